// crates/kryon-compiler/src/source.rs
//! In-memory source model handed to the writer.
//!
//! Values are kept as written; style and string references are still names.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProperty {
    pub key: String,
    pub value: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceElement {
    pub type_name: String,
    pub properties: Vec<SourceProperty>,
    pub children: Vec<SourceElement>,
    pub line: usize,
}

impl SourceElement {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties: Vec::new(),
            children: Vec::new(),
            line: 0,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(SourceProperty {
            key: key.into(),
            value: value.into(),
            line: self.line,
        });
        self
    }

    pub fn with_child(mut self, child: SourceElement) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStyle {
    pub name: String,
    pub properties: Vec<SourceProperty>,
    pub line: usize,
}

impl SourceStyle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            line: 0,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(SourceProperty {
            key: key.into(),
            value: value.into(),
            line: self.line,
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocument {
    pub styles: Vec<SourceStyle>,
    pub roots: Vec<SourceElement>,
}

impl SourceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: SourceStyle) -> Self {
        self.styles.push(style);
        self
    }

    pub fn with_root(mut self, root: SourceElement) -> Self {
        self.roots.push(root);
        self
    }
}
