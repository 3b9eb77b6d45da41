// crates/kryon-compiler/src/context.rs
//! Pass 1: turns the source model into sized, table-backed records.
//!
//! All working state lives in one owned [`CompilationContext`], so separate
//! compilations never share anything.

use crate::error::{CompilerError, Result};
use crate::limits::Limits;
use crate::source::{SourceDocument, SourceElement, SourceProperty, SourceStyle};
use crate::values::{self, ValueKind};
use kryon_core::codec::percentage_to_fixed;
use kryon_core::format::{
    HeaderFlags, CHILD_OFFSET_SIZE, EVENT_SIZE, KRB_ELEMENT_HEADER_SIZE,
    MAX_STRING_LENGTH, STYLE_HEADER_SIZE,
};
use kryon_core::{
    Color, ElementType, EventBinding, EventType, Property, PropertyValue, ResourceType,
    CUSTOM_ELEMENT_BASE,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CompiledElement {
    pub element_type: ElementType,
    pub id_index: u8,
    pub pos_x: u16,
    pub pos_y: u16,
    pub width: u16,
    pub height: u16,
    pub layout: u8,
    pub style_id: u8,
    pub properties: Vec<Property>,
    pub events: Vec<EventBinding>,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
    pub line: usize,
    pub calculated_size: u32,
    pub absolute_offset: u32,
}

impl CompiledElement {
    fn new(element_type: ElementType, parent: Option<usize>, depth: usize, line: usize) -> Self {
        Self {
            element_type,
            id_index: 0,
            pos_x: 0,
            pos_y: 0,
            width: 0,
            height: 0,
            layout: 0,
            style_id: 0,
            properties: Vec::new(),
            events: Vec::new(),
            parent,
            children: Vec::new(),
            depth,
            line,
            calculated_size: 0,
            absolute_offset: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledStyle {
    pub id: u8,
    pub name: String,
    pub name_index: u8,
    pub properties: Vec<Property>,
    pub calculated_size: u32,
    pub absolute_offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledResource {
    pub resource_type: ResourceType,
    pub name_index: u8,
    pub path_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileWarning {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct CompilationContext {
    pub limits: Limits,
    pub strings: Vec<String>,
    string_lookup: HashMap<String, u8>,
    pub styles: Vec<CompiledStyle>,
    style_lookup: HashMap<String, u8>,
    /// Pre-order, which is also definition order.
    pub elements: Vec<CompiledElement>,
    pub resources: Vec<CompiledResource>,
    resource_lookup: HashMap<String, u8>,
    custom_types: HashMap<String, u8>,
    pub header_flags: HeaderFlags,
    pub warnings: Vec<CompileWarning>,
}

impl CompilationContext {
    /// String 0 is always the empty string so that index 0 can mean "unset".
    pub fn new(limits: Limits) -> Self {
        let mut context = Self {
            limits: limits.clamped(),
            strings: Vec::new(),
            string_lookup: HashMap::new(),
            styles: Vec::new(),
            style_lookup: HashMap::new(),
            elements: Vec::new(),
            resources: Vec::new(),
            resource_lookup: HashMap::new(),
            custom_types: HashMap::new(),
            header_flags: HeaderFlags::empty(),
            warnings: Vec::new(),
        };
        context.strings.push(String::new());
        context.string_lookup.insert(String::new(), 0);
        context
    }

    pub fn build(source: &SourceDocument, limits: Limits) -> Result<Self> {
        let mut context = Self::new(limits);
        for style in &source.styles {
            context.add_style(style)?;
        }
        if source.roots.is_empty() {
            return Err(CompilerError::semantic(0, "No root element found"));
        }
        for (position, root) in source.roots.iter().enumerate() {
            context.add_element(root, None, 0, position == 0)?;
        }
        context.calculate_sizes();
        debug!(
            "Pass 1 complete: {} elements, {} styles, {} strings, {} resources, flags {:?}",
            context.elements.len(),
            context.styles.len(),
            context.strings.len(),
            context.resources.len(),
            context.header_flags
        );
        Ok(context)
    }

    /// Adds a cleaned string to the table, reusing an identical entry.
    pub fn intern_string(&mut self, raw: &str) -> Result<u8> {
        let cleaned = values::clean_string(raw);
        if let Some(&index) = self.string_lookup.get(cleaned) {
            return Ok(index);
        }
        if cleaned.len() > MAX_STRING_LENGTH {
            return Err(CompilerError::limit("string length in bytes", MAX_STRING_LENGTH));
        }
        if self.strings.len() >= self.limits.max_strings {
            return Err(CompilerError::limit("strings", self.limits.max_strings));
        }
        let index = self.strings.len() as u8;
        self.strings.push(cleaned.to_string());
        self.string_lookup.insert(cleaned.to_string(), index);
        Ok(index)
    }

    fn warn(&mut self, line: usize, message: String) {
        warn!("line {}: {}", line, message);
        self.warnings.push(CompileWarning { line, message });
    }

    fn add_style(&mut self, style: &SourceStyle) -> Result<()> {
        if self.style_lookup.contains_key(&style.name) {
            self.warn(style.line, format!("style '{}' is defined twice; keeping the first", style.name));
            return Ok(());
        }
        if self.styles.len() >= self.limits.max_styles {
            return Err(CompilerError::limit("styles", self.limits.max_styles));
        }

        let name_index = self.intern_string(&style.name)?;
        let mut properties = Vec::new();
        for property in &style.properties {
            match property.key.as_str() {
                "extends" => {
                    let base = values::clean_string(&property.value);
                    match self.style_id(base) {
                        Some(id) => properties.extend(self.styles[id as usize - 1].properties.iter().cloned()),
                        None => self.warn(property.line, format!("style '{}' extends unknown style '{}'", style.name, base)),
                    }
                }
                key if is_element_only_key(key) => {
                    self.warn(property.line, format!("'{}' cannot be set in style '{}'", key, style.name));
                }
                _ => {
                    if let Some(converted) = self.convert_property(property)? {
                        properties.push(converted);
                    }
                }
            }
        }
        if properties.len() > self.limits.max_properties {
            return Err(CompilerError::limit("properties per style", self.limits.max_properties));
        }

        let id = self.styles.len() as u8 + 1;
        self.styles.push(CompiledStyle {
            id,
            name: style.name.clone(),
            name_index,
            properties,
            calculated_size: 0,
            absolute_offset: 0,
        });
        self.style_lookup.insert(style.name.clone(), id);
        self.header_flags |= HeaderFlags::HAS_STYLES;
        Ok(())
    }

    fn add_element(
        &mut self,
        source: &SourceElement,
        parent: Option<usize>,
        depth: usize,
        first_root: bool,
    ) -> Result<usize> {
        if depth >= self.limits.max_depth {
            return Err(CompilerError::limit("nesting depth", self.limits.max_depth));
        }
        if self.elements.len() >= self.limits.max_elements {
            return Err(CompilerError::limit("elements", self.limits.max_elements));
        }
        if source.children.len() > self.limits.max_children {
            return Err(CompilerError::limit("children per element", self.limits.max_children));
        }

        let element_type = self.element_type(&source.type_name, source.line)?;
        if element_type == ElementType::App {
            if parent.is_some() || !first_root {
                return Err(CompilerError::semantic(
                    source.line,
                    "App must be the first top-level element",
                ));
            }
            self.header_flags |= HeaderFlags::HAS_APP;
        }

        let index = self.elements.len();
        self.elements
            .push(CompiledElement::new(element_type, parent, depth, source.line));

        for property in &source.properties {
            self.apply_element_property(index, property)?;
        }
        if self.elements[index].properties.len() > self.limits.max_properties {
            return Err(CompilerError::limit("properties per element", self.limits.max_properties));
        }
        if self.elements[index].events.len() > self.limits.max_events {
            return Err(CompilerError::limit("events per element", self.limits.max_events));
        }

        for child in &source.children {
            let child_index = self.add_element(child, Some(index), depth + 1, false)?;
            self.elements[index].children.push(child_index);
        }
        Ok(index)
    }

    fn element_type(&mut self, name: &str, line: usize) -> Result<ElementType> {
        if let Some(known) = ElementType::from_name(name) {
            return Ok(known);
        }
        if let Some(&id) = self.custom_types.get(name) {
            return Ok(ElementType::Custom(id));
        }
        let next = CUSTOM_ELEMENT_BASE as usize + self.custom_types.len();
        if next > u8::MAX as usize {
            return Err(CompilerError::limit("custom element types", u8::MAX as usize - CUSTOM_ELEMENT_BASE as usize + 1));
        }
        debug!("line {}: custom element type '{}' mapped to 0x{:02X}", line, name, next);
        self.custom_types.insert(name.to_string(), next as u8);
        Ok(ElementType::Custom(next as u8))
    }

    fn apply_element_property(&mut self, index: usize, property: &SourceProperty) -> Result<()> {
        let key = property.key.as_str();
        let line = property.line;
        match key {
            "id" => {
                let id_index = self.intern_string(&property.value)?;
                self.elements[index].id_index = id_index;
            }
            "pos_x" | "x" | "pos_y" | "y" | "width" | "height" => match values::parse_u16(&property.value) {
                Some(value) => {
                    let element = &mut self.elements[index];
                    match key {
                        "pos_x" | "x" => element.pos_x = value,
                        "pos_y" | "y" => element.pos_y = value,
                        "width" => element.width = value,
                        _ => element.height = value,
                    }
                }
                None => self.warn(line, format!("'{}' needs a number in 0..=65535, found '{}'", key, property.value)),
            },
            "layout" => {
                let (flags, unknown) = values::parse_layout(&property.value);
                for token in unknown {
                    self.warn(line, format!("unknown layout token '{}'", token));
                }
                self.elements[index].layout = flags;
            }
            "style" => {
                let name = values::clean_string(&property.value);
                match self.style_id(name) {
                    Some(id) => self.elements[index].style_id = id,
                    None => self.warn(line, format!("unknown style '{}'", name)),
                }
            }
            _ => {
                if let Some(event_type) = EventType::from_handler_key(key) {
                    let callback = self.intern_string(&property.value)?;
                    self.elements[index].events.push(EventBinding { event_type, callback });
                } else if let Some(converted) = self.convert_property(property)? {
                    self.elements[index].properties.push(converted);
                }
            }
        }
        Ok(())
    }

    /// Returns `Ok(None)` after recording a warning for anything that cannot
    /// be encoded; only capacity problems are errors.
    fn convert_property(&mut self, property: &SourceProperty) -> Result<Option<Property>> {
        let Some((id, kind)) = values::lookup(&property.key) else {
            self.warn(property.line, format!("unknown property '{}' skipped", property.key));
            return Ok(None);
        };
        let raw = property.value.as_str();

        let value = match kind {
            ValueKind::Color => match Color::from_hex(values::clean_string(raw).trim()) {
                Some(color) => {
                    self.header_flags |= HeaderFlags::EXTENDED_COLOR;
                    Some(PropertyValue::Color(color))
                }
                None => {
                    self.warn(
                        property.line,
                        format!("'{}' is not a #RRGGBB or #RRGGBBAA color for '{}'", raw, property.key),
                    );
                    return Ok(None);
                }
            },
            ValueKind::Byte => values::parse_u8(raw).map(PropertyValue::Byte),
            ValueKind::Short => values::parse_u16(raw).map(PropertyValue::Short),
            ValueKind::Bool => values::parse_bool(raw).map(|b| PropertyValue::Byte(b as u8)),
            ValueKind::ByteOrInsets => match values::parse_u8(raw) {
                Some(width) => Some(PropertyValue::Byte(width)),
                None => values::parse_insets(raw).map(insets),
            },
            ValueKind::Insets => values::parse_insets(raw).map(insets),
            ValueKind::Percentage => values::parse_percentage(raw).map(|fraction| {
                self.header_flags |= HeaderFlags::FIXED_POINT;
                PropertyValue::Percentage(percentage_to_fixed(fraction))
            }),
            ValueKind::String => Some(PropertyValue::String(self.intern_string(raw)?)),
            ValueKind::Resource => Some(PropertyValue::Resource(self.add_resource(ResourceType::Image, raw)?)),
            ValueKind::TextAlignment => values::parse_text_alignment(raw).map(PropertyValue::Enum),
            ValueKind::FontWeight => values::parse_font_weight(raw).map(PropertyValue::Enum),
            ValueKind::Overflow => values::parse_overflow(raw).map(PropertyValue::Enum),
            ValueKind::Layout => {
                let (flags, unknown) = values::parse_layout(raw);
                for token in unknown {
                    self.warn(property.line, format!("unknown layout token '{}'", token));
                }
                Some(PropertyValue::Byte(flags))
            }
        };

        match value {
            Some(value) => Ok(Some(Property::new(id, value))),
            None => {
                self.warn(property.line, format!("malformed value '{}' for '{}' skipped", raw, property.key));
                Ok(None)
            }
        }
    }

    /// External resources are deduplicated by path.
    pub fn add_resource(&mut self, resource_type: ResourceType, raw_path: &str) -> Result<u8> {
        let path = values::clean_string(raw_path).to_string();
        if let Some(&index) = self.resource_lookup.get(&path) {
            return Ok(index);
        }
        if self.resources.len() >= self.limits.max_resources {
            return Err(CompilerError::limit("resources", self.limits.max_resources));
        }
        let name = Path::new(&path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&path)
            .to_string();
        let name_index = self.intern_string(&name)?;
        let path_index = self.intern_string(&path)?;

        let index = self.resources.len() as u8;
        self.resources.push(CompiledResource {
            resource_type,
            name_index,
            path_index,
        });
        self.resource_lookup.insert(path, index);
        self.header_flags |= HeaderFlags::HAS_RESOURCES;
        Ok(index)
    }

    pub fn calculate_sizes(&mut self) {
        for element in &mut self.elements {
            // No animation references are emitted.
            let properties: usize = element.properties.iter().map(Property::encoded_size).sum();
            element.calculated_size = (KRB_ELEMENT_HEADER_SIZE
                + properties
                + element.events.len() * EVENT_SIZE
                + element.children.len() * CHILD_OFFSET_SIZE) as u32;
        }
        for style in &mut self.styles {
            let properties: usize = style.properties.iter().map(Property::encoded_size).sum();
            style.calculated_size = (STYLE_HEADER_SIZE + properties) as u32;
        }
    }

    /// 1-based id of a style added so far.
    pub fn style_id(&self, name: &str) -> Option<u8> {
        self.style_lookup.get(name).copied()
    }
}

fn insets([top, right, bottom, left]: [u8; 4]) -> PropertyValue {
    PropertyValue::EdgeInsets { top, right, bottom, left }
}

fn is_element_only_key(key: &str) -> bool {
    matches!(key, "id" | "pos_x" | "x" | "pos_y" | "y" | "width" | "height" | "style")
        || EventType::from_handler_key(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceElement, SourceStyle};

    fn app() -> SourceElement {
        SourceElement::new("App")
    }

    #[test]
    fn strings_are_cleaned_and_deduplicated() {
        let source = SourceDocument::new().with_root(
            app()
                .with_child(SourceElement::new("Text").with_property("text", "\"Hello\""))
                .with_child(SourceElement::new("Text").with_property("text", "  Hello ")),
        );
        let context = CompilationContext::build(&source, Limits::default()).unwrap();
        assert_eq!(context.strings, vec!["".to_string(), "Hello".to_string()]);
        assert_eq!(context.elements[1].properties, context.elements[2].properties);
    }

    #[test]
    fn sizes_follow_record_layout() {
        let source = SourceDocument::new()
            .with_style(SourceStyle::new("card").with_property("background_color", "#101010"))
            .with_root(
                app()
                    .with_property("background_color", "#000000")
                    .with_property("onClick", "handle_click")
                    .with_child(SourceElement::new("Container").with_property("style", "card")),
            );
        let context = CompilationContext::build(&source, Limits::default()).unwrap();
        // header + color property + one event + one child offset
        assert_eq!(context.elements[0].calculated_size, 17 + 7 + 2 + 2);
        assert_eq!(context.elements[1].calculated_size, 17);
        assert_eq!(context.styles[0].calculated_size, 3 + 7);
        assert_eq!(context.elements[1].style_id, 1);
    }

    #[test]
    fn flags_track_features_in_use() {
        let source = SourceDocument::new()
            .with_style(SourceStyle::new("faded").with_property("opacity", "50%"))
            .with_root(
                app()
                    .with_property("text_color", "#FFFFFF")
                    .with_child(SourceElement::new("Image").with_property("source", "logo.png")),
            );
        let context = CompilationContext::build(&source, Limits::default()).unwrap();
        let flags = context.header_flags;
        assert!(flags.contains(HeaderFlags::HAS_APP));
        assert!(flags.contains(HeaderFlags::HAS_STYLES));
        assert!(flags.contains(HeaderFlags::EXTENDED_COLOR));
        assert!(flags.contains(HeaderFlags::FIXED_POINT));
        assert!(flags.contains(HeaderFlags::HAS_RESOURCES));
        assert_eq!(context.resources.len(), 1);
    }

    #[test]
    fn cosmetic_mistakes_only_warn() {
        let source = SourceDocument::new().with_root(
            app()
                .with_property("background_color", "red")
                .with_property("sparkle", "yes")
                .with_property("style", "missing")
                .with_property("layout", "column sideways"),
        );
        let context = CompilationContext::build(&source, Limits::default()).unwrap();
        assert_eq!(context.warnings.len(), 4);
        assert!(context.elements[0].properties.is_empty());
        assert_eq!(context.elements[0].layout, 0x01);
        assert_eq!(context.elements[0].style_id, 0);
    }

    #[test]
    fn string_capacity_is_fatal() {
        // "" plus 256 distinct texts is one string too many.
        let mut root = app();
        for group in 0..4 {
            let mut container = SourceElement::new("Container");
            for i in 0..64 {
                container = container
                    .with_child(SourceElement::new("Text").with_property("text", format!("s{}_{}", group, i)));
            }
            root = root.with_child(container);
        }
        root = root.with_child(SourceElement::new("Text").with_property("text", "one more"));
        let limits = Limits {
            max_elements: 1000,
            ..Limits::default()
        };
        let err = CompilationContext::build(&SourceDocument::new().with_root(root), limits).unwrap_err();
        assert!(matches!(err, CompilerError::LimitExceeded { ref limit_type, limit: 256 } if limit_type == "strings"));
    }

    #[test]
    fn style_extends_copies_base_first() {
        let source = SourceDocument::new()
            .with_style(SourceStyle::new("base").with_property("border_width", "2"))
            .with_style(
                SourceStyle::new("derived")
                    .with_property("extends", "\"base\"")
                    .with_property("border_width", "1 2 3 4"),
            )
            .with_root(app());
        let context = CompilationContext::build(&source, Limits::default()).unwrap();
        let derived = &context.styles[1];
        assert_eq!(derived.properties.len(), 2);
        assert_eq!(derived.properties[0].value, PropertyValue::Byte(2));
        assert_eq!(
            derived.properties[1].value,
            PropertyValue::EdgeInsets { top: 1, right: 2, bottom: 3, left: 4 }
        );
    }

    #[test]
    fn nested_app_is_rejected() {
        let source = SourceDocument::new().with_root(SourceElement::new("Container").with_child(app()));
        assert!(matches!(
            CompilationContext::build(&source, Limits::default()),
            Err(CompilerError::Semantic { .. })
        ));
    }

    #[test]
    fn too_many_children_is_fatal() {
        let mut root = app();
        for _ in 0..129 {
            root = root.with_child(SourceElement::new("Container"));
        }
        let limits = Limits {
            max_elements: 1000,
            ..Limits::default()
        };
        let err = CompilationContext::build(&SourceDocument::new().with_root(root), limits).unwrap_err();
        assert!(matches!(err, CompilerError::LimitExceeded { limit: 128, .. }));
    }
}
