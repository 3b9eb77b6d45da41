// crates/kryon-compiler/src/kry.rs
//! Line scanner for `.kry` text.
//!
//! One construct per line: `@style "name" {`, `TypeName {`, `key: value`,
//! or `}`. `#` and `//` start comment lines. Everything else about the
//! values is left to the compilation context.

use crate::error::{CompilerError, Result};
use crate::source::{SourceDocument, SourceElement, SourceProperty, SourceStyle};

enum Block {
    Style(SourceStyle),
    Element(SourceElement),
}

pub fn parse_kry(file: &str, text: &str) -> Result<SourceDocument> {
    let mut document = SourceDocument::new();
    let mut stack: Vec<Block> = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
            continue;
        }

        if trimmed == "}" {
            let block = stack
                .pop()
                .ok_or_else(|| CompilerError::parse(file, line, "unmatched '}'"))?;
            close_block(file, line, block, &mut stack, &mut document)?;
            continue;
        }

        if let Some(head) = trimmed.strip_suffix('{').or_else(|| trimmed.strip_suffix("{}")) {
            let self_closing = trimmed.ends_with("{}");
            let head = head.trim();
            let block = if let Some(name) = head.strip_prefix("@style") {
                if !stack.is_empty() {
                    return Err(CompilerError::parse(file, line, "@style blocks must be top level"));
                }
                let name = name.trim().trim_matches('"').trim();
                if name.is_empty() {
                    return Err(CompilerError::parse(file, line, "@style needs a name"));
                }
                let mut style = SourceStyle::new(name);
                style.line = line;
                Block::Style(style)
            } else {
                if head.is_empty() || !head.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(CompilerError::parse(file, line, format!("invalid block header '{}'", head)));
                }
                if matches!(stack.last(), Some(Block::Style(_))) {
                    return Err(CompilerError::parse(file, line, "elements cannot be nested in a style"));
                }
                let mut element = SourceElement::new(head);
                element.line = line;
                Block::Element(element)
            };
            if self_closing {
                close_block(file, line, block, &mut stack, &mut document)?;
            } else {
                stack.push(block);
            }
            continue;
        }

        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| CompilerError::parse(file, line, format!("expected 'key: value', found '{}'", trimmed)))?;
        let property = SourceProperty {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
            line,
        };
        match stack.last_mut() {
            Some(Block::Style(style)) => style.properties.push(property),
            Some(Block::Element(element)) => element.properties.push(property),
            None => return Err(CompilerError::parse(file, line, "property outside of any block")),
        }
    }

    if let Some(open) = stack.last() {
        let opened_at = match open {
            Block::Style(style) => style.line,
            Block::Element(element) => element.line,
        };
        return Err(CompilerError::parse(file, opened_at, "block is never closed"));
    }
    Ok(document)
}

fn close_block(
    file: &str,
    line: usize,
    block: Block,
    stack: &mut [Block],
    document: &mut SourceDocument,
) -> Result<()> {
    match block {
        Block::Style(style) => document.styles.push(style),
        Block::Element(element) => match stack.last_mut() {
            Some(Block::Element(parent)) => parent.children.push(element),
            Some(Block::Style(_)) => {
                return Err(CompilerError::parse(file, line, "elements cannot be nested in a style"))
            }
            None => document.roots.push(element),
        },
    }
    Ok(())
}
