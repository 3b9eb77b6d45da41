//! Text and JSON views of a loaded document.

use anyhow::{Context, Result};
use kryon_core::{ElementId, KrbFile, KrbHeader};
use kryon_layout::LayoutResult;
use kryon_render::RenderCommand;
use serde::Serialize;

/// Renders the element hierarchy with box-drawing prefixes, one element per line.
pub fn tree_output(krb_file: &KrbFile, layout: Option<&LayoutResult>) -> String {
    let mut output = String::new();
    let roots = krb_file.roots();
    if roots.is_empty() {
        output.push_str("No root element found\n");
        return output;
    }
    for root in roots {
        render_element_tree(&mut output, krb_file, layout, root, 0, true);
    }
    output
}

fn render_element_tree(
    output: &mut String,
    krb_file: &KrbFile,
    layout: Option<&LayoutResult>,
    element_id: ElementId,
    depth: usize,
    is_last: bool,
) {
    let Some(element) = krb_file.elements.get(&element_id) else {
        return;
    };

    let indent = if depth == 0 {
        String::new()
    } else {
        let tree_char = if is_last { "└── " } else { "├── " };
        "│   ".repeat(depth - 1) + tree_char
    };

    output.push_str(&format!("{}{:?}", indent, element.element_type));
    if !element.id.is_empty() {
        output.push_str(&format!(" #{}", element.id));
    }
    if !element.text.is_empty() {
        output.push_str(&format!(" \"{}\"", element.text));
    }
    if let Some(style) = style_name(krb_file, element.style_id) {
        output.push_str(&format!(" style:{}", style));
    }
    if let Some(rect) = layout.and_then(|layout| layout.rect(element_id)) {
        output.push_str(&format!(
            " pos:({:.0},{:.0}) size:({:.0},{:.0})",
            rect.position.x, rect.position.y, rect.size.x, rect.size.y
        ));
    }
    if !element.visible {
        output.push_str(" [hidden]");
    }
    output.push('\n');

    let child_count = element.children.len();
    for (i, child_id) in element.children.iter().enumerate() {
        render_element_tree(output, krb_file, layout, *child_id, depth + 1, i + 1 == child_count);
    }
}

fn style_name(krb_file: &KrbFile, style_id: u8) -> Option<&str> {
    let document = &krb_file.document;
    document.style(style_id).and_then(|style| document.style_name(style))
}

#[derive(Debug, Serialize)]
pub struct DocumentReport<'a> {
    pub path: Option<String>,
    pub header: &'a KrbHeader,
    pub strings: &'a [String],
    pub elements: Vec<NodeSummary>,
    pub commands: &'a [RenderCommand],
}

#[derive(Debug, Serialize)]
pub struct NodeSummary {
    pub index: ElementId,
    pub element_type: String,
    pub id: String,
    pub text: String,
    pub style: Option<String>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub position: Option<[f32; 2]>,
    pub size: Option<[f32; 2]>,
}

pub fn report<'a>(
    krb_file: &'a KrbFile,
    layout: Option<&LayoutResult>,
    commands: &'a [RenderCommand],
) -> DocumentReport<'a> {
    let elements = krb_file
        .tree
        .pre_order()
        .into_iter()
        .filter_map(|index| {
            let id = index as ElementId;
            let element = krb_file.elements.get(&id)?;
            let rect = layout.and_then(|layout| layout.rect(id));
            Some(NodeSummary {
                index: id,
                element_type: format!("{:?}", element.element_type),
                id: element.id.clone(),
                text: element.text.clone(),
                style: style_name(krb_file, element.style_id).map(str::to_string),
                parent: element.parent,
                children: element.children.clone(),
                position: rect.map(|r| [r.position.x, r.position.y]),
                size: rect.map(|r| [r.size.x, r.size.y]),
            })
        })
        .collect();

    DocumentReport {
        path: krb_file.path.as_ref().map(|p| p.display().to_string()),
        header: &krb_file.document.header,
        strings: krb_file.strings(),
        elements,
        commands,
    }
}

pub fn json_output(krb_file: &KrbFile, layout: Option<&LayoutResult>, commands: &[RenderCommand]) -> Result<String> {
    let mut text = serde_json::to_string_pretty(&report(krb_file, layout, commands))
        .context("Failed to serialize document report")?;
    text.push('\n');
    Ok(text)
}
