// crates/kryon-render/src/lib.rs

use glam::{Vec2, Vec4};
use kryon_core::{EdgeWidths, Element, ElementId, ElementType, TextAlignment};
use kryon_layout::LayoutResult;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, trace};

pub mod recorder;
pub use recorder::*;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Render operation failed: {0}")]
    RenderFailed(String),
}

pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// Backend-neutral drawing instructions, in viewport pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    DrawRect {
        element: ElementId,
        #[serde(with = "vec2")]
        position: Vec2,
        #[serde(with = "vec2")]
        size: Vec2,
        #[serde(with = "vec4")]
        color: Vec4,
        border_radius: f32,
        #[serde(with = "edges")]
        border_widths: EdgeWidths,
        #[serde(with = "vec4")]
        border_color: Vec4,
    },
    DrawText {
        element: ElementId,
        #[serde(with = "vec2")]
        position: Vec2,
        text: String,
        font_size: f32,
        #[serde(with = "vec4")]
        color: Vec4,
        #[serde(with = "alignment")]
        alignment: TextAlignment,
        max_width: f32,
    },
    DrawImage {
        element: ElementId,
        #[serde(with = "vec2")]
        position: Vec2,
        #[serde(with = "vec2")]
        size: Vec2,
        source: String,
        opacity: f32,
    },
}

impl RenderCommand {
    pub fn element(&self) -> ElementId {
        match self {
            RenderCommand::DrawRect { element, .. }
            | RenderCommand::DrawText { element, .. }
            | RenderCommand::DrawImage { element, .. } => *element,
        }
    }
}

/// A presentation backend that consumes render commands.
pub trait CommandRenderer {
    type Context;

    fn begin_frame(&mut self, clear_color: Vec4) -> RenderResult<Self::Context>;

    fn execute_commands(&mut self, context: &mut Self::Context, commands: &[RenderCommand]) -> RenderResult<()>;

    fn end_frame(&mut self, context: Self::Context) -> RenderResult<()>;

    fn viewport_size(&self) -> Vec2;
}

/// Walks the tree in pre-order and emits what each visible element draws.
/// An invisible element hides its whole subtree.
pub fn generate_commands(
    elements: &HashMap<ElementId, Element>,
    roots: &[ElementId],
    layout: &LayoutResult,
) -> Vec<RenderCommand> {
    let mut commands = Vec::new();
    let mut stack: Vec<ElementId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let Some(element) = elements.get(&id) else { continue };
        if !element.visible {
            trace!("Skipping hidden subtree at element {}", element.id);
            continue;
        }
        element_to_commands(id, element, layout, &mut commands);
        stack.extend(element.children.iter().rev());
    }
    debug!("Generated {} render commands", commands.len());
    commands
}

fn element_to_commands(id: ElementId, element: &Element, layout: &LayoutResult, commands: &mut Vec<RenderCommand>) {
    let Some(rect) = layout.rect(id) else { return };
    let content = layout.content_rects.get(&id).copied().unwrap_or(rect);
    let border_widths = layout.border_widths.get(&id).copied().unwrap_or_default();
    let opacity = element.opacity.clamp(0.0, 1.0);

    let mut background = element.background_color;
    background.w *= opacity;
    let mut border_color = element.border_color;
    border_color.w *= opacity;

    let has_border = !border_widths.is_zero() && border_color.w > 0.0;
    if background.w > 0.0 || has_border {
        commands.push(RenderCommand::DrawRect {
            element: id,
            position: rect.position,
            size: rect.size,
            color: background,
            border_radius: element.border_radius,
            border_widths: if has_border { border_widths } else { EdgeWidths::default() },
            border_color,
        });
    }

    if element.element_type == ElementType::Image {
        if let Some(source) = &element.image_source {
            commands.push(RenderCommand::DrawImage {
                element: id,
                position: content.position,
                size: content.size,
                source: source.clone(),
                opacity,
            });
        }
    }

    if !element.text.is_empty() && element.element_type.shows_text() {
        let mut color = element.text_color;
        color.w *= opacity;
        if color.w > 0.0 {
            commands.push(RenderCommand::DrawText {
                element: id,
                position: content.position,
                text: element.text.clone(),
                font_size: element.font_size,
                color,
                alignment: element.text_alignment,
                max_width: content.size.x,
            });
        }
    }
}

/// Drives a backend through one frame per call.
pub struct ElementRenderer<R: CommandRenderer> {
    backend: R,
}

impl<R: CommandRenderer> ElementRenderer<R> {
    pub fn new(backend: R) -> Self {
        Self { backend }
    }

    pub fn render_frame(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        roots: &[ElementId],
        layout: &LayoutResult,
        clear_color: Vec4,
    ) -> RenderResult<()> {
        if let Some(root) = roots.iter().find(|&&root| layout.rect(root).is_none()) {
            return Err(RenderError::RenderFailed(format!("root element {} has no layout", root)));
        }
        let commands = generate_commands(elements, roots, layout);
        let mut context = self.backend.begin_frame(clear_color)?;
        self.backend.execute_commands(&mut context, &commands)?;
        self.backend.end_frame(context)
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.backend.viewport_size()
    }

    pub fn backend(&self) -> &R {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut R {
        &mut self.backend
    }

    pub fn into_backend(self) -> R {
        self.backend
    }
}

mod vec2 {
    use glam::Vec2;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(v: &Vec2, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq([v.x, v.y])
    }
}

mod vec4 {
    use glam::Vec4;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(v: &Vec4, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq([v.x, v.y, v.z, v.w])
    }
}

mod edges {
    use kryon_core::EdgeWidths;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(e: &EdgeWidths, s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq([e.top, e.right, e.bottom, e.left])
    }
}

mod alignment {
    use kryon_core::TextAlignment;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(a: &TextAlignment, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(match a {
            TextAlignment::Start => "start",
            TextAlignment::Center => "center",
            TextAlignment::End => "end",
            TextAlignment::Justify => "justify",
        })
    }
}
