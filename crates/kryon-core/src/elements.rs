// crates/kryon-core/src/elements.rs
use crate::EventType;
use glam::{Vec2, Vec4};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    App,
    Container,
    Text,
    Image,
    Canvas,
    Button,
    Input,
    List,
    Grid,
    Scrollable,
    Video,
    Custom(u8),
}

impl From<u8> for ElementType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => ElementType::App,
            0x01 => ElementType::Container,
            0x02 => ElementType::Text,
            0x03 => ElementType::Image,
            0x04 => ElementType::Canvas,
            0x10 => ElementType::Button,
            0x11 => ElementType::Input,
            0x20 => ElementType::List,
            0x21 => ElementType::Grid,
            0x22 => ElementType::Scrollable,
            0x30 => ElementType::Video,
            other => ElementType::Custom(other),
        }
    }
}

impl From<ElementType> for u8 {
    fn from(value: ElementType) -> Self {
        match value {
            ElementType::App => 0x00,
            ElementType::Container => 0x01,
            ElementType::Text => 0x02,
            ElementType::Image => 0x03,
            ElementType::Canvas => 0x04,
            ElementType::Button => 0x10,
            ElementType::Input => 0x11,
            ElementType::List => 0x20,
            ElementType::Grid => 0x21,
            ElementType::Scrollable => 0x22,
            ElementType::Video => 0x30,
            ElementType::Custom(other) => other,
        }
    }
}

pub const CUSTOM_ELEMENT_BASE: u8 = 0x31;

impl ElementType {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "App" => ElementType::App,
            "Container" => ElementType::Container,
            "Text" => ElementType::Text,
            "Image" => ElementType::Image,
            "Canvas" => ElementType::Canvas,
            "Button" => ElementType::Button,
            "Input" => ElementType::Input,
            "List" => ElementType::List,
            "Grid" => ElementType::Grid,
            "Scrollable" => ElementType::Scrollable,
            "Video" => ElementType::Video,
            _ => return None,
        })
    }

    /// Elements that draw their own text.
    pub fn shows_text(self) -> bool {
        matches!(self, ElementType::Text | ElementType::Button | ElementType::Input)
    }
}

pub type ElementId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal = 400,
    Bold = 700,
    Light = 300,
    Heavy = 900,
}

impl FontWeight {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FontWeight::Bold,
            2 => FontWeight::Light,
            3 => FontWeight::Heavy,
            _ => FontWeight::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlignment {
    Start,
    Center,
    End,
    Justify,
}

impl TextAlignment {
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => TextAlignment::Center,
            2 => TextAlignment::End,
            3 => TextAlignment::Justify,
            _ => TextAlignment::Start,
        }
    }
}

/// Border widths per edge, in unscaled document units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeWidths {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl EdgeWidths {
    pub fn uniform(width: f32) -> Self {
        Self { top: width, right: width, bottom: width, left: width }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self {
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
            left: self.left * factor,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0 && self.left == 0.0
    }
}

/// A render node: one element record plus everything the style cascade resolved.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: String,
    pub element_type: ElementType,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,

    pub style_id: u8,

    // Layout properties
    pub position: Vec2,
    pub size: Vec2,
    pub layout_flags: u8,
    pub gap: f32,

    // Visual properties
    pub background_color: Vec4,
    pub text_color: Vec4,
    pub border_color: Vec4,
    pub border_widths: EdgeWidths,
    pub border_radius: f32,
    pub opacity: f32,
    pub visible: bool,

    // Text properties
    pub text: String,
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub text_alignment: TextAlignment,

    pub image_source: Option<String>,
    pub window_title: Option<String>,

    pub event_handlers: HashMap<EventType, String>,
}

pub const DEFAULT_FONT_SIZE: f32 = 14.0;

impl Default for Element {
    fn default() -> Self {
        Self {
            id: String::new(),
            element_type: ElementType::Container,
            parent: None,
            children: Vec::new(),
            style_id: 0,
            position: Vec2::ZERO,
            size: Vec2::ZERO,
            layout_flags: 0,
            gap: 0.0,
            background_color: Vec4::new(0.0, 0.0, 0.0, 0.0), // Transparent
            text_color: Vec4::new(0.0, 0.0, 0.0, 1.0), // Black
            border_color: Vec4::new(0.0, 0.0, 0.0, 0.0), // Transparent
            border_widths: EdgeWidths::default(),
            border_radius: 0.0,
            opacity: 1.0,
            visible: true,
            text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            text_alignment: TextAlignment::Start,
            image_source: None,
            window_title: None,
            event_handlers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_type_round_trips_custom_range() {
        for raw in [0x00u8, 0x03, 0x11, 0x22, 0x30, 0x31, 0x80] {
            assert_eq!(u8::from(ElementType::from(raw)), raw);
        }
        assert_eq!(ElementType::from(0x45), ElementType::Custom(0x45));
    }
}
