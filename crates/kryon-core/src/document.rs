// crates/kryon-core/src/document.rs
//! The flat, parsed form of a KRB file.

use crate::format::{FormatVariant, HeaderFlags, PropertyId};
use crate::{ElementType, EventBinding, Property, ResourceRecord};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct KrbHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub variant: FormatVariant,
    pub flags: HeaderFlags,
    pub element_count: u16,
    pub style_count: u16,
    pub animation_count: u16,
    pub string_count: u16,
    pub resource_count: u16,
    pub element_offset: u32,
    pub style_offset: u32,
    pub animation_offset: u32,
    pub string_offset: u32,
    pub resource_offset: u32,
    pub total_size: u32,
}

/// One element as stored on disk. Children are not linked here; see
/// [`crate::tree::assemble_tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub element_type: ElementType,
    pub id_index: u8,
    pub pos_x: u16,
    pub pos_y: u16,
    pub width: u16,
    pub height: u16,
    pub layout: u8,
    pub style_id: u8,
    pub child_count: u8,
    pub animation_count: u8,
    pub properties: Vec<Property>,
    pub custom_properties: Vec<Property>,
    pub events: Vec<EventBinding>,
    /// Byte distance from this record's start to each child's start.
    pub child_offsets: Vec<u16>,
    /// Absolute offset of the record within the file.
    pub offset: u32,
}

impl ElementRecord {
    pub fn new(element_type: ElementType) -> Self {
        Self {
            element_type,
            id_index: 0,
            pos_x: 0,
            pos_y: 0,
            width: 0,
            height: 0,
            layout: 0,
            style_id: 0,
            child_count: 0,
            animation_count: 0,
            properties: Vec::new(),
            custom_properties: Vec::new(),
            events: Vec::new(),
            child_offsets: Vec::new(),
            offset: 0,
        }
    }

    /// Last property with `id` wins.
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.iter().rev().find(|p| p.id == id as u8)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleRecord {
    pub id: u8,
    pub name_index: u8,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub header: KrbHeader,
    pub elements: Vec<ElementRecord>,
    pub styles: Vec<StyleRecord>,
    pub strings: Vec<String>,
    pub resources: Vec<ResourceRecord>,
}

impl Document {
    pub fn flags(&self) -> HeaderFlags {
        self.header.flags
    }

    pub fn string(&self, index: usize) -> Option<&str> {
        self.strings.get(index).map(String::as_str)
    }

    /// Style ids are 1-based; 0 means no style.
    pub fn style(&self, style_id: u8) -> Option<&StyleRecord> {
        if style_id == 0 {
            return None;
        }
        self.styles.get(style_id as usize - 1)
    }

    pub fn style_name(&self, style: &StyleRecord) -> Option<&str> {
        self.string(style.name_index as usize)
    }

    pub fn resource_path(&self, index: usize) -> Option<&str> {
        let resource = self.resources.get(index)?;
        self.string(resource.path_index as usize)
    }
}
