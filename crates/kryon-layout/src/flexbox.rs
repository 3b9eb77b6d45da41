// crates/kryon-layout/src/flexbox.rs
use kryon_core::format::{
    LAYOUT_ABSOLUTE_BIT, LAYOUT_ALIGNMENT_MASK, LAYOUT_ALIGNMENT_SHIFT, LAYOUT_DIRECTION_MASK,
    LAYOUT_GROW_BIT, LAYOUT_WRAP_BIT,
};

/// Decoded form of an element's layout byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutFlags {
    pub direction: LayoutDirection,
    pub alignment: LayoutAlignment,
    pub wrap: bool,
    pub grow: bool,
    pub absolute: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutDirection {
    Row,
    Column,
    RowReverse,
    ColumnReverse,
}

impl LayoutDirection {
    pub fn is_row(self) -> bool {
        matches!(self, LayoutDirection::Row | LayoutDirection::RowReverse)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, LayoutDirection::RowReverse | LayoutDirection::ColumnReverse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutAlignment {
    Start,
    Center,
    End,
    SpaceBetween,
}

impl LayoutAlignment {
    /// Offset of an item of `size` inside `available` space. Space-between
    /// has no meaning for a single item and behaves like start.
    pub fn offset(self, available: f32, size: f32) -> f32 {
        match self {
            LayoutAlignment::Start | LayoutAlignment::SpaceBetween => 0.0,
            LayoutAlignment::Center => (available - size) / 2.0,
            LayoutAlignment::End => available - size,
        }
    }
}

impl LayoutFlags {
    pub fn from_bits(bits: u8) -> Self {
        let direction = match bits & LAYOUT_DIRECTION_MASK {
            0 => LayoutDirection::Row,
            1 => LayoutDirection::Column,
            2 => LayoutDirection::RowReverse,
            _ => LayoutDirection::ColumnReverse,
        };

        let alignment = match (bits & LAYOUT_ALIGNMENT_MASK) >> LAYOUT_ALIGNMENT_SHIFT {
            0 => LayoutAlignment::Start,
            1 => LayoutAlignment::Center,
            2 => LayoutAlignment::End,
            _ => LayoutAlignment::SpaceBetween,
        };

        Self {
            direction,
            alignment,
            wrap: bits & LAYOUT_WRAP_BIT != 0,
            grow: bits & LAYOUT_GROW_BIT != 0,
            absolute: bits & LAYOUT_ABSOLUTE_BIT != 0,
        }
    }
}
