// crates/kryon-core/src/format.rs
//! KRB wire constants.
//!
//! Two header shapes exist in the wild. Version 0.3 is canonical: a 42-byte
//! header that carries a resource offset and a 17-byte element header with a
//! custom property count. Version 1.0 files use the older 38-byte header and
//! 16-byte element header and have no resource section; they are read-only.

use bitflags::bitflags;
use serde::Serialize;

pub const KRB_MAGIC: &[u8; 4] = b"KRB1";

pub const KRB_VERSION_MAJOR: u8 = 0;
pub const KRB_VERSION_MINOR: u8 = 3;

pub const LEGACY_VERSION_MAJOR: u8 = 1;
pub const LEGACY_VERSION_MINOR: u8 = 0;

pub const KRB_HEADER_SIZE: usize = 42;
pub const LEGACY_HEADER_SIZE: usize = 38;

pub const KRB_ELEMENT_HEADER_SIZE: usize = 17;
pub const LEGACY_ELEMENT_HEADER_SIZE: usize = 16;

pub const STYLE_HEADER_SIZE: usize = 3;
pub const PROPERTY_HEADER_SIZE: usize = 3;
pub const EVENT_SIZE: usize = 2;
pub const ANIMATION_REF_SIZE: usize = 2;
pub const CHILD_OFFSET_SIZE: usize = 2;
pub const RESOURCE_EXTERNAL_SIZE: usize = 4;
pub const STRING_TABLE_COUNT_SIZE: usize = 2;

pub const MAX_STRING_LENGTH: usize = 255;

/// Packs a version the way it sits on disk: minor in the high byte.
pub fn encode_version(major: u8, minor: u8) -> u16 {
    ((minor as u16) << 8) | major as u16
}

pub fn decode_version(raw: u16) -> (u8, u8) {
    ((raw & 0xFF) as u8, (raw >> 8) as u8)
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct HeaderFlags: u16 {
        const HAS_STYLES = 1 << 0;
        const HAS_COMPONENT_DEFS = 1 << 1;
        const HAS_ANIMATIONS = 1 << 2;
        const HAS_RESOURCES = 1 << 3;
        const COMPRESSED = 1 << 4;
        const FIXED_POINT = 1 << 5;
        const EXTENDED_COLOR = 1 << 6;
        const HAS_APP = 1 << 7;
    }
}

/// Header and element record shape, chosen by major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormatVariant {
    Canonical,
    Legacy,
}

impl FormatVariant {
    pub fn for_major(major: u8) -> Option<Self> {
        match major {
            KRB_VERSION_MAJOR => Some(FormatVariant::Canonical),
            LEGACY_VERSION_MAJOR => Some(FormatVariant::Legacy),
            _ => None,
        }
    }

    pub fn header_size(self) -> usize {
        match self {
            FormatVariant::Canonical => KRB_HEADER_SIZE,
            FormatVariant::Legacy => LEGACY_HEADER_SIZE,
        }
    }

    pub fn element_header_size(self) -> usize {
        match self {
            FormatVariant::Canonical => KRB_ELEMENT_HEADER_SIZE,
            FormatVariant::Legacy => LEGACY_ELEMENT_HEADER_SIZE,
        }
    }

    pub fn expected_minor(self) -> u8 {
        match self {
            FormatVariant::Canonical => KRB_VERSION_MINOR,
            FormatVariant::Legacy => LEGACY_VERSION_MINOR,
        }
    }
}

// Layout byte
pub const LAYOUT_DIRECTION_MASK: u8 = 0x03;
pub const LAYOUT_DIRECTION_ROW: u8 = 0;
pub const LAYOUT_DIRECTION_COLUMN: u8 = 1;
pub const LAYOUT_DIRECTION_ROW_REVERSE: u8 = 2;
pub const LAYOUT_DIRECTION_COLUMN_REVERSE: u8 = 3;

pub const LAYOUT_ALIGNMENT_MASK: u8 = 0x0C;
pub const LAYOUT_ALIGNMENT_SHIFT: u8 = 2;
pub const LAYOUT_ALIGNMENT_START: u8 = 0 << 2;
pub const LAYOUT_ALIGNMENT_CENTER: u8 = 1 << 2;
pub const LAYOUT_ALIGNMENT_END: u8 = 2 << 2;
pub const LAYOUT_ALIGNMENT_SPACE_BETWEEN: u8 = 3 << 2;

pub const LAYOUT_WRAP_BIT: u8 = 1 << 4;
pub const LAYOUT_GROW_BIT: u8 = 1 << 5;
pub const LAYOUT_ABSOLUTE_BIT: u8 = 1 << 6;

/// Property value type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    None = 0x00,
    Byte = 0x01,
    Short = 0x02,
    Color = 0x03,
    String = 0x04,
    Resource = 0x05,
    Percentage = 0x06,
    Rect = 0x07,
    EdgeInsets = 0x08,
    Enum = 0x09,
    Vector = 0x0A,
    Custom = 0x0B,
}

impl ValueType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => ValueType::None,
            0x01 => ValueType::Byte,
            0x02 => ValueType::Short,
            0x03 => ValueType::Color,
            0x04 => ValueType::String,
            0x05 => ValueType::Resource,
            0x06 => ValueType::Percentage,
            0x07 => ValueType::Rect,
            0x08 => ValueType::EdgeInsets,
            0x09 => ValueType::Enum,
            0x0A => ValueType::Vector,
            0x0B => ValueType::Custom,
            _ => return None,
        })
    }

    /// Payload length fixed by the type, `None` for variable-length custom data.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            ValueType::None => Some(0),
            ValueType::Byte | ValueType::String | ValueType::Resource | ValueType::Enum => Some(1),
            ValueType::Short | ValueType::Percentage => Some(2),
            ValueType::Color | ValueType::EdgeInsets | ValueType::Vector => Some(4),
            ValueType::Rect => Some(8),
            ValueType::Custom => None,
        }
    }
}

/// Known property ids. Ids outside this list are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyId {
    Invalid = 0x00,
    BackgroundColor = 0x01,
    ForegroundColor = 0x02,
    BorderColor = 0x03,
    BorderWidth = 0x04,
    BorderRadius = 0x05,
    Padding = 0x06,
    Margin = 0x07,
    TextContent = 0x08,
    FontSize = 0x09,
    FontWeight = 0x0A,
    TextAlignment = 0x0B,
    ImageSource = 0x0C,
    Opacity = 0x0D,
    ZIndex = 0x0E,
    Visibility = 0x0F,
    Gap = 0x10,
    MinWidth = 0x11,
    MinHeight = 0x12,
    MaxWidth = 0x13,
    MaxHeight = 0x14,
    AspectRatio = 0x15,
    Transform = 0x16,
    Shadow = 0x17,
    Overflow = 0x18,
    Custom = 0x19,
    LayoutFlags = 0x1A,
    WindowWidth = 0x20,
    WindowHeight = 0x21,
    WindowTitle = 0x22,
    Resizable = 0x23,
    KeepAspect = 0x24,
    ScaleFactor = 0x25,
    Icon = 0x26,
    Version = 0x27,
    Author = 0x28,
}

impl PropertyId {
    pub fn from_u8(value: u8) -> Option<Self> {
        use PropertyId::*;
        Some(match value {
            0x00 => Invalid,
            0x01 => BackgroundColor,
            0x02 => ForegroundColor,
            0x03 => BorderColor,
            0x04 => BorderWidth,
            0x05 => BorderRadius,
            0x06 => Padding,
            0x07 => Margin,
            0x08 => TextContent,
            0x09 => FontSize,
            0x0A => FontWeight,
            0x0B => TextAlignment,
            0x0C => ImageSource,
            0x0D => Opacity,
            0x0E => ZIndex,
            0x0F => Visibility,
            0x10 => Gap,
            0x11 => MinWidth,
            0x12 => MinHeight,
            0x13 => MaxWidth,
            0x14 => MaxHeight,
            0x15 => AspectRatio,
            0x16 => Transform,
            0x17 => Shadow,
            0x18 => Overflow,
            0x19 => Custom,
            0x1A => LayoutFlags,
            0x20 => WindowWidth,
            0x21 => WindowHeight,
            0x22 => WindowTitle,
            0x23 => Resizable,
            0x24 => KeepAspect,
            0x25 => ScaleFactor,
            0x26 => Icon,
            0x27 => Version,
            0x28 => Author,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_word_puts_minor_high() {
        assert_eq!(encode_version(0, 3), 0x0300);
        assert_eq!(decode_version(0x0300), (0, 3));
        assert_eq!(decode_version(encode_version(1, 0)), (1, 0));
    }

    #[test]
    fn variant_sizes() {
        assert_eq!(FormatVariant::for_major(0), Some(FormatVariant::Canonical));
        assert_eq!(FormatVariant::Legacy.header_size(), 38);
        assert_eq!(FormatVariant::Canonical.element_header_size(), 17);
        assert_eq!(FormatVariant::for_major(7), None);
    }
}
