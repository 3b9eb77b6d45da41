// crates/kryon-core/src/properties.rs
use crate::codec;
use crate::format::{PropertyId, ValueType};
use glam::Vec4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`. Six-digit colors are opaque.
    pub fn from_hex(text: &str) -> Option<Self> {
        let hex = text.strip_prefix('#')?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }
}

/// Typed property payload. Each variant carries exactly its on-disk layout.
///
/// `Raw` keeps values whose declared size disagrees with their type (or whose
/// type tag is unknown) so they survive a read/write cycle byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    None,
    Byte(u8),
    Short(u16),
    Color(Color),
    String(u8),
    Resource(u8),
    /// Unsigned 8.8 fixed point.
    Percentage(u16),
    Rect { x: u16, y: u16, width: u16, height: u16 },
    EdgeInsets { top: u8, right: u8, bottom: u8, left: u8 },
    Enum(u8),
    Vector { x: u16, y: u16 },
    Custom(Vec<u8>),
    Raw { value_type: u8, bytes: Vec<u8> },
}

impl PropertyValue {
    pub fn decode(value_type: u8, bytes: &[u8]) -> Self {
        let raw = || PropertyValue::Raw { value_type, bytes: bytes.to_vec() };
        let Some(kind) = ValueType::from_u8(value_type) else {
            return raw();
        };
        if let Some(expected) = kind.fixed_size() {
            if expected != bytes.len() {
                return raw();
            }
        }
        let u16_at = |i: usize| codec::read_u16_le(&bytes[i..]);
        match kind {
            ValueType::None => PropertyValue::None,
            ValueType::Byte => PropertyValue::Byte(bytes[0]),
            ValueType::Short => PropertyValue::Short(u16_at(0)),
            ValueType::Color => PropertyValue::Color(Color::rgba(bytes[0], bytes[1], bytes[2], bytes[3])),
            ValueType::String => PropertyValue::String(bytes[0]),
            ValueType::Resource => PropertyValue::Resource(bytes[0]),
            ValueType::Percentage => PropertyValue::Percentage(u16_at(0)),
            ValueType::Rect => PropertyValue::Rect {
                x: u16_at(0),
                y: u16_at(2),
                width: u16_at(4),
                height: u16_at(6),
            },
            ValueType::EdgeInsets => PropertyValue::EdgeInsets {
                top: bytes[0],
                right: bytes[1],
                bottom: bytes[2],
                left: bytes[3],
            },
            ValueType::Enum => PropertyValue::Enum(bytes[0]),
            ValueType::Vector => PropertyValue::Vector { x: u16_at(0), y: u16_at(2) },
            ValueType::Custom => PropertyValue::Custom(bytes.to_vec()),
        }
    }

    pub fn value_type(&self) -> u8 {
        let kind = match self {
            PropertyValue::None => ValueType::None,
            PropertyValue::Byte(_) => ValueType::Byte,
            PropertyValue::Short(_) => ValueType::Short,
            PropertyValue::Color(_) => ValueType::Color,
            PropertyValue::String(_) => ValueType::String,
            PropertyValue::Resource(_) => ValueType::Resource,
            PropertyValue::Percentage(_) => ValueType::Percentage,
            PropertyValue::Rect { .. } => ValueType::Rect,
            PropertyValue::EdgeInsets { .. } => ValueType::EdgeInsets,
            PropertyValue::Enum(_) => ValueType::Enum,
            PropertyValue::Vector { .. } => ValueType::Vector,
            PropertyValue::Custom(_) => ValueType::Custom,
            PropertyValue::Raw { value_type, .. } => return *value_type,
        };
        kind as u8
    }

    pub fn size(&self) -> usize {
        match self {
            PropertyValue::Custom(bytes) | PropertyValue::Raw { bytes, .. } => bytes.len(),
            other => ValueType::from_u8(other.value_type())
                .and_then(ValueType::fixed_size)
                .unwrap_or(0),
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            PropertyValue::None => {}
            PropertyValue::Byte(v) | PropertyValue::String(v) | PropertyValue::Resource(v) | PropertyValue::Enum(v) => {
                out.push(*v)
            }
            PropertyValue::Short(v) | PropertyValue::Percentage(v) => codec::write_u16_le(out, *v),
            PropertyValue::Color(c) => out.extend_from_slice(&[c.r, c.g, c.b, c.a]),
            PropertyValue::Rect { x, y, width, height } => {
                for v in [x, y, width, height] {
                    codec::write_u16_le(out, *v);
                }
            }
            PropertyValue::EdgeInsets { top, right, bottom, left } => {
                out.extend_from_slice(&[*top, *right, *bottom, *left])
            }
            PropertyValue::Vector { x, y } => {
                codec::write_u16_le(out, *x);
                codec::write_u16_le(out, *y);
            }
            PropertyValue::Custom(bytes) | PropertyValue::Raw { bytes, .. } => out.extend_from_slice(bytes),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size());
        self.encode(&mut out);
        out
    }

    pub fn as_color(&self) -> Option<Vec4> {
        match self {
            PropertyValue::Color(c) => Some(c.to_vec4()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Byte(v) | PropertyValue::Enum(v) => Some(*v as i32),
            PropertyValue::Short(v) => Some(*v as i32),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            PropertyValue::Percentage(v) => Some(codec::fixed_to_percentage(*v)),
            other => other.as_int().map(|v| v as f32),
        }
    }

    pub fn as_string_index(&self) -> Option<usize> {
        match self {
            PropertyValue::String(i) => Some(*i as usize),
            _ => None,
        }
    }

    pub fn as_resource_index(&self) -> Option<usize> {
        match self {
            PropertyValue::Resource(i) => Some(*i as usize),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id: u8,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(id: PropertyId, value: PropertyValue) -> Self {
        Self { id: id as u8, value }
    }

    pub fn known_id(&self) -> Option<PropertyId> {
        PropertyId::from_u8(self.id)
    }

    /// Bytes this property occupies on disk, header included.
    pub fn encoded_size(&self) -> usize {
        crate::format::PROPERTY_HEADER_SIZE + self.value.size()
    }
}
