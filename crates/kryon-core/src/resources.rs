// crates/kryon-core/src/resources.rs
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Image,
    Font,
    Sound,
    Video,
    Custom,
    Unknown(u8),
}

impl ResourceType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0x01 => ResourceType::Image,
            0x02 => ResourceType::Font,
            0x03 => ResourceType::Sound,
            0x04 => ResourceType::Video,
            0x05 => ResourceType::Custom,
            other => ResourceType::Unknown(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            ResourceType::Image => 0x01,
            ResourceType::Font => 0x02,
            ResourceType::Sound => 0x03,
            ResourceType::Video => 0x04,
            ResourceType::Custom => 0x05,
            ResourceType::Unknown(other) => other,
        }
    }
}

pub const RESOURCE_FORMAT_EXTERNAL: u8 = 0x00;
pub const RESOURCE_FORMAT_INLINE: u8 = 0x01;

/// An external resource: the payload lives at `path` relative to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub resource_type: ResourceType,
    pub name_index: u8,
    pub path_index: u8,
}

/// Resolves a resource path against the directory holding the `.krb` file.
pub fn resolve_resource_path(document_path: Option<&Path>, relative: &str) -> PathBuf {
    let relative = Path::new(relative);
    if relative.is_absolute() {
        return relative.to_path_buf();
    }
    match document_path.and_then(Path::parent) {
        Some(dir) => dir.join(relative),
        None => relative.to_path_buf(),
    }
}
