// crates/kryon-compiler/src/limits.rs
//! Capacity limits enforced during compilation.
//!
//! The defaults are the historical table sizes of the format. They can be
//! raised, but never past what the wire encoding can address.

/// Hard ceilings imposed by field widths on disk.
pub const FORMAT_MAX_STRINGS: usize = 256;
pub const FORMAT_MAX_STYLES: usize = 255;
pub const FORMAT_MAX_ELEMENTS: usize = u16::MAX as usize;
pub const FORMAT_MAX_CHILDREN: usize = u8::MAX as usize;
pub const FORMAT_MAX_PROPERTIES: usize = u8::MAX as usize;
pub const FORMAT_MAX_EVENTS: usize = u8::MAX as usize;
pub const FORMAT_MAX_RESOURCES: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_strings: usize,
    pub max_styles: usize,
    pub max_elements: usize,
    pub max_children: usize,
    pub max_properties: usize,
    pub max_events: usize,
    pub max_resources: usize,
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_strings: 256,
            max_styles: 64,
            max_elements: 256,
            max_children: 128,
            max_properties: 64,
            max_events: 16,
            max_resources: 256,
            max_depth: 32,
        }
    }
}

impl Limits {
    /// Clamps every limit to what the format can encode.
    pub fn clamped(self) -> Self {
        Self {
            max_strings: self.max_strings.min(FORMAT_MAX_STRINGS),
            max_styles: self.max_styles.min(FORMAT_MAX_STYLES),
            max_elements: self.max_elements.min(FORMAT_MAX_ELEMENTS),
            max_children: self.max_children.min(FORMAT_MAX_CHILDREN),
            max_properties: self.max_properties.min(FORMAT_MAX_PROPERTIES),
            max_events: self.max_events.min(FORMAT_MAX_EVENTS),
            max_resources: self.max_resources.min(FORMAT_MAX_RESOURCES),
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_format_ceilings() {
        let limits = Limits {
            max_strings: 10_000,
            max_children: 1_000,
            ..Limits::default()
        }
        .clamped();
        assert_eq!(limits.max_strings, 256);
        assert_eq!(limits.max_children, 255);
        assert_eq!(limits.max_styles, 64);
    }
}
