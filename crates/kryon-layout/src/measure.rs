// crates/kryon-layout/src/measure.rs
//! Content measurement hooks.
//!
//! Layout never touches fonts or image files itself; backends plug in real
//! measurements through these traits.

use glam::Vec2;

pub trait TextMeasurer {
    /// Size of `text` set at `font_size` pixels.
    fn measure(&self, text: &str, font_size: f32) -> Vec2;
}

pub trait ImageSizer {
    /// Natural size of the image at `source`, or `None` if it cannot be read.
    fn image_size(&self, source: &str) -> Option<Vec2>;
}

/// Monospace estimate used when no font backend is available.
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthMeasurer {
    /// Advance per character as a fraction of the font size.
    pub char_width: f32,
    pub line_height: f32,
}

impl Default for FixedWidthMeasurer {
    fn default() -> Self {
        Self {
            char_width: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasurer for FixedWidthMeasurer {
    fn measure(&self, text: &str, font_size: f32) -> Vec2 {
        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.lines() {
            lines += 1;
            widest = widest.max(line.chars().count());
        }
        if lines == 0 {
            return Vec2::new(0.0, font_size * self.line_height);
        }
        Vec2::new(
            widest as f32 * font_size * self.char_width,
            lines as f32 * font_size * self.line_height,
        )
    }
}

/// Sizes every image to zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImages;

impl ImageSizer for NoImages {
    fn image_size(&self, _source: &str) -> Option<Vec2> {
        None
    }
}

impl<F> ImageSizer for F
where
    F: Fn(&str) -> Option<Vec2>,
{
    fn image_size(&self, source: &str) -> Option<Vec2> {
        self(source)
    }
}
