// crates/kryon-layout/src/geometry.rs
use glam::Vec2;
use kryon_core::EdgeWidths;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub position: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// Shrinks the rectangle by `edges`, never below zero size.
    pub fn inset(self, edges: EdgeWidths) -> Self {
        Self {
            position: self.position + Vec2::new(edges.left, edges.top),
            size: Vec2::new(
                (self.size.x - edges.left - edges.right).max(0.0),
                (self.size.y - edges.top - edges.bottom).max(0.0),
            ),
        }
    }
}

/// Keeps opposing borders from eating the whole box.
///
/// When top and bottom together cover the height, one side keeps at most a
/// single pixel and the other drops to zero. Left and right work the same
/// way against the width.
pub fn clamp_borders(widths: EdgeWidths, size: Vec2) -> EdgeWidths {
    let (top, bottom) = clamp_pair(widths.top, widths.bottom, size.y);
    let (left, right) = clamp_pair(widths.left, widths.right, size.x);
    EdgeWidths { top, right, bottom, left }
}

fn clamp_pair(first: f32, second: f32, extent: f32) -> (f32, f32) {
    let (first, second) = (first.max(0.0), second.max(0.0));
    if first + second < extent || (first == 0.0 && second == 0.0) {
        return (first, second);
    }
    let extent = extent.max(0.0);
    if first > 0.0 {
        (first.min(1.0).min(extent), 0.0)
    } else {
        (0.0, second.min(1.0).min(extent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_borders_collapse_to_one_pixel() {
        let widths = EdgeWidths { top: 4.0, right: 2.0, bottom: 4.0, left: 2.0 };
        let clamped = clamp_borders(widths, Vec2::new(100.0, 3.0));
        assert_eq!(clamped.top, 1.0);
        assert_eq!(clamped.bottom, 0.0);
        assert_eq!(clamped.left, 2.0);
        assert_eq!(clamped.right, 2.0);

        let content = Rect::new(Vec2::ZERO, Vec2::new(100.0, 3.0)).inset(clamped);
        assert_eq!(content.size, Vec2::new(96.0, 2.0));
    }

    #[test]
    fn zero_extent_zeroes_borders() {
        let clamped = clamp_borders(EdgeWidths::uniform(2.0), Vec2::ZERO);
        assert!(clamped.is_zero());
    }

    #[test]
    fn inset_never_goes_negative() {
        let rect = Rect::new(Vec2::new(5.0, 5.0), Vec2::new(4.0, 4.0)).inset(EdgeWidths::uniform(3.0));
        assert_eq!(rect.position, Vec2::new(8.0, 8.0));
        assert_eq!(rect.size, Vec2::ZERO);
    }
}
