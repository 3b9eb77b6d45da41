// crates/kryon-layout/src/lib.rs

use glam::Vec2;
use kryon_core::{EdgeWidths, Element, ElementId, ElementType};
use std::collections::HashMap;
use tracing::debug;

pub mod flexbox;
pub mod geometry;
pub mod measure;

pub use flexbox::*;
pub use geometry::*;
pub use measure::*;

#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub computed_positions: HashMap<ElementId, Vec2>,
    pub computed_sizes: HashMap<ElementId, Vec2>,
    /// Element rectangle minus its resolved borders.
    pub content_rects: HashMap<ElementId, Rect>,
    /// Scaled and clamped border widths.
    pub border_widths: HashMap<ElementId, EdgeWidths>,
}

impl LayoutResult {
    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        Some(Rect::new(
            *self.computed_positions.get(&id)?,
            *self.computed_sizes.get(&id)?,
        ))
    }
}

pub trait LayoutEngine {
    fn compute_layout(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        roots: &[ElementId],
        viewport_size: Vec2,
    ) -> LayoutResult;
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutConfig {
    /// Global factor applied to every declared size, position, border and font.
    pub scale: f32,
    /// Space added on each side of measured text, before scaling.
    pub text_padding: Vec2,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            text_padding: Vec2::new(4.0, 2.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FlowItem {
    id: ElementId,
    size: Vec2,
    grow: bool,
}

/// Box-model flow layout shared by every backend.
///
/// Children are placed along the parent's primary axis with start, center,
/// end or space-between alignment, optionally wrapped into lines and grown
/// into leftover space. Absolute children are placed against the parent's
/// content origin and take no flow space. Layout never fails; degenerate
/// sizes clamp to zero.
#[derive(Debug)]
pub struct FlowLayoutEngine<M = FixedWidthMeasurer, S = NoImages> {
    config: LayoutConfig,
    measurer: M,
    images: S,
}

impl FlowLayoutEngine {
    pub fn new() -> Self {
        Self {
            config: LayoutConfig::default(),
            measurer: FixedWidthMeasurer::default(),
            images: NoImages,
        }
    }
}

impl Default for FlowLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TextMeasurer, S: ImageSizer> FlowLayoutEngine<M, S> {
    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn with_measurer<M2: TextMeasurer>(self, measurer: M2) -> FlowLayoutEngine<M2, S> {
        FlowLayoutEngine {
            config: self.config,
            measurer,
            images: self.images,
        }
    }

    pub fn with_image_sizer<S2: ImageSizer>(self, images: S2) -> FlowLayoutEngine<M, S2> {
        FlowLayoutEngine {
            config: self.config,
            measurer: self.measurer,
            images,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    fn scale(&self) -> f32 {
        self.config.scale.max(0.0)
    }

    fn is_absolute(element: &Element) -> bool {
        LayoutFlags::from_bits(element.layout_flags).absolute || element.position != Vec2::ZERO
    }

    /// Size an element wants before its parent places it. Declared sizes
    /// win per axis; an undeclared axis comes from the element's content.
    pub fn intrinsic_size(&self, elements: &HashMap<ElementId, Element>, id: ElementId) -> Vec2 {
        let Some(element) = elements.get(&id) else {
            return Vec2::ZERO;
        };
        let scale = self.scale();
        let declared = |value: f32| (value > 0.0).then(|| (value * scale).max(1.0));
        let (width, height) = (declared(element.size.x), declared(element.size.y));
        if let (Some(width), Some(height)) = (width, height) {
            return Vec2::new(width, height);
        }

        let content = if element.element_type.shows_text() && !element.text.is_empty() {
            self.measurer.measure(&element.text, element.font_size * scale) + self.config.text_padding * 2.0 * scale
        } else if element.element_type == ElementType::Image {
            element
                .image_source
                .as_deref()
                .and_then(|source| self.images.image_size(source))
                .map(|natural| natural * scale)
                .unwrap_or(Vec2::ZERO)
        } else {
            self.shrink_wrap(elements, element)
        };

        Vec2::new(width.unwrap_or(content.x), height.unwrap_or(content.y))
    }

    /// Smallest box that holds the flow children on one line, plus borders.
    fn shrink_wrap(&self, elements: &HashMap<ElementId, Element>, element: &Element) -> Vec2 {
        let flags = LayoutFlags::from_bits(element.layout_flags);
        let gap = element.gap * self.scale();
        let mut main = 0.0f32;
        let mut cross = 0.0f32;
        let mut count = 0usize;
        for &child_id in &element.children {
            let Some(child) = elements.get(&child_id) else { continue };
            if Self::is_absolute(child) {
                continue;
            }
            let size = self.intrinsic_size(elements, child_id);
            let (child_main, child_cross) = split(size, flags.direction.is_row());
            main += child_main;
            cross = cross.max(child_cross);
            count += 1;
        }
        if count > 1 {
            main += gap * (count - 1) as f32;
        }
        let borders = element.border_widths.scaled(self.scale());
        join(main, cross, flags.direction.is_row()) + Vec2::new(borders.left + borders.right, borders.top + borders.bottom)
    }

    fn place(
        &self,
        elements: &HashMap<ElementId, Element>,
        id: ElementId,
        position: Vec2,
        size: Vec2,
        result: &mut LayoutResult,
    ) {
        let Some(element) = elements.get(&id) else { return };
        let size = size.max(Vec2::ZERO);
        let borders = clamp_borders(element.border_widths.scaled(self.scale()), size);
        let content = Rect::new(position, size).inset(borders);

        debug!("Layout element {} ({:?}): pos={:?} size={:?}", element.id, element.element_type, position, size);
        result.computed_positions.insert(id, position);
        result.computed_sizes.insert(id, size);
        result.content_rects.insert(id, content);
        result.border_widths.insert(id, borders);

        if !element.children.is_empty() {
            self.layout_children(elements, element, content, result);
        }
    }

    fn layout_children(
        &self,
        elements: &HashMap<ElementId, Element>,
        parent: &Element,
        content: Rect,
        result: &mut LayoutResult,
    ) {
        let scale = self.scale();
        let flags = LayoutFlags::from_bits(parent.layout_flags);
        let is_row = flags.direction.is_row();
        let gap = parent.gap * scale;

        let mut flow = Vec::with_capacity(parent.children.len());
        for &child_id in &parent.children {
            let Some(child) = elements.get(&child_id) else { continue };
            let size = self.intrinsic_size(elements, child_id);
            if Self::is_absolute(child) {
                self.place(elements, child_id, content.position + child.position * scale, size, result);
            } else {
                flow.push(FlowItem {
                    id: child_id,
                    size,
                    grow: LayoutFlags::from_bits(child.layout_flags).grow,
                });
            }
        }
        if flow.is_empty() {
            return;
        }
        if flags.direction.is_reversed() {
            flow.reverse();
        }

        let (available_main, available_cross) = split(content.size, is_row);
        let lines = break_lines(&flow, flags.wrap, available_main, gap, is_row);
        let single_line = lines.len() == 1;
        let mut cross_cursor = 0.0f32;

        for line in lines {
            let line_items = &flow[line];
            let count = line_items.len();
            let mut mains: Vec<f32> = line_items.iter().map(|item| split(item.size, is_row).0).collect();
            let line_cross = line_items
                .iter()
                .map(|item| split(item.size, is_row).1)
                .fold(0.0f32, f32::max);
            let line_box_cross = if single_line { available_cross } else { line_cross };

            // Pass A: how much of the primary axis the line uses.
            let total: f32 = mains.iter().sum::<f32>() + gap * (count - 1) as f32;
            let mut free = available_main - total;

            let growers = line_items.iter().filter(|item| item.grow).count();
            if growers > 0 && free > 0.0 {
                let share = free / growers as f32;
                for (main, item) in mains.iter_mut().zip(line_items) {
                    if item.grow {
                        *main += share;
                    }
                }
                free = 0.0;
            }

            // Pass B: place along the line.
            let (start, between) = match flags.alignment {
                LayoutAlignment::SpaceBetween if count > 1 => (0.0, free.max(0.0) / (count - 1) as f32),
                alignment => (alignment.offset(total + free, total), 0.0),
            };
            let mut cursor = start;
            for (item, main) in line_items.iter().zip(&mains) {
                let cross = split(item.size, is_row).1;
                let cross_offset = flags.alignment.offset(line_box_cross, cross);
                let position = content.position + join(cursor, cross_cursor + cross_offset, is_row);
                self.place(elements, item.id, position, join(*main, cross, is_row), result);
                cursor += main + gap + between;
            }

            cross_cursor += line_cross + gap;
        }
    }
}

impl<M: TextMeasurer, S: ImageSizer> LayoutEngine for FlowLayoutEngine<M, S> {
    fn compute_layout(
        &mut self,
        elements: &HashMap<ElementId, Element>,
        roots: &[ElementId],
        viewport_size: Vec2,
    ) -> LayoutResult {
        let mut result = LayoutResult::default();
        debug!("Viewport: {:?}, scale: {:.3}, roots: {:?}", viewport_size, self.scale(), roots);

        for &root in roots {
            let Some(element) = elements.get(&root) else { continue };
            let mut size = self.intrinsic_size(elements, root);
            if element.size.x <= 0.0 {
                size.x = viewport_size.x;
            }
            if element.size.y <= 0.0 {
                size.y = viewport_size.y;
            }
            let position = if Self::is_absolute(element) {
                element.position * self.scale()
            } else {
                Vec2::ZERO
            };
            self.place(elements, root, position, size, &mut result);
        }
        result
    }
}

/// Splits the flow into lines. Without wrapping everything shares one line;
/// with it a new line starts when the next item would overflow.
fn break_lines(
    items: &[FlowItem],
    wrap: bool,
    available: f32,
    gap: f32,
    is_row: bool,
) -> Vec<std::ops::Range<usize>> {
    if !wrap {
        return vec![0..items.len()];
    }
    let mut lines = Vec::new();
    let mut start = 0;
    let mut used = 0.0f32;
    for (index, item) in items.iter().enumerate() {
        let main = split(item.size, is_row).0;
        if index > start && used + gap + main > available {
            lines.push(start..index);
            start = index;
            used = main;
        } else if index == start {
            used = main;
        } else {
            used += gap + main;
        }
    }
    lines.push(start..items.len());
    lines
}

/// (primary, cross) components of `v`.
fn split(v: Vec2, is_row: bool) -> (f32, f32) {
    if is_row {
        (v.x, v.y)
    } else {
        (v.y, v.x)
    }
}

fn join(main: f32, cross: f32, is_row: bool) -> Vec2 {
    if is_row {
        Vec2::new(main, cross)
    } else {
        Vec2::new(cross, main)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::format::{
        LAYOUT_ABSOLUTE_BIT, LAYOUT_ALIGNMENT_CENTER, LAYOUT_ALIGNMENT_END, LAYOUT_ALIGNMENT_SPACE_BETWEEN,
        LAYOUT_DIRECTION_COLUMN, LAYOUT_DIRECTION_ROW_REVERSE, LAYOUT_GROW_BIT, LAYOUT_WRAP_BIT,
    };

    fn node(size: (f32, f32)) -> Element {
        Element {
            size: Vec2::new(size.0, size.1),
            ..Element::default()
        }
    }

    /// Root 0 with the given layout byte and children 1..=n.
    fn tree(layout: u8, root_size: (f32, f32), children: Vec<Element>) -> HashMap<ElementId, Element> {
        let mut elements = HashMap::new();
        let mut root = node(root_size);
        root.layout_flags = layout;
        root.children = (1..=children.len() as ElementId).collect();
        elements.insert(0, root);
        for (i, mut child) in children.into_iter().enumerate() {
            child.parent = Some(0);
            elements.insert(i as ElementId + 1, child);
        }
        elements
    }

    fn x(result: &LayoutResult, id: ElementId) -> f32 {
        result.computed_positions[&id].x
    }

    #[test]
    fn center_alignment_places_run_in_the_middle() {
        let elements = tree(
            LAYOUT_ALIGNMENT_CENTER,
            (100.0, 40.0),
            vec![node((10.0, 10.0)), node((20.0, 10.0)), node((30.0, 10.0))],
        );
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(x(&result, 1), 20.0);
        assert_eq!(x(&result, 2), 30.0);
        assert_eq!(x(&result, 3), 50.0);
        // Cross axis centers too.
        assert_eq!(result.computed_positions[&1].y, 15.0);
    }

    #[test]
    fn space_between_spreads_leftover() {
        let elements = tree(
            LAYOUT_ALIGNMENT_SPACE_BETWEEN,
            (100.0, 10.0),
            vec![node((10.0, 10.0)), node((20.0, 10.0)), node((30.0, 10.0))],
        );
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(x(&result, 1), 0.0);
        assert_eq!(x(&result, 2), 30.0);
        assert_eq!(x(&result, 3), 70.0);
    }

    #[test]
    fn end_alignment_and_reverse_direction() {
        let elements = tree(
            LAYOUT_DIRECTION_ROW_REVERSE | LAYOUT_ALIGNMENT_END,
            (100.0, 10.0),
            vec![node((10.0, 10.0)), node((20.0, 10.0))],
        );
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        // Reversed order: child 2 then child 1, pushed to the end.
        assert_eq!(x(&result, 2), 70.0);
        assert_eq!(x(&result, 1), 90.0);
    }

    #[test]
    fn column_stacks_vertically_with_gap() {
        let mut elements = tree(
            LAYOUT_DIRECTION_COLUMN,
            (50.0, 100.0),
            vec![node((10.0, 10.0)), node((10.0, 20.0))],
        );
        elements.get_mut(&0).unwrap().gap = 5.0;
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(result.computed_positions[&1], Vec2::new(0.0, 0.0));
        assert_eq!(result.computed_positions[&2], Vec2::new(0.0, 15.0));
    }

    #[test]
    fn grow_shares_remaining_space() {
        let mut grower = node((10.0, 10.0));
        grower.layout_flags = LAYOUT_GROW_BIT;
        let mut other = node((10.0, 10.0));
        other.layout_flags = LAYOUT_GROW_BIT;
        let elements = tree(0, (100.0, 10.0), vec![grower, node((20.0, 10.0)), other]);
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(result.computed_sizes[&1].x, 40.0);
        assert_eq!(result.computed_sizes[&3].x, 40.0);
        assert_eq!(x(&result, 2), 40.0);
        assert_eq!(x(&result, 3), 60.0);
    }

    #[test]
    fn wrap_moves_overflow_to_next_line() {
        let elements = tree(
            LAYOUT_WRAP_BIT,
            (50.0, 100.0),
            vec![node((30.0, 10.0)), node((30.0, 20.0)), node((10.0, 10.0))],
        );
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(result.computed_positions[&1], Vec2::new(0.0, 0.0));
        assert_eq!(result.computed_positions[&2], Vec2::new(0.0, 10.0));
        assert_eq!(result.computed_positions[&3], Vec2::new(30.0, 10.0));
    }

    #[test]
    fn absolute_children_skip_flow() {
        let mut pinned = node((5.0, 5.0));
        pinned.position = Vec2::new(12.0, 7.0);
        let mut flagged = node((5.0, 5.0));
        flagged.layout_flags = LAYOUT_ABSOLUTE_BIT;
        let mut elements = tree(0, (100.0, 100.0), vec![pinned, node((10.0, 10.0)), flagged]);
        elements.get_mut(&0).unwrap().border_widths = EdgeWidths::uniform(2.0);

        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(result.computed_positions[&1], Vec2::new(14.0, 9.0));
        assert_eq!(result.computed_positions[&2], Vec2::new(2.0, 2.0));
        assert_eq!(result.computed_positions[&3], Vec2::new(2.0, 2.0));
    }

    #[test]
    fn thin_element_clamps_borders() {
        let mut strip = node((100.0, 3.0));
        strip.border_widths = EdgeWidths { top: 4.0, right: 0.0, bottom: 4.0, left: 0.0 };
        let elements = tree(0, (200.0, 200.0), vec![strip]);
        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        let borders = result.border_widths[&1];
        assert_eq!((borders.top, borders.bottom), (1.0, 0.0));
        assert_eq!(result.content_rects[&1].size.y, 2.0);
    }

    #[test]
    fn zero_sized_root_fills_viewport_and_scales() {
        let elements = tree(0, (0.0, 0.0), vec![node((10.0, 0.4))]);
        let result = FlowLayoutEngine::new()
            .with_scale(2.0)
            .compute_layout(&elements, &[0], Vec2::new(320.0, 240.0));
        assert_eq!(result.computed_sizes[&0], Vec2::new(320.0, 240.0));
        // 0.4 * 2 rounds up to the one pixel minimum.
        assert_eq!(result.computed_sizes[&1], Vec2::new(20.0, 1.0));
    }

    #[test]
    fn text_and_images_size_from_content() {
        let mut label = Element {
            element_type: ElementType::Text,
            text: "abcd".to_string(),
            font_size: 10.0,
            ..Element::default()
        };
        label.parent = Some(0);
        let picture = Element {
            element_type: ElementType::Image,
            image_source: Some("logo.png".to_string()),
            ..Element::default()
        };
        let elements = tree(LAYOUT_DIRECTION_COLUMN, (100.0, 100.0), vec![label, picture]);

        let engine = FlowLayoutEngine::new()
            .with_config(LayoutConfig { scale: 1.0, text_padding: Vec2::ZERO })
            .with_measurer(FixedWidthMeasurer { char_width: 0.5, line_height: 1.0 })
            .with_image_sizer(|source: &str| (source == "logo.png").then(|| Vec2::new(64.0, 32.0)));
        assert_eq!(engine.intrinsic_size(&elements, 1), Vec2::new(20.0, 10.0));
        assert_eq!(engine.intrinsic_size(&elements, 2), Vec2::new(64.0, 32.0));
    }

    #[test]
    fn empty_container_shrink_wraps_children() {
        let mut elements = tree(0, (0.0, 0.0), vec![node((10.0, 10.0)), node((20.0, 5.0))]);
        let wrapper = elements.remove(&0).unwrap();
        // Hang the wrapper under a sized root so it is not stretched to the viewport.
        let mut root = node((200.0, 200.0));
        root.children = vec![10];
        elements.insert(0, root);
        elements.insert(10, Element { parent: Some(0), gap: 2.0, ..wrapper });

        let result = FlowLayoutEngine::new().compute_layout(&elements, &[0], Vec2::new(800.0, 600.0));
        assert_eq!(result.computed_sizes[&10], Vec2::new(32.0, 10.0));
    }
}
