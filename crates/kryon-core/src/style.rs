// crates/kryon-core/src/style.rs

use crate::format::PropertyId;
use crate::{
    Document, EdgeWidths, Element, ElementId, ElementRecord, ElementTree, FontWeight, Property,
    PropertyValue, TextAlignment,
};
use glam::Vec2;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Style,
    Direct,
}

/// Builds render nodes from element records.
///
/// Each element starts from defaults (text color inherited from its parent),
/// then its style's properties are applied, then its own properties. Later
/// properties always win; id 0 leaves the current value alone.
pub struct StyleResolver<'a> {
    document: &'a Document,
}

impl<'a> StyleResolver<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn resolve(&self, tree: &ElementTree) -> HashMap<ElementId, Element> {
        let mut elements: HashMap<ElementId, Element> = HashMap::with_capacity(self.document.elements.len());
        for index in tree.pre_order() {
            let Some(record) = self.document.elements.get(index) else { continue };
            let parent = tree.parent(index).and_then(|p| elements.get(&(p as ElementId)));
            let mut element = self.resolve_element(index, record, parent);
            element.parent = tree.parent(index).map(|p| p as ElementId);
            element.children = tree.children(index).iter().map(|&c| c as ElementId).collect();
            elements.insert(index as ElementId, element);
        }
        elements
    }

    pub fn resolve_element(&self, index: usize, record: &ElementRecord, parent: Option<&Element>) -> Element {
        let mut element = Element {
            element_type: record.element_type,
            style_id: record.style_id,
            position: Vec2::new(record.pos_x as f32, record.pos_y as f32),
            size: Vec2::new(record.width as f32, record.height as f32),
            layout_flags: record.layout,
            ..Element::default()
        };

        // String 0 is "", so anonymous elements keep an empty id.
        element.id = self.document.string(record.id_index as usize).unwrap_or_default().to_string();

        if let Some(parent) = parent {
            element.text_color = parent.text_color;
        }

        if record.style_id != 0 {
            match self.document.style(record.style_id) {
                Some(style) => {
                    for property in &style.properties {
                        self.apply_property(&mut element, record, property, Origin::Style);
                    }
                }
                None => warn!("Element {} references missing style {}", index, record.style_id),
            }
        }

        for property in &record.properties {
            self.apply_property(&mut element, record, property, Origin::Direct);
        }

        for event in &record.events {
            if let Some(callback) = self.document.string(event.callback as usize) {
                element.event_handlers.insert(event.event_type, callback.to_string());
            }
        }

        element
    }

    fn apply_property(&self, element: &mut Element, record: &ElementRecord, property: &Property, origin: Origin) {
        let Some(id) = property.known_id() else {
            debug!("Ignoring unknown property 0x{:02X}", property.id);
            return;
        };
        let value = &property.value;
        match id {
            PropertyId::Invalid => {}
            PropertyId::BackgroundColor => {
                if let Some(c) = value.as_color() {
                    element.background_color = c;
                }
            }
            PropertyId::ForegroundColor => {
                if let Some(c) = value.as_color() {
                    element.text_color = c;
                }
            }
            PropertyId::BorderColor => {
                if let Some(c) = value.as_color() {
                    element.border_color = c;
                }
            }
            PropertyId::BorderWidth => match value {
                PropertyValue::EdgeInsets { top, right, bottom, left } => {
                    element.border_widths = EdgeWidths {
                        top: *top as f32,
                        right: *right as f32,
                        bottom: *bottom as f32,
                        left: *left as f32,
                    };
                }
                other => {
                    if let Some(width) = other.as_float() {
                        element.border_widths = EdgeWidths::uniform(width);
                    }
                }
            },
            PropertyId::BorderRadius => {
                if let Some(radius) = value.as_float() {
                    element.border_radius = radius;
                }
            }
            PropertyId::TextContent => {
                if let Some(text) = value.as_string_index().and_then(|i| self.document.string(i)) {
                    element.text = text.to_string();
                }
            }
            PropertyId::FontSize => {
                if let Some(size) = value.as_float() {
                    element.font_size = size;
                }
            }
            PropertyId::FontWeight => {
                element.font_weight = match value {
                    PropertyValue::Short(300) => FontWeight::Light,
                    PropertyValue::Short(700) => FontWeight::Bold,
                    PropertyValue::Short(900) => FontWeight::Heavy,
                    PropertyValue::Short(_) => FontWeight::Normal,
                    PropertyValue::Enum(v) | PropertyValue::Byte(v) => FontWeight::from_u8(*v),
                    _ => element.font_weight,
                };
            }
            PropertyId::TextAlignment => {
                if let Some(alignment) = value.as_int() {
                    element.text_alignment = TextAlignment::from_u8(alignment as u8);
                }
            }
            PropertyId::ImageSource => {
                let source = match value.as_resource_index() {
                    Some(i) => self.document.resource_path(i),
                    None => value.as_string_index().and_then(|i| self.document.string(i)),
                };
                if let Some(source) = source {
                    element.image_source = Some(source.to_string());
                }
            }
            PropertyId::Opacity => match value {
                PropertyValue::Byte(v) => element.opacity = *v as f32 / 255.0,
                other => {
                    if let Some(opacity) = other.as_float() {
                        element.opacity = opacity.clamp(0.0, 1.0);
                    }
                }
            },
            PropertyId::Visibility => {
                if let Some(visible) = value.as_int() {
                    element.visible = visible != 0;
                }
            }
            PropertyId::Gap => {
                if let Some(gap) = value.as_float() {
                    element.gap = gap;
                }
            }
            PropertyId::LayoutFlags => {
                if let Some(flags) = value.as_int() {
                    // The header byte outranks a style; a direct property outranks both.
                    if origin == Origin::Direct || record.layout == 0 {
                        element.layout_flags = flags as u8;
                    }
                }
            }
            PropertyId::WindowTitle => {
                if let Some(title) = value.as_string_index().and_then(|i| self.document.string(i)) {
                    element.window_title = Some(title.to_string());
                }
            }
            PropertyId::WindowWidth => {
                if record.width == 0 {
                    if let Some(width) = value.as_float() {
                        element.size.x = width;
                    }
                }
            }
            PropertyId::WindowHeight => {
                if record.height == 0 {
                    if let Some(height) = value.as_float() {
                        element.size.y = height;
                    }
                }
            }
            other => debug!("Property {:?} has no render-node field", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HeaderFlags;
    use crate::{assemble_tree, Color, ElementType, FormatVariant, KrbHeader, StyleRecord};
    use glam::Vec4;

    fn header() -> KrbHeader {
        KrbHeader {
            version_major: 0,
            version_minor: 3,
            variant: FormatVariant::Canonical,
            flags: HeaderFlags::empty(),
            element_count: 0,
            style_count: 0,
            animation_count: 0,
            string_count: 0,
            resource_count: 0,
            element_offset: 0,
            style_offset: 0,
            animation_offset: 0,
            string_offset: 0,
            resource_offset: 0,
            total_size: 0,
        }
    }

    fn color(id: PropertyId, hex: &str) -> Property {
        Property::new(id, PropertyValue::Color(Color::from_hex(hex).unwrap()))
    }

    fn document(elements: Vec<ElementRecord>, styles: Vec<StyleRecord>) -> Document {
        Document {
            header: header(),
            elements,
            styles,
            strings: vec![String::new(), "card".to_string(), "Hello".to_string()],
            resources: Vec::new(),
        }
    }

    #[test]
    fn direct_property_overrides_style() {
        let style = StyleRecord {
            id: 1,
            name_index: 1,
            properties: vec![
                color(PropertyId::BackgroundColor, "#111111"),
                color(PropertyId::BorderColor, "#333333"),
            ],
        };
        let mut record = ElementRecord::new(ElementType::Container);
        record.style_id = 1;
        record.properties.push(color(PropertyId::BackgroundColor, "#222222"));
        let doc = document(vec![record], vec![style]);

        let element = StyleResolver::new(&doc).resolve_element(0, &doc.elements[0], None);
        let expected = Color::from_hex("#222222").unwrap().to_vec4();
        assert_eq!(element.background_color, expected);
        assert_eq!(element.border_color, Color::from_hex("#333333").unwrap().to_vec4());
    }

    #[test]
    fn later_property_wins_and_zero_id_is_ignored() {
        let mut record = ElementRecord::new(ElementType::Text);
        record.properties = vec![
            Property::new(PropertyId::TextContent, PropertyValue::String(1)),
            Property::new(PropertyId::TextContent, PropertyValue::String(2)),
            Property { id: 0, value: PropertyValue::String(1) },
        ];
        let doc = document(vec![record], Vec::new());
        let element = StyleResolver::new(&doc).resolve_element(0, &doc.elements[0], None);
        assert_eq!(element.text, "Hello");
    }

    #[test]
    fn ids_come_from_the_string_table() {
        let mut named = ElementRecord::new(ElementType::Container);
        named.id_index = 1;
        let anonymous = ElementRecord::new(ElementType::Text);
        let doc = document(vec![named, anonymous], Vec::new());
        let resolver = StyleResolver::new(&doc);
        assert_eq!(resolver.resolve_element(0, &doc.elements[0], None).id, "card");
        assert_eq!(resolver.resolve_element(1, &doc.elements[1], None).id, "");
    }

    #[test]
    fn image_source_accepts_resource_or_string() {
        let mut doc = document(Vec::new(), Vec::new());
        doc.strings.push("img/logo.png".to_string());
        doc.resources.push(crate::ResourceRecord {
            resource_type: crate::ResourceType::Image,
            name_index: 1,
            path_index: 3,
        });
        let mut by_resource = ElementRecord::new(ElementType::Image);
        by_resource.properties.push(Property::new(PropertyId::ImageSource, PropertyValue::Resource(0)));
        let mut by_string = ElementRecord::new(ElementType::Image);
        by_string.properties.push(Property::new(PropertyId::ImageSource, PropertyValue::String(2)));
        doc.elements = vec![by_resource, by_string];

        let resolver = StyleResolver::new(&doc);
        let first = resolver.resolve_element(0, &doc.elements[0], None);
        let second = resolver.resolve_element(1, &doc.elements[1], None);
        assert_eq!(first.image_source.as_deref(), Some("img/logo.png"));
        assert_eq!(second.image_source.as_deref(), Some("Hello"));
    }

    #[test]
    fn text_color_is_inherited() {
        let mut parent = ElementRecord::new(ElementType::Container);
        parent.child_count = 1;
        parent.properties.push(color(PropertyId::ForegroundColor, "#FF0000"));
        let child = ElementRecord::new(ElementType::Text);
        let doc = document(vec![parent, child], Vec::new());
        let tree = assemble_tree(&doc.elements, HeaderFlags::empty()).unwrap();

        let elements = StyleResolver::new(&doc).resolve(&tree);
        assert_eq!(elements[&1].text_color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(elements[&1].parent, Some(0));
        assert_eq!(elements[&0].children, vec![1]);
    }

    #[test]
    fn style_layout_fills_only_unset_layout_byte() {
        let style = StyleRecord {
            id: 1,
            name_index: 1,
            properties: vec![Property::new(PropertyId::LayoutFlags, PropertyValue::Byte(0x05))],
        };
        let mut unset = ElementRecord::new(ElementType::Container);
        unset.style_id = 1;
        let mut set = unset.clone();
        set.layout = 0x01;
        let doc = document(vec![unset, set], vec![style]);
        let resolver = StyleResolver::new(&doc);
        assert_eq!(resolver.resolve_element(0, &doc.elements[0], None).layout_flags, 0x05);
        assert_eq!(resolver.resolve_element(1, &doc.elements[1], None).layout_flags, 0x01);
    }

    #[test]
    fn edge_insets_set_each_border() {
        let mut record = ElementRecord::new(ElementType::Container);
        record.properties.push(Property::new(
            PropertyId::BorderWidth,
            PropertyValue::EdgeInsets { top: 1, right: 2, bottom: 3, left: 4 },
        ));
        let doc = document(vec![record], Vec::new());
        let element = StyleResolver::new(&doc).resolve_element(0, &doc.elements[0], None);
        assert_eq!(
            element.border_widths,
            EdgeWidths { top: 1.0, right: 2.0, bottom: 3.0, left: 4.0 }
        );
    }
}
