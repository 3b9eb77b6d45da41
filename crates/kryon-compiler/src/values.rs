// crates/kryon-compiler/src/values.rs
//! Source key table and literal parsing.

use kryon_core::format::{
    PropertyId, LAYOUT_ABSOLUTE_BIT, LAYOUT_ALIGNMENT_CENTER, LAYOUT_ALIGNMENT_END,
    LAYOUT_ALIGNMENT_MASK, LAYOUT_ALIGNMENT_SPACE_BETWEEN, LAYOUT_ALIGNMENT_START,
    LAYOUT_DIRECTION_COLUMN, LAYOUT_DIRECTION_COLUMN_REVERSE, LAYOUT_DIRECTION_MASK,
    LAYOUT_DIRECTION_ROW, LAYOUT_DIRECTION_ROW_REVERSE, LAYOUT_GROW_BIT, LAYOUT_WRAP_BIT,
};

/// How a source value is turned into a property payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    Byte,
    Short,
    Bool,
    /// Plain number becomes a byte, several numbers become edge insets.
    ByteOrInsets,
    Insets,
    Percentage,
    String,
    Resource,
    TextAlignment,
    FontWeight,
    Overflow,
    Layout,
}

pub fn lookup(key: &str) -> Option<(PropertyId, ValueKind)> {
    use PropertyId as P;
    use ValueKind as K;
    Some(match key {
        "background_color" => (P::BackgroundColor, K::Color),
        "text_color" | "foreground_color" | "color" => (P::ForegroundColor, K::Color),
        "border_color" => (P::BorderColor, K::Color),
        "border_width" => (P::BorderWidth, K::ByteOrInsets),
        "border_radius" => (P::BorderRadius, K::Byte),
        "padding" => (P::Padding, K::Insets),
        "margin" => (P::Margin, K::Insets),
        "text" | "content" => (P::TextContent, K::String),
        "font_size" => (P::FontSize, K::Short),
        "font_weight" => (P::FontWeight, K::FontWeight),
        "text_alignment" | "text_align" => (P::TextAlignment, K::TextAlignment),
        "image_source" | "source" | "src" => (P::ImageSource, K::Resource),
        "opacity" => (P::Opacity, K::Percentage),
        "z_index" => (P::ZIndex, K::Short),
        "visibility" | "visible" => (P::Visibility, K::Bool),
        "gap" => (P::Gap, K::Short),
        "min_width" => (P::MinWidth, K::Short),
        "min_height" => (P::MinHeight, K::Short),
        "max_width" => (P::MaxWidth, K::Short),
        "max_height" => (P::MaxHeight, K::Short),
        "aspect_ratio" => (P::AspectRatio, K::Percentage),
        "overflow" => (P::Overflow, K::Overflow),
        "layout" => (P::LayoutFlags, K::Layout),
        "window_width" => (P::WindowWidth, K::Short),
        "window_height" => (P::WindowHeight, K::Short),
        "window_title" => (P::WindowTitle, K::String),
        "resizable" => (P::Resizable, K::Bool),
        "keep_aspect" => (P::KeepAspect, K::Bool),
        "scale_factor" => (P::ScaleFactor, K::Percentage),
        "icon" => (P::Icon, K::Resource),
        "version" => (P::Version, K::String),
        "author" => (P::Author, K::String),
        _ => return None,
    })
}

/// Strips one pair of surrounding quotes and outer whitespace.
pub fn clean_string(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

pub fn parse_number(raw: &str) -> Option<f64> {
    let value: f64 = clean_string(raw).trim().parse().ok()?;
    value.is_finite().then_some(value)
}

pub fn parse_u16(raw: &str) -> Option<u16> {
    let value = parse_number(raw)?;
    (0.0..=u16::MAX as f64).contains(&value).then(|| value.round() as u16)
}

pub fn parse_u8(raw: &str) -> Option<u8> {
    let value = parse_number(raw)?;
    (0.0..=u8::MAX as f64).contains(&value).then(|| value.round() as u8)
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match clean_string(raw).trim() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// `50%` and `0.5` both mean one half.
pub fn parse_percentage(raw: &str) -> Option<f32> {
    let text = clean_string(raw).trim();
    let value = match text.strip_suffix('%') {
        Some(number) => number.trim().parse::<f32>().ok()? / 100.0,
        None => text.parse::<f32>().ok()?,
    };
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// CSS order: one value for all edges, two for vertical/horizontal, four for
/// top, right, bottom, left.
pub fn parse_insets(raw: &str) -> Option<[u8; 4]> {
    let parts: Vec<u8> = clean_string(raw)
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(parse_u8)
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [all] => Some([*all; 4]),
        [vertical, horizontal] => Some([*vertical, *horizontal, *vertical, *horizontal]),
        [top, right, bottom, left] => Some([*top, *right, *bottom, *left]),
        _ => None,
    }
}

pub fn parse_text_alignment(raw: &str) -> Option<u8> {
    Some(match clean_string(raw).trim() {
        "start" | "left" => 0,
        "center" | "centre" => 1,
        "end" | "right" => 2,
        "justify" => 3,
        _ => return None,
    })
}

pub fn parse_font_weight(raw: &str) -> Option<u8> {
    Some(match clean_string(raw).trim() {
        "normal" | "400" => 0,
        "bold" | "700" => 1,
        "light" | "300" => 2,
        "heavy" | "black" | "900" => 3,
        _ => return None,
    })
}

pub fn parse_overflow(raw: &str) -> Option<u8> {
    Some(match clean_string(raw).trim() {
        "visible" => 0,
        "hidden" => 1,
        "scroll" => 2,
        _ => return None,
    })
}

/// Folds layout tokens into a layout byte. Unknown tokens are returned so the
/// caller can report them; the known ones still apply.
pub fn parse_layout(raw: &str) -> (u8, Vec<String>) {
    let mut flags = 0u8;
    let mut unknown = Vec::new();
    for token in clean_string(raw).split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
        let normalized = token.to_ascii_lowercase().replace('-', "_");
        let direction = |flags: u8, bits: u8| (flags & !LAYOUT_DIRECTION_MASK) | bits;
        let alignment = |flags: u8, bits: u8| (flags & !LAYOUT_ALIGNMENT_MASK) | bits;
        flags = match normalized.as_str() {
            "row" => direction(flags, LAYOUT_DIRECTION_ROW),
            "column" | "col" => direction(flags, LAYOUT_DIRECTION_COLUMN),
            "row_reverse" | "row_rev" => direction(flags, LAYOUT_DIRECTION_ROW_REVERSE),
            "column_reverse" | "col_reverse" | "col_rev" => direction(flags, LAYOUT_DIRECTION_COLUMN_REVERSE),
            "start" => alignment(flags, LAYOUT_ALIGNMENT_START),
            "center" | "centre" => alignment(flags, LAYOUT_ALIGNMENT_CENTER),
            "end" => alignment(flags, LAYOUT_ALIGNMENT_END),
            "space_between" => alignment(flags, LAYOUT_ALIGNMENT_SPACE_BETWEEN),
            "wrap" => flags | LAYOUT_WRAP_BIT,
            "grow" => flags | LAYOUT_GROW_BIT,
            "absolute" => flags | LAYOUT_ABSOLUTE_BIT,
            _ => {
                unknown.push(token.to_string());
                flags
            }
        };
    }
    (flags, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_quotes_and_whitespace() {
        assert_eq!(clean_string("  \"hello world\" "), "hello world");
        assert_eq!(clean_string("'x'"), "x");
        assert_eq!(clean_string("\""), "\"");
        assert_eq!(clean_string("plain"), "plain");
    }

    #[test]
    fn parses_layout_tokens() {
        assert_eq!(parse_layout("column center").0, 0x05);
        assert_eq!(parse_layout("row-reverse space_between wrap grow").0, 0x02 | 0x0C | 0x10 | 0x20);
        let (flags, unknown) = parse_layout("absolute diagonal");
        assert_eq!(flags, 0x40);
        assert_eq!(unknown, vec!["diagonal".to_string()]);
    }

    #[test]
    fn parses_insets_in_css_order() {
        assert_eq!(parse_insets("4"), Some([4, 4, 4, 4]));
        assert_eq!(parse_insets("1 2"), Some([1, 2, 1, 2]));
        assert_eq!(parse_insets("1, 2, 3, 4"), Some([1, 2, 3, 4]));
        assert_eq!(parse_insets("1 2 3"), None);
        assert_eq!(parse_insets("300"), None);
    }

    #[test]
    fn parses_percentages() {
        assert_eq!(parse_percentage("50%"), Some(0.5));
        assert_eq!(parse_percentage("0.25"), Some(0.25));
        assert_eq!(parse_percentage("-1"), None);
    }

    #[test]
    fn numbers_respect_ranges() {
        assert_eq!(parse_u16("\"640\""), Some(640));
        assert_eq!(parse_u16("70000"), None);
        assert_eq!(parse_u8("256"), None);
        assert_eq!(parse_number("abc"), None);
    }
}
