// crates/kryon-compiler/src/writer.rs
//! Pass 2: assigns offsets and writes the binary.
//!
//! Section order is header, elements (pre-order), styles, animations
//! (always empty), strings, resources. Every record is encoded into a
//! scratch buffer first and its length compared with the size computed in
//! pass 1, so a drift between the two passes fails loudly.

use crate::context::{CompilationContext, CompiledElement};
use crate::error::{CompilerError, Result};
use byteorder::{LittleEndian, WriteBytesExt};
use kryon_core::format::{
    encode_version, KRB_HEADER_SIZE, KRB_MAGIC, KRB_VERSION_MAJOR, KRB_VERSION_MINOR,
    RESOURCE_EXTERNAL_SIZE, STRING_TABLE_COUNT_SIZE,
};
use kryon_core::{Property, RESOURCE_FORMAT_EXTERNAL};
use std::io::{Seek, SeekFrom, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionOffsets {
    pub element: u32,
    pub style: u32,
    pub animation: u32,
    pub string: u32,
    pub resource: u32,
    pub total_size: u32,
}

/// Gives every element and style its absolute offset and lays out the
/// sections. Fails if a child sits further than a `u16` from its parent.
pub fn resolve_offsets(context: &mut CompilationContext) -> Result<SectionOffsets> {
    let mut cursor = KRB_HEADER_SIZE as u64;
    let element = cursor;
    for record in &mut context.elements {
        record.absolute_offset = to_u32(cursor)?;
        cursor += record.calculated_size as u64;
    }

    for (parent, record) in context.elements.iter().enumerate() {
        for &child in &record.children {
            let distance = context.elements[child].absolute_offset as u64 - record.absolute_offset as u64;
            if distance > u16::MAX as u64 {
                return Err(CompilerError::OffsetOverflow { parent, child, distance });
            }
        }
    }

    let style = cursor;
    for record in &mut context.styles {
        record.absolute_offset = to_u32(cursor)?;
        cursor += record.calculated_size as u64;
    }

    let animation = cursor;
    let string = cursor;
    cursor += STRING_TABLE_COUNT_SIZE as u64;
    cursor += context.strings.iter().map(|s| 1 + s.len() as u64).sum::<u64>();

    let resource = cursor;
    cursor += (context.resources.len() * RESOURCE_EXTERNAL_SIZE) as u64;

    let offsets = SectionOffsets {
        element: to_u32(element)?,
        style: to_u32(style)?,
        animation: to_u32(animation)?,
        string: to_u32(string)?,
        resource: to_u32(resource)?,
        total_size: to_u32(cursor)?,
    };
    debug!("Section offsets: {:?}", offsets);
    Ok(offsets)
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| CompilerError::codegen(format!("offset {} does not fit in 32 bits", value)))
}

pub struct KrbWriter<W> {
    out: W,
    start: u64,
    written: u64,
}

impl<W: Write + Seek> KrbWriter<W> {
    pub fn new(mut out: W) -> Result<Self> {
        let start = out.stream_position()?;
        Ok(Self { out, start, written: 0 })
    }

    /// Writes the whole file. The header is first written with zeroed
    /// offsets and rewritten once every section has landed where planned.
    pub fn write(mut self, context: &CompilationContext, offsets: &SectionOffsets) -> Result<W> {
        self.emit(&encode_header(context, &SectionOffsets::default())?)?;

        self.expect_position("element", offsets.element)?;
        for (index, element) in context.elements.iter().enumerate() {
            self.expect_position("element record", element.absolute_offset)?;
            let bytes = encode_element(context, element)?;
            check_size(&format!("element {}", index), element.calculated_size, bytes.len())?;
            self.emit(&bytes)?;
        }

        self.expect_position("style", offsets.style)?;
        for style in &context.styles {
            self.expect_position("style record", style.absolute_offset)?;
            let mut bytes = Vec::with_capacity(style.calculated_size as usize);
            bytes.write_u8(style.id)?;
            bytes.write_u8(style.name_index)?;
            bytes.write_u8(style.properties.len() as u8)?;
            for property in &style.properties {
                encode_property(&mut bytes, property)?;
            }
            check_size(&format!("style '{}'", style.name), style.calculated_size, bytes.len())?;
            self.emit(&bytes)?;
        }

        self.expect_position("animation", offsets.animation)?;
        self.expect_position("string", offsets.string)?;
        let mut strings = Vec::new();
        strings.write_u16::<LittleEndian>(context.strings.len() as u16)?;
        for text in &context.strings {
            strings.write_u8(text.len() as u8)?;
            strings.extend_from_slice(text.as_bytes());
        }
        self.emit(&strings)?;

        self.expect_position("resource", offsets.resource)?;
        let mut resources = Vec::with_capacity(context.resources.len() * RESOURCE_EXTERNAL_SIZE);
        for resource in &context.resources {
            resources.write_u8(resource.resource_type.to_u8())?;
            resources.write_u8(resource.name_index)?;
            resources.write_u8(RESOURCE_FORMAT_EXTERNAL)?;
            resources.write_u8(resource.path_index)?;
        }
        self.emit(&resources)?;

        if self.written != offsets.total_size as u64 {
            return Err(CompilerError::codegen(format!(
                "final size mismatch: planned {} bytes, wrote {}",
                offsets.total_size, self.written
            )));
        }

        self.out.seek(SeekFrom::Start(self.start))?;
        self.out.write_all(&encode_header(context, offsets)?)?;
        self.out.seek(SeekFrom::Start(self.start + self.written))?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn emit(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn expect_position(&self, section: &str, planned: u32) -> Result<()> {
        if self.written != planned as u64 {
            return Err(CompilerError::codegen(format!(
                "{} section starts at {} but {} bytes were written before it",
                section, planned, self.written
            )));
        }
        Ok(())
    }
}

fn check_size(what: &str, planned: u32, actual: usize) -> Result<()> {
    if planned as usize != actual {
        return Err(CompilerError::codegen(format!(
            "{} encoded to {} bytes, expected {}",
            what, actual, planned
        )));
    }
    Ok(())
}

fn encode_header(context: &CompilationContext, offsets: &SectionOffsets) -> Result<Vec<u8>> {
    let mut header = Vec::with_capacity(KRB_HEADER_SIZE);
    header.extend_from_slice(KRB_MAGIC);
    header.write_u16::<LittleEndian>(encode_version(KRB_VERSION_MAJOR, KRB_VERSION_MINOR))?;
    header.write_u16::<LittleEndian>(context.header_flags.bits())?;

    header.write_u16::<LittleEndian>(context.elements.len() as u16)?;
    header.write_u16::<LittleEndian>(context.styles.len() as u16)?;
    header.write_u16::<LittleEndian>(0)?; // animations
    header.write_u16::<LittleEndian>(context.strings.len() as u16)?;
    header.write_u16::<LittleEndian>(context.resources.len() as u16)?;

    header.write_u32::<LittleEndian>(offsets.element)?;
    header.write_u32::<LittleEndian>(offsets.style)?;
    header.write_u32::<LittleEndian>(offsets.animation)?;
    header.write_u32::<LittleEndian>(offsets.string)?;
    header.write_u32::<LittleEndian>(offsets.resource)?;
    header.write_u32::<LittleEndian>(offsets.total_size)?;

    debug_assert_eq!(header.len(), KRB_HEADER_SIZE);
    Ok(header)
}

fn encode_element(context: &CompilationContext, element: &CompiledElement) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(element.calculated_size as usize);
    bytes.write_u8(element.element_type.into())?;
    bytes.write_u8(element.id_index)?;
    bytes.write_u16::<LittleEndian>(element.pos_x)?;
    bytes.write_u16::<LittleEndian>(element.pos_y)?;
    bytes.write_u16::<LittleEndian>(element.width)?;
    bytes.write_u16::<LittleEndian>(element.height)?;
    bytes.write_u8(element.layout)?;
    bytes.write_u8(element.style_id)?;
    bytes.write_u8(element.properties.len() as u8)?;
    bytes.write_u8(element.children.len() as u8)?;
    bytes.write_u8(element.events.len() as u8)?;
    bytes.write_u8(0)?; // animation references
    bytes.write_u8(0)?; // custom properties

    for property in &element.properties {
        encode_property(&mut bytes, property)?;
    }
    for event in &element.events {
        bytes.write_u8(event.event_type.to_u8())?;
        bytes.write_u8(event.callback)?;
    }
    for &child in &element.children {
        let distance = context.elements[child].absolute_offset - element.absolute_offset;
        bytes.write_u16::<LittleEndian>(distance as u16)?;
    }
    Ok(bytes)
}

fn encode_property(bytes: &mut Vec<u8>, property: &Property) -> Result<()> {
    let size = property.value.size();
    if size > u8::MAX as usize {
        return Err(CompilerError::codegen(format!(
            "property 0x{:02X} payload of {} bytes does not fit the size byte",
            property.id, size
        )));
    }
    bytes.write_u8(property.id)?;
    bytes.write_u8(property.value.value_type())?;
    bytes.write_u8(size as u8)?;
    property.value.encode(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::Limits;
    use crate::source::{SourceDocument, SourceElement, SourceStyle};
    use std::io::Cursor;

    fn compiled(source: &SourceDocument) -> (CompilationContext, SectionOffsets) {
        let mut context = CompilationContext::build(source, Limits::default()).unwrap();
        let offsets = resolve_offsets(&mut context).unwrap();
        (context, offsets)
    }

    #[test]
    fn sections_are_contiguous() {
        let source = SourceDocument::new()
            .with_style(SourceStyle::new("card").with_property("border_width", "1"))
            .with_root(
                SourceElement::new("App")
                    .with_child(SourceElement::new("Text").with_property("text", "Hi"))
                    .with_child(SourceElement::new("Container").with_property("style", "card")),
            );
        let (context, offsets) = compiled(&source);

        assert_eq!(offsets.element, 42);
        let mut expected = 42;
        for element in &context.elements {
            assert_eq!(element.absolute_offset, expected);
            expected += element.calculated_size;
        }
        assert_eq!(offsets.style, expected);
        assert_eq!(offsets.animation, offsets.string);
        // "" and "card" and "Hi"
        assert_eq!(offsets.resource, offsets.string + 2 + 1 + 5 + 3);
        assert_eq!(offsets.total_size, offsets.resource);
    }

    #[test]
    fn header_is_rewritten_with_final_offsets() {
        let source = SourceDocument::new().with_root(SourceElement::new("App").with_property("text", "x"));
        let (context, offsets) = compiled(&source);
        let bytes = KrbWriter::new(Cursor::new(Vec::new()))
            .unwrap()
            .write(&context, &offsets)
            .unwrap()
            .into_inner();

        assert_eq!(bytes.len() as u32, offsets.total_size);
        assert_eq!(&bytes[0..4], b"KRB1");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), encode_version(0, 3));
        assert_eq!(u32::from_le_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]), 42);
        assert_eq!(u32::from_le_bytes([bytes[38], bytes[39], bytes[40], bytes[41]]), offsets.total_size);
    }

    #[test]
    fn child_offsets_are_relative_to_parent() {
        let source = SourceDocument::new().with_root(
            SourceElement::new("Container")
                .with_child(SourceElement::new("Text"))
                .with_child(SourceElement::new("Text")),
        );
        let (context, offsets) = compiled(&source);
        let bytes = KrbWriter::new(Cursor::new(Vec::new()))
            .unwrap()
            .write(&context, &offsets)
            .unwrap()
            .into_inner();

        let parent = &bytes[42..];
        let first = u16::from_le_bytes([parent[17], parent[18]]);
        let second = u16::from_le_bytes([parent[19], parent[20]]);
        assert_eq!(first, 21);
        assert_eq!(second, 21 + 17);
    }

    #[test]
    fn distant_child_overflows() {
        // A's 200 children each carry 20 grandchildren, pushing B past 65535 bytes.
        let mut a = SourceElement::new("Container");
        for _ in 0..200 {
            let mut middle = SourceElement::new("Container");
            for _ in 0..20 {
                middle = middle.with_child(SourceElement::new("Container"));
            }
            a = a.with_child(middle);
        }
        let root = SourceElement::new("Container")
            .with_child(a)
            .with_child(SourceElement::new("Container"));
        let limits = Limits {
            max_elements: 10_000,
            max_children: 255,
            ..Limits::default()
        };
        let mut context = CompilationContext::build(&SourceDocument::new().with_root(root), limits).unwrap();
        let err = resolve_offsets(&mut context).unwrap_err();
        assert!(matches!(err, CompilerError::OffsetOverflow { parent: 0, .. }));
    }
}
