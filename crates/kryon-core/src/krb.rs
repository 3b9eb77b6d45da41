// crates/kryon-core/src/krb.rs
use crate::codec;
use crate::format::{self, FormatVariant, HeaderFlags};
use crate::resources::{RESOURCE_FORMAT_EXTERNAL, RESOURCE_FORMAT_INLINE};
use crate::{
    assemble_tree, Document, Element, ElementId, ElementRecord, ElementTree, ElementType,
    EventBinding, EventType, KrbHeader, KryonError, Property, PropertyValue, ResourceRecord,
    ResourceType, Result, StyleRecord, StyleResolver,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A loaded document together with its assembled tree and resolved render nodes.
#[derive(Debug)]
pub struct KrbFile {
    pub path: Option<PathBuf>,
    pub document: Document,
    pub tree: ElementTree,
    pub elements: HashMap<ElementId, Element>,
    pub root_element_id: Option<ElementId>,
}

impl KrbFile {
    pub fn from_document(document: Document, path: Option<PathBuf>) -> Result<Self> {
        let tree = assemble_tree(&document.elements, document.flags())?;
        let elements = StyleResolver::new(&document).resolve(&tree);
        let root_element_id = tree.roots.first().map(|&root| root as ElementId);
        Ok(Self {
            path,
            document,
            tree,
            elements,
            root_element_id,
        })
    }

    pub fn roots(&self) -> Vec<ElementId> {
        self.tree.roots.iter().map(|&root| root as ElementId).collect()
    }

    pub fn strings(&self) -> &[String] {
        &self.document.strings
    }
}

/// Streaming reader over any seekable byte source.
///
/// Sections are visited in header order using the declared offsets. Reading
/// is all or nothing: every failure returns an error and drops whatever was
/// parsed so far.
pub struct KrbReader<R> {
    input: R,
    len: u64,
}

impl<R: Read + Seek> KrbReader<R> {
    pub fn new(mut input: R) -> Result<Self> {
        let len = input.seek(SeekFrom::End(0))?;
        input.seek(SeekFrom::Start(0))?;
        Ok(Self { input, len })
    }

    pub fn read_document(mut self) -> Result<Document> {
        let header = self.read_header()?;
        let variant = header.variant;

        if header.flags.contains(HeaderFlags::HAS_APP) {
            self.peek_app_root(&header)?;
        }

        let elements = self.read_elements(&header, variant)?;
        let styles = self.read_styles(&header)?;
        let strings = self.read_strings(&header)?;
        let resources = self.read_resources(&header)?;

        let document = Document {
            header,
            elements,
            styles,
            strings,
            resources,
        };
        validate_references(&document)?;

        debug!(
            "Read KRB v{}.{}: {} elements, {} styles, {} strings, {} resources",
            document.header.version_major,
            document.header.version_minor,
            document.elements.len(),
            document.styles.len(),
            document.strings.len(),
            document.resources.len()
        );
        Ok(document)
    }

    fn read_header(&mut self) -> Result<KrbHeader> {
        let prefix = self.read_bytes("header", 6)?;
        if &prefix[0..4] != format::KRB_MAGIC {
            return Err(KryonError::InvalidKRB(format!(
                "bad magic {:02X?}, expected \"KRB1\"",
                &prefix[0..4]
            )));
        }

        let (major, minor) = format::decode_version(codec::read_u16_le(&prefix[4..]));
        let variant = match FormatVariant::for_major(major) {
            Some(variant) => variant,
            None => {
                warn!("Unknown KRB major version {}.{}, reading as canonical layout", major, minor);
                FormatVariant::Canonical
            }
        };
        if FormatVariant::for_major(major).is_some() && minor != variant.expected_minor() {
            warn!(
                "KRB minor version mismatch: file is {}.{}, reader expects {}.{}",
                major,
                minor,
                major,
                variant.expected_minor()
            );
        }

        let rest = self.read_bytes("header", variant.header_size() - prefix.len())?;
        let mut raw = prefix;
        raw.extend_from_slice(&rest);

        let u16_at = |offset: usize| codec::read_u16_le(&raw[offset..]);
        let u32_at = |offset: usize| codec::read_u32_le(&raw[offset..]);

        let flags = HeaderFlags::from_bits_retain(u16_at(6));
        let (resource_offset, total_size) = match variant {
            FormatVariant::Canonical => (u32_at(34), u32_at(38)),
            FormatVariant::Legacy => (0, u32_at(34)),
        };

        let mut header = KrbHeader {
            version_major: major,
            version_minor: minor,
            variant,
            flags,
            element_count: u16_at(8),
            style_count: u16_at(10),
            animation_count: u16_at(12),
            string_count: u16_at(14),
            resource_count: u16_at(16),
            element_offset: u32_at(18),
            style_offset: u32_at(22),
            animation_offset: u32_at(26),
            string_offset: u32_at(30),
            resource_offset,
            total_size,
        };

        if flags.contains(HeaderFlags::COMPRESSED) {
            return Err(KryonError::UnsupportedFeature("compressed KRB payloads".to_string()));
        }
        if variant == FormatVariant::Legacy && header.resource_count > 0 {
            warn!(
                "Legacy KRB header declares {} resources but has no resource section; ignoring them",
                header.resource_count
            );
            header.resource_count = 0;
        }
        if header.animation_count > 0 {
            warn!("Ignoring {} reserved animation entries", header.animation_count);
        }
        if total_size as u64 != self.len {
            warn!("Header total size {} does not match input length {}", total_size, self.len);
        }

        let header_size = variant.header_size() as u64;
        for (section, count, offset) in [
            ("element", header.element_count, header.element_offset),
            ("style", header.style_count, header.style_offset),
            ("string", header.string_count, header.string_offset),
            ("resource", header.resource_count, header.resource_offset),
        ] {
            if count == 0 {
                continue;
            }
            if (offset as u64) < header_size {
                return Err(KryonError::InvalidKRB(format!(
                    "{} section offset {} overlaps the {}-byte header",
                    section, offset, header_size
                )));
            }
            if offset as u64 >= self.len {
                return Err(KryonError::InvalidKRB(format!(
                    "{} section offset {} is past the end of the input ({} bytes)",
                    section, offset, self.len
                )));
            }
        }

        Ok(header)
    }

    /// Checks the first element's type without disturbing the stream position.
    fn peek_app_root(&mut self, header: &KrbHeader) -> Result<()> {
        if header.element_count == 0 {
            return Err(KryonError::InvalidKRB(
                "header declares an App root but the element section is empty".to_string(),
            ));
        }
        let saved = self.input.stream_position()?;
        self.input.seek(SeekFrom::Start(header.element_offset as u64))?;
        let first = self.read_bytes("element header", 1)?[0];
        self.input.seek(SeekFrom::Start(saved))?;

        if ElementType::from(first) != ElementType::App {
            return Err(KryonError::InvalidKRB(format!(
                "header declares an App root but the first element has type 0x{:02X}",
                first
            )));
        }
        Ok(())
    }

    fn read_elements(&mut self, header: &KrbHeader, variant: FormatVariant) -> Result<Vec<ElementRecord>> {
        let mut elements = Vec::with_capacity(header.element_count as usize);
        if header.element_count == 0 {
            return Ok(elements);
        }
        self.input.seek(SeekFrom::Start(header.element_offset as u64))?;
        for _ in 0..header.element_count {
            elements.push(self.read_element(variant)?);
        }
        Ok(elements)
    }

    fn read_element(&mut self, variant: FormatVariant) -> Result<ElementRecord> {
        let offset = self.input.stream_position()?;
        let head = self.read_bytes("element header", variant.element_header_size())?;

        let mut record = ElementRecord::new(ElementType::from(head[0]));
        record.offset = offset as u32;
        record.id_index = head[1];
        record.pos_x = codec::read_u16_le(&head[2..]);
        record.pos_y = codec::read_u16_le(&head[4..]);
        record.width = codec::read_u16_le(&head[6..]);
        record.height = codec::read_u16_le(&head[8..]);
        record.layout = head[10];
        record.style_id = head[11];
        let property_count = head[12];
        record.child_count = head[13];
        let event_count = head[14];
        record.animation_count = head[15];
        let custom_count = match variant {
            FormatVariant::Canonical => head[16],
            FormatVariant::Legacy => 0,
        };

        record.properties = self.read_properties("element property", property_count)?;
        record.custom_properties = self.read_properties("custom property", custom_count)?;

        let events = self.read_bytes("event table", event_count as usize * format::EVENT_SIZE)?;
        record.events = events
            .chunks_exact(format::EVENT_SIZE)
            .map(|pair| EventBinding {
                event_type: EventType::from_u8(pair[0]),
                callback: pair[1],
            })
            .collect();

        // Animation references are reserved.
        self.read_bytes(
            "animation references",
            record.animation_count as usize * format::ANIMATION_REF_SIZE,
        )?;

        let children = self.read_bytes("child offsets", record.child_count as usize * format::CHILD_OFFSET_SIZE)?;
        record.child_offsets = children
            .chunks_exact(format::CHILD_OFFSET_SIZE)
            .map(codec::read_u16_le)
            .collect();

        Ok(record)
    }

    fn read_properties(&mut self, section: &'static str, count: u8) -> Result<Vec<Property>> {
        let mut properties = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let head = self.read_bytes(section, format::PROPERTY_HEADER_SIZE)?;
            let (id, value_type, size) = (head[0], head[1], head[2]);
            let bytes = self.read_bytes(section, size as usize)?;
            properties.push(Property {
                id,
                value: PropertyValue::decode(value_type, &bytes),
            });
        }
        Ok(properties)
    }

    fn read_styles(&mut self, header: &KrbHeader) -> Result<Vec<StyleRecord>> {
        let mut styles = Vec::with_capacity(header.style_count as usize);
        if header.style_count == 0 {
            return Ok(styles);
        }
        self.input.seek(SeekFrom::Start(header.style_offset as u64))?;
        for _ in 0..header.style_count {
            let head = self.read_bytes("style header", format::STYLE_HEADER_SIZE)?;
            let properties = self.read_properties("style property", head[2])?;
            styles.push(StyleRecord {
                id: head[0],
                name_index: head[1],
                properties,
            });
        }
        for (index, style) in styles.iter().enumerate() {
            if style.id as usize != index + 1 {
                warn!("Style at position {} declares id {}; lookups use position", index, style.id);
            }
        }
        Ok(styles)
    }

    fn read_strings(&mut self, header: &KrbHeader) -> Result<Vec<String>> {
        let mut strings = Vec::with_capacity(header.string_count as usize);
        if header.string_count == 0 {
            return Ok(strings);
        }
        self.input.seek(SeekFrom::Start(header.string_offset as u64))?;
        let count_bytes = self.read_bytes("string table", format::STRING_TABLE_COUNT_SIZE)?;
        let in_section = codec::read_u16_le(&count_bytes);
        if in_section < header.string_count {
            return Err(KryonError::InvalidKRB(format!(
                "string table holds {} entries but the header declares {}",
                in_section, header.string_count
            )));
        }
        if in_section > header.string_count {
            warn!(
                "String table holds {} entries, header declares {}; reading {}",
                in_section, header.string_count, header.string_count
            );
        }

        for _ in 0..header.string_count {
            let length = self.read_bytes("string table", 1)?[0] as usize;
            let bytes = self.read_bytes("string table", length)?;
            strings.push(String::from_utf8_lossy(&bytes).into_owned());
        }
        Ok(strings)
    }

    fn read_resources(&mut self, header: &KrbHeader) -> Result<Vec<ResourceRecord>> {
        let mut resources = Vec::with_capacity(header.resource_count as usize);
        if header.resource_count == 0 {
            return Ok(resources);
        }
        self.input.seek(SeekFrom::Start(header.resource_offset as u64))?;
        for index in 0..header.resource_count {
            let head = self.read_bytes("resource table", 3)?;
            match head[2] {
                RESOURCE_FORMAT_EXTERNAL => {}
                RESOURCE_FORMAT_INLINE => {
                    return Err(KryonError::UnsupportedFeature(format!(
                        "resource {} uses inline data",
                        index
                    )))
                }
                other => {
                    return Err(KryonError::InvalidKRB(format!(
                        "resource {} has unknown format 0x{:02X}",
                        index, other
                    )))
                }
            }
            let path_index = self.read_bytes("resource table", 1)?[0];
            resources.push(ResourceRecord {
                resource_type: ResourceType::from_u8(head[0]),
                name_index: head[1],
                path_index,
            });
        }
        Ok(resources)
    }

    fn read_bytes(&mut self, section: &'static str, len: usize) -> Result<Vec<u8>> {
        let offset = self.input.stream_position()?;
        let mut buf = vec![0u8; len];
        match self.input.read_exact(&mut buf) {
            Ok(()) => Ok(buf),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(KryonError::Truncated {
                section,
                offset,
                needed: len,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Index references must land inside their tables.
fn validate_references(document: &Document) -> Result<()> {
    let string_count = document.strings.len();
    let check_string = |index: usize, what: &str| -> Result<()> {
        if index >= string_count {
            return Err(KryonError::InvalidKRB(format!(
                "{} references string {} but the table has {} entries",
                what, index, string_count
            )));
        }
        Ok(())
    };
    let check_properties = |properties: &[Property], owner: &str| -> Result<()> {
        for property in properties {
            match &property.value {
                PropertyValue::String(index) => check_string(*index as usize, owner)?,
                PropertyValue::Resource(index) if *index as usize >= document.resources.len() => {
                    return Err(KryonError::InvalidKRB(format!(
                        "{} references resource {} but the table has {} entries",
                        owner,
                        index,
                        document.resources.len()
                    )))
                }
                _ => {}
            }
        }
        Ok(())
    };

    for (index, element) in document.elements.iter().enumerate() {
        let owner = format!("element {}", index);
        if element.id_index != 0 {
            check_string(element.id_index as usize, &owner)?;
        }
        if element.style_id as usize > document.styles.len() {
            return Err(KryonError::InvalidKRB(format!(
                "{} references style {} but the table has {} entries",
                owner,
                element.style_id,
                document.styles.len()
            )));
        }
        check_properties(&element.properties, &owner)?;
        for event in &element.events {
            check_string(event.callback as usize, &owner)?;
        }
    }
    for (index, style) in document.styles.iter().enumerate() {
        let owner = format!("style {}", index + 1);
        check_string(style.name_index as usize, &owner)?;
        check_properties(&style.properties, &owner)?;
    }
    for (index, resource) in document.resources.iter().enumerate() {
        let owner = format!("resource {}", index);
        check_string(resource.name_index as usize, &owner)?;
        check_string(resource.path_index as usize, &owner)?;
    }
    Ok(())
}

pub fn read_document<R: Read + Seek>(input: R) -> Result<Document> {
    KrbReader::new(input)?.read_document()
}

pub fn load_krb_file(path: impl AsRef<Path>) -> Result<KrbFile> {
    let path = path.as_ref();
    info!("Loading KRB file: {}", path.display());
    let file = File::open(path)?;
    let document = read_document(BufReader::new(file))?;
    KrbFile::from_document(document, Some(path.to_path_buf()))
}
