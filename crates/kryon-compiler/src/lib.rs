// crates/kryon-compiler/src/lib.rs
//! Kryon UI compiler
//!
//! Turns a source document into a KRB v0.3 binary in two passes:
//!
//! 1. **Pass 1** ([`context`]): intern strings, resolve styles and resources,
//!    flatten elements in pre-order and compute every record's size.
//! 2. **Pass 2** ([`writer`]): assign absolute offsets, check child offsets
//!    fit in 16 bits, write the sections and rewrite the header.
//!
//! ```no_run
//! use kryon_compiler::{compile_file, Limits};
//!
//! let report = compile_file("app.kry", "app.krb", Limits::default())?;
//! println!("{} bytes", report.total_size);
//! # Ok::<(), kryon_compiler::CompilerError>(())
//! ```

pub mod context;
pub mod error;
pub mod kry;
pub mod limits;
pub mod source;
pub mod values;
pub mod writer;

pub use context::{CompilationContext, CompileWarning};
pub use error::{CompilerError, Result};
pub use kry::parse_kry;
pub use limits::Limits;
pub use source::{SourceDocument, SourceElement, SourceProperty, SourceStyle};
pub use writer::{resolve_offsets, KrbWriter, SectionOffsets};

use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default)]
pub struct CompilationStats {
    pub element_count: usize,
    pub style_count: usize,
    pub string_count: usize,
    pub resource_count: usize,
    pub total_size: u32,
    pub compile_time_ms: u128,
    pub warnings: Vec<CompileWarning>,
}

impl CompilationStats {
    fn from_context(context: &CompilationContext, offsets: &SectionOffsets) -> Self {
        Self {
            element_count: context.elements.len(),
            style_count: context.styles.len(),
            string_count: context.strings.len(),
            resource_count: context.resources.len(),
            total_size: offsets.total_size,
            compile_time_ms: 0,
            warnings: context.warnings.clone(),
        }
    }
}

/// Runs both passes into any seekable sink.
pub fn compile_into<W: Write + Seek>(
    source: &SourceDocument,
    limits: Limits,
    out: W,
) -> Result<(W, CompilationStats)> {
    debug!("Pass 1: building compilation context");
    let mut context = CompilationContext::build(source, limits)?;
    debug!("Pass 2: resolving offsets and writing");
    let offsets = resolve_offsets(&mut context)?;
    let out = KrbWriter::new(out)?.write(&context, &offsets)?;
    Ok((out, CompilationStats::from_context(&context, &offsets)))
}

pub fn compile_to_bytes(source: &SourceDocument, limits: Limits) -> Result<Vec<u8>> {
    let (cursor, _) = compile_into(source, limits, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Parses `.kry` text and compiles it in memory.
pub fn compile_source(text: &str, file_name: &str, limits: Limits) -> Result<Vec<u8>> {
    let source = parse_kry(file_name, text)?;
    compile_to_bytes(&source, limits)
}

/// Compiles `input` to `output`. A failed compilation leaves no output file
/// behind.
pub fn compile_file(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    limits: Limits,
) -> Result<CompilationStats> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let started = Instant::now();
    info!("{} v{}", NAME, VERSION);
    info!("Compiling '{}' to '{}'", input.display(), output.display());

    let text = fs::read_to_string(input)?;
    let source = parse_kry(&input.display().to_string(), &text)?;

    let result = File::create(output)
        .map_err(CompilerError::from)
        .and_then(|file| compile_into(&source, limits, BufWriter::new(file)))
        .and_then(|(writer, stats)| {
            writer.into_inner().map_err(|e| CompilerError::Io(e.into_error()))?;
            Ok(stats)
        });

    match result {
        Ok(mut stats) => {
            stats.compile_time_ms = started.elapsed().as_millis();
            info!(
                "Compilation successful: {} elements, {} styles, {} strings, {} bytes in {}ms",
                stats.element_count, stats.style_count, stats.string_count, stats.total_size, stats.compile_time_ms
            );
            if !stats.warnings.is_empty() {
                warn!("{} warning(s) during compilation", stats.warnings.len());
            }
            Ok(stats)
        }
        Err(err) => {
            if output.exists() {
                if let Err(remove_err) = fs::remove_file(output) {
                    warn!("Could not remove partial output '{}': {}", output.display(), remove_err);
                }
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{read_document, ElementType, HeaderFlags, PropertyId, PropertyValue};

    const SAMPLE: &str = r#"
@style "title" {
    text_color: #FFCC00
    font_size: 24
}

App {
    window_title: "Demo"
    window_width: 640
    window_height: 480
    Container {
        layout: column center
        padding: 4
        Text {
            style: title
            text: "Hello"
        }
        Button {
            text: "Go"
            onClick: start
        }
    }
}
"#;

    const EVERY_KIND: &str = r##"
@style "base" {
    background_color: #10203040
    border_width: 1 2 3 4
}

@style "card" {
    extends: base
    opacity: 75%
    font_weight: bold
}

App {
    window_title: "Round trip"
    resizable: true
    Container {
        id: body
        style: card
        padding: 4 8
        gap: 12
        Image {
            source: "img/logo.png"
        }
        Button {
            text: "Go"
            text_alignment: center
            onClick: go
            onHover: hover
        }
    }
}
"##;

    #[test]
    fn written_records_read_back_unchanged() {
        let source = parse_kry("every.kry", EVERY_KIND).unwrap();
        let mut context = CompilationContext::build(&source, Limits::default()).unwrap();
        assert!(context.warnings.is_empty(), "{:?}", context.warnings);
        let offsets = resolve_offsets(&mut context).unwrap();
        let bytes = KrbWriter::new(Cursor::new(Vec::new()))
            .unwrap()
            .write(&context, &offsets)
            .unwrap()
            .into_inner();
        let document = read_document(Cursor::new(bytes)).unwrap();

        assert_eq!(document.strings, context.strings);
        assert_eq!(document.header.element_count as usize, context.elements.len());
        assert_eq!(document.header.style_count as usize, context.styles.len());
        assert_eq!(document.header.string_count as usize, context.strings.len());
        assert_eq!(document.header.resource_count as usize, context.resources.len());

        for (read, written) in document.elements.iter().zip(&context.elements) {
            assert_eq!(read.element_type, written.element_type);
            assert_eq!(read.id_index, written.id_index);
            assert_eq!(read.style_id, written.style_id);
            assert_eq!(read.layout, written.layout);
            assert_eq!(read.offset, written.absolute_offset);
            assert_eq!(read.child_count as usize, written.children.len());
            assert_eq!(read.properties, written.properties);
            assert_eq!(read.events, written.events);
            for (a, b) in read.properties.iter().zip(&written.properties) {
                assert_eq!(a.value.value_type(), b.value.value_type());
                assert_eq!(a.value.to_bytes(), b.value.to_bytes());
            }
        }
        for (read, written) in document.styles.iter().zip(&context.styles) {
            assert_eq!(read.id, written.id);
            assert_eq!(read.name_index, written.name_index);
            assert_eq!(read.properties, written.properties);
        }
        for (read, written) in document.resources.iter().zip(&context.resources) {
            assert_eq!(read.resource_type, written.resource_type);
            assert_eq!(read.name_index, written.name_index);
            assert_eq!(read.path_index, written.path_index);
        }

        // Byte, short, color, string, resource, percentage, insets, enum.
        let mut kinds: Vec<u8> = document
            .elements
            .iter()
            .flat_map(|e| &e.properties)
            .chain(document.styles.iter().flat_map(|s| &s.properties))
            .map(|p| p.value.value_type())
            .collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds, vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x08, 0x09]);

        let card = &document.styles[1];
        assert_eq!(card.properties[..2], document.styles[0].properties[..]);
        let button = &document.elements[3];
        assert_eq!(button.events.len(), 2);
        assert_eq!(document.string(button.events[1].callback as usize), Some("hover"));
    }

    #[test]
    fn compiled_source_reads_back() {
        let bytes = compile_source(SAMPLE, "sample.kry", Limits::default()).unwrap();
        let document = read_document(Cursor::new(bytes)).unwrap();

        assert!(document.flags().contains(HeaderFlags::HAS_APP | HeaderFlags::HAS_STYLES));
        let types: Vec<ElementType> = document.elements.iter().map(|e| e.element_type).collect();
        assert_eq!(
            types,
            vec![ElementType::App, ElementType::Container, ElementType::Text, ElementType::Button]
        );
        assert_eq!(document.elements[1].layout, 0x05);
        assert_eq!(document.elements[2].style_id, 1);

        let text = document.elements[2].property(PropertyId::TextContent).unwrap();
        let PropertyValue::String(index) = text.value else { panic!("text is a string index") };
        assert_eq!(document.string(index as usize), Some("Hello"));

        let button = &document.elements[3];
        assert_eq!(button.events.len(), 1);
        assert_eq!(document.string(button.events[0].callback as usize), Some("start"));
    }

    #[test]
    fn failed_compile_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.kry");
        let output = dir.path().join("bad.krb");
        fs::write(&input, "Container {\n    App {}\n}\n").unwrap();

        let err = compile_file(&input, &output, Limits::default()).unwrap_err();
        assert!(matches!(err, CompilerError::Semantic { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn compile_file_writes_reported_size() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("app.kry");
        let output = dir.path().join("app.krb");
        fs::write(&input, SAMPLE).unwrap();

        let stats = compile_file(&input, &output, Limits::default()).unwrap();
        assert_eq!(fs::metadata(&output).unwrap().len(), stats.total_size as u64);
        assert!(stats.warnings.is_empty());
    }
}
