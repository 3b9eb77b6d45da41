// crates/kryon-core/src/lib.rs
pub mod codec;
pub mod document;
pub mod elements;
pub mod events;
pub mod format;
pub mod krb;
pub mod properties;
pub mod resources;
pub mod style;
pub mod tree;

pub use document::*;
pub use elements::*;
pub use events::*;
pub use format::{FormatVariant, HeaderFlags, PropertyId, ValueType};
pub use krb::*;
pub use properties::*;
pub use resources::*;
pub use style::*;
pub use tree::*;

#[derive(Debug, thiserror::Error)]
pub enum KryonError {
    #[error("Invalid KRB file: {0}")]
    InvalidKRB(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Truncated {section}: needed {needed} bytes at offset {offset}")]
    Truncated {
        section: &'static str,
        offset: u64,
        needed: usize,
    },

    #[error("Malformed element tree: {0}")]
    MalformedTree(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KryonError>;
