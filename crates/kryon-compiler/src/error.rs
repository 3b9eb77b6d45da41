// crates/kryon-compiler/src/error.rs
//! Error types for the KRB compiler

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse { file: String, line: usize, message: String },

    #[error("Semantic error at line {line}: {message}")]
    Semantic { line: usize, message: String },

    #[error("Maximum limit exceeded: {limit_type} (limit: {limit})")]
    LimitExceeded { limit_type: String, limit: usize },

    #[error("Child offset overflow: element {parent} reaches child {child} {distance} bytes past its start (max 65535)")]
    OffsetOverflow { parent: usize, child: usize, distance: u64 },

    #[error("Code generation error: {message}")]
    CodeGen { message: String },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

impl CompilerError {
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn semantic(line: usize, message: impl Into<String>) -> Self {
        Self::Semantic {
            line,
            message: message.into(),
        }
    }

    pub fn limit(limit_type: impl Into<String>, limit: usize) -> Self {
        Self::LimitExceeded {
            limit_type: limit_type.into(),
            limit,
        }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::CodeGen {
            message: message.into(),
        }
    }
}
