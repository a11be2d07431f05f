//! Error types for the storyboard library.
//!
//! Recoverable playback problems (unknown templates, failed constructors) are
//! not errors at this level: the player logs them and moves on. What lives here
//! is what the caller has to deal with.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a document into elements
#[derive(Error, Debug)]
pub enum IngestError {
    /// The file could not be read
    #[error("Failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No partitioner understands this file
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Errors raised while loading a timeline file
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("JSON file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read timeline {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse timeline {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by a template constructor
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("content is empty")]
    EmptyContent,

    /// Content did not have the shape the template needs (e.g. no `|` for a comparison)
    #[error("expected {expected}, got {found:?}")]
    Shape {
        expected: &'static str,
        found: String,
    },

    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid expression: {0}")]
    Expression(#[from] ExpressionError),
}

/// Errors raised while parsing a plot expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at {0}")]
    UnexpectedToken(usize),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
}
