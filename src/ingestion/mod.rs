pub mod partition;

pub use partition::{AutoPartitioner, DocumentFormat};

use crate::errors::IngestError;
use log::{debug, warn};
use serde::Serialize;
use std::path::Path;

/// Kind of a segmented document element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Title,
    NarrativeText,
    ListItem,
    CodeSnippet,
    PageBreak,
}

/// A unit of extracted content (paragraph, heading, list item, ...)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub kind: ElementKind,
    pub text: String,
}

impl Element {
    pub fn new(kind: ElementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn page_break() -> Self {
        Self::new(ElementKind::PageBreak, "")
    }
}

/// Turns a file into an ordered list of elements
pub trait Partitioner {
    fn partition(&self, path: &Path) -> Result<Vec<Element>, IngestError>;
}

/// Plain text extracted from a document, plus the number of elements it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedDocument {
    text: String,
    element_count: usize,
}

impl ExtractedDocument {
    /// Ingest a file with the automatic partitioner
    pub fn ingest(path: &Path) -> Result<Self, IngestError> {
        Self::ingest_with(path, &AutoPartitioner)
    }

    /// Ingest a file with a caller-supplied partitioner
    pub fn ingest_with(path: &Path, partitioner: &dyn Partitioner) -> Result<Self, IngestError> {
        let elements = partitioner.partition(path)?;
        debug!(
            "Partitioned {} into {} elements",
            path.display(),
            elements.len()
        );
        Ok(Self::from_elements(&elements))
    }

    /// Join every non-empty element text with a blank line
    pub fn from_elements(elements: &[Element]) -> Self {
        let text = elements
            .iter()
            .map(|el| el.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        if text.trim().is_empty() {
            warn!("No extractable text found.");
        }

        Self {
            text,
            element_count: elements.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of elements the partitioner reported, empty ones included
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn into_text(self) -> String {
        self.text
    }
}
