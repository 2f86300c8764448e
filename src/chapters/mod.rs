/// Chapter alignment module
///
/// This module reconciles chapter markers read from audio file metadata with
/// chapter lists exported from a bibliographic catalog. It proposes catalog
/// titles for local chapters and flags books whose titles look auto-generated.

pub mod normalize;
pub mod similarity;
pub mod aligner;
pub mod confidence;
pub mod placeholder;
pub mod catalog;
pub mod files;
pub mod report;

// Re-export main types
pub use aligner::{align, ChapterAligner};
pub use catalog::{CatalogItem, CatalogSource, FileCatalog};
pub use placeholder::{analyze, analyze_with_threshold, is_placeholder_title, PlaceholderAnalysis};
pub use report::{AlignmentReport, ReportRow};

use normalize::seconds_to_ms;
use serde::{Deserialize, Serialize};

/// Errors raised by the alignment engine
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AlignmentError {
    #[error("Invalid alignment configuration: {0}")]
    InvalidConfig(String),
}

/// A chapter marker read from the audio file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalChapter {
    /// Title stored in the audio metadata
    pub title: String,
    /// Start offset in milliseconds
    pub start_ms: u64,
    /// End offset in milliseconds
    pub end_ms: u64,
}

impl LocalChapter {
    pub fn new(title: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            title: title.into(),
            start_ms,
            end_ms,
        }
    }

    /// Build from second offsets, as most tag readers report them
    pub fn from_seconds(title: impl Into<String>, start_seconds: f64, end_seconds: f64) -> Self {
        Self::new(title, seconds_to_ms(start_seconds), seconds_to_ms(end_seconds))
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// A chapter entry from the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteChapter {
    /// Catalog title
    pub title: String,
    /// Start offset in milliseconds
    pub start_ms: u64,
    /// Length in milliseconds
    pub duration_ms: u64,
}

impl RemoteChapter {
    pub fn new(title: impl Into<String>, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            title: title.into(),
            start_ms,
            duration_ms,
        }
    }

    pub fn from_seconds(title: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self::new(title, seconds_to_ms(start_seconds), seconds_to_ms(duration_seconds))
    }

    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }
}

/// How a local chapter was resolved against the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ChapterMatch {
    /// Paired with the catalog chapter at `remote_index`
    Matched { remote_index: usize },
    /// No catalog counterpart
    Inserted,
}

/// Alignment outcome for one local chapter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignedChapter {
    /// Position in the local chapter list
    pub index: usize,
    /// Catalog title proposed for this chapter, empty when there is none
    pub suggested_name: String,
    /// Match confidence in [0, 1]
    pub confidence: f64,
    pub kind: ChapterMatch,
}

impl AlignedChapter {
    pub fn is_matched(&self) -> bool {
        matches!(self.kind, ChapterMatch::Matched { .. })
    }

    pub fn remote_index(&self) -> Option<usize> {
        match self.kind {
            ChapterMatch::Matched { remote_index } => Some(remote_index),
            ChapterMatch::Inserted => None,
        }
    }

    /// Suggested title, if the chapter was matched
    pub fn suggestion(&self) -> Option<&str> {
        match self.kind {
            ChapterMatch::Matched { .. } => Some(self.suggested_name.as_str()),
            ChapterMatch::Inserted => None,
        }
    }
}

/// Result of aligning one book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlignmentResult {
    /// One entry per local chapter, in local order
    pub aligned: Vec<AlignedChapter>,
    /// Mean confidence over matched chapters, 0 if none matched
    pub overall_confidence: f64,
    /// Whether the local titles look like placeholders
    pub needs_update: bool,
}

impl AlignmentResult {
    pub fn matched_count(&self) -> usize {
        self.aligned.iter().filter(|chapter| chapter.is_matched()).count()
    }

    pub fn inserted_count(&self) -> usize {
        self.aligned.len() - self.matched_count()
    }
}

/// Align with the default configuration
pub fn align_default(local: &[LocalChapter], remote: &[RemoteChapter]) -> AlignmentResult {
    ChapterAligner::default().align(local, remote)
}
