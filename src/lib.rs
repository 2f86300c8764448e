/// Chapter Aligner - Rust Implementation
///
/// Reconciles the chapter markers stored in audiobook files with the chapter
/// list published by a bibliographic catalog, proposes catalog titles for the
/// local chapters, and flags books whose titles look auto-generated.

pub mod chapters;
pub mod config;
pub mod processing;

// Re-export main types for easy access
pub use crate::config::{AlignmentConfig, Config, ConfigBuilder};
pub use crate::processing::{BatchProcessor, BatchSummary, BookAlignmentResult};
pub use crate::chapters::{
    align, align_default, analyze, AlignedChapter, AlignmentError, AlignmentReport, AlignmentResult,
    CatalogItem, CatalogSource, ChapterAligner, ChapterMatch, FileCatalog, LocalChapter,
    PlaceholderAnalysis, RemoteChapter,
};
