use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::chapters::catalog::fetch_or_empty;
use crate::chapters::files::load_local_chapters;
use crate::chapters::{AlignmentResult, CatalogItem, CatalogSource, ChapterAligner, FileCatalog};
use crate::config::{BatchConfig, Config};

/// Alignment result for a single book directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAlignmentResult {
    pub book_dir: PathBuf,
    pub item: Option<CatalogItem>,
    pub local_chapters: usize,
    pub catalog_chapters: usize,
    pub result: Option<AlignmentResult>,
    pub processing_time: Duration,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
}

/// Overall batch results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub aligned: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub needs_update: usize,
    pub total_time: Duration,
    pub results: Vec<BookAlignmentResult>,
}

impl BookAlignmentResult {
    fn pending(book_dir: &Path) -> Self {
        Self {
            book_dir: book_dir.to_path_buf(),
            item: None,
            local_chapters: 0,
            catalog_chapters: 0,
            result: None,
            processing_time: Duration::from_secs(0),
            status: ProcessingStatus::Failed,
            error_message: None,
        }
    }

    fn failed(book_dir: PathBuf, message: String) -> Self {
        let mut result = Self::pending(&book_dir);
        result.error_message = Some(message);
        result
    }
}

impl BatchSummary {
    fn empty(total_time: Duration) -> Self {
        Self {
            total: 0,
            aligned: 0,
            unmatched: 0,
            failed: 0,
            needs_update: 0,
            total_time,
            results: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    /// Catalog chapters found and aligned
    Aligned,
    /// Catalog lookup produced nothing; every chapter is unmatched
    Unmatched,
    Failed,
}

/// Per-book manifest naming the catalog item
#[derive(Debug, Clone, Deserialize)]
struct BookManifest {
    asin: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    locale: Option<String>,
}

/// Batch aligner running one task per book behind a worker pool
pub struct BatchProcessor {
    state: Arc<ProcessorState>,
    worker_semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

/// Shared state handed to every book task
struct ProcessorState {
    batch: BatchConfig,
    aligner: ChapterAligner,
    catalog: Arc<dyn CatalogSource>,
}

impl BatchProcessor {
    /// Create a processor backed by the file catalog from `batch.catalog_dir`
    /// (`./catalog` when unset)
    pub fn new(config: Config) -> Result<Self> {
        let catalog_dir = config
            .batch
            .catalog_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("catalog"));
        Self::with_catalog(config, Arc::new(FileCatalog::new(catalog_dir)))
    }

    pub fn with_catalog(config: Config, catalog: Arc<dyn CatalogSource>) -> Result<Self> {
        config.validate()?;
        let aligner = ChapterAligner::new(config.alignment.clone())?;
        let max_workers = config.batch.max_workers;

        info!(
            "🔧 Initializing BatchProcessor with {} workers ({})",
            max_workers,
            catalog.source_name()
        );

        Ok(Self {
            state: Arc::new(ProcessorState {
                batch: config.batch,
                aligner,
                catalog,
            }),
            worker_semaphore: Arc::new(Semaphore::new(max_workers)),
            max_concurrent: max_workers,
        })
    }

    /// Align every book found under `root` and write the results file there
    pub async fn process_directory(&self, root: &Path) -> Result<BatchSummary> {
        let start_time = Instant::now();

        info!("🚀 Starting batch alignment...");
        info!("📁 Root: {}", root.display());

        if !root.is_dir() {
            return Err(anyhow!("Batch root is not a directory: {}", root.display()));
        }

        if !self.state.catalog.is_available().await {
            warn!("⚠️ {} is not available, every book will be unmatched", self.state.catalog.source_name());
        }

        info!("🔍 Discovering books...");
        let book_dirs = discover_books(root, &self.state.batch.local_file);

        if book_dirs.is_empty() {
            warn!("No books with {} found in {}", self.state.batch.local_file, root.display());
            return Ok(BatchSummary::empty(start_time.elapsed()));
        }

        info!("📚 Found {} books to align", book_dirs.len());

        let mut results = self.process_books_parallel(book_dirs).await;
        results.sort_by(|a, b| a.book_dir.cmp(&b.book_dir));

        let count = |status: ProcessingStatus| results.iter().filter(|r| r.status == status).count();
        let summary = BatchSummary {
            total: results.len(),
            aligned: count(ProcessingStatus::Aligned),
            unmatched: count(ProcessingStatus::Unmatched),
            failed: count(ProcessingStatus::Failed),
            needs_update: results
                .iter()
                .filter(|r| r.result.as_ref().map_or(false, |result| result.needs_update))
                .count(),
            total_time: start_time.elapsed(),
            results,
        };

        let results_path = root.join(&self.state.batch.results_file);
        let json_data = serde_json::to_string_pretty(&summary)?;
        tokio::fs::write(&results_path, json_data)
            .await
            .with_context(|| format!("Failed to write {}", results_path.display()))?;

        info!("💾 Results saved to: {}", results_path.display());

        Ok(summary)
    }

    /// Align books in parallel with controlled concurrency
    async fn process_books_parallel(&self, book_dirs: Vec<PathBuf>) -> Vec<BookAlignmentResult> {
        let (tx, mut rx) = mpsc::channel(self.max_concurrent);
        let total_books = book_dirs.len();

        let mut handles = Vec::with_capacity(total_books);
        for (index, book_dir) in book_dirs.into_iter().enumerate() {
            let state = Arc::clone(&self.state);
            let semaphore = Arc::clone(&self.worker_semaphore);
            let tx = tx.clone();
            let task_dir = book_dir.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        error!("Worker pool closed: {}", e);
                        return;
                    }
                };

                info!("📖 Aligning book {}/{}: {}", index + 1, total_books, task_dir.display());

                let result = state.process_book(&task_dir).await;

                if let Err(e) = tx.send(result).await {
                    error!("Failed to send result: {}", e);
                }
            });
            handles.push((book_dir, handle));
        }

        // Drop the original sender to close the channel when all tasks complete
        drop(tx);

        let mut results = Vec::with_capacity(total_books);
        while let Some(result) = rx.recv().await {
            match result.status {
                ProcessingStatus::Aligned => {
                    info!(
                        "✅ Aligned: {} in {:.2}s",
                        result.book_dir.display(),
                        result.processing_time.as_secs_f64()
                    );
                }
                ProcessingStatus::Unmatched => {
                    warn!("⚠️ No catalog chapters: {}", result.book_dir.display());
                }
                ProcessingStatus::Failed => {
                    warn!(
                        "❌ Failed: {} - {}",
                        result.book_dir.display(),
                        result.error_message.as_deref().unwrap_or("Unknown error")
                    );
                }
            }
            results.push(result);
        }

        // A task that never reported still gets a row
        for (book_dir, handle) in handles {
            let outcome = handle.await;
            if results.iter().any(|r| r.book_dir == book_dir) {
                continue;
            }

            let reason = match outcome {
                Err(e) => format!("Alignment task aborted: {}", e),
                Ok(()) => "Alignment task produced no result".to_string(),
            };
            error!("❌ Failed: {} - {}", book_dir.display(), reason);
            results.push(BookAlignmentResult::failed(book_dir, reason));
        }

        results
    }

    /// Get processing statistics
    pub fn get_stats(&self) -> ProcessingStats {
        ProcessingStats {
            max_workers: self.max_concurrent,
            available_permits: self.worker_semaphore.available_permits(),
        }
    }
}

impl ProcessorState {
    async fn process_book(&self, book_dir: &Path) -> BookAlignmentResult {
        let start_time = Instant::now();
        let mut result = BookAlignmentResult::pending(book_dir);

        if let Err(e) = self.align_book(book_dir, &mut result).await {
            result.status = ProcessingStatus::Failed;
            result.error_message = Some(format!("{:#}", e));
        }

        result.processing_time = start_time.elapsed();
        result
    }

    async fn align_book(&self, book_dir: &Path, result: &mut BookAlignmentResult) -> Result<()> {
        let item = catalog_item_for(book_dir, &self.batch).await?;
        result.item = Some(item.clone());

        let local = load_local_chapters(&book_dir.join(&self.batch.local_file)).await?;
        result.local_chapters = local.len();

        let remote = fetch_or_empty(self.catalog.as_ref(), &item).await;
        result.catalog_chapters = remote.len();

        debug!(
            "Aligning {} ({}): {} local / {} catalog chapters",
            item.asin,
            item.region,
            local.len(),
            remote.len()
        );

        result.status = if remote.is_empty() {
            ProcessingStatus::Unmatched
        } else {
            ProcessingStatus::Aligned
        };
        result.result = Some(self.aligner.align(&local, &remote));

        Ok(())
    }
}

/// Directories under `root` that contain `local_file`, sorted
pub fn discover_books(root: &Path, local_file: &str) -> Vec<PathBuf> {
    let mut book_dirs: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == local_file)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();

    book_dirs.sort();
    book_dirs
}

/// Catalog item from the book manifest, else the directory name in the
/// default region
pub async fn catalog_item_for(book_dir: &Path, batch: &BatchConfig) -> Result<CatalogItem> {
    let manifest_path = book_dir.join(&batch.manifest_file);

    if tokio::fs::try_exists(&manifest_path).await.unwrap_or(false) {
        let content = tokio::fs::read_to_string(&manifest_path)
            .await
            .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
        let manifest: BookManifest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid manifest {}", manifest_path.display()))?;

        let mut item = CatalogItem::new(
            manifest.asin,
            manifest.region.unwrap_or_else(|| batch.default_region.clone()),
        );
        item.locale = manifest.locale;
        return Ok(item);
    }

    let asin = book_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Cannot derive a catalog id from {}", book_dir.display()))?;

    Ok(CatalogItem::new(asin, batch.default_region.clone()))
}

#[derive(Debug, Clone)]
pub struct ProcessingStats {
    pub max_workers: usize,
    pub available_permits: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_batch_processor_creation() {
        let config = ConfigBuilder::new().with_workers(4).build();
        let processor = BatchProcessor::new(config).unwrap();

        let stats = processor.get_stats();
        assert_eq!(stats.max_workers, 4);
        assert_eq!(stats.available_permits, 4);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ConfigBuilder::new().with_time_window_ms(0).build();
        assert!(BatchProcessor::new(config).is_err());
    }

    #[tokio::test]
    async fn test_empty_directory_processing() {
        let temp_dir = TempDir::new().unwrap();
        let processor = BatchProcessor::new(Config::default()).unwrap();

        let summary = processor.process_directory(temp_dir.path()).await.unwrap();

        assert_eq!(summary.total, 0);
        assert_eq!(summary.aligned, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_catalog_item_from_manifest_and_dir_name() {
        let temp_dir = TempDir::new().unwrap();
        let batch = BatchConfig::default();

        let plain = temp_dir.path().join("B00PLAIN");
        tokio::fs::create_dir_all(&plain).await.unwrap();
        let item = catalog_item_for(&plain, &batch).await.unwrap();
        assert_eq!(item, CatalogItem::new("B00PLAIN", "us"));

        let with_manifest = temp_dir.path().join("some-book");
        tokio::fs::create_dir_all(&with_manifest).await.unwrap();
        tokio::fs::write(
            with_manifest.join("book.json"),
            r#"{"asin": "B00MANIFEST", "region": "uk", "locale": "en-GB"}"#,
        )
        .await
        .unwrap();
        let item = catalog_item_for(&with_manifest, &batch).await.unwrap();
        assert_eq!(item, CatalogItem::new("B00MANIFEST", "uk").with_locale("en-GB"));
    }

    #[test]
    fn test_discover_books() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("author/B002")).unwrap();
        std::fs::create_dir_all(root.join("B001")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("author/B002/chapters.json"), "[]").unwrap();
        std::fs::write(root.join("B001/chapters.json"), "[]").unwrap();

        let books = discover_books(root, "chapters.json");
        assert_eq!(books, vec![root.join("B001"), root.join("author/B002")]);
    }
}
