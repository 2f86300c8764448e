/// Catalog sources that supply the remote chapter list for a book
use super::files::load_remote_chapters;
use super::RemoteChapter;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Identifies a book in a regional catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    /// Catalog item identifier
    pub asin: String,
    /// Regional catalog, e.g. "us", "uk", "de"
    pub region: String,
    /// Preferred locale for titles
    #[serde(default)]
    pub locale: Option<String>,
}

impl CatalogItem {
    pub fn new(asin: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            asin: asin.into(),
            region: region.into(),
            locale: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Trait for catalog chapter providers
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_chapters(&self, item: &CatalogItem) -> Result<Vec<RemoteChapter>>;
    async fn is_available(&self) -> bool;
    fn source_name(&self) -> &str;
}

/// Fetch catalog chapters, degrading any failure to an empty list.
///
/// The aligner treats an empty catalog list as "nothing matched", which is
/// the intended outcome when a lookup fails.
pub async fn fetch_or_empty(source: &dyn CatalogSource, item: &CatalogItem) -> Vec<RemoteChapter> {
    match source.fetch_chapters(item).await {
        Ok(chapters) => {
            if chapters.is_empty() {
                warn!("⚠️ {} returned no chapters for {}", source.source_name(), item.asin);
            }
            chapters
        }
        Err(e) => {
            warn!("❌ Catalog lookup failed for {} ({}): {}", item.asin, item.region, e);
            Vec::new()
        }
    }
}

/// Catalog exports stored on disk as `<root>/<region>/<asin>[.<locale>].json`
#[derive(Debug, Clone)]
pub struct FileCatalog {
    root: PathBuf,
}

impl FileCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate export paths, locale-specific first
    pub fn candidate_paths(&self, item: &CatalogItem) -> Vec<PathBuf> {
        let region_dir = self.root.join(item.region.to_lowercase());
        let mut paths = Vec::with_capacity(2);
        if let Some(locale) = &item.locale {
            paths.push(region_dir.join(format!("{}.{}.json", item.asin, locale)));
        }
        paths.push(region_dir.join(format!("{}.json", item.asin)));
        paths
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn fetch_chapters(&self, item: &CatalogItem) -> Result<Vec<RemoteChapter>> {
        for path in self.candidate_paths(item) {
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                debug!("Reading catalog export {}", path.display());
                let chapters = load_remote_chapters(&path).await?;
                info!("📚 Loaded {} catalog chapters for {}", chapters.len(), item.asin);
                return Ok(chapters);
            }
        }

        Err(anyhow!(
            "No catalog export for {} in region {} under {}",
            item.asin,
            item.region,
            self.root.display()
        ))
    }

    async fn is_available(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    fn source_name(&self) -> &str {
        "file catalog"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::fs;

    #[test]
    fn test_candidate_paths() {
        let catalog = FileCatalog::new("/catalog");
        let item = CatalogItem::new("B00TEST", "UK").with_locale("en-GB");

        let paths = catalog.candidate_paths(&item);
        assert_eq!(paths[0], PathBuf::from("/catalog/uk/B00TEST.en-GB.json"));
        assert_eq!(paths[1], PathBuf::from("/catalog/uk/B00TEST.json"));
    }

    #[tokio::test]
    async fn test_file_catalog_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let region_dir = temp_dir.path().join("us");
        fs::create_dir_all(&region_dir).await.unwrap();
        fs::write(
            region_dir.join("B00TEST.json"),
            r#"[{"title": "Opening Credits", "start_ms": 0, "duration_ms": 20000}]"#,
        )
        .await
        .unwrap();

        let catalog = FileCatalog::new(temp_dir.path());
        assert!(catalog.is_available().await);

        let chapters = catalog
            .fetch_chapters(&CatalogItem::new("B00TEST", "us"))
            .await
            .unwrap();
        assert_eq!(chapters, vec![RemoteChapter::new("Opening Credits", 0, 20_000)]);
    }

    #[tokio::test]
    async fn test_missing_export_degrades_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = FileCatalog::new(temp_dir.path());
        let item = CatalogItem::new("B00MISSING", "de");

        assert!(catalog.fetch_chapters(&item).await.is_err());
        assert!(fetch_or_empty(&catalog, &item).await.is_empty());
    }
}
