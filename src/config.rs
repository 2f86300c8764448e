use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::chapters::AlignmentError;

/// Default window beyond which two chapter starts are considered unrelated
pub const DEFAULT_TIME_WINDOW_MS: u64 = 30_000;
/// Default weight of temporal proximity in the pair cost
pub const DEFAULT_WEIGHT_TIME: f64 = 0.6;
/// Default weight of title similarity in the pair cost
pub const DEFAULT_WEIGHT_TEXT: f64 = 0.4;
/// Default cost of leaving a local chapter unmatched
pub const DEFAULT_INSERT_COST: f64 = 0.7;
/// Default cost of leaving a catalog chapter unmatched
pub const DEFAULT_DELETE_COST: f64 = 0.7;
/// Default placeholder fraction at which a book needs new titles
pub const DEFAULT_NEEDS_UPDATE_THRESHOLD: f64 = 0.5;

/// Configuration for the Chapter Aligner tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Alignment engine tuning
    pub alignment: AlignmentConfig,

    /// Batch processing settings
    pub batch: BatchConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

/// Tuning constants for the alignment engine.
///
/// Every field is optional in configuration files; missing values fall back
/// to the defaults above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Offset (ms) at which temporal similarity reaches zero
    pub time_window_ms: u64,

    /// Weight of temporal similarity
    pub weight_time: f64,

    /// Weight of title similarity
    pub weight_text: f64,

    /// Cost of a local chapter with no catalog counterpart
    pub insert_cost: f64,

    /// Cost of a catalog chapter with no local counterpart
    pub delete_cost: f64,

    /// Placeholder fraction that triggers `needs_update`
    pub needs_update_threshold: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            time_window_ms: DEFAULT_TIME_WINDOW_MS,
            weight_time: DEFAULT_WEIGHT_TIME,
            weight_text: DEFAULT_WEIGHT_TEXT,
            insert_cost: DEFAULT_INSERT_COST,
            delete_cost: DEFAULT_DELETE_COST,
            needs_update_threshold: DEFAULT_NEEDS_UPDATE_THRESHOLD,
        }
    }
}

impl AlignmentConfig {
    /// Reject values that make pair costs meaningless
    pub fn validate(&self) -> std::result::Result<(), AlignmentError> {
        if self.time_window_ms == 0 {
            return Err(AlignmentError::InvalidConfig(
                "time_window_ms must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [("weight_time", self.weight_time), ("weight_text", self.weight_text)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AlignmentError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.weight_time + self.weight_text <= 0.0 {
            return Err(AlignmentError::InvalidConfig(
                "weight_time and weight_text cannot both be 0".to_string(),
            ));
        }

        for (name, value) in [("insert_cost", self.insert_cost), ("delete_cost", self.delete_cost)] {
            if !value.is_finite() || value < 0.0 {
                return Err(AlignmentError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.needs_update_threshold) {
            return Err(AlignmentError::InvalidConfig(format!(
                "needs_update_threshold must be within [0, 1], got {}",
                self.needs_update_threshold
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of books aligned concurrently
    pub max_workers: usize,

    /// Local chapter file expected in every book directory
    pub local_file: String,

    /// Optional per-book manifest naming the catalog item
    pub manifest_file: String,

    /// Directory holding catalog exports as `<region>/<asin>.json`
    pub catalog_dir: Option<PathBuf>,

    /// Region used when a book has no manifest
    pub default_region: String,

    /// Results file written to the batch root
    pub results_file: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get().min(8), // Use available cores, max 8
            local_file: "chapters.json".to_string(),
            manifest_file: "book.json".to_string(),
            catalog_dir: None,
            default_region: "us".to_string(),
            results_file: "alignment_results.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Log level used when RUST_LOG is not set
    pub log_level: String,

    /// Report format for single-book commands
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Config {
    /// Load configuration from the first config file found, or from the
    /// environment when there is none. A config file that exists but does
    /// not parse is an error.
    pub fn load() -> Result<Self> {
        // Try to load from various locations
        let mut config_paths = vec![
            PathBuf::from("chapter-aligner.toml"),
            PathBuf::from("config/chapter-aligner.toml"),
        ];
        if let Ok(home) = std::env::var("HOME") {
            config_paths.push(PathBuf::from(home).join(".config/chapter-aligner/config.toml"));
        }
        config_paths.push(PathBuf::from("/etc/chapter-aligner/config.toml"));

        Self::load_first(&config_paths)
    }

    /// Load the first existing file among `paths`
    pub fn load_first(paths: &[PathBuf]) -> Result<Self> {
        for path in paths {
            if path.is_file() {
                return Self::from_file(path);
            }
        }

        tracing::info!("📄 No configuration file found, using defaults");
        Ok(Self::from_env())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Cannot read config file {}: {}", path.display(), e))?;
        let config: Config = toml::from_str(&config_str)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config.with_env_overrides())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Override fields with environment variables
    fn with_env_overrides(mut self) -> Self {
        if let Ok(workers) = std::env::var("CHAPTER_ALIGNER_WORKERS") {
            match workers.parse() {
                Ok(workers) => self.batch.max_workers = workers,
                Err(_) => tracing::warn!("Ignoring invalid CHAPTER_ALIGNER_WORKERS: {}", workers),
            }
        }

        if let Ok(window) = std::env::var("CHAPTER_ALIGNER_TIME_WINDOW_MS") {
            match window.parse() {
                Ok(window) => self.alignment.time_window_ms = window,
                Err(_) => tracing::warn!("Ignoring invalid CHAPTER_ALIGNER_TIME_WINDOW_MS: {}", window),
            }
        }

        if let Ok(log_level) = std::env::var("CHAPTER_ALIGNER_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        self
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.alignment.validate()?;

        if self.batch.max_workers == 0 {
            return Err(anyhow!("max_workers must be greater than 0"));
        }

        if self.batch.local_file.trim().is_empty() {
            return Err(anyhow!("local_file cannot be empty"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Chapter Aligner Configuration:\n\
            - Time Window: {}ms\n\
            - Weights: time {:.2} / text {:.2}\n\
            - Unmatched Costs: insert {:.2} / delete {:.2}\n\
            - Placeholder Threshold: {:.2}\n\
            - Workers: {}\n\
            - Local Chapter File: {}\n\
            - Output Format: {:?}",
            self.alignment.time_window_ms,
            self.alignment.weight_time,
            self.alignment.weight_text,
            self.alignment.insert_cost,
            self.alignment.delete_cost,
            self.alignment.needs_update_threshold,
            self.batch.max_workers,
            self.batch.local_file,
            self.output.format
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.batch.max_workers = workers;
        self
    }

    pub fn with_time_window_ms(mut self, window: u64) -> Self {
        self.config.alignment.time_window_ms = window;
        self
    }

    pub fn with_weights(mut self, weight_time: f64, weight_text: f64) -> Self {
        self.config.alignment.weight_time = weight_time;
        self.config.alignment.weight_text = weight_text;
        self
    }

    pub fn with_unmatched_costs(mut self, insert_cost: f64, delete_cost: f64) -> Self {
        self.config.alignment.insert_cost = insert_cost;
        self.config.alignment.delete_cost = delete_cost;
        self
    }

    pub fn with_needs_update_threshold(mut self, threshold: f64) -> Self {
        self.config.alignment.needs_update_threshold = threshold;
        self
    }

    pub fn with_catalog_dir(mut self, dir: PathBuf) -> Self {
        self.config.batch.catalog_dir = Some(dir);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
