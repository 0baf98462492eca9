//! Configuration module for docmerge.
//!
//! [`Config`] carries everything the library needs from the process
//! environment: where stored paths are rooted, where uploads and merged files
//! land, how to reach the database, and how merged output is produced. The
//! CLI builds it from flags and environment variables; tests build it
//! directly around a temporary directory.

use anyhow::{Result, bail};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::DocMergeError;

/// Default upload directory, relative to the working root.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Default SQLite database location.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://docmerge.db";

/// Default file name prefix for merged output.
pub const DEFAULT_MERGED_PREFIX: &str = "merged";

/// Compression level for merged PDF output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Streams are written as they were read.
    None,
    /// Compress uncompressed streams.
    #[default]
    Standard,
    /// Compress and prune unreachable objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = DocMergeError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(DocMergeError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Complete configuration for document storage and merging.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that stored document paths are relative to.
    pub working_root: PathBuf,

    /// Upload directory, relative to `working_root`.
    pub upload_dir: PathBuf,

    /// SQLite connection string.
    pub database_url: String,

    /// File name prefix for merged output.
    pub merged_prefix: String,

    /// Number of sources read concurrently (None = CPU count).
    pub jobs: Option<usize>,

    /// Compression applied to merged PDFs.
    pub compression: CompressionLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_root: PathBuf::from("."),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            merged_prefix: DEFAULT_MERGED_PREFIX.to_string(),
            jobs: None,
            compression: CompressionLevel::Standard,
        }
    }
}

impl Config {
    /// Configuration rooted at `working_root` with default settings.
    pub fn rooted_at(working_root: impl Into<PathBuf>) -> Self {
        Self {
            working_root: working_root.into(),
            ..Default::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The merged file prefix is empty or contains a path separator
    /// - Jobs count is zero
    /// - The upload directory is absolute or escapes the working root
    /// - The database URL is empty
    pub fn validate(&self) -> Result<()> {
        if self.merged_prefix.trim().is_empty() {
            bail!("Merged file prefix cannot be empty");
        }

        if self.merged_prefix.contains(['/', '\\']) {
            bail!(
                "Merged file prefix cannot contain path separators: {}",
                self.merged_prefix
            );
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        if self.upload_dir.is_absolute() {
            bail!(
                "Upload directory must be relative to the working root: {}",
                self.upload_dir.display()
            );
        }

        if self
            .upload_dir
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            bail!(
                "Upload directory cannot leave the working root: {}",
                self.upload_dir.display()
            );
        }

        if self.database_url.trim().is_empty() {
            bail!("Database URL cannot be empty");
        }

        Ok(())
    }

    /// Absolute (or cwd-relative) directory where files are written.
    pub fn upload_root(&self) -> PathBuf {
        self.working_root.join(&self.upload_dir)
    }

    /// Map a stored document path onto the filesystem.
    pub fn resolve(&self, stored: impl AsRef<Path>) -> PathBuf {
        let stored = stored.as_ref();
        if stored.is_absolute() {
            stored.to_path_buf()
        } else {
            self.working_root.join(stored)
        }
    }

    /// Stored path for a file named `file_name` inside the upload directory.
    pub fn stored_path(&self, file_name: &str) -> String {
        self.upload_dir.join(file_name).to_string_lossy().into_owned()
    }

    /// Get the effective number of concurrent source reads.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
