//! Error types for docmerge.
//!
//! Every failure a merge or document operation can produce maps to exactly one
//! variant of [`DocMergeError`]. Variants carry enough context to produce an
//! actionable message for the caller.
//!
//! # Error Categories
//!
//! - **Merge taxonomy**: insufficient inputs, unreadable sources, decode
//!   failures, write failures, unauthorized references
//! - **Document errors**: unknown documents, missing files, rejected uploads
//! - **Configuration errors**: invalid settings
//! - **Storage errors**: database faults surfaced at the process boundary

use std::io;
use std::path::PathBuf;

use crate::model::{DocumentId, MergeKind};

/// Result type alias for docmerge operations.
pub type Result<T> = std::result::Result<T, DocMergeError>;

/// Main error type for docmerge operations.
#[derive(Debug, thiserror::Error)]
pub enum DocMergeError {
    /// Fewer than two authorized, type-matching, present source files.
    #[error("Not enough {kind} files to merge: {found} valid file(s), at least 2 required")]
    InsufficientInputs {
        /// Requested merge kind.
        kind: MergeKind,
        /// Number of sources that survived filtering.
        found: usize,
    },

    /// A stored document's backing file is missing from disk.
    #[error("Source file is missing from storage: {}", .path.display())]
    SourceUnreadable {
        /// Resolved on-disk path of the missing file.
        path: PathBuf,
    },

    /// A source could not be decoded as the requested format.
    #[error("Merge operation failed for {}\n  Reason: {reason}", .path.display())]
    MergeFailed {
        /// Source (or output) path involved in the failure.
        path: PathBuf,
        /// Decoder or merger message.
        reason: String,
    },

    /// The merged output could not be written.
    #[error("Failed to write output file: {}\n  Reason: {source}", .path.display())]
    WriteFailed {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The caller referenced a document outside their ownership scope.
    #[error("Document {id} is not accessible to the current user")]
    Unauthorized {
        /// Requested document id.
        id: DocumentId,
    },

    /// No document with this id is visible to the caller.
    #[error("Document not found or not authorized: {id}")]
    DocumentNotFound {
        /// Requested document id.
        id: DocumentId,
    },

    /// A document record exists but its file does not.
    #[error("File not found on server: {}", .path.display())]
    FileNotFound {
        /// Expected on-disk path.
        path: PathBuf,
    },

    /// Uploaded file has an extension outside the accepted set.
    #[error("Invalid file type: {}\n  Only .xlsx, .pdf, and .docx are allowed", .path.display())]
    UnsupportedFileType {
        /// Offending path.
        path: PathBuf,
    },

    /// No account with this username.
    #[error("Unknown user: {username}")]
    UserNotFound {
        /// Requested username.
        username: String,
    },

    /// An account with this username already exists.
    #[error("Username already taken: {username}")]
    UsernameTaken {
        /// Requested username.
        username: String,
    },

    /// Invalid configuration or request arguments.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what is wrong.
        message: String,
    },

    /// Database failure.
    #[error("Storage error: {source}")]
    Storage {
        /// Underlying database error.
        #[from]
        source: sqlx::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },
}

impl DocMergeError {
    /// Create an InsufficientInputs error.
    pub fn insufficient_inputs(kind: MergeKind, found: usize) -> Self {
        Self::InsufficientInputs { kind, found }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a WriteFailed error.
    pub fn write_failed(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Check if this error only excludes a single source from a merge.
    ///
    /// Recoverable errors are logged and the source is dropped; the merge
    /// continues as long as two sources remain.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnreadable { .. } | Self::Unauthorized { .. }
        )
    }

    /// Caller-facing reason, free of paths and internal details.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientInputs { kind, .. } => {
                format!("Please select at least 2 valid {} files to merge", kind.label())
            }
            Self::SourceUnreadable { .. } => "Some selected files are not found on server".into(),
            Self::MergeFailed { .. } => "Merge failed: a selected file could not be read".into(),
            Self::WriteFailed { .. } => "Merge failed: the merged file could not be saved".into(),
            Self::Unauthorized { .. } | Self::DocumentNotFound { .. } => {
                "Document not found or not authorized.".into()
            }
            Self::FileNotFound { .. } => "File not found on server.".into(),
            Self::UnsupportedFileType { .. } => {
                "Invalid file type. Only .xlsx, .pdf, and .docx are allowed.".into()
            }
            Self::UserNotFound { .. } => "Not authorized.".into(),
            Self::UsernameTaken { username } => format!("Username '{username}' is already taken"),
            Self::InvalidConfig { message } => message.clone(),
            Self::Storage { .. } | Self::Io { .. } => "Server error.".into(),
        }
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InsufficientInputs { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::UsernameTaken { .. } => 1,
            Self::UnsupportedFileType { .. } => 1,
            Self::SourceUnreadable { .. } => 2,
            Self::FileNotFound { .. } => 2,
            Self::DocumentNotFound { .. } => 2,
            Self::MergeFailed { .. } => 3,
            Self::Unauthorized { .. } => 4,
            Self::UserNotFound { .. } => 4,
            Self::WriteFailed { .. } => 5,
            Self::Io { .. } => 5,
            Self::Storage { .. } => 6,
        }
    }
}
