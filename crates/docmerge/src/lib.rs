//! docmerge - Role-scoped document storage with spreadsheet and PDF merging.
//!
//! This library keeps a catalog of uploaded documents and merges several of
//! them into a new one:
//!
//! - Spreadsheet merging (`.xlsx`, `.xls`): first-sheet rows concatenated
//!   under the union of their headers
//! - PDF merging: pages concatenated in request order
//! - Owner-scoped access, with an admin override
//! - Upload, download, classification and deletion of stored documents
//!
//! # Examples
//!
//! ## Merging
//!
//! ```no_run
//! use docmerge::service::MergeService;
//! use docmerge::store::SqliteStore;
//! use docmerge::Config;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::rooted_at("/srv/documents");
//! let store = Arc::new(SqliteStore::open(&config).await?);
//!
//! let user = store.find_user("alice").await?.ok_or("no such user")?;
//! let service = MergeService::new(store.clone(), config);
//!
//! let outcome = service.merge_pdfs(&[3, 7], &user.actor()).await?;
//! println!("Merged {} pages into {}", outcome.items, outcome.path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use docmerge::io::{PdfReader, PdfWriter};
//! use docmerge::merge::PdfMerger;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (results, _stats) = reader.load_all(&paths, 2).await;
//! let sources = results.into_iter().collect::<Result<Vec<_>, _>>()?;
//!
//! let merged = PdfMerger::new().merge(sources)?;
//! PdfWriter::new()
//!     .save(merged.document, &PathBuf::from("merged.pdf"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod library;
pub mod merge;
pub mod model;
pub mod service;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{DocMergeError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
