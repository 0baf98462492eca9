//! Document record storage.
//!
//! [`DocumentStore`] is the seam between the library and its database. Every
//! read and mutation takes the acting user's [`Actor`]: non-admin actors only
//! ever see or change documents they own, and a document outside that scope
//! is indistinguishable from one that does not exist.

pub mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Actor, Document, DocumentId, MergeKind, NewDocument};

/// Persistent store of document records.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Look up a document visible to `actor`.
    async fn find_document(&self, id: DocumentId, actor: &Actor) -> Result<Option<Document>>;

    /// All documents visible to `actor`, newest first.
    async fn list_documents(&self, actor: &Actor) -> Result<Vec<Document>>;

    /// Storage paths of visible documents whose extension matches `kind`.
    async fn list_paths(&self, kind: MergeKind, actor: &Actor) -> Result<Vec<String>>;

    /// Insert a record and return its id.
    async fn insert_document(&self, document: NewDocument) -> Result<DocumentId>;

    /// Set the session and semester of a visible document.
    ///
    /// `None` leaves the existing value in place. Returns whether a record
    /// was updated.
    async fn update_classification(
        &self,
        id: DocumentId,
        session: Option<String>,
        semester: Option<String>,
        actor: &Actor,
    ) -> Result<bool>;

    /// Delete a visible document record. Returns whether a record was removed.
    async fn delete_document(&self, id: DocumentId, actor: &Actor) -> Result<bool>;
}
