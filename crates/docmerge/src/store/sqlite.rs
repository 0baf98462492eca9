//! SQLite-backed [`DocumentStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use uuid::Uuid;

use super::DocumentStore;
use crate::config::Config;
use crate::error::{DocMergeError, Result};
use crate::model::{Actor, Document, DocumentId, MergeKind, NewDocument, Role, User};

static SCHEMA: &str = include_str!("schema.sql");

const MAX_CONNECTIONS: u32 = 5;

/// Document and user storage in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DocMergeError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            username: row.username,
            role: row.role.parse()?,
            created_at: row.created_at,
        })
    }
}

impl SqliteStore {
    /// Open the database named by `config.database_url`.
    pub async fn open(config: &Config) -> Result<Self> {
        Self::connect(&config.database_url).await
    }

    /// Open a database by connection URL, creating it if missing.
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database is a separate database.
        let max_connections = if url.contains(":memory:") {
            1
        } else {
            MAX_CONNECTIONS
        };

        Self::with_options(opts, max_connections).await
    }

    /// Open a database file, creating it if missing.
    pub async fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(30));

        Self::with_options(opts, MAX_CONNECTIONS).await
    }

    async fn with_options(opts: SqliteConnectOptions, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        sqlx::query(SCHEMA).execute(&pool).await?;
        debug!("database schema applied");

        Ok(Self { pool })
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Create a user account.
    ///
    /// The password is stored as a salted SHA-256 digest.
    pub async fn create_user(&self, username: &str, password: &str, role: Role) -> Result<User> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, password, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(hash_password(password))
        .bind(role.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        info!(username, role = %role, "created user");

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            role,
            created_at,
        })
    }

    /// Look up a user by name.
    pub async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, role, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create the first admin account unless an admin already exists.
    ///
    /// Returns whether an account was created.
    ///
    /// # Errors
    ///
    /// Returns [`DocMergeError::UsernameTaken`] if no admin exists yet but
    /// `username` belongs to a non-admin account.
    pub async fn provision_admin(&self, username: &str, password: &str) -> Result<bool> {
        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?")
            .bind(Role::Admin.as_str())
            .fetch_one(&self.pool)
            .await?;
        if admins > 0 {
            debug!("admin account already provisioned");
            return Ok(false);
        }

        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (username, password, role, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(username)
        .bind(hash_password(password))
        .bind(Role::Admin.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DocMergeError::UsernameTaken {
                username: username.to_string(),
            });
        }
        info!(username, "provisioned admin account");
        Ok(true)
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_document(&self, id: DocumentId, actor: &Actor) -> Result<Option<Document>> {
        let document = sqlx::query_as(
            "SELECT * FROM documents WHERE id = ? AND (? OR user_id = ?)",
        )
        .bind(id)
        .bind(actor.is_admin())
        .bind(actor.user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(document)
    }

    async fn list_documents(&self, actor: &Actor) -> Result<Vec<Document>> {
        // Ids are assigned in insertion order, so id order is creation order.
        let documents = sqlx::query_as(
            "SELECT * FROM documents WHERE (? OR user_id = ?) ORDER BY id DESC",
        )
        .bind(actor.is_admin())
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn list_paths(&self, kind: MergeKind, actor: &Actor) -> Result<Vec<String>> {
        let clauses = vec!["LOWER(file_path) LIKE ?"; kind.extensions().len()].join(" OR ");
        let sql = format!(
            "SELECT file_path FROM documents WHERE (? OR user_id = ?) AND ({clauses}) ORDER BY id DESC"
        );

        let mut query = sqlx::query_scalar::<_, String>(&sql)
            .bind(actor.is_admin())
            .bind(actor.user_id);
        for ext in kind.extensions() {
            query = query.bind(format!("%.{ext}"));
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn insert_document(&self, document: NewDocument) -> Result<DocumentId> {
        let result = sqlx::query(
            "INSERT INTO documents (title, description, file_path, user_id, session, semester, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&document.title)
        .bind(&document.description)
        .bind(&document.file_path)
        .bind(document.user_id)
        .bind(&document.session)
        .bind(&document.semester)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn update_classification(
        &self,
        id: DocumentId,
        session: Option<String>,
        semester: Option<String>,
        actor: &Actor,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE documents SET session = COALESCE(?, session), semester = COALESCE(?, semester)
             WHERE id = ? AND (? OR user_id = ?)",
        )
        .bind(session)
        .bind(semester)
        .bind(id)
        .bind(actor.is_admin())
        .bind(actor.user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_document(&self, id: DocumentId, actor: &Actor) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ? AND (? OR user_id = ?)")
            .bind(id)
            .bind(actor.is_admin())
            .bind(actor.user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// `sha256$<salt>$<hex digest of salt || password>`.
fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    format!("sha256${salt}${}", hex::encode(digest))
}
