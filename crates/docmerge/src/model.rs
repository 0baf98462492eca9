//! Core data types: documents, users, merge kinds and cell values.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::DocMergeError;

/// Identifier of a stored document.
pub type DocumentId = i64;

/// Identifier of a user account.
pub type UserId = i64;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
    /// Full access to every document.
    Admin,
    /// Office staff; sees own documents only.
    #[serde(rename = "Office User")]
    OfficeUser,
    /// Faculty member; sees own documents only.
    Faculty,
}

impl Role {
    /// Stored representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::OfficeUser => "Office User",
            Self::Faculty => "Faculty",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DocMergeError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "office user" | "office-user" | "office" => Ok(Self::OfficeUser),
            "faculty" => Ok(Self::Faculty),
            _ => Err(DocMergeError::invalid_config(format!(
                "Invalid role: {s}. Must be one of: Admin, Office User, Faculty"
            ))),
        }
    }
}

/// The acting user's identity and authorization scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user's id.
    pub user_id: UserId,
    /// Acting user's role.
    pub role: Role,
}

impl Actor {
    /// Create an actor.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Whether ownership checks are bypassed.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Whether this actor may read a document owned by `owner`.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id == owner
    }
}

/// A user account, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Account id.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Account role.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Authorization scope for requests made by this user.
    pub fn actor(&self) -> Actor {
        Actor::new(self.id, self.role)
    }
}

/// A persisted reference to a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Document {
    /// Unique id.
    pub id: DocumentId,
    /// Display title.
    pub title: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Storage path relative to the working root. Immutable.
    pub file_path: String,
    /// Owning user.
    pub user_id: UserId,
    /// Optional session classification.
    pub session: Option<String>,
    /// Optional semester classification.
    pub semester: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a document record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    /// Display title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Storage path relative to the working root.
    pub file_path: String,
    /// Owning user.
    pub user_id: UserId,
    /// Optional session classification.
    pub session: Option<String>,
    /// Optional semester classification.
    pub semester: Option<String>,
}

impl NewDocument {
    /// Record for a freshly merged artifact.
    pub fn merged(kind: MergeKind, file_path: impl Into<String>, owner: UserId) -> Self {
        Self {
            title: kind.merged_title().to_string(),
            description: Some(kind.merged_description().to_string()),
            file_path: file_path.into(),
            user_id: owner,
            session: None,
            semester: None,
        }
    }
}

/// Which merger and extension filter apply to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeKind {
    /// Tabular workbooks (`.xlsx`, `.xls`).
    Spreadsheet,
    /// PDF documents.
    Pdf,
}

impl MergeKind {
    /// Accepted source extensions, lowercase.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Spreadsheet => &["xlsx", "xls"],
            Self::Pdf => &["pdf"],
        }
    }

    /// Extension of the merged output.
    pub fn output_extension(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    /// Case-insensitive extension check against [`Self::extensions`].
    pub fn matches_path(&self, path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }

    /// Short label used in user-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "Excel",
            Self::Pdf => "PDF",
        }
    }

    /// Title given to merged documents.
    pub fn merged_title(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "Merged Excel",
            Self::Pdf => "Merged PDF",
        }
    }

    /// Description given to merged documents.
    pub fn merged_description(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "Auto-merged Excel file",
            Self::Pdf => "Auto-merged PDF file",
        }
    }
}

impl fmt::Display for MergeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MergeKind {
    type Err = DocMergeError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "spreadsheet" | "excel" | "xlsx" => Ok(Self::Spreadsheet),
            "pdf" => Ok(Self::Pdf),
            _ => Err(DocMergeError::invalid_config(format!(
                "Invalid merge kind: {s}. Must be one of: spreadsheet, pdf"
            ))),
        }
    }
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// String content.
    Text(String),
    /// Integer or floating point content.
    Number(f64),
    /// Date or date-time content.
    Date(NaiveDateTime),
    /// Blank cell.
    Empty,
}

impl CellValue {
    /// Text cell; blank strings collapse to [`CellValue::Empty`].
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }

    /// Whether the cell is blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Date(dt) => {
                if dt.num_seconds_from_midnight() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            Self::Empty => Ok(()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => serializer.serialize_f64(*n),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Integral values print without a fractional part.
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// One data row: column header to cell value, in the source's column order.
pub type Row = IndexMap<String, CellValue>;

/// Result of a successful merge, returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutcome {
    /// Id of the new document record.
    pub id: DocumentId,
    /// Stored (relative) path of the merged file.
    pub path: String,
    /// Kind of merge performed.
    pub kind: MergeKind,
    /// Number of sources merged.
    pub sources: usize,
    /// Rows (spreadsheet) or pages (PDF) in the output.
    pub items: usize,
}
