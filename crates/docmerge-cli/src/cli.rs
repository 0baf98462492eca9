//! CLI argument parsing for docmerge.
//!
//! This module only depends on `clap` and `std` so the build script can
//! include it to render the man page.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Store department documents and merge spreadsheets or PDFs.
///
/// docmerge keeps a catalog of uploaded documents in a SQLite database and
/// merges several of them into a new document: spreadsheet rows are
/// concatenated under the union of their headers, PDF pages are
/// concatenated in the order given.
#[derive(Parser, Debug)]
#[command(name = "docmerge")]
#[command(version)]
#[command(about = "Store department documents and merge spreadsheets or PDFs", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    ///
    /// RUST_LOG overrides this when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// SQLite database URL
    #[arg(long, value_name = "URL", env = "DOCMERGE_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Directory stored document paths are relative to
    #[arg(long, value_name = "DIR", env = "DOCMERGE_ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Upload directory, relative to the root
    #[arg(long, value_name = "DIR", env = "DOCMERGE_UPLOAD_DIR", global = true)]
    pub upload_dir: Option<PathBuf>,

    /// Number of source files read concurrently
    ///
    /// Default is the number of CPU cores.
    #[arg(short, long, value_name = "N", env = "DOCMERGE_JOBS", global = true)]
    pub jobs: Option<usize>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// The account a command acts as.
#[derive(Args, Debug, Clone)]
pub struct Acting {
    /// Username to act as
    ///
    /// Non-admin users only see and change their own documents.
    #[arg(long = "as", value_name = "USER", env = "DOCMERGE_USER")]
    pub user: String,
}

/// docmerge commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the database and the first admin account
    ///
    /// Safe to run repeatedly: nothing is created once an admin exists.
    Init {
        /// Admin username
        #[arg(long, value_name = "NAME", default_value = "admin")]
        admin_username: String,

        /// Admin password
        #[arg(long, value_name = "PASSWORD", env = "DOCMERGE_ADMIN_PASSWORD")]
        admin_password: String,
    },

    /// Create a user account
    AddUser {
        /// Login name
        #[arg(long, value_name = "NAME")]
        username: String,

        /// Password
        #[arg(long, value_name = "PASSWORD")]
        password: String,

        /// Role of the account
        #[arg(long, value_name = "ROLE", default_value = "Faculty")]
        #[arg(value_parser = ["Admin", "Office User", "Faculty"])]
        role: String,
    },

    /// Upload a .xlsx, .pdf or .docx file
    Upload {
        #[command(flatten)]
        acting: Acting,

        /// Document title
        #[arg(long, value_name = "TEXT")]
        title: String,

        /// Document description
        #[arg(long, value_name = "TEXT")]
        description: Option<String>,

        /// Academic session, e.g. 2024-2026
        #[arg(long, value_name = "TEXT")]
        session: Option<String>,

        /// Semester
        #[arg(long, value_name = "TEXT")]
        semester: Option<String>,

        /// File to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// List documents, newest first
    List {
        #[command(flatten)]
        acting: Acting,

        /// Only list stored paths of one mergeable kind
        #[arg(long, value_name = "KIND")]
        #[arg(value_parser = ["spreadsheet", "pdf"])]
        kind: Option<String>,
    },

    /// Copy a stored document to a local file
    Download {
        #[command(flatten)]
        acting: Acting,

        /// Document id
        #[arg(value_name = "ID")]
        id: i64,

        /// Destination file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Delete a document and its file
    Delete {
        #[command(flatten)]
        acting: Acting,

        /// Document id
        #[arg(value_name = "ID")]
        id: i64,
    },

    /// Set a document's session and semester
    Classify {
        #[command(flatten)]
        acting: Acting,

        /// Document id
        #[arg(value_name = "ID")]
        id: i64,

        /// Academic session
        #[arg(long, value_name = "TEXT")]
        session: Option<String>,

        /// Semester
        #[arg(long, value_name = "TEXT")]
        semester: Option<String>,
    },

    /// Merge spreadsheets into a new document
    ///
    /// Rows from the first sheet of each workbook are concatenated in the
    /// order given. Documents that are not spreadsheets, not visible to the
    /// acting user, or missing from disk are skipped.
    MergeSheets {
        #[command(flatten)]
        acting: Acting,

        /// Document ids to merge, in order
        #[arg(required = true, value_name = "ID")]
        ids: Vec<i64>,
    },

    /// Merge PDFs into a new document
    ///
    /// Pages are concatenated in the order given. Documents that are not
    /// PDFs, not visible to the acting user, or missing from disk are
    /// skipped.
    MergePdfs {
        #[command(flatten)]
        acting: Acting,

        /// Document ids to merge, in order
        #[arg(required = true, value_name = "ID")]
        ids: Vec<i64>,

        /// Compression level for the merged PDF
        ///
        /// - none: streams written as read
        /// - standard: compress streams (default)
        /// - maximum: compress and drop unreachable objects
        #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
        #[arg(value_parser = ["none", "standard", "maximum"])]
        compression: String,
    },
}
