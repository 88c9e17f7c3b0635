//! Storage module for persisting audit data
//!
//! This module handles all database operations for the audit engine,
//! including:
//! - SQLite database initialization and schema management
//! - Audit lifecycle records and scores
//! - Crawl state snapshots for batch resumption
//! - Crawled page signals and check results

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::AuditError;
use std::collections::BTreeMap;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(AuditError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, AuditError> {
    SqliteStorage::new(path)
}

/// Represents an audit in the database
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub id: i64,
    /// Normalized root URL of the audited site
    pub domain: String,
    pub brand_name: Option<String>,
    pub business_type: Option<String>,
    pub crawl_limit: u32,
    pub status: AuditStatus,
    pub overall_score: Option<f64>,
    pub module_scores: BTreeMap<String, f64>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields needed to create a new audit row
#[derive(Debug, Clone)]
pub struct NewAudit<'a> {
    pub domain: &'a str,
    pub brand_name: Option<&'a str>,
    pub business_type: Option<&'a str>,
    pub crawl_limit: u32,
}

/// Lifecycle status of an audit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl AuditStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
