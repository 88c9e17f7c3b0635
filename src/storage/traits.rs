//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::checks::CheckResult;
use crate::crawler::{CrawlState, PageRecord};
use crate::storage::{AuditRecord, AuditStatus, NewAudit};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Audit not found: {0}")]
    AuditNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the audit engine.
pub trait Storage {
    // ===== Audit Management =====

    /// Creates a new audit in the `pending` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created audit
    fn create_audit(&mut self, audit: &NewAudit) -> StorageResult<i64>;

    /// Gets an audit by ID
    fn get_audit(&self, audit_id: i64) -> StorageResult<AuditRecord>;

    /// Updates the lifecycle status of an audit
    fn update_audit_status(&mut self, audit_id: i64, status: AuditStatus) -> StorageResult<()>;

    /// Stores computed scores on the audit row
    fn update_audit_scores(
        &mut self,
        audit_id: i64,
        overall: f64,
        modules: &BTreeMap<String, f64>,
    ) -> StorageResult<()>;

    // ===== Crawl State =====

    /// Saves the crawl state snapshot, replacing any previous snapshot
    fn save_crawl_state(&mut self, audit_id: i64, state: &CrawlState) -> StorageResult<()>;

    /// Loads the crawl state snapshot, if one exists
    fn load_crawl_state(&self, audit_id: i64) -> StorageResult<Option<CrawlState>>;

    // ===== Pages =====

    /// Appends crawled pages for an audit
    ///
    /// A page that was already stored for this audit keeps its first
    /// recorded signals.
    fn append_pages(&mut self, audit_id: i64, pages: &[PageRecord]) -> StorageResult<()>;

    /// Loads all pages for an audit in insertion order
    fn load_pages(&self, audit_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Counts crawled pages for an audit
    fn count_pages(&self, audit_id: i64) -> StorageResult<u64>;

    // ===== Check Results =====

    /// Inserts or overwrites check results for an audit
    ///
    /// Keyed by (audit_id, key), so rescoring replaces earlier results
    /// instead of accumulating duplicates.
    fn upsert_checks(&mut self, audit_id: i64, results: &[CheckResult]) -> StorageResult<()>;

    /// Loads all stored check results for an audit in catalog order
    fn load_checks(&self, audit_id: i64) -> StorageResult<Vec<CheckResult>>;
}
