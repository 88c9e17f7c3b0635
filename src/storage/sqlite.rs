//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::checks::{CheckResult, CheckStatus, Evidence, Module, Rating};
use crate::crawler::{CrawlState, PageRecord};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{AuditRecord, AuditStatus, NewAudit};
use crate::AuditError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(AuditError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn audit_from_row(row: &rusqlite::Row) -> rusqlite::Result<AuditRecord> {
        let module_scores: Option<String> = row.get(7)?;
        Ok(AuditRecord {
            id: row.get(0)?,
            domain: row.get(1)?,
            brand_name: row.get(2)?,
            business_type: row.get(3)?,
            crawl_limit: row.get(4)?,
            status: AuditStatus::from_db_string(&row.get::<_, String>(5)?)
                .unwrap_or(AuditStatus::Failed),
            overall_score: row.get(6)?,
            module_scores: module_scores
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or_default(),
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn touch_audit(&self, audit_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE audits SET updated_at = ?1 WHERE id = ?2",
            params![now, audit_id],
        )?;
        Ok(())
    }
}

const AUDIT_COLUMNS: &str = "id, domain, brand_name, business_type, crawl_limit, status, \
                             overall_score, module_scores, created_at, updated_at";

impl Storage for SqliteStorage {
    // ===== Audit Management =====

    fn create_audit(&mut self, audit: &NewAudit) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO audits (domain, brand_name, business_type, crawl_limit, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                audit.domain,
                audit.brand_name,
                audit.business_type,
                audit.crawl_limit,
                AuditStatus::Pending.to_db_string(),
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_audit(&self, audit_id: i64) -> StorageResult<AuditRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM audits WHERE id = ?1", AUDIT_COLUMNS))?;

        stmt.query_row(params![audit_id], Self::audit_from_row)
            .optional()?
            .ok_or(StorageError::AuditNotFound(audit_id))
    }

    fn update_audit_status(&mut self, audit_id: i64, status: AuditStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE audits SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, audit_id],
        )?;
        if changed == 0 {
            return Err(StorageError::AuditNotFound(audit_id));
        }
        Ok(())
    }

    fn update_audit_scores(
        &mut self,
        audit_id: i64,
        overall: f64,
        modules: &BTreeMap<String, f64>,
    ) -> StorageResult<()> {
        let module_json = serde_json::to_string(modules)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let changed = self.conn.execute(
            "UPDATE audits SET overall_score = ?1, module_scores = ?2, updated_at = ?3 WHERE id = ?4",
            params![overall, module_json, now, audit_id],
        )?;
        if changed == 0 {
            return Err(StorageError::AuditNotFound(audit_id));
        }
        Ok(())
    }

    // ===== Crawl State =====

    fn save_crawl_state(&mut self, audit_id: i64, state: &CrawlState) -> StorageResult<()> {
        let snapshot = serde_json::to_string(state)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_states (audit_id, snapshot, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(audit_id) DO UPDATE SET snapshot = ?2, updated_at = ?3",
            params![audit_id, snapshot, now],
        )?;
        Ok(())
    }

    fn load_crawl_state(&self, audit_id: i64) -> StorageResult<Option<CrawlState>> {
        let snapshot: Option<String> = self
            .conn
            .query_row(
                "SELECT snapshot FROM crawl_states WHERE audit_id = ?1",
                params![audit_id],
                |row| row.get(0),
            )
            .optional()?;

        match snapshot {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    // ===== Pages =====

    fn append_pages(&mut self, audit_id: i64, pages: &[PageRecord]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO pages (
                    audit_id, url, status_code, title, h1, meta_description, canonical,
                    noindex, has_schema, schema_types, word_count, image_count,
                    images_with_alt, h1_count, h2_count, h3_count, h4_count, h5_count,
                    h6_count, stylesheet_count, blocking_script_count, modified_at,
                    internal_links, social_links
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                           ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24)",
            )?;
            for page in pages {
                let schema_types = serde_json::to_string(&page.schema_types)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                let internal_links = serde_json::to_string(&page.internal_links)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                let social_links = serde_json::to_string(&page.social_links)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                stmt.execute(params![
                    audit_id,
                    page.url,
                    page.status,
                    page.title,
                    page.h1,
                    page.meta_description,
                    page.canonical,
                    page.noindex,
                    page.has_schema,
                    schema_types,
                    page.word_count,
                    page.image_count,
                    page.images_with_alt,
                    page.heading_counts[0],
                    page.heading_counts[1],
                    page.heading_counts[2],
                    page.heading_counts[3],
                    page.heading_counts[4],
                    page.heading_counts[5],
                    page.stylesheet_count,
                    page.blocking_script_count,
                    page.modified_at.map(|dt| dt.to_rfc3339()),
                    internal_links,
                    social_links,
                ])?;
            }
        }
        tx.commit()?;
        self.touch_audit(audit_id)
    }

    fn load_pages(&self, audit_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, status_code, title, h1, meta_description, canonical, noindex,
                    has_schema, schema_types, word_count, image_count, images_with_alt,
                    h1_count, h2_count, h3_count, h4_count, h5_count, h6_count,
                    stylesheet_count, blocking_script_count, modified_at,
                    internal_links, social_links
             FROM pages WHERE audit_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![audit_id], |row| {
            let schema_types: String = row.get(8)?;
            let modified_at: Option<String> = row.get(20)?;
            let internal_links: String = row.get(21)?;
            let social_links: String = row.get(22)?;
            Ok(PageRecord {
                url: row.get(0)?,
                status: row.get(1)?,
                title: row.get(2)?,
                h1: row.get(3)?,
                meta_description: row.get(4)?,
                canonical: row.get(5)?,
                noindex: row.get(6)?,
                has_schema: row.get(7)?,
                schema_types: serde_json::from_str(&schema_types).unwrap_or_default(),
                word_count: row.get(9)?,
                image_count: row.get(10)?,
                images_with_alt: row.get(11)?,
                heading_counts: [
                    row.get(12)?,
                    row.get(13)?,
                    row.get(14)?,
                    row.get(15)?,
                    row.get(16)?,
                    row.get(17)?,
                ],
                stylesheet_count: row.get(18)?,
                blocking_script_count: row.get(19)?,
                modified_at: modified_at
                    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                internal_links: serde_json::from_str(&internal_links).unwrap_or_default(),
                social_links: serde_json::from_str(&social_links).unwrap_or_default(),
            })
        })?;

        let mut pages = Vec::new();
        for row in rows {
            pages.push(row?);
        }
        Ok(pages)
    }

    fn count_pages(&self, audit_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE audit_id = ?1",
            params![audit_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Check Results =====

    fn upsert_checks(&mut self, audit_id: i64, results: &[CheckResult]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO checks (audit_id, key, module, status, score, evidence, why, fix, impact, effort)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(audit_id, key) DO UPDATE SET
                    module = ?3, status = ?4, score = ?5, evidence = ?6,
                    why = ?7, fix = ?8, impact = ?9, effort = ?10",
            )?;
            for result in results {
                let evidence = serde_json::to_string(&result.evidence)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                stmt.execute(params![
                    audit_id,
                    result.key,
                    result.module.as_str(),
                    result.status.as_str(),
                    result.score,
                    evidence,
                    result.why,
                    result.fix,
                    result.impact.as_str(),
                    result.effort.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        self.touch_audit(audit_id)
    }

    fn load_checks(&self, audit_id: i64) -> StorageResult<Vec<CheckResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, module, status, score, evidence, why, fix, impact, effort
             FROM checks WHERE audit_id = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![audit_id], |row| {
            let module: String = row.get(1)?;
            let status: String = row.get(2)?;
            let evidence: String = row.get(4)?;
            let impact: String = row.get(7)?;
            let effort: String = row.get(8)?;
            Ok(CheckResult {
                key: row.get(0)?,
                module: Module::from_str(&module).unwrap_or(Module::Crawl),
                status: CheckStatus::from_str(&status).unwrap_or(CheckStatus::Fail),
                score: row.get(3)?,
                evidence: serde_json::from_str::<Evidence>(&evidence).unwrap_or_default(),
                why: row.get(5)?,
                fix: row.get(6)?,
                impact: Rating::from_str(&impact).unwrap_or(Rating::Medium),
                effort: Rating::from_str(&effort).unwrap_or(Rating::Medium),
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
