//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Sitegauge database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per audit
CREATE TABLE IF NOT EXISTS audits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    brand_name TEXT,
    business_type TEXT,
    crawl_limit INTEGER NOT NULL,
    status TEXT NOT NULL,
    overall_score REAL,
    module_scores TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audits_domain ON audits(domain);
CREATE INDEX IF NOT EXISTS idx_audits_status ON audits(status);

-- Serialized crawl state, one snapshot per audit
CREATE TABLE IF NOT EXISTS crawl_states (
    audit_id INTEGER PRIMARY KEY REFERENCES audits(id),
    snapshot TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Crawled pages with extracted signals
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    audit_id INTEGER NOT NULL REFERENCES audits(id),
    url TEXT NOT NULL,
    status_code INTEGER NOT NULL,
    title TEXT,
    h1 TEXT,
    meta_description TEXT,
    canonical TEXT,
    noindex INTEGER NOT NULL DEFAULT 0,
    has_schema INTEGER NOT NULL DEFAULT 0,
    schema_types TEXT NOT NULL DEFAULT '[]',
    word_count INTEGER NOT NULL DEFAULT 0,
    image_count INTEGER NOT NULL DEFAULT 0,
    images_with_alt INTEGER NOT NULL DEFAULT 0,
    h1_count INTEGER NOT NULL DEFAULT 0,
    h2_count INTEGER NOT NULL DEFAULT 0,
    h3_count INTEGER NOT NULL DEFAULT 0,
    h4_count INTEGER NOT NULL DEFAULT 0,
    h5_count INTEGER NOT NULL DEFAULT 0,
    h6_count INTEGER NOT NULL DEFAULT 0,
    stylesheet_count INTEGER NOT NULL DEFAULT 0,
    blocking_script_count INTEGER NOT NULL DEFAULT 0,
    modified_at TEXT,
    internal_links TEXT NOT NULL DEFAULT '[]',
    social_links TEXT NOT NULL DEFAULT '[]',
    UNIQUE(audit_id, url)
);

CREATE INDEX IF NOT EXISTS idx_pages_audit ON pages(audit_id);

-- Check results; rescoring overwrites in place
CREATE TABLE IF NOT EXISTS checks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    audit_id INTEGER NOT NULL REFERENCES audits(id),
    key TEXT NOT NULL,
    module TEXT NOT NULL,
    status TEXT NOT NULL,
    score REAL NOT NULL,
    evidence TEXT NOT NULL DEFAULT '{}',
    why TEXT NOT NULL,
    fix TEXT NOT NULL,
    impact TEXT NOT NULL,
    effort TEXT NOT NULL,
    UNIQUE(audit_id, key)
);

CREATE INDEX IF NOT EXISTS idx_checks_audit ON checks(audit_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["audits", "crawl_states", "pages", "checks"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
