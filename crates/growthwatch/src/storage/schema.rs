//! `SQLite` schema definitions for the reference store.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the table recording imported source files.
pub const CREATE_SOURCES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS reference_sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    gender TEXT NOT NULL,
    label TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    imported_at TEXT NOT NULL
)
";

/// SQL statement to create a unique index used for import deduplication.
pub const CREATE_SOURCE_HASH_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_sources_gender_hash
    ON reference_sources(gender, content_hash)
";

/// SQL statement to create the LMS rows table.
pub const CREATE_LMS_ROWS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS lms_rows (
    gender TEXT NOT NULL,
    age_months INTEGER NOT NULL,
    l REAL NOT NULL,
    m REAL NOT NULL,
    s REAL NOT NULL,
    source_id INTEGER REFERENCES reference_sources(id),
    PRIMARY KEY (gender, age_months)
)
";

/// SQL statement to create an index on `source_id` for per-source queries.
pub const CREATE_ROW_SOURCE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_lms_rows_source ON lms_rows(source_id)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_SOURCES_TABLE,
    CREATE_SOURCE_HASH_INDEX,
    CREATE_LMS_ROWS_TABLE,
    CREATE_ROW_SOURCE_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_lms_rows_keyed_by_gender_and_month() {
        assert!(CREATE_LMS_ROWS_TABLE.contains("PRIMARY KEY (gender, age_months)"));
        assert!(CREATE_LMS_ROWS_TABLE.contains("l REAL NOT NULL"));
        assert!(CREATE_LMS_ROWS_TABLE.contains("m REAL NOT NULL"));
        assert!(CREATE_LMS_ROWS_TABLE.contains("s REAL NOT NULL"));
    }

    #[test]
    fn test_sources_deduplicate_by_hash() {
        assert!(CREATE_SOURCE_HASH_INDEX.contains("UNIQUE"));
        assert!(CREATE_SOURCE_HASH_INDEX.contains("content_hash"));
    }

    #[test]
    fn test_create_metadata_table_structure() {
        assert!(CREATE_METADATA_TABLE.contains("key TEXT PRIMARY KEY"));
        assert!(CREATE_METADATA_TABLE.contains("value TEXT NOT NULL"));
    }

    #[test]
    fn test_statements_are_idempotent() {
        for stmt in SCHEMA_STATEMENTS {
            assert!(stmt.contains("IF NOT EXISTS"));
        }
    }
}
