//! Storage layer for growth reference data.
//!
//! This module provides the `SQLite`-backed data source the reference table is
//! loaded from. Tables are imported once per gender (append), read back in full
//! at startup (read), and can be removed (delete). Re-importing identical file
//! content is detected by hash and skipped.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::reference::{
    parse_lms_table, Gender, GrowthReferenceRow, LmsParams, ReferenceTable,
};

/// Outcome of importing a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Rows were written under a new source record.
    Imported {
        /// ID of the new source record.
        source_id: i64,
        /// Number of rows written.
        rows: usize,
    },
    /// Identical content was already imported for this gender.
    Skipped {
        /// ID of the existing source record.
        source_id: i64,
    },
}

/// A previously imported reference file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSource {
    /// Source record ID.
    pub id: i64,
    /// Curve the file was imported for.
    pub gender: Gender,
    /// Where the content came from (usually a file path).
    pub label: String,
    /// BLAKE3 hash of the imported content.
    pub content_hash: String,
    /// Number of rows parsed from the content.
    pub row_count: i64,
    /// When the import happened.
    pub imported_at: DateTime<Utc>,
}

/// Database-backed source of the growth reference table.
#[derive(Debug)]
pub struct ReferenceStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl ReferenceStore {
    /// Open or create a reference store at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening reference store at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        info!("Reference store opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compute the BLAKE3 hash used to recognise repeated imports.
    #[must_use]
    pub fn content_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }

    /// Import a reference table for one gender from delimited text.
    ///
    /// The content is parsed and validated before anything is written. Rows
    /// for months that are already stored are replaced. All writes happen in
    /// a single transaction.
    ///
    /// # Errors
    ///
    /// Returns a parse or data integrity error for bad content, or a database
    /// error if the write fails.
    pub fn import(&mut self, gender: Gender, label: &str, content: &str) -> Result<ImportOutcome> {
        let content_hash = Self::content_hash(content);
        let mut stale_source = None;
        if let Some((source_id, row_count)) = self.find_source(gender, &content_hash)? {
            if self.rows_from_source(source_id)? == row_count {
                debug!(
                    "Skipping {} import of {}: identical to source {}",
                    gender, label, source_id
                );
                return Ok(ImportOutcome::Skipped { source_id });
            }
            info!(
                "Source {} no longer holds all of its {} rows; importing {} again",
                source_id, gender, label
            );
            stale_source = Some(source_id);
        }

        let rows = parse_lms_table(content, gender)?;
        // Validates values and rejects duplicate months within the file.
        ReferenceTable::from_rows(rows.iter().copied())?;

        let row_count = i64::try_from(rows.len()).unwrap_or(i64::MAX);
        let tx = self.conn.transaction()?;
        if let Some(stale) = stale_source {
            tx.execute("DELETE FROM reference_sources WHERE id = ?1", [stale])?;
        }
        tx.execute(
            r"
            INSERT INTO reference_sources (gender, label, content_hash, row_count, imported_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                gender.as_str(),
                label,
                content_hash,
                row_count,
                Utc::now().to_rfc3339()
            ],
        )?;
        let source_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r"
                INSERT OR REPLACE INTO lms_rows (gender, age_months, l, m, s, source_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
            )?;
            for row in &rows {
                stmt.execute(params![
                    gender.as_str(),
                    row.age_months,
                    row.params.l,
                    row.params.m,
                    row.params.s,
                    source_id
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "Imported {} {} reference rows from {} (source {})",
            rows.len(),
            gender,
            label,
            source_id
        );
        Ok(ImportOutcome::Imported {
            source_id,
            rows: rows.len(),
        })
    }

    /// Import a reference table file for one gender.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`import`](Self::import).
    pub fn import_file(&mut self, gender: Gender, path: impl AsRef<Path>) -> Result<ImportOutcome> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        self.import(gender, &path.display().to_string(), &content)
    }

    /// Look up an earlier import of the same content, returning its ID and
    /// the number of rows it wrote.
    fn find_source(&self, gender: Gender, content_hash: &str) -> Result<Option<(i64, i64)>> {
        let source = self
            .conn
            .query_row(
                "SELECT id, row_count FROM reference_sources WHERE gender = ?1 AND content_hash = ?2",
                params![gender.as_str(), content_hash],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(source)
    }

    /// Count stored rows still attributed to a source.
    fn rows_from_source(&self, source_id: i64) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM lms_rows WHERE source_id = ?1",
            [source_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Read every stored row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataIntegrity`] if a stored row has an unknown gender
    /// or a missing or non-numeric parameter.
    pub fn rows(&self) -> Result<Vec<GrowthReferenceRow>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT gender, age_months, l, m, s
            FROM lms_rows ORDER BY gender, age_months
            ",
        )?;

        let rows = stmt
            .query_map([], Self::row_to_reference_row)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| match err {
                rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::IntegralValueOutOfRange(..) => {
                    Error::data_integrity(format!("unreadable reference row: {err}"))
                }
                other => other.into(),
            })?;

        rows.into_iter().collect()
    }

    /// Load the stored rows into a validated reference table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DataIntegrity`] for unreadable or invalid rows.
    pub fn load_table(&self) -> Result<ReferenceTable> {
        let rows = self.rows()?;
        let table = ReferenceTable::from_rows(rows)?;
        if table.is_empty() {
            warn!(
                "Reference store at {} is empty; every age will be out of range",
                self.path.display()
            );
        } else {
            info!(
                "Loaded reference table ({} male, {} female rows)",
                table.len_for(Gender::Male),
                table.len_for(Gender::Female)
            );
        }
        Ok(table)
    }

    /// Delete all rows and sources for a gender.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_gender(&mut self, gender: Gender) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM lms_rows WHERE gender = ?1", [gender.as_str()])?;
        tx.execute(
            "DELETE FROM reference_sources WHERE gender = ?1",
            [gender.as_str()],
        )?;
        tx.commit()?;

        if deleted > 0 {
            info!("Deleted {} {} reference rows", deleted, gender);
        }
        Ok(deleted)
    }

    /// Delete the row for one month of one gender.
    ///
    /// Returns `true` if a row was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_month(&self, gender: Gender, age_months: u32) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM lms_rows WHERE gender = ?1 AND age_months = ?2",
            params![gender.as_str(), age_months],
        )?;
        Ok(affected > 0)
    }

    /// List import records, newest first, optionally for one gender.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn sources(&self, gender: Option<Gender>) -> Result<Vec<ReferenceSource>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, gender, label, content_hash, row_count, imported_at
            FROM reference_sources
            WHERE ?1 IS NULL OR gender = ?1
            ORDER BY id DESC
            ",
        )?;

        let sources = stmt
            .query_map([gender.map(|g| g.as_str())], Self::row_to_source)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources.into_iter().flatten().collect())
    }

    /// Count stored rows for a gender.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, gender: Gender) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM lms_rows WHERE gender = ?1",
            [gender.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let male_rows = self.count(Gender::Male)?;
        let female_rows = self.count(Gender::Female)?;
        let sources: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM reference_sources", [], |row| {
                    row.get(0)
                })?;

        let last: Option<String> = self
            .conn
            .query_row(
                "SELECT imported_at FROM reference_sources ORDER BY imported_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let last_import = last
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            male_rows,
            female_rows,
            sources,
            last_import,
            db_size_bytes,
        })
    }

    /// Convert a database row to a reference row.
    ///
    /// The outer result carries SQL type errors; the inner one carries
    /// domain errors such as an unknown gender.
    fn row_to_reference_row(
        row: &rusqlite::Row,
    ) -> rusqlite::Result<Result<GrowthReferenceRow>> {
        let gender_str: String = row.get(0)?;
        let age_months: u32 = row.get(1)?;
        let l: f64 = row.get(2)?;
        let m: f64 = row.get(3)?;
        let s: f64 = row.get(4)?;

        Ok(gender_str
            .parse::<Gender>()
            .map_err(|_| {
                Error::data_integrity(format!(
                    "unknown gender '{gender_str}' stored for month {age_months}"
                ))
            })
            .map(|gender| GrowthReferenceRow::new(age_months, gender, LmsParams::new(l, m, s))))
    }

    /// Convert a database row to a source record, skipping unknown genders.
    fn row_to_source(row: &rusqlite::Row) -> rusqlite::Result<Option<ReferenceSource>> {
        let id: i64 = row.get(0)?;
        let gender_str: String = row.get(1)?;
        let label: String = row.get(2)?;
        let content_hash: String = row.get(3)?;
        let row_count: i64 = row.get(4)?;
        let imported_at_str: String = row.get(5)?;

        let Ok(gender) = gender_str.parse::<Gender>() else {
            warn!("Skipping source {} with unknown gender '{}'", id, gender_str);
            return Ok(None);
        };

        let imported_at = DateTime::parse_from_rfc3339(&imported_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));

        Ok(Some(ReferenceSource {
            id,
            gender,
            label,
            content_hash,
            row_count,
            imported_at,
        }))
    }
}

/// Statistics about the reference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Rows stored for the male curve.
    pub male_rows: i64,
    /// Rows stored for the female curve.
    pub female_rows: i64,
    /// Number of import records.
    pub sources: i64,
    /// Time of the most recent import.
    pub last_import: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
