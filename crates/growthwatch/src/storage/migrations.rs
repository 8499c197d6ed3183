//! Database migration system for the reference store.
//!
//! Tracks the schema version in the `metadata` table and applies numbered
//! migrations in order until the database matches [`CURRENT_VERSION`].

use rusqlite::Connection;
use tracing::info;

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The current schema version.
pub const CURRENT_VERSION: i32 = 1;

/// Key used to store the schema version in the metadata table.
const VERSION_KEY: &str = "schema_version";

/// Initialize the database schema.
///
/// Creates all tables and indexes if they don't exist, then runs any
/// pending migrations to bring the schema up to the current version.
///
/// # Errors
///
/// Returns an error if schema creation or migration fails, or if the database
/// was written by a newer version of growthwatch.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = get_schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "database schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }
    if version < CURRENT_VERSION {
        run_migrations(conn, version)?;
    }

    Ok(())
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (fresh database).
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let result: std::result::Result<String, rusqlite::Error> = conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
    );

    match result {
        Ok(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, version.to_string()),
    )?;
    Ok(())
}

/// A numbered step that upgrades the schema from `version - 1` to `version`.
type Migration = fn(&Connection) -> Result<()>;

/// Migration steps, indexed by target version minus one.
const MIGRATIONS: &[Migration] = &[migrate_v1];

/// Apply every step after `from_version` inside one transaction.
///
/// A failed step leaves the store at `from_version`.
fn run_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for version in (from_version + 1)..=CURRENT_VERSION {
        run_migration(&tx, version)?;
    }
    set_schema_version(&tx, CURRENT_VERSION)?;
    tx.commit()?;

    info!(
        "Reference store schema migrated from v{} to v{}",
        from_version, CURRENT_VERSION
    );
    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<()> {
    let step = usize::try_from(version - 1)
        .ok()
        .and_then(|index| MIGRATIONS.get(index))
        .ok_or_else(|| Error::DatabaseMigration {
            message: format!("unknown migration version: {version}"),
        })?;
    step(conn)
}

/// Version 1 is the initial schema, already created by `SCHEMA_STATEMENTS`.
/// Any `lms_rows` left without a source record are dropped.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute(
        "DELETE FROM lms_rows WHERE source_id NOT IN (SELECT id FROM reference_sources)",
        [],
    )?;
    Ok(())
}
