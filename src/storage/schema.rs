//! Database schema definitions and migrations
//!
//! This module contains all SQL schema definitions for the Reach-Probe
//! database. Migrations are additive only: columns are added to existing
//! tables, never dropped or retyped.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track probe runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per probed domain per run
CREATE TABLE IF NOT EXISTS domain_checks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL,
    isp TEXT,
    dns TEXT,
    update_time TEXT NOT NULL,
    status_http TEXT,
    status_final TEXT NOT NULL,
    content TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Indexes, created once every migrated column exists
pub const INDEX_SQL: &str = r#"
CREATE INDEX IF NOT EXISTS idx_domain_checks_domain ON domain_checks(domain);
CREATE INDEX IF NOT EXISTS idx_domain_checks_update_time ON domain_checks(update_time);
CREATE INDEX IF NOT EXISTS idx_domain_checks_run ON domain_checks(run_id);
"#;

/// Columns added to `domain_checks` after its first release
pub const DOMAIN_CHECK_COLUMNS: &[(&str, &str)] = &[
    ("run_id", "INTEGER REFERENCES runs(id)"),
    ("resolved_url", "TEXT"),
    ("tried_count", "INTEGER DEFAULT 0"),
    ("last_url", "TEXT"),
    ("error_kind", "TEXT"),
];

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized and migrated
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    ensure_columns(conn, "domain_checks", DOMAIN_CHECK_COLUMNS)?;
    conn.execute_batch(INDEX_SQL)?;
    Ok(())
}

/// Adds every listed column the table does not have yet
///
/// # Returns
///
/// The names of the columns that were added
pub fn ensure_columns(
    conn: &Connection,
    table: &str,
    columns: &[(&str, &str)],
) -> Result<Vec<String>, rusqlite::Error> {
    let existing = column_names(conn, table)?;
    let mut added = Vec::new();

    for (name, definition) in columns {
        if existing.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            continue;
        }
        conn.execute_batch(&format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, name, definition
        ))?;
        tracing::info!("Added column {}.{}", table, name);
        added.push(name.to_string());
    }

    Ok(added)
}

fn column_names(conn: &Connection, table: &str) -> Result<Vec<String>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
