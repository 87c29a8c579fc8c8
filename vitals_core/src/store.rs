//! Date-keyed entry persistence backed by SQLite.
//!
//! The store holds at most one entry per date. Every write is a single
//! `INSERT ... ON CONFLICT` statement, so a failed upsert never leaves a
//! half-written row behind. Batches run inside one transaction.
//!
//! The schema is created on first open and versioned through
//! `PRAGMA user_version`.

use crate::{Entry, EntryPatch, Error, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// Schema migration applied in order of `version`
#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_entries.sql"),
}];

const UPSERT_SQL: &str = "INSERT INTO entries (date, weight, sleep_hours, resting_heart_rate, notes)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(date) DO UPDATE SET
        weight = excluded.weight,
        sleep_hours = excluded.sleep_hours,
        resting_heart_rate = excluded.resting_heart_rate,
        notes = excluded.notes";

const SELECT_COLUMNS: &str = "SELECT date, weight, sleep_hours, resting_heart_rate, notes FROM entries";

/// Entry store contract
pub trait EntryStore {
    /// Insert `entry`, replacing any entry that shares its date
    fn upsert(&mut self, entry: &Entry) -> Result<()>;

    /// Upsert a batch as one unit; returns the number of rows written
    fn upsert_many(&mut self, entries: &[Entry]) -> Result<usize>;

    /// All entries, oldest first
    fn list_all(&self) -> Result<Vec<Entry>>;

    fn find_by_date(&self, date: NaiveDate) -> Result<Option<Entry>>;

    fn count(&self) -> Result<usize>;

    /// Apply `patch` to the entry stored for `date`
    ///
    /// Returns the entry as persisted, or `Error::NotFound` when there is
    /// nothing stored for that date.
    fn update(&mut self, date: NaiveDate, patch: &EntryPatch) -> Result<Entry> {
        let current = self.find_by_date(date)?.ok_or(Error::NotFound(date))?;
        let updated = patch.apply(&current).normalized()?;
        self.upsert(&updated)?;
        Ok(updated)
    }
}

/// SQLite-backed entry store
///
/// Owns its connection for the life of the handle. Call [`SqliteStore::close`]
/// to surface close errors; dropping the handle also releases the connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let store = Self::bootstrap(conn)?;
        tracing::info!("Opened entry store at {:?}", path);
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self::bootstrap(conn)?;
        tracing::debug!("Opened in-memory entry store");
        Ok(store)
    }

    /// Close the connection, reporting any error SQLite raises while doing so
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Store(e))?;
        tracing::debug!("Closed entry store");
        Ok(())
    }

    fn bootstrap(mut conn: Connection) -> Result<Self> {
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }
}

impl EntryStore for SqliteStore {
    fn upsert(&mut self, entry: &Entry) -> Result<()> {
        let entry = entry.clone().normalized()?;
        write_entry(&self.conn, &entry)?;
        tracing::debug!("Upserted entry for {}", entry.date);
        Ok(())
    }

    fn upsert_many(&mut self, entries: &[Entry]) -> Result<usize> {
        let entries = entries
            .iter()
            .cloned()
            .map(Entry::normalized)
            .collect::<Result<Vec<_>>>()?;

        let tx = self.conn.transaction()?;
        for entry in &entries {
            write_entry(&tx, entry)?;
        }
        tx.commit()?;

        tracing::debug!("Upserted {} entries", entries.len());
        Ok(entries.len())
    }

    fn list_all(&self) -> Result<Vec<Entry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY date ASC", SELECT_COLUMNS))?;
        let entries = stmt
            .query_map([], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn find_by_date(&self, date: NaiveDate) -> Result<Option<Entry>> {
        let entry = self
            .conn
            .query_row(
                &format!("{} WHERE date = ?1", SELECT_COLUMNS),
                [date],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn write_entry(conn: &Connection, entry: &Entry) -> Result<()> {
    conn.execute(
        UPSERT_SQL,
        params![
            entry.date,
            entry.weight,
            entry.sleep_hours,
            entry.resting_heart_rate,
            entry.notes,
        ],
    )?;
    Ok(())
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        date: row.get("date")?,
        weight: row.get("weight")?,
        sleep_hours: row.get("sleep_hours")?,
        resting_heart_rate: row.get("resting_heart_rate")?,
        notes: row.get("notes")?,
    })
}

/// Latest schema version known to this binary
pub fn latest_schema_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_schema_version();

    if current > latest {
        return Err(Error::UnsupportedSchema {
            found: current,
            supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        tracing::info!("Applied schema migration {}", migration.version);
    }
    tx.commit()?;
    Ok(())
}
