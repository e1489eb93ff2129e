use chrono::{DateTime, Local};
use directories::ProjectDirs;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::attempt::{AttemptRecord, Outcome, ProgressKey};
use crate::category::Category;
use crate::error::{ProgressError, Result};

/// The only storage operations the progression core requires. The durable
/// engine behind it is a key-indexed append log; records are never mutated or
/// deleted by this core.
pub trait ProgressStore {
    /// Durably persists one record. Must not silently drop records.
    fn append(&mut self, record: &AttemptRecord) -> Result<()>;

    /// Up to `limit` most-recently-appended records whose key is in `keys`.
    /// No ordering guarantee beyond "the most recent `limit`"; callers
    /// re-sort as needed.
    fn trailing_by_keys(&self, keys: &[ProgressKey], limit: usize) -> Result<Vec<AttemptRecord>>;

    /// Full history, oldest first. Used by reporting, not by the controller.
    fn all(&self) -> Result<Vec<AttemptRecord>>;
}

impl<S: ProgressStore + ?Sized> ProgressStore for &mut S {
    fn append(&mut self, record: &AttemptRecord) -> Result<()> {
        (**self).append(record)
    }

    fn trailing_by_keys(&self, keys: &[ProgressKey], limit: usize) -> Result<Vec<AttemptRecord>> {
        (**self).trailing_by_keys(keys, limit)
    }

    fn all(&self) -> Result<Vec<AttemptRecord>> {
        (**self).all()
    }
}

/// SQLite-backed record log.
#[derive(Debug)]
pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    /// Open (or create) the database at the default state directory.
    pub fn new() -> Result<Self> {
        let db_path = Self::default_db_path().unwrap_or_else(|| PathBuf::from("rrt_progress.db"));
        Self::open(&db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ProgressError::StorageUnavailable(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Database file under $HOME/.local/state/rrt, falling back to the
    /// platform-specific data directory.
    fn default_db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home).join(".local").join("state").join("rrt");
            Some(state_dir.join("progress.db"))
        } else if let Some(proj_dirs) = ProjectDirs::from("", "", "rrt") {
            Some(proj_dirs.data_local_dir().join("progress.db"))
        } else {
            None
        }
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL,
                category TEXT NOT NULL,
                premises INTEGER NOT NULL,
                seconds_allotted INTEGER,
                modifiers TEXT NOT NULL,
                outcome TEXT NOT NULL,
                elapsed_ms INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_key ON attempts(key)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_attempts_recorded_at ON attempts(recorded_at)",
            [],
        )?;
        Ok(())
    }

    fn rows_to_records(rows: Vec<AttemptRow>) -> Result<Vec<AttemptRecord>> {
        rows.into_iter().map(AttemptRow::into_record).collect()
    }
}

/// Raw row shape; converted to a typed record outside the rusqlite closure so
/// category/outcome parse failures surface with the right error variant.
struct AttemptRow {
    category: String,
    premises: u32,
    seconds_allotted: Option<u32>,
    modifiers: String,
    outcome: String,
    elapsed_ms: u64,
    recorded_at: String,
}

impl AttemptRow {
    fn into_record(self) -> Result<AttemptRecord> {
        let category = Category::parse(&self.category)?;
        let outcome: Outcome = self
            .outcome
            .parse()
            .map_err(|_| ProgressError::MalformedRecord(format!("bad outcome: {}", self.outcome)))?;
        let modifiers: Vec<String> = serde_json::from_str(&self.modifiers)
            .map_err(|e| ProgressError::MalformedRecord(format!("bad modifiers: {e}")))?;
        let recorded_at = DateTime::parse_from_rfc3339(&self.recorded_at)
            .map_err(|e| ProgressError::MalformedRecord(format!("bad timestamp: {e}")))?
            .with_timezone(&Local);
        Ok(AttemptRecord {
            category,
            premises: self.premises,
            seconds_allotted: self.seconds_allotted,
            modifiers,
            outcome,
            elapsed_ms: self.elapsed_ms,
            recorded_at,
        })
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttemptRow> {
    Ok(AttemptRow {
        category: row.get(0)?,
        premises: row.get(1)?,
        seconds_allotted: row.get(2)?,
        modifiers: row.get(3)?,
        outcome: row.get(4)?,
        elapsed_ms: row.get(5)?,
        recorded_at: row.get(6)?,
    })
}

const ROW_COLUMNS: &str =
    "category, premises, seconds_allotted, modifiers, outcome, elapsed_ms, recorded_at";

impl ProgressStore for SqliteProgressStore {
    fn append(&mut self, record: &AttemptRecord) -> Result<()> {
        let modifiers = serde_json::to_string(&record.modifiers)
            .map_err(|e| ProgressError::MalformedRecord(format!("bad modifiers: {e}")))?;
        self.conn.execute(
            r#"
            INSERT INTO attempts
            (key, category, premises, seconds_allotted, modifiers, outcome, elapsed_ms, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.key().as_str(),
                record.category.to_string(),
                record.premises,
                record.seconds_allotted,
                modifiers,
                record.outcome.to_string(),
                record.elapsed_ms,
                record.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn trailing_by_keys(&self, keys: &[ProgressKey], limit: usize) -> Result<Vec<AttemptRecord>> {
        if keys.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let placeholders = std::iter::repeat("?")
            .take(keys.len())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {ROW_COLUMNS} FROM attempts WHERE key IN ({placeholders}) \
             ORDER BY id DESC LIMIT ?"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut params: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(keys.len() + 1);
        let key_strings: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        for key in &key_strings {
            params.push(key);
        }
        let limit = limit as i64;
        params.push(&limit);
        let rows = stmt
            .query_map(params.as_slice(), read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Self::rows_to_records(rows)
    }

    fn all(&self) -> Result<Vec<AttemptRecord>> {
        let sql = format!("SELECT {ROW_COLUMNS} FROM attempts ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Self::rows_to_records(rows)
    }
}

/// In-memory append log, the test double for the storage contract. Can be
/// flipped unavailable to exercise the fail-closed paths.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: Vec<AttemptRecord>,
    unavailable: bool,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `StorageUnavailable`.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable {
            Err(ProgressError::StorageUnavailable(
                "memory store marked unavailable".into(),
            ))
        } else {
            Ok(())
        }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn append(&mut self, record: &AttemptRecord) -> Result<()> {
        self.check_available()?;
        self.records.push(record.clone());
        Ok(())
    }

    fn trailing_by_keys(&self, keys: &[ProgressKey], limit: usize) -> Result<Vec<AttemptRecord>> {
        self.check_available()?;
        Ok(self
            .records
            .iter()
            .rev()
            .filter(|r| keys.contains(&r.key()))
            .take(limit)
            .cloned()
            .collect())
    }

    fn all(&self) -> Result<Vec<AttemptRecord>> {
        self.check_available()?;
        Ok(self.records.clone())
    }
}
