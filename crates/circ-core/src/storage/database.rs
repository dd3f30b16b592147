//! SQLite-based session storage.
//!
//! One table of completed focus intervals with a unique
//! `(date, start_time)` key and replace-on-conflict writes, plus a
//! key-value table for engine state carried across restarts. The
//! upsert key is the bit-exact contract completion writes and
//! import/export both honor.

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use tokio::sync::watch;

use crate::error::DatabaseError;
use crate::timer::CompletedSession;

use super::data_dir;

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/circ/circ.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        let path = data_dir()?.join("circ.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                date         TEXT NOT NULL,
                start_time   TEXT NOT NULL,
                duration_min INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_date_start
                ON sessions(date, start_time);

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Upsert one completed session. A write with an existing
    /// `(date, start_time)` key replaces the earlier record.
    pub fn append(&self, session: &CompletedSession) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO sessions (date, start_time, duration_min)
             VALUES (?1, ?2, ?3)",
            params![
                session.date.format("%Y-%m-%d").to_string(),
                session.start_time_of_day.format("%H:%M").to_string(),
                session.duration_minutes,
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch in one transaction. Used by the completion
    /// handler (midnight splits write two records) and by import.
    pub fn append_batch(&mut self, sessions: &[CompletedSession]) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        for session in sessions {
            tx.execute(
                "INSERT OR REPLACE INTO sessions (date, start_time, duration_min)
                 VALUES (?1, ?2, ?3)",
                params![
                    session.date.format("%Y-%m-%d").to_string(),
                    session.start_time_of_day.format("%H:%M").to_string(),
                    session.duration_minutes,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn sessions_for_date(&self, date: NaiveDate) -> Result<Vec<CompletedSession>, DatabaseError> {
        self.query_sessions(
            "SELECT date, start_time, duration_min FROM sessions
             WHERE date = ?1 ORDER BY start_time",
            &[&date.format("%Y-%m-%d").to_string()],
        )
    }

    pub fn sessions_from(&self, date: NaiveDate) -> Result<Vec<CompletedSession>, DatabaseError> {
        self.query_sessions(
            "SELECT date, start_time, duration_min FROM sessions
             WHERE date >= ?1 ORDER BY date, start_time",
            &[&date.format("%Y-%m-%d").to_string()],
        )
    }

    pub fn all_sessions(&self) -> Result<Vec<CompletedSession>, DatabaseError> {
        self.query_sessions(
            "SELECT date, start_time, duration_min FROM sessions
             ORDER BY date, start_time",
            &[],
        )
    }

    fn query_sessions(
        &self,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<CompletedSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (date, start_time, duration_min) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|e| DatabaseError::QueryFailed(format!("bad date '{date}': {e}")))?;
            let start = NaiveTime::parse_from_str(&start_time, "%H:%M").map_err(|e| {
                DatabaseError::QueryFailed(format!("bad start_time '{start_time}': {e}"))
            })?;
            sessions.push(CompletedSession {
                date,
                start_time_of_day: start,
                duration_minutes: duration_min,
            });
        }
        Ok(sessions)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Database wrapped with a revision watch so observers hold a
/// continuously-updated view: every write bumps the revision, and a
/// subscriber re-queries when it changes rather than polling snapshots.
pub struct SessionStore {
    db: Database,
    revision: watch::Sender<u64>,
}

impl SessionStore {
    pub fn new(db: Database) -> Self {
        let (revision, _) = watch::channel(0);
        Self { db, revision }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Subscribe to write notifications.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn append(&self, session: &CompletedSession) -> Result<(), DatabaseError> {
        self.db.append(session)?;
        self.bump();
        Ok(())
    }

    pub fn append_batch(&mut self, sessions: &[CompletedSession]) -> Result<(), DatabaseError> {
        self.db.append_batch(sessions)?;
        self.bump();
        Ok(())
    }

    pub fn sessions_for_date(&self, date: NaiveDate) -> Result<Vec<CompletedSession>, DatabaseError> {
        self.db.sessions_for_date(date)
    }

    pub fn sessions_from(&self, date: NaiveDate) -> Result<Vec<CompletedSession>, DatabaseError> {
        self.db.sessions_from(date)
    }

    pub fn all_sessions(&self) -> Result<Vec<CompletedSession>, DatabaseError> {
        self.db.all_sessions()
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        self.db.kv_get(key)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.db.kv_set(key, value)
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
