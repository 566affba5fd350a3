use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::board::{Board, Layout};
use crate::logging::log_storage;

/// Row as listed in the saved-readings panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSummary {
    pub id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedReading {
    pub summary: ReadingSummary,
    pub board: Board,
}

pub struct ReadingStore {
    conn: Connection,
}

impl ReadingStore {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("opening {}", path))?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                layout TEXT NOT NULL,
                board TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    pub fn save(&mut self, title: &str, layout: Layout, board: &Board) -> Result<i64> {
        let board_json = serde_json::to_string(board)?;
        self.conn.execute(
            "INSERT INTO readings (title, created_at, layout, board) VALUES (?1, ?2, ?3, ?4)",
            params![title, Utc::now().to_rfc3339(), layout.as_str(), board_json],
        )?;
        let id = self.conn.last_insert_rowid();
        log_storage("reading_saved", id);
        Ok(id)
    }

    /// Newest first.
    pub fn list(&self) -> Result<Vec<ReadingSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, created_at, layout FROM readings ORDER BY id DESC")?;
        let rows = stmt.query_map([], raw_summary)?;
        let mut out = Vec::new();
        for raw in rows {
            out.push(raw?.into_summary()?);
        }
        Ok(out)
    }

    pub fn load(&self, id: i64) -> Result<Option<SavedReading>> {
        let found = self
            .conn
            .query_row(
                "SELECT id, title, created_at, layout, board FROM readings WHERE id = ?1",
                params![id],
                |row| Ok((raw_summary(row)?, row.get::<_, String>(4)?)),
            )
            .optional()?;
        let Some((raw, board)) = found else {
            return Ok(None);
        };
        Ok(Some(SavedReading {
            summary: raw.into_summary()?,
            board: serde_json::from_str(&board).context("corrupt board snapshot")?,
        }))
    }

    /// Returns whether a row was removed.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM readings WHERE id = ?1", params![id])?;
        if n > 0 {
            log_storage("reading_deleted", id);
        }
        Ok(n > 0)
    }
}

struct RawSummary {
    id: i64,
    title: String,
    created_at: String,
    layout: String,
}

fn raw_summary(row: &Row<'_>) -> rusqlite::Result<RawSummary> {
    Ok(RawSummary {
        id: row.get(0)?,
        title: row.get(1)?,
        created_at: row.get(2)?,
        layout: row.get(3)?,
    })
}

impl RawSummary {
    fn into_summary(self) -> Result<ReadingSummary> {
        let date = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("reading {}: bad date", self.id))?
            .with_timezone(&Utc);
        let layout = Layout::parse(&self.layout)
            .with_context(|| format!("reading {}: unknown layout {}", self.id, self.layout))?;
        Ok(ReadingSummary {
            id: self.id,
            title: self.title,
            date,
            layout,
        })
    }
}
