use crate::page::{Page, PageId, PageState};
use crate::registry::Registry;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Result, params};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

pub struct Database {
    conn: Connection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub seed_url: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub status: String,
}

fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

impl Database {
    pub fn drop(path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- One walk through the link graph
            CREATE TABLE IF NOT EXISTS walk_sessions (
    id TEXT PRIMARY KEY,
    seed_url TEXT NOT NULL,
    start_time INTEGER NOT NULL,
    end_time INTEGER,
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed'))
);

-- Pages, in registration order
CREATE TABLE IF NOT EXISTS pages (
    session_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    url TEXT NOT NULL,
    title TEXT,
    html TEXT,
    state TEXT NOT NULL CHECK(state IN ('idle', 'fetching', 'ready')),
    partial BOOLEAN NOT NULL DEFAULT 0,
    fetched_at INTEGER,

    PRIMARY KEY(session_id, position),
    UNIQUE(session_id, url),
    FOREIGN KEY(session_id) REFERENCES walk_sessions(id) ON DELETE CASCADE
);

-- Directed edges; ordinals keep linked_to / linked_from order
CREATE TABLE IF NOT EXISTS links (
    session_id TEXT NOT NULL,
    source INTEGER NOT NULL,
    target INTEGER NOT NULL,
    out_ordinal INTEGER NOT NULL,
    in_ordinal INTEGER NOT NULL,

    PRIMARY KEY(session_id, source, target),
    FOREIGN KEY(session_id) REFERENCES walk_sessions(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_links_target ON links(session_id, target);
            ",
        )?;
        Ok(())
    }

    // Session management
    pub fn create_session(&self, seed_url: &str) -> Result<String> {
        let session_id = uuid::Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO walk_sessions (id, seed_url, start_time, status) VALUES (?1, ?2, ?3, ?4)",
            params![&session_id, seed_url, current_timestamp(), "running"],
        )?;

        Ok(session_id)
    }

    pub fn complete_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, "completed")
    }

    pub fn fail_session(&self, session_id: &str) -> Result<()> {
        self.finish_session(session_id, "failed")
    }

    fn finish_session(&self, session_id: &str, status: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE walk_sessions SET status = ?1, end_time = ?2 WHERE id = ?3",
            params![status, current_timestamp(), session_id],
        )?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        self.conn
            .query_row(
                "SELECT id, seed_url, start_time, end_time, status FROM walk_sessions WHERE id = ?1",
                params![session_id],
                session_from_row,
            )
            .optional()
    }

    /// The most recently started session, if any.
    pub fn latest_session(&self) -> Result<Option<SessionInfo>> {
        self.conn
            .query_row(
                "SELECT id, seed_url, start_time, end_time, status FROM walk_sessions
                 ORDER BY start_time DESC, rowid DESC LIMIT 1",
                [],
                session_from_row,
            )
            .optional()
    }

    pub fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, seed_url, start_time, end_time, status FROM walk_sessions
             ORDER BY start_time DESC, rowid DESC",
        )?;
        let sessions = stmt
            .query_map([], session_from_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Replace the stored graph of `session_id` with `registry`.
    pub fn save_registry(&self, session_id: &str, registry: &Registry) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM links WHERE session_id = ?1", params![session_id])?;
        tx.execute("DELETE FROM pages WHERE session_id = ?1", params![session_id])?;

        {
            let mut insert_page = tx.prepare(
                "INSERT INTO pages (session_id, position, url, title, html, state, partial, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            let mut insert_link = tx.prepare(
                "INSERT INTO links (session_id, source, target, out_ordinal, in_ordinal)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for (id, page) in registry.iter() {
                // An interrupted fetch is not resumable; store it as not yet fetched.
                let state = match page.state() {
                    PageState::Fetching => PageState::Idle,
                    state => state,
                };

                insert_page.execute(params![
                    session_id,
                    id.index() as i64,
                    page.url(),
                    page.title(),
                    page.html(),
                    state.as_str(),
                    page.is_partial(),
                    page.fetched_at().map(|t| t.timestamp()),
                ])?;

                for (out_ordinal, target) in page.linked_to().iter().enumerate() {
                    let in_ordinal = registry
                        .page(*target)
                        .linked_from()
                        .iter()
                        .position(|source| *source == id)
                        .unwrap_or_default();

                    insert_link.execute(params![
                        session_id,
                        id.index() as i64,
                        target.index() as i64,
                        out_ordinal as i64,
                        in_ordinal as i64,
                    ])?;
                }
            }
        }

        tx.commit()?;
        debug!(
            "Saved {} pages and {} links for session {}",
            registry.len(),
            registry.edge_count(),
            session_id
        );
        Ok(())
    }

    /// Rebuild the graph stored for `session_id`, edge order included.
    pub fn load_registry(&self, session_id: &str) -> Result<Registry> {
        let mut registry = Registry::new();

        let mut stmt = self.conn.prepare(
            "SELECT url, title, html, state, partial, fetched_at FROM pages
             WHERE session_id = ?1 ORDER BY position",
        )?;
        let pages = stmt
            .query_map(params![session_id], |row| {
                let mut page = Page::new(row.get(0)?);
                page.title = row.get(1)?;
                page.html = row.get(2)?;
                let state: String = row.get(3)?;
                page.state = PageState::from_str(&state).unwrap_or(PageState::Idle);
                page.partial = row.get(4)?;
                let fetched_at: Option<i64> = row.get(5)?;
                page.fetched_at = fetched_at.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));
                Ok(page)
            })?
            .collect::<Result<Vec<_>>>()?;

        for page in pages {
            registry.push_restored(page);
        }

        let outbound = self.edges(
            session_id,
            "SELECT source, target FROM links WHERE session_id = ?1 ORDER BY source, out_ordinal",
        )?;
        let inbound = self.edges(
            session_id,
            "SELECT source, target FROM links WHERE session_id = ?1 ORDER BY target, in_ordinal",
        )?;

        for (source, target) in outbound {
            let source = checked_id(&registry, source)?;
            let target = checked_id(&registry, target)?;
            registry.page_mut(source).linked_to.push(target);
        }
        for (source, target) in inbound {
            let source = checked_id(&registry, source)?;
            let target = checked_id(&registry, target)?;
            registry.page_mut(target).linked_from.push(source);
        }

        Ok(registry)
    }

    fn edges(&self, session_id: &str, sql: &str) -> Result<Vec<(i64, i64)>> {
        let mut stmt = self.conn.prepare(sql)?;
        let edges = stmt
            .query_map(params![session_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;
        Ok(edges)
    }

    pub fn page_count(&self, session_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pages WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn session_from_row(row: &rusqlite::Row<'_>) -> Result<SessionInfo> {
    Ok(SessionInfo {
        id: row.get(0)?,
        seed_url: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        status: row.get(4)?,
    })
}

fn checked_id(registry: &Registry, position: i64) -> Result<PageId> {
    usize::try_from(position)
        .ok()
        .map(PageId)
        .filter(|id| registry.get(*id).is_some())
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, position))
}
