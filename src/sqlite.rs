//! SQLite-backed generation store.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::{path::Path, sync::Arc};
use uuid::Uuid;

use crate::{
    models::{NewGeneration, StoredGeneration},
    store::{stamp, GenerationStore, StoreError},
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS generations (
        id                TEXT PRIMARY KEY,
        idea              TEXT NOT NULL,
        roles_input       TEXT NOT NULL,
        monetization_type TEXT NOT NULL,
        tenant_type       TEXT NOT NULL,
        tech_stack        TEXT NOT NULL,
        ai_response       TEXT NOT NULL,
        created_at        TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_generations_created_at ON generations(created_at);
";

const SELECT: &str = "SELECT id, idea, roles_input, monetization_type, tenant_type, tech_stack, ai_response, created_at
                      FROM generations";

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Raw column values; converted outside the rusqlite row callback so that
/// bad ids or timestamps surface as `StoreError::Corrupt`.
struct RawRow {
    id: String,
    idea: String,
    roles_input: String,
    monetization_type: String,
    tenant_type: String,
    tech_stack: String,
    ai_response: String,
    created_at: String,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            idea: row.get(1)?,
            roles_input: row.get(2)?,
            monetization_type: row.get(3)?,
            tenant_type: row.get(4)?,
            tech_stack: row.get(5)?,
            ai_response: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_stored(self) -> Result<StoredGeneration, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt { id: self.id.clone(), reason };
        let id = Uuid::parse_str(&self.id).map_err(|e| corrupt(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| corrupt(e.to_string()))?
            .with_timezone(&Utc);
        Ok(StoredGeneration {
            id,
            idea: self.idea,
            roles_input: self.roles_input,
            monetization_type: self.monetization_type,
            tenant_type: self.tenant_type,
            tech_stack: self.tech_stack,
            ai_response: self.ai_response,
            created_at,
        })
    }
}

#[async_trait]
impl GenerationStore for SqliteStore {
    async fn create(&self, new: NewGeneration) -> Result<StoredGeneration, StoreError> {
        let row = stamp(new);
        let insert = row.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO generations (
                    id, idea, roles_input, monetization_type, tenant_type, tech_stack, ai_response, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    insert.id.to_string(),
                    insert.idea,
                    insert.roles_input,
                    insert.monetization_type,
                    insert.tenant_type,
                    insert.tech_stack,
                    insert.ai_response,
                    format_ts(&insert.created_at),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredGeneration>, StoreError> {
        self.with_conn(move |conn| {
            conn.query_row(&format!("{SELECT} WHERE id = ?1"), params![id.to_string()], RawRow::from_row)
                .optional()?
                .map(RawRow::into_stored)
                .transpose()
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<StoredGeneration>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY created_at DESC, rowid DESC"))?;
            let rows = stmt.query_map([], RawRow::from_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(RawRow::into_stored).collect()
        })
        .await
    }
}
