//! SQLite-backed document store.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use super::{merge_fields, CollectionDiscovery, DocumentStore, StoreResult};
use crate::domain::Record;
use crate::error::StoreError;

pub const SCHEMA_VERSION: i64 = 1;

pub const DEFAULT_STORE_PATH: &str = ".csv-upsert/store.sqlite";

/// Connection settings, supplied once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: PathBuf::from(DEFAULT_STORE_PATH) }
    }
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating parent directories and tables as needed).
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                StoreError::Backend(format!("cannot create {}: {err}", parent.display()))
            })?;
        }
        let conn = Connection::open(&config.path)?;
        ensure_schema(&conn)?;
        debug!(path = %config.path.display(), "opened document store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        ensure_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        ",
    )?;

    let current: Option<i64> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?;
    match current {
        None => {
            conn.execute("INSERT INTO schema_version(version) VALUES(?1)", [SCHEMA_VERSION])?;
        }
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(StoreError::SchemaVersion { found, expected: SCHEMA_VERSION });
        }
    }
    Ok(())
}

fn decode_body(id: &str, body: &str) -> StoreResult<Record> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::NotAnObject(id.to_string())),
    }
}

impl DocumentStore for SqliteStore {
    fn get_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Record>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| decode_body(id, &b)).transpose()
    }

    fn set(&mut self, collection: &str, id: &str, fields: &Record, merge: bool) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        let mut document = if merge {
            let existing: Option<String> = tx
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                    |row| row.get(0),
                )
                .optional()?;
            existing.map(|b| decode_body(id, &b)).transpose()?.unwrap_or_default()
        } else {
            Record::new()
        };
        merge_fields(&mut document, fields);

        let body = serde_json::to_string(&document)?;
        tx.execute(
            "
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at
            ",
            params![collection, id, body, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_all(&self, collection: &str) -> StoreResult<Vec<(String, Record)>> {
        let mut stmt =
            self.conn.prepare("SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row?;
            let record = decode_body(&id, &body)?;
            documents.push((id, record));
        }
        Ok(documents)
    }
}

impl CollectionDiscovery for SqliteStore {
    fn list(&self) -> StoreResult<Vec<String>> {
        let mut stmt =
            self.conn.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }
}
