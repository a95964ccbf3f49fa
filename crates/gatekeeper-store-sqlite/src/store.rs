// crates/gatekeeper-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Catalog Store
// Description: `CatalogStore` implementation backed by a single SQLite
//              database file (the `packages` table, §6).
// Purpose: Durable, concurrency-safe state for the Gate and Orchestrator.
// Dependencies: rusqlite, gatekeeper_core, serde_json, time
// ============================================================================

//! ## Overview
//! `SqliteCatalogStore` wraps one `Connection` behind a `Mutex`: SQLite
//! serializes writers at the file level regardless, so a `Mutex` costs
//! nothing extra and keeps the `rusqlite::Connection` (itself `!Sync`) safe
//! to share across the Gate's request handlers. `claim` takes an `IMMEDIATE`
//! transaction to acquire the write lock up front, which is SQLite's
//! equivalent of Postgres's `SELECT ... FOR UPDATE SKIP LOCKED`: a second
//! caller simply blocks (up to `busy_timeout`) rather than racing for rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use gatekeeper_core::CatalogEntry;
use gatekeeper_core::CatalogError;
use gatekeeper_core::CatalogStore;
use gatekeeper_core::PackageName;
use gatekeeper_core::RuntimeVersion;
use gatekeeper_core::ScanStatus;
use gatekeeper_core::Timestamp;
use gatekeeper_core::VersionSpec;
use gatekeeper_core::VulnerabilityInfo;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors internal to the SQLite backend, mapped to [`CatalogError`] at the
/// [`CatalogStore`] trait boundary.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The underlying `rusqlite` call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row could not be decoded back into a [`CatalogEntry`].
    #[error("stored row is malformed: {0}")]
    MalformedRow(String),
    /// A caller-supplied path had no usable parent directory.
    #[error("invalid store path: {0}")]
    InvalidPath(String),
}

fn to_catalog_error(err: SqliteStoreError) -> CatalogError {
    match err {
        SqliteStoreError::Sqlite(rusqlite::Error::SqliteFailure(inner, message))
            if inner.code == rusqlite::ErrorCode::DatabaseBusy
                || inner.code == rusqlite::ErrorCode::DatabaseLocked =>
        {
            CatalogError::Connectivity(message.unwrap_or_else(|| inner.to_string()))
        }
        SqliteStoreError::Sqlite(err) => CatalogError::Corrupt(err.to_string()),
        SqliteStoreError::MalformedRow(detail) => CatalogError::Corrupt(detail),
        SqliteStoreError::InvalidPath(detail) => CatalogError::Corrupt(detail),
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

const CURRENT_SCHEMA_VERSION: i64 = 1;

fn ensure_parent_dir(database_url: &str) -> Result<(), SqliteStoreError> {
    if database_url == ":memory:" || database_url.starts_with("file::memory:") {
        return Ok(());
    }
    let path = Path::new(database_url);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|err| SqliteStoreError::InvalidPath(err.to_string()))?;
        }
    }
    Ok(())
}

fn apply_pragmas(conn: &Connection) -> Result<(), SqliteStoreError> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

fn initialize_schema(conn: &Connection) -> Result<(), SqliteStoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS store_meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    let schema_version: Option<i64> = conn
        .query_row(
            "SELECT value FROM store_meta WHERE key = 'schema_version'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .map(|raw| raw.parse().unwrap_or(0));

    if schema_version.is_none() {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS packages (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                name                TEXT NOT NULL,
                version             TEXT NOT NULL,
                runtime_version     TEXT,
                status              TEXT NOT NULL,
                vulnerability_info  TEXT,
                error_message       TEXT,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                UNIQUE(name, version)
            );
            CREATE INDEX IF NOT EXISTS idx_packages_status_created_at
                ON packages(status, created_at);",
        )?;
        conn.execute(
            "INSERT INTO store_meta (key, value) VALUES ('schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CURRENT_SCHEMA_VERSION.to_string()],
        )?;
    }
    Ok(())
}

fn open_connection(database_url: &str) -> Result<Connection, SqliteStoreError> {
    ensure_parent_dir(database_url)?;
    let conn = Connection::open(database_url)?;
    apply_pragmas(&conn)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<Result<CatalogEntry, SqliteStoreError>> {
    let name: String = row.get("name")?;
    let version: String = row.get("version")?;
    let runtime_version: Option<String> = row.get("runtime_version")?;
    let status_raw: String = row.get("status")?;
    let vulnerability_info_raw: Option<String> = row.get("vulnerability_info")?;
    let error_message: Option<String> = row.get("error_message")?;
    let created_at_raw: String = row.get("created_at")?;
    let updated_at_raw: String = row.get("updated_at")?;

    Ok((|| {
        let status = ScanStatus::parse(&status_raw)
            .ok_or_else(|| SqliteStoreError::MalformedRow(format!("unknown status {status_raw}")))?;
        let vulnerability_info = vulnerability_info_raw
            .map(|raw| {
                serde_json::from_str(&raw)
                    .map(VulnerabilityInfo::new)
                    .map_err(|err| SqliteStoreError::MalformedRow(err.to_string()))
            })
            .transpose()?;
        let created_at = Timestamp::parse(&created_at_raw)
            .map_err(|err| SqliteStoreError::MalformedRow(err.to_string()))?;
        let updated_at = Timestamp::parse(&updated_at_raw)
            .map_err(|err| SqliteStoreError::MalformedRow(err.to_string()))?;
        Ok(CatalogEntry {
            name: PackageName::new(&name),
            version: VersionSpec::from_optional(Some(&version)),
            runtime_version: runtime_version.map(RuntimeVersion::new),
            status,
            vulnerability_info,
            error_message,
            created_at,
            updated_at,
        })
    })())
}

const SELECT_COLUMNS: &str = "id, name, version, runtime_version, status, \
    vulnerability_info, error_message, created_at, updated_at";

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed [`CatalogStore`].
pub struct SqliteCatalogStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Opens (creating if absent) the catalog database at `database_url`,
    /// applying pragmas and initializing the schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the file cannot be created or
    /// opened, or the schema cannot be initialized.
    pub fn open(database_url: &str) -> Result<Self, SqliteStoreError> {
        let connection = open_connection(database_url)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CatalogError> {
        self.connection
            .lock()
            .map_err(|_| CatalogError::Connectivity("catalog connection mutex poisoned".to_string()))
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn find_by_name_and_version(
        &self,
        name: &PackageName,
        version: Option<&VersionSpec>,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        let conn = self.lock()?;
        let version_str = version.map_or_else(|| VersionSpec::latest().as_str().to_string(), |v| v.as_str().to_string());
        let query = format!("SELECT {SELECT_COLUMNS} FROM packages WHERE name = ?1 AND version = ?2");
        conn.query_row(&query, params![name.as_str(), version_str], row_to_entry)
            .optional()
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
            .transpose()
            .map_err(to_catalog_error)
    }

    fn upsert_pending(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        runtime_version: Option<&RuntimeVersion>,
    ) -> Result<CatalogEntry, CatalogError> {
        let conn = self.lock()?;
        let entry = CatalogEntry::new_pending(name.clone(), version.clone(), runtime_version.cloned());
        let created_at = entry.created_at.to_rfc3339().map_err(|err| CatalogError::Corrupt(err.to_string()))?;
        conn.execute(
            "INSERT INTO packages (name, version, runtime_version, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(name, version) DO NOTHING",
            params![
                name.as_str(),
                version.as_str(),
                runtime_version.map(RuntimeVersion::as_str),
                ScanStatus::Pending.as_str(),
                created_at,
            ],
        )
        .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;

        let query = format!("SELECT {SELECT_COLUMNS} FROM packages WHERE name = ?1 AND version = ?2");
        conn.query_row(&query, params![name.as_str(), version.as_str()], row_to_entry)
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
            .map_err(to_catalog_error)
    }

    fn claim(&self, limit: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
        let now = Timestamp::now().to_rfc3339().map_err(|err| CatalogError::Corrupt(err.to_string()))?;
        let query = format!(
            "UPDATE packages SET updated_at = ?1
             WHERE id IN (
                 SELECT id FROM packages WHERE status = ?2 ORDER BY created_at ASC LIMIT ?3
             )
             RETURNING {SELECT_COLUMNS}"
        );
        let entries: Vec<CatalogEntry> = {
            let mut stmt = tx.prepare(&query).map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            let rows = stmt
                .query_map(params![now, ScanStatus::Pending.as_str(), limit], row_to_entry)
                .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            let mut collected = Vec::new();
            for row in rows {
                let entry = row
                    .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
                    .map_err(to_catalog_error)?;
                collected.push(entry);
            }
            collected
        };
        tx.commit().map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
        Ok(entries)
    }

    fn finalize(
        &self,
        name: &PackageName,
        version: &VersionSpec,
        status: ScanStatus,
        vulnerability_info: Option<VulnerabilityInfo>,
        error_message: Option<String>,
    ) -> Result<CatalogEntry, CatalogError> {
        let conn = self.lock()?;
        let current = {
            let query = format!("SELECT {SELECT_COLUMNS} FROM packages WHERE name = ?1 AND version = ?2");
            conn.query_row(&query, params![name.as_str(), version.as_str()], row_to_entry)
                .optional()
                .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
                .transpose()
                .map_err(to_catalog_error)?
        };
        let Some(current) = current else {
            return Err(CatalogError::NotFound {
                name: name.as_str().to_string(),
                version: version.as_str().to_string(),
            });
        };
        if !current.status.can_transition_to(status) {
            return Err(CatalogError::IllegalTransition { from: current.status, to: status });
        }

        let now = Timestamp::now().to_rfc3339().map_err(|err| CatalogError::Corrupt(err.to_string()))?;
        let vulnerability_info_json = vulnerability_info
            .as_ref()
            .map(|info| serde_json::to_string(info.as_value()))
            .transpose()
            .map_err(|err| CatalogError::Corrupt(err.to_string()))?;

        conn.execute(
            "UPDATE packages
             SET status = ?1, vulnerability_info = ?2, error_message = ?3, updated_at = ?4
             WHERE name = ?5 AND version = ?6",
            params![
                status.as_str(),
                vulnerability_info_json,
                error_message,
                now,
                name.as_str(),
                version.as_str(),
            ],
        )
        .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;

        let query = format!("SELECT {SELECT_COLUMNS} FROM packages WHERE name = ?1 AND version = ?2");
        conn.query_row(&query, params![name.as_str(), version.as_str()], row_to_entry)
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
            .map_err(to_catalog_error)
    }

    fn reschedule(&self, name: &PackageName, version: &VersionSpec) -> Result<CatalogEntry, CatalogError> {
        let conn = self.lock()?;
        let now = Timestamp::now().to_rfc3339().map_err(|err| CatalogError::Corrupt(err.to_string()))?;
        let updated = conn
            .execute(
                "UPDATE packages
                 SET status = ?1, error_message = NULL, vulnerability_info = NULL, updated_at = ?2
                 WHERE name = ?3 AND version = ?4",
                params![ScanStatus::Pending.as_str(), now, name.as_str(), version.as_str()],
            )
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
        if updated == 0 {
            return Err(CatalogError::NotFound {
                name: name.as_str().to_string(),
                version: version.as_str().to_string(),
            });
        }
        let query = format!("SELECT {SELECT_COLUMNS} FROM packages WHERE name = ?1 AND version = ?2");
        conn.query_row(&query, params![name.as_str(), version.as_str()], row_to_entry)
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
            .map_err(to_catalog_error)
    }

    fn count_by_status(&self) -> Result<Vec<(ScanStatus, u64)>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT status, COUNT(*) FROM packages GROUP BY status")
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
        let rows = stmt
            .query_map([], |row| {
                let status_raw: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status_raw, count))
            })
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
        let mut counts = Vec::new();
        for row in rows {
            let (status_raw, count) = row.map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            let status = ScanStatus::parse(&status_raw)
                .ok_or_else(|| CatalogError::Corrupt(format!("unknown status {status_raw}")))?;
            counts.push((status, u64::try_from(count).unwrap_or(0)));
        }
        Ok(counts)
    }

    fn list_pending(&self, limit: u32, offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.list_by_status(Some(ScanStatus::Pending), limit, offset)
    }

    fn list_all(&self, limit: u32, offset: u32) -> Result<Vec<CatalogEntry>, CatalogError> {
        self.list_by_status(None, limit, offset)
    }
}

impl SqliteCatalogStore {
    fn list_by_status(
        &self,
        status: Option<ScanStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let conn = self.lock()?;
        let entries = if let Some(status) = status {
            let query = format!(
                "SELECT {SELECT_COLUMNS} FROM packages WHERE status = ?1
                 ORDER BY created_at ASC LIMIT ?2 OFFSET ?3"
            );
            let mut stmt = conn.prepare(&query).map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            let rows = stmt
                .query_map(params![status.as_str(), limit, offset], row_to_entry)
                .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            collect_entries(rows)?
        } else {
            let query = format!(
                "SELECT {SELECT_COLUMNS} FROM packages
                 ORDER BY created_at ASC LIMIT ?1 OFFSET ?2"
            );
            let mut stmt = conn.prepare(&query).map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            let rows = stmt
                .query_map(params![limit, offset], row_to_entry)
                .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?;
            collect_entries(rows)?
        };
        Ok(entries)
    }
}

fn collect_entries(
    rows: rusqlite::MappedRows<'_, impl FnMut(&Row<'_>) -> rusqlite::Result<Result<CatalogEntry, SqliteStoreError>>>,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut entries = Vec::new();
    for row in rows {
        let entry = row
            .map_err(|err| to_catalog_error(SqliteStoreError::Sqlite(err)))?
            .map_err(to_catalog_error)?;
        entries.push(entry);
    }
    Ok(entries)
}
