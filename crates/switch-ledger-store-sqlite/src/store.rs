// crates/switch-ledger-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Key-Value Backend
// Description: Durable KeyValueBackend backed by SQLite WAL.
// Purpose: Persist ledger rows with atomic conditional transactions.
// Dependencies: switch-ledger-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`KeyValueBackend`] using `SQLite`. All
//! rows share one table keyed by `(pk, sk)` with the attribute map stored as
//! JSON. `transact_write` reads every addressed row, evaluates every guard
//! against that pre-transaction state, and applies mutations only when all
//! guards pass, inside a single `SQLite` transaction. Database contents are
//! untrusted; decode failures fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use switch_ledger_core::BackendError;
use switch_ledger_core::CancellationReason;
use switch_ledger_core::Item;
use switch_ledger_core::KeyValueBackend;
use switch_ledger_core::QueryRequest;
use switch_ledger_core::RowKey;
use switch_ledger_core::TransactWriteError;
use switch_ledger_core::TransactionCancellation;
use switch_ledger_core::WriteOp;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the backend.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` backend.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteBackendConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteBackendConfig {
    /// Creates a configuration with defaults for the given database path.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` backend errors.
///
/// # Invariants
/// - Error messages avoid embedding raw row payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteBackendError {
    /// Backend I/O error.
    #[error("sqlite backend io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite backend db error: {0}")]
    Db(String),
    /// Backend schema version mismatch.
    #[error("sqlite backend version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid backend configuration or data.
    #[error("sqlite backend invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteBackendError> for BackendError {
    fn from(error: SqliteBackendError) -> Self {
        match error {
            SqliteBackendError::Io(message) => Self::Io(message),
            SqliteBackendError::Db(message) | SqliteBackendError::VersionMismatch(message) => {
                Self::Backend(message)
            }
            SqliteBackendError::Invalid(message) => Self::Invalid(message),
        }
    }
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// `SQLite`-backed key-value backend with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex, so a transaction sees
///   no concurrent writes between guard evaluation and application.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens (or creates) the backend database at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteBackendError::Invalid`] for unusable paths,
    /// [`SqliteBackendError::VersionMismatch`] for unknown schema versions,
    /// and database errors otherwise.
    pub fn open(config: &SqliteBackendConfig) -> Result<Self, SqliteBackendError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

impl KeyValueBackend for SqliteBackend {
    fn get(&self, key: &RowKey) -> Result<Option<Item>, BackendError> {
        let connection = self.connection.lock().map_err(poisoned)?;
        let encoded: Option<String> = connection
            .query_row(
                "SELECT attrs FROM rows WHERE pk = ?1 AND sk = ?2",
                params![key.partition, key.sort],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)?;
        encoded.map(|attrs| decode_item(&attrs)).transpose()
    }

    fn query(&self, request: &QueryRequest) -> Result<Vec<Item>, BackendError> {
        let connection = self.connection.lock().map_err(poisoned)?;
        let sql = if request.scan_forward {
            "SELECT sk, attrs FROM rows WHERE pk = ?1 ORDER BY sk ASC"
        } else {
            "SELECT sk, attrs FROM rows WHERE pk = ?1 ORDER BY sk DESC"
        };
        let mut statement = connection.prepare_cached(sql).map_err(db_err)?;
        let rows = statement
            .query_map(params![request.partition], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(db_err)?;
        let mut matched = Vec::new();
        for row in rows {
            let (sort, attrs) = row.map_err(db_err)?;
            if !request.sort.matches(&sort) {
                continue;
            }
            matched.push(decode_item(&attrs)?);
            if request.limit.is_some_and(|limit| matched.len() >= limit) {
                break;
            }
        }
        Ok(matched)
    }

    fn transact_write(&self, ops: &[WriteOp]) -> Result<(), TransactWriteError> {
        let mut connection =
            self.connection.lock().map_err(|_| TransactWriteError::Backend(poisoned_err()))?;
        let tx = connection.transaction().map_err(|err| TransactWriteError::Backend(db_err(err)))?;

        // Reject transactions addressing the same row twice; the
        // evaluate-then-apply split would be ambiguous otherwise.
        let mut targets = Vec::with_capacity(ops.len());
        for op in ops {
            let target = op.target_key().map_err(TransactWriteError::Backend)?;
            if targets.contains(&target) {
                return Err(TransactWriteError::Backend(BackendError::Invalid(format!(
                    "duplicate target key in transaction: {}/{}",
                    target.partition, target.sort
                ))));
            }
            targets.push(target);
        }

        // Evaluate every guard against the pre-transaction state.
        let mut existing = Vec::with_capacity(ops.len());
        let mut reasons = Vec::with_capacity(ops.len());
        let mut failed = false;
        for (op, target) in ops.iter().zip(&targets) {
            let stored = fetch_row(&tx, target)?;
            let passes = op.condition().is_none_or(|cond| cond.evaluate(stored.as_ref()));
            if passes {
                reasons.push(CancellationReason::passed());
            } else {
                failed = true;
                let item = if op.wants_previous() {
                    stored.clone()
                } else {
                    None
                };
                reasons.push(CancellationReason::condition_failed(item));
            }
            existing.push(stored);
        }
        if failed {
            // Dropping the transaction rolls it back.
            return Err(TransactWriteError::Canceled(TransactionCancellation {
                reasons,
            }));
        }

        // All guards passed; apply every mutation.
        for ((op, target), stored) in ops.iter().zip(&targets).zip(existing) {
            let item = match op {
                WriteOp::Put(put) => put.item.clone(),
                WriteOp::Update(update) => {
                    let mut item = stored.unwrap_or_else(|| Item::for_key(&update.key));
                    for assignment in &update.assignments {
                        item.set(&assignment.attribute, assignment.value.clone());
                    }
                    item
                }
            };
            let attrs = encode_item(&item)?;
            tx.execute(
                "INSERT OR REPLACE INTO rows (pk, sk, attrs) VALUES (?1, ?2, ?3)",
                params![target.partition, target.sort, attrs],
            )
            .map_err(|err| TransactWriteError::Backend(db_err(err)))?;
        }
        tx.commit().map_err(|err| TransactWriteError::Backend(db_err(err)))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads one row inside an open transaction.
fn fetch_row(
    tx: &rusqlite::Transaction<'_>,
    key: &RowKey,
) -> Result<Option<Item>, TransactWriteError> {
    let encoded: Option<String> = tx
        .query_row(
            "SELECT attrs FROM rows WHERE pk = ?1 AND sk = ?2",
            params![key.partition, key.sort],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| TransactWriteError::Backend(db_err(err)))?;
    encoded
        .map(|attrs| decode_item(&attrs))
        .transpose()
        .map_err(TransactWriteError::Backend)
}

/// Serializes an item's attribute map to JSON.
fn encode_item(item: &Item) -> Result<String, BackendError> {
    serde_json::to_string(item)
        .map_err(|_| BackendError::Backend("row failed to serialize".to_string()))
}

/// Deserializes an item's attribute map from JSON, failing closed.
fn decode_item(attrs: &str) -> Result<Item, BackendError> {
    serde_json::from_str(attrs)
        .map_err(|_| BackendError::Backend("stored row is not valid json".to_string()))
}

/// Maps a `rusqlite` error to a backend error without payload details.
fn db_err(err: rusqlite::Error) -> BackendError {
    BackendError::Backend(err.to_string())
}

/// Maps a poisoned connection lock to a backend error.
fn poisoned<T>(_: PoisonError<T>) -> BackendError {
    poisoned_err()
}

/// Backend error describing a poisoned connection lock.
fn poisoned_err() -> BackendError {
    BackendError::Backend("connection lock poisoned".to_string())
}

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteBackendError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteBackendError::Io("database path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteBackendError::Io(err.to_string()))
}

/// Validates database paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteBackendError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteBackendError::Invalid("database path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteBackendError::Invalid("database path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteBackendError::Invalid(
                "database path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteBackendError::Invalid(
            "database path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteBackendConfig) -> Result<Connection, SqliteBackendError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteBackendConfig,
) -> Result<(), SqliteBackendError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteBackendError> {
    let tx = connection.transaction().map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS rows (
                    pk TEXT NOT NULL,
                    sk TEXT NOT NULL,
                    attrs TEXT NOT NULL,
                    PRIMARY KEY (pk, sk)
                );",
            )
            .map_err(|err| SqliteBackendError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteBackendError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteBackendError::Db(err.to_string()))?;
    Ok(())
}
