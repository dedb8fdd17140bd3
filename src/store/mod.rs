pub mod couriers;
pub mod orders;

use std::sync::Mutex;
use std::time::Duration;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Row, TransactionBehavior};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::models::courier::CourierType;

pub use orders::{OrderFilter, OrderUpdate};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS couriers (
    courier_id    INTEGER PRIMARY KEY,
    courier_type  TEXT    NOT NULL,
    regions       TEXT    NOT NULL,
    working_hours TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS orders (
    order_id       INTEGER PRIMARY KEY,
    weight         REAL    NOT NULL,
    region         INTEGER NOT NULL,
    delivery_hours TEXT    NOT NULL,
    assign         INTEGER,
    courier_type   TEXT,
    assign_time    TEXT,
    complete       INTEGER,
    complete_time  TEXT
);

CREATE INDEX IF NOT EXISTS idx_orders_assign ON orders (assign, complete);
CREATE INDEX IF NOT EXISTS idx_orders_open_region ON orders (complete, region);
"#;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode column: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("connection lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("store is disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub couriers: i64,
    pub orders: i64,
    pub active_assignments: i64,
}

/// Persistence handle. Owns a single SQLite connection; every engine operation runs inside
/// [`Store::transaction`].
pub struct Store {
    conn: Mutex<Option<Connection>>,
}

impl Store {
    /// Opens the database at `path` (`:memory:` for a private in-memory db) and creates the
    /// schema if needed.
    pub fn connect(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(SCHEMA)?;

        info!(path, "store connected");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn disconnect(&self) -> Result<(), StoreError> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|err| StoreError::LockPoisoned(err.to_string()))?;

        if let Some(conn) = guard.take() {
            conn.close().map_err(|(_, err)| err)?;
            info!("store disconnected");
        }
        Ok(())
    }

    /// Runs `f` in an immediate transaction. Commits when `f` returns `Ok`, rolls back otherwise.
    pub fn transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&StoreTx<'_>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|err| StoreError::LockPoisoned(err.to_string()))?;
        let conn = guard.as_mut().ok_or(StoreError::Disconnected)?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let store_tx = StoreTx { tx };

        let value = f(&store_tx)?;
        store_tx.tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        self.transaction(|tx| -> Result<StoreStats, StoreError> {
            let conn = &tx.tx;
            let couriers = conn.query_row("SELECT COUNT(*) FROM couriers", [], |row| row.get(0))?;
            let orders = conn.query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?;
            let active_assignments = conn.query_row(
                "SELECT COUNT(*) FROM orders WHERE assign IS NOT NULL AND complete IS NULL",
                [],
                |row| row.get(0),
            )?;

            Ok(StoreStats {
                couriers,
                orders,
                active_assignments,
            })
        })
    }
}

/// An open transaction. Courier and order access lives in the `couriers` and `orders`
/// submodules.
pub struct StoreTx<'conn> {
    tx: rusqlite::Transaction<'conn>,
}

impl ToSql for CourierType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CourierType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        CourierType::parse(raw)
            .ok_or_else(|| FromSqlError::Other(format!("unknown courier type {raw:?}").into()))
    }
}

/// Reads a TEXT column holding JSON.
fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}
