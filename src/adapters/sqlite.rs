use crate::domain::model::{Booking, BookingId, BookingStatus, WriteOutcome};
use crate::domain::ports::BookingRepository;
use crate::utils::error::{LifecycleError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SELECT_BOOKING: &str = "SELECT id, customer_id, worker_id, service_id, status, version,
        created_at, updated_at
 FROM bookings
 WHERE id = ?1";

/// SQLite-backed booking store.
///
/// The compare-and-swap is a single `UPDATE ... WHERE id = ? AND version = ?`;
/// SQLite applies it atomically, so zero changed rows means another writer got
/// there first.
#[derive(Debug, Clone)]
pub struct SqliteBookingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBookingRepository {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL keeps readers off the writer's lock
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Inserts a new `Pending` booking at version 0.
    pub async fn create(&self, customer_id: i64, worker_id: i64, service_id: i64) -> Result<Booking> {
        self.with_connection(move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO bookings (
                    customer_id, worker_id, service_id, status, version, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?5)",
                params![
                    customer_id,
                    worker_id,
                    service_id,
                    BookingStatus::Pending.as_str(),
                    now
                ],
            )?;

            let id = BookingId(conn.last_insert_rowid());
            conn.query_row(SELECT_BOOKING, params![id.0], booking_from_row)
                .map_err(LifecycleError::from)
        })
        .await
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| LifecycleError::Persistence {
                message: "SQLite connection lock poisoned".to_string(),
            })?;
            f(&conn)
        })
        .await
        .map_err(|e| LifecycleError::Persistence {
            message: format!("SQLite task failed: {}", e),
        })?
    }
}

pub fn setup_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS bookings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id INTEGER NOT NULL,
            worker_id INTEGER NOT NULL,
            service_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            version INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status)",
        [],
    )?;

    Ok(())
}

fn booking_from_row(row: &Row<'_>) -> rusqlite::Result<Booking> {
    let status: String = row.get(4)?;
    let status = status.parse::<BookingStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let version: i64 = row.get(5)?;

    Ok(Booking {
        id: BookingId(row.get(0)?),
        customer_id: row.get(1)?,
        worker_id: row.get(2)?,
        service_id: row.get(3)?,
        status,
        version: version as u64,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn get_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        self.with_connection(move |conn| {
            conn.query_row(SELECT_BOOKING, params![id.0], booking_from_row)
                .optional()
                .map_err(LifecycleError::from)
        })
        .await
    }

    async fn try_update_status(
        &self,
        id: BookingId,
        expected_version: u64,
        new_status: BookingStatus,
    ) -> Result<WriteOutcome> {
        self.with_connection(move |conn| {
            let changed = conn.execute(
                "UPDATE bookings
                 SET status = ?1, version = version + 1, updated_at = ?2
                 WHERE id = ?3 AND version = ?4",
                params![new_status.as_str(), Utc::now(), id.0, expected_version as i64],
            )?;

            if changed == 1 {
                return Ok(WriteOutcome::Committed {
                    version: expected_version + 1,
                });
            }

            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM bookings WHERE id = ?1)",
                params![id.0],
                |row| row.get(0),
            )?;

            if exists {
                Ok(WriteOutcome::Conflict)
            } else {
                Err(LifecycleError::NotFound { booking_id: id })
            }
        })
        .await
    }
}
