pub mod schema;
pub mod seed;
mod types;

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use rusqlite::Connection;

pub use types::{TransportType, TripStatus, UserType, VehicleKind, VehicleStatus};

/// Shared handle on the relational store.
///
/// SQLite connections are not `Sync`, so the connection sits behind a mutex and every
/// operation runs on the guard. Transactions are opened on the guarded connection by the
/// service functions themselves.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database at `path` and make sure the schema exists.
    pub fn open(path: &str) -> rusqlite::Result<Store> {
        let start = Instant::now();
        let conn = Connection::open(path)?;
        schema::create(&conn)?;
        log::debug!(
            "Database {} opened in {}ms",
            path,
            start.elapsed().as_millis()
        );
        Ok(Store::from_connection(conn))
    }

    pub fn open_in_memory() -> rusqlite::Result<Store> {
        let conn = Connection::open_in_memory()?;
        schema::create(&conn)?;
        Ok(Store::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Store {
        Store {
            conn: Mutex::new(conn),
        }
    }

    /// Lock the connection. A panic while holding the lock cannot leave a transaction
    /// half-applied (it rolls back on drop), so a poisoned lock is recovered.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Row counts per table plus the number of trips still in progress.
    pub fn stats(&self) -> rusqlite::Result<StoreStats> {
        let conn = self.lock();
        let mut tables = Vec::with_capacity(schema::TABLES.len());
        for table in schema::TABLES {
            let count: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
            tables.push((table, count));
        }
        let rentals_in_progress = conn.query_row(
            "SELECT COUNT(*) FROM vehicle_trips WHERE status = ?1",
            [TripStatus::InProgress],
            |row| row.get(0),
        )?;
        let rides_in_progress = conn.query_row(
            "SELECT COUNT(*) FROM public_transport_trips WHERE status = ?1",
            [TripStatus::InProgress],
            |row| row.get(0),
        )?;
        Ok(StoreStats {
            tables,
            rentals_in_progress,
            rides_in_progress,
        })
    }
}

#[derive(Debug)]
pub struct StoreStats {
    pub tables: Vec<(&'static str, i64)>,
    pub rentals_in_progress: i64,
    pub rides_in_progress: i64,
}

impl StoreStats {
    pub fn print_stats(&self) {
        println!("Store:");
        for (table, count) in &self.tables {
            println!("  {}: {}", table, count);
        }
        println!("  Rentals in progress: {}", self.rentals_in_progress);
        println!("  Rides in progress: {}", self.rides_in_progress);
    }
}

/// Decode a JSON array column (route snapshots, principal destinations).
pub(crate) fn json_list(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
