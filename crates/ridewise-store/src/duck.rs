//! DuckDB source: ride-sharing tables imported from Parquet and read back as
//! Arrow batches.

use std::path::Path;

use arrow::record_batch::RecordBatch;
use duckdb::Connection;
use ridewise_core::schema::{rating_records_from_batches, trip_listings_from_batches};
use ridewise_core::{RatingRecord, TripListing, UserId};
use tracing::info;

use crate::{RatingSource, StoreError, TripSource, validate_ratings};

/// Tables every data directory must provide, as `<table>.parquet`.
pub const REQUIRED_TABLES: [&str; 4] = ["users", "vehicles", "trips", "ratings"];

/// Booking table, needed only for rider-scoped listings.
pub const PASSENGERS_TABLE: &str = "passengers";

/// Trip ⨝ driver ⨝ vehicle projection, in the listing column names.
const LISTING_SELECT: &str = "SELECT
        t.id,
        t.user_id,
        t.vehicle_id,
        t.pickup_location,
        t.drop_location,
        t.date,
        t.seats_available,
        t.price,
        t.ride_fare,
        t.estimated_time,
        t.status,
        t.is_completed,
        t.is_canceled,
        coalesce(u.full_name, '') AS driver_name,
        u.profile_picture AS driver_profile_picture,
        v.vehicle_type,
        v.image_link AS vehicle_image
    FROM trips t
    JOIN users u ON t.user_id = u.id
    JOIN vehicles v ON t.vehicle_id = v.id";

/// DuckDB store over `users`, `vehicles`, `trips`, `ratings` and optionally
/// `passengers`.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// Use [`open`](Self::open) for in-memory and [`open_persistent`](Self::open_persistent)
/// for a database that keeps its tables across runs.
pub struct DuckStore {
    conn: Connection,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open or create a persistent DuckDB database at the given path.
    ///
    /// Tables imported earlier are available immediately; use
    /// [`has_tables`](Self::has_tables) to decide whether to import.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Whether every required table exists.
    pub fn has_tables(&self) -> bool {
        REQUIRED_TABLES
            .iter()
            .all(|table| self.count_table(table).is_ok())
    }

    /// Replace `table` with the contents of a Parquet file.
    pub fn load_table(&self, table: &str, path: &Path) -> Result<usize, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let sql = format!(
            "CREATE OR REPLACE TABLE {table} AS SELECT * FROM read_parquet('{}')",
            path.display()
        );
        self.conn.execute_batch(&sql)?;
        let count = self.count_table(table)?;
        info!(table, count, "loaded table");
        Ok(count)
    }

    /// Load every `<table>.parquet` from a data directory.
    ///
    /// The required tables must all be present; `passengers.parquet` is
    /// loaded when it exists.
    pub fn load_all(&self, data_dir: &Path) -> Result<(), StoreError> {
        for table in REQUIRED_TABLES {
            self.load_table(table, &data_dir.join(format!("{table}.parquet")))?;
        }
        let passengers = data_dir.join(format!("{PASSENGERS_TABLE}.parquet"));
        if passengers.exists() {
            self.load_table(PASSENGERS_TABLE, &passengers)?;
        }
        Ok(())
    }

    /// Number of rows in `table`.
    pub fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let sql = format!("SELECT count(*)::BIGINT AS cnt FROM {table}");
        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        let batch = batches.first().ok_or(StoreError::NoResults)?;
        let col = batch
            .column(0)
            .as_any()
            .downcast_ref::<arrow::array::Int64Array>()
            .ok_or_else(|| StoreError::Other("count column not i64".into()))?;
        Ok(col.value(0) as usize)
    }

    /// Listings for the trips a rider holds a passenger record on.
    ///
    /// Fails with [`StoreError::NoResults`] when the rider has no passenger
    /// records at all.
    pub fn trip_listings_for_rider(&self, rider_id: UserId) -> Result<Vec<TripListing>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{LISTING_SELECT}
            WHERE t.id IN (SELECT trip_id FROM {PASSENGERS_TABLE} WHERE user_id = ?)
            ORDER BY t.id"
        ))?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([rider_id])?.collect();
        let listings = trip_listings_from_batches(&batches)?;
        if listings.is_empty() {
            return Err(StoreError::NoResults);
        }
        Ok(listings)
    }

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TripSource for DuckStore {
    fn all_trip_listings(&self) -> Result<Vec<TripListing>, StoreError> {
        let batches = self.query_arrow(&format!("{LISTING_SELECT} ORDER BY t.id"))?;
        Ok(trip_listings_from_batches(&batches)?)
    }
}

impl RatingSource for DuckStore {
    fn all_rating_records(&self) -> Result<Vec<RatingRecord>, StoreError> {
        let batches = self.query_arrow(
            "SELECT trip_id, rated_by_user_id, driver_id, rating, feedback
             FROM ratings
             ORDER BY id",
        )?;
        validate_ratings(rating_records_from_batches(&batches)?)
    }
}
