//! Arrow decoders for the ride-sharing tables.
//!
//! The store layer reads `ratings` and the joined trip listing projection as
//! Arrow RecordBatches (DuckDB `query_arrow`). These decoders turn them into
//! [`RatingRecord`] and [`TripListing`] values. They accept the physical types
//! different producers emit for the same logical column: any integer width,
//! `Utf8`/`LargeUtf8`/`Utf8View`, `Float32`/`Float64` and any timestamp unit.

use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Float32Array, Float64Array, Int8Array,
    Int16Array, Int32Array, Int64Array, LargeStringArray, StringArray, StringViewArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt8Array, UInt16Array, UInt32Array,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;
use thiserror::Error;

use crate::model::{RatingRecord, TripListing};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing '{0}' column")]
    MissingColumn(String),

    #[error("null {column} at row {row}")]
    NullValue { column: String, row: usize },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedType { column: String, data_type: DataType },

    #[error("{column} at row {row} is out of range: {value}")]
    OutOfRange {
        column: String,
        row: usize,
        value: i64,
    },
}

/// Decode `ratings` rows.
///
/// Expects columns: `trip_id`, `rated_by_user_id`, `driver_id`, `rating`,
/// `feedback`. The `feedback` column may be absent entirely.
pub fn rating_records_from_batches(
    batches: &[RecordBatch],
) -> Result<Vec<RatingRecord>, SchemaError> {
    let mut records = Vec::new();

    for batch in batches {
        let trip_col = column(batch, "trip_id")?;
        let rater_col = column(batch, "rated_by_user_id")?;
        let driver_col = column(batch, "driver_id")?;
        let rating_col = column(batch, "rating")?;
        let feedback_col = batch.column_by_name("feedback");

        for row in 0..batch.num_rows() {
            let rating = required_i64(rating_col, "rating", row)?;
            let numeric_rating = u8::try_from(rating).map_err(|_| SchemaError::OutOfRange {
                column: "rating".to_string(),
                row,
                value: rating,
            })?;

            let feedback = match feedback_col {
                Some(col) => get_string(col.as_ref(), "feedback", row)?,
                None => None,
            };

            records.push(RatingRecord {
                trip_id: required_i64(trip_col, "trip_id", row)?,
                rated_by_user_id: required_i64(rater_col, "rated_by_user_id", row)?,
                driver_id: get_i64(driver_col.as_ref(), "driver_id", row)?,
                numeric_rating,
                feedback,
            });
        }
    }

    Ok(records)
}

/// Decode trip listing rows produced by the trip ⨝ driver ⨝ vehicle join.
///
/// `driver_overall_rating` is always `None` here; it is filled in by ranking.
pub fn trip_listings_from_batches(
    batches: &[RecordBatch],
) -> Result<Vec<TripListing>, SchemaError> {
    let mut listings = Vec::new();

    for batch in batches {
        let id = column(batch, "id")?;
        let user_id = column(batch, "user_id")?;
        let vehicle_id = column(batch, "vehicle_id")?;
        let pickup = column(batch, "pickup_location")?;
        let drop = column(batch, "drop_location")?;
        let date = column(batch, "date")?;
        let seats = column(batch, "seats_available")?;
        let price = column(batch, "price")?;
        let driver_name = column(batch, "driver_name")?;
        let vehicle_type = column(batch, "vehicle_type")?;

        let ride_fare = batch.column_by_name("ride_fare");
        let estimated_time = batch.column_by_name("estimated_time");
        let status = batch.column_by_name("status");
        let is_completed = batch.column_by_name("is_completed");
        let is_canceled = batch.column_by_name("is_canceled");
        let picture = batch.column_by_name("driver_profile_picture");
        let vehicle_image = batch.column_by_name("vehicle_image");

        for row in 0..batch.num_rows() {
            let seats_available = required_i64(seats, "seats_available", row)?;
            let seats_available =
                i32::try_from(seats_available).map_err(|_| SchemaError::OutOfRange {
                    column: "seats_available".to_string(),
                    row,
                    value: seats_available,
                })?;

            listings.push(TripListing {
                id: required_i64(id, "id", row)?,
                driver_id: required_i64(user_id, "user_id", row)?,
                vehicle_id: required_i64(vehicle_id, "vehicle_id", row)?,
                pickup_location: required_string(pickup, "pickup_location", row)?,
                drop_location: required_string(drop, "drop_location", row)?,
                date: get_datetime(date.as_ref(), "date", row)?.ok_or_else(|| null("date", row))?,
                seats_available,
                price: get_f64(price.as_ref(), "price", row)?.ok_or_else(|| null("price", row))?,
                ride_fare: optional(ride_fare, "ride_fare", row, get_f64)?,
                estimated_time: optional(estimated_time, "estimated_time", row, get_string)?,
                status: optional(status, "status", row, get_string)?
                    .unwrap_or_else(|| "Scheduled".to_string()),
                is_completed: optional(is_completed, "is_completed", row, get_bool)?
                    .unwrap_or(false),
                is_canceled: optional(is_canceled, "is_canceled", row, get_bool)?.unwrap_or(false),
                driver_name: required_string(driver_name, "driver_name", row)?,
                driver_profile_picture: optional(picture, "driver_profile_picture", row, get_string)?,
                vehicle_type: required_string(vehicle_type, "vehicle_type", row)?,
                vehicle_image: optional(vehicle_image, "vehicle_image", row, get_string)?,
                driver_overall_rating: None,
            });
        }
    }

    Ok(listings)
}

// ── Column access ──

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, SchemaError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
}

fn null(column: &str, row: usize) -> SchemaError {
    SchemaError::NullValue {
        column: column.to_string(),
        row,
    }
}

fn unsupported(name: &str, col: &dyn Array) -> SchemaError {
    SchemaError::UnsupportedType {
        column: name.to_string(),
        data_type: col.data_type().clone(),
    }
}

fn required_i64(col: &ArrayRef, name: &str, row: usize) -> Result<i64, SchemaError> {
    get_i64(col.as_ref(), name, row)?.ok_or_else(|| null(name, row))
}

fn required_string(col: &ArrayRef, name: &str, row: usize) -> Result<String, SchemaError> {
    get_string(col.as_ref(), name, row)?.ok_or_else(|| null(name, row))
}

/// Read an optional column; a missing column reads as null.
fn optional<T>(
    col: Option<&ArrayRef>,
    name: &str,
    row: usize,
    get: fn(&dyn Array, &str, usize) -> Result<Option<T>, SchemaError>,
) -> Result<Option<T>, SchemaError> {
    match col {
        Some(col) => get(col.as_ref(), name, row),
        None => Ok(None),
    }
}

macro_rules! downcast_value {
    ($col:expr, $row:expr, $($array:ty),+) => {
        None$(.or_else(|| {
            $col.as_any()
                .downcast_ref::<$array>()
                .map(|arr| i64::from(arr.value($row)))
        }))+
    };
}

fn get_i64(col: &dyn Array, name: &str, row: usize) -> Result<Option<i64>, SchemaError> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value: Option<i64> = downcast_value!(
        col, row, Int64Array, Int32Array, Int16Array, Int8Array, UInt32Array, UInt16Array,
        UInt8Array
    );
    value.map(Some).ok_or_else(|| unsupported(name, col))
}

fn get_f64(col: &dyn Array, name: &str, row: usize) -> Result<Option<f64>, SchemaError> {
    if col.is_null(row) {
        return Ok(None);
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        return Ok(Some(arr.value(row)));
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        return Ok(Some(f64::from(arr.value(row))));
    }
    // Whole-number prices may arrive as integer columns.
    get_i64(col, name, row).map(|v| v.map(|v| v as f64))
}

fn get_string(col: &dyn Array, name: &str, row: usize) -> Result<Option<String>, SchemaError> {
    if col.is_null(row) {
        return Ok(None);
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
        .or_else(|| {
            col.as_any()
                .downcast_ref::<StringViewArray>()
                .map(|arr| arr.value(row).to_string())
        })
        .map(Some)
        .ok_or_else(|| unsupported(name, col))
}

fn get_bool(col: &dyn Array, name: &str, row: usize) -> Result<Option<bool>, SchemaError> {
    if col.is_null(row) {
        return Ok(None);
    }
    if let Some(arr) = col.as_any().downcast_ref::<BooleanArray>() {
        return Ok(Some(arr.value(row)));
    }
    // SQLite-era exports store flags as 0/1 integers.
    get_i64(col, name, row).map(|v| v.map(|v| v != 0))
}

fn get_datetime(
    col: &dyn Array,
    name: &str,
    row: usize,
) -> Result<Option<NaiveDateTime>, SchemaError> {
    if col.is_null(row) {
        return Ok(None);
    }
    let any = col.as_any();
    let value = if let Some(arr) = any.downcast_ref::<TimestampMicrosecondArray>() {
        arr.value_as_datetime(row)
    } else if let Some(arr) = any.downcast_ref::<TimestampMillisecondArray>() {
        arr.value_as_datetime(row)
    } else if let Some(arr) = any.downcast_ref::<TimestampSecondArray>() {
        arr.value_as_datetime(row)
    } else if let Some(arr) = any.downcast_ref::<TimestampNanosecondArray>() {
        arr.value_as_datetime(row)
    } else if let Some(arr) = any.downcast_ref::<Date32Array>() {
        arr.value_as_datetime(row)
    } else {
        return Err(unsupported(name, col));
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Builder, StringBuilder};
    use arrow::datatypes::{Field, Schema, TimeUnit};
    use std::sync::Arc;

    /// Schema of the `ratings` table.
    fn rating_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("trip_id", DataType::Int64, false),
            Field::new("rated_by_user_id", DataType::Int64, false),
            Field::new("driver_id", DataType::Int64, true),
            Field::new("rating", DataType::Int32, false),
            Field::new("feedback", DataType::Utf8, true),
        ])
    }

    /// Schema of the trip listing projection (trip ⨝ driver ⨝ vehicle).
    fn trip_listing_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("user_id", DataType::Int64, false),
            Field::new("vehicle_id", DataType::Int64, false),
            Field::new("pickup_location", DataType::Utf8, false),
            Field::new("drop_location", DataType::Utf8, false),
            Field::new("date", DataType::Timestamp(TimeUnit::Microsecond, None), false),
            Field::new("seats_available", DataType::Int32, false),
            Field::new("price", DataType::Float64, false),
            Field::new("ride_fare", DataType::Float64, true),
            Field::new("estimated_time", DataType::Utf8, true),
            Field::new("status", DataType::Utf8, true),
            Field::new("is_completed", DataType::Boolean, true),
            Field::new("is_canceled", DataType::Boolean, true),
            Field::new("driver_name", DataType::Utf8, false),
            Field::new("driver_profile_picture", DataType::Utf8, true),
            Field::new("vehicle_type", DataType::Utf8, false),
            Field::new("vehicle_image", DataType::Utf8, true),
        ])
    }

    fn ratings_batch(rows: &[(i64, Option<i64>, i32, Option<&str>)]) -> RecordBatch {
        let mut rating_builder = Int32Builder::new();
        let mut feedback_builder = StringBuilder::new();
        for (_, _, rating, feedback) in rows {
            rating_builder.append_value(*rating);
            feedback_builder.append_option(*feedback);
        }

        RecordBatch::try_new(
            Arc::new(rating_schema()),
            vec![
                Arc::new(Int64Array::from_iter_values(0..rows.len() as i64)),
                Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.0))),
                Arc::new(Int64Array::from_iter_values(rows.iter().map(|_| 7))),
                Arc::new(Int64Array::from(
                    rows.iter().map(|r| r.1).collect::<Vec<_>>(),
                )),
                Arc::new(rating_builder.finish()),
                Arc::new(feedback_builder.finish()),
            ],
        )
        .unwrap()
    }

    fn listing_batch() -> RecordBatch {
        // 2025-02-24T10:00:00 UTC in microseconds.
        let date_micros = 1_740_391_200_000_000i64;
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![10, 20])),
            Arc::new(Int64Array::from(vec![2, 1])),
            Arc::new(Int64Array::from(vec![1, 1])),
            Arc::new(StringArray::from(vec!["Location A", "Location C"])),
            Arc::new(StringArray::from(vec!["Location B", "Location D"])),
            Arc::new(TimestampMicrosecondArray::from(vec![date_micros, date_micros])),
            Arc::new(Int32Array::from(vec![3, 1])),
            Arc::new(Float64Array::from(vec![50.0, 12.5])),
            Arc::new(Float64Array::from(vec![Some(45.0), None])),
            Arc::new(StringArray::from(vec![Some("1 hour"), None])),
            Arc::new(StringArray::from(vec![Some("Scheduled"), None])),
            Arc::new(BooleanArray::from(vec![Some(false), None])),
            Arc::new(BooleanArray::from(vec![Some(false), Some(true)])),
            Arc::new(StringArray::from(vec!["Driver Two", "Driver One"])),
            Arc::new(StringArray::from(vec![None, Some("one.png")])),
            Arc::new(StringArray::from(vec!["Sedan", "Van"])),
            Arc::new(StringArray::from(vec![None::<&str>, None])),
        ];
        RecordBatch::try_new(Arc::new(trip_listing_schema()), columns).unwrap()
    }

    #[test]
    fn decode_ratings() {
        let batch = ratings_batch(&[
            (1, Some(1), 5, Some("excellent and smooth")),
            (2, None, 3, None),
        ]);
        let records = rating_records_from_batches(&[batch]).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].trip_id, 1);
        assert_eq!(records[0].rated_by_user_id, 7);
        assert_eq!(records[0].driver_id, Some(1));
        assert_eq!(records[0].numeric_rating, 5);
        assert_eq!(records[0].feedback.as_deref(), Some("excellent and smooth"));

        assert_eq!(records[1].driver_id, None);
        assert_eq!(records[1].feedback, None);
    }

    #[test]
    fn decode_ratings_across_batches() {
        let b1 = ratings_batch(&[(1, Some(1), 5, None)]);
        let b2 = ratings_batch(&[(2, Some(2), 2, Some("rude"))]);
        let records = rating_records_from_batches(&[b1, b2]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].driver_id, Some(2));
    }

    #[test]
    fn decode_ratings_rejects_negative_rating() {
        let batch = ratings_batch(&[(1, Some(1), -1, None)]);
        let err = rating_records_from_batches(&[batch]).unwrap_err();
        assert!(matches!(err, SchemaError::OutOfRange { row: 0, value: -1, .. }));
    }

    #[test]
    fn decode_ratings_missing_column() {
        let schema = Schema::new(vec![Field::new("trip_id", DataType::Int64, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Int64Array::from(vec![1]))],
        )
        .unwrap();
        let err = rating_records_from_batches(&[batch]).unwrap_err();
        assert!(matches!(err, SchemaError::MissingColumn(ref c) if c == "rated_by_user_id"));
    }

    #[test]
    fn decode_listings() {
        let listings = trip_listings_from_batches(&[listing_batch()]).unwrap();
        assert_eq!(listings.len(), 2);

        let first = &listings[0];
        assert_eq!(first.id, 10);
        assert_eq!(first.driver_id, 2);
        assert_eq!(first.date.to_string(), "2025-02-24 10:00:00");
        assert_eq!(first.ride_fare, Some(45.0));
        assert_eq!(first.estimated_time.as_deref(), Some("1 hour"));
        assert_eq!(first.driver_overall_rating, None);

        let second = &listings[1];
        assert_eq!(second.status, "Scheduled");
        assert!(!second.is_completed);
        assert!(second.is_canceled);
        assert_eq!(second.driver_profile_picture.as_deref(), Some("one.png"));
        assert_eq!(second.vehicle_image, None);
    }

    #[test]
    fn decode_empty_batches() {
        assert!(rating_records_from_batches(&[]).unwrap().is_empty());
        assert!(trip_listings_from_batches(&[]).unwrap().is_empty());
    }
}
