//! Table rendering for ranked trips and driver reports.
//!
//! Rows are packed into a RecordBatch and printed with Arrow's pretty
//! formatter, so column widths follow the data.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use ridewise_core::{DriverSummary, ReputationScore, TripListing, UserId};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One row per trip, in ranked order.
pub fn trips_batch(trips: &[TripListing]) -> anyhow::Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("rank", DataType::UInt64, false),
        Field::new("trip", DataType::Int64, false),
        Field::new("driver", DataType::Utf8, false),
        Field::new("rating", DataType::Float32, true),
        Field::new("route", DataType::Utf8, false),
        Field::new("date", DataType::Utf8, false),
        Field::new("seats", DataType::Int64, false),
        Field::new("price", DataType::Float64, false),
        Field::new("status", DataType::Utf8, false),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from_iter_values(1..=trips.len() as u64)),
        Arc::new(Int64Array::from_iter_values(trips.iter().map(|t| t.id))),
        Arc::new(StringArray::from_iter_values(
            trips.iter().map(|t| t.driver_name.as_str()),
        )),
        Arc::new(Float32Array::from_iter(
            trips.iter().map(|t| t.driver_overall_rating.map(round2)),
        )),
        Arc::new(StringArray::from_iter_values(
            trips
                .iter()
                .map(|t| format!("{} -> {}", t.pickup_location, t.drop_location)),
        )),
        Arc::new(StringArray::from_iter_values(
            trips.iter().map(|t| t.date.format(DATE_FORMAT).to_string()),
        )),
        Arc::new(Int64Array::from_iter_values(
            trips.iter().map(|t| i64::from(t.seats_available)),
        )),
        Arc::new(Float64Array::from_iter_values(trips.iter().map(|t| t.price))),
        Arc::new(StringArray::from_iter_values(trips.iter().map(|t| {
            if t.is_canceled {
                "Canceled"
            } else if t.is_completed {
                "Completed"
            } else {
                t.status.as_str()
            }
        }))),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// One row per rated driver, ordered by driver id.
pub fn drivers_batch(
    summaries: &BTreeMap<UserId, DriverSummary>,
    reputations: &BTreeMap<UserId, ReputationScore>,
) -> anyhow::Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("driver", DataType::Int64, false),
        Field::new("ratings", DataType::UInt64, false),
        Field::new("avg_rating", DataType::Float32, false),
        Field::new("avg_sentiment", DataType::Float32, false),
        Field::new("predicted", DataType::Float32, true),
    ]));

    let rows: Vec<&DriverSummary> = summaries.values().collect();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|s| s.driver_id))),
        Arc::new(UInt64Array::from_iter_values(
            rows.iter().map(|s| s.sample_count as u64),
        )),
        Arc::new(Float32Array::from_iter_values(
            rows.iter().map(|s| round2(s.avg_numeric_rating)),
        )),
        Arc::new(Float32Array::from_iter_values(
            rows.iter().map(|s| round2(s.avg_sentiment_score)),
        )),
        Arc::new(Float32Array::from_iter(rows.iter().map(|s| {
            reputations
                .get(&s.driver_id)
                .map(|r| round2(r.predicted_rating))
        }))),
    ];

    Ok(RecordBatch::try_new(schema, columns)?)
}

/// Print a batch as an ASCII table on stdout.
pub fn print_table(batch: &RecordBatch) -> anyhow::Result<()> {
    if batch.num_rows() == 0 {
        println!("(no rows)");
        return Ok(());
    }
    println!("{}", pretty_format_batches(std::slice::from_ref(batch))?);
    Ok(())
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
