//! Error types for the Sojourn engine

use thiserror::Error;

/// Errors that can occur during mobility computation.
///
/// Data-driven degenerate conditions (no stops, zero matrix sum, a single
/// place) never produce an error; the affected feature returns its documented
/// sentinel instead. Errors are reserved for structural violations the caller
/// must repair before retrying.
#[derive(Debug, Error)]
pub enum MobilityError {
    #[error("Samples out of order at index {index}: {prev} ms followed by {next} ms")]
    UnorderedSamples { index: usize, prev: i64, next: i64 },

    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Stop straddles midnight: arrives {arrival}, departs {departure}")]
    StraddlesMidnight { arrival: String, departure: String },

    #[error("Place id {place_id} outside matrix width {num_places}")]
    PlaceOutOfRange { place_id: i32, num_places: usize },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse record: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
