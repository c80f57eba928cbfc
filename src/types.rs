//! Core types for the Sojourn pipeline
//!
//! This module defines the value-like records that flow through each stage:
//! samples in, stops and moves through the middle, places and daily features
//! out. Once constructed, entities are never mutated except for the single
//! `place_id` assignment into `Stop` performed by the place clusterer.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MobilityError;
use crate::matrix::HourMatrix;

/// Place id marking a stop that belongs to no place.
pub const NOISE_PLACE: i32 = -1;

/// A geographic coordinate in degrees (WGS-84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees, in [-90, 90]
    pub latitude: f64,
    /// Longitude in degrees, in [-180, 180]
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(&self) -> Result<(), MobilityError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(())
        } else {
            Err(MobilityError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// A single geolocation observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observed position
    pub location: Location,
    /// Observation instant (UTC, millisecond precision)
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(location: Location, timestamp: DateTime<Utc>) -> Self {
        Self {
            location,
            timestamp,
        }
    }
}

/// A maximal contiguous run of samples whose centroid stays within the stop
/// radius and whose duration meets the minimum stop duration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Median centroid of the member samples
    pub centroid: Location,
    /// Timestamp of the first member sample
    pub arrival: DateTime<Utc>,
    /// Timestamp of the last member sample
    pub departure: DateTime<Utc>,
    /// Assigned place id; [`NOISE_PLACE`] until the clusterer runs
    pub place_id: i32,
}

impl Stop {
    /// Create an unclustered stop (`place_id` = [`NOISE_PLACE`]).
    pub fn new(centroid: Location, arrival: DateTime<Utc>, departure: DateTime<Utc>) -> Self {
        Self {
            centroid,
            arrival,
            departure,
            place_id: NOISE_PLACE,
        }
    }

    /// Time spent at the stop.
    pub fn duration(&self) -> Duration {
        self.departure - self.arrival
    }

    /// Calendar day of the arrival (UTC).
    pub fn day(&self) -> NaiveDate {
        self.arrival.date_naive()
    }
}

/// A spatial cluster of stops
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Non-negative id, unique within a processing run
    pub id: i32,
    /// Median centroid of the member stop centroids
    pub centroid: Location,
    /// Total time spent across member stops, in seconds
    pub duration_secs: i64,
}

/// An ordered pair of stops plus the path distance of the samples between
/// them. Boundary moves (window start to first stop, dead-end tail) carry a
/// synthetic zero-duration anchor stop with `place_id` = [`NOISE_PLACE`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Origin stop; its departure is the start of the move
    pub stop_from: Stop,
    /// Destination stop; its arrival is the end of the move
    pub stop_to: Stop,
    /// Cumulative great-circle length of the sample path, meters
    pub distance: f64,
}

impl Move {
    pub fn new(stop_from: Stop, stop_to: Stop, distance: f64) -> Self {
        Self {
            stop_from,
            stop_to,
            distance,
        }
    }

    /// Start of the move.
    pub fn departure(&self) -> DateTime<Utc> {
        self.stop_from.departure
    }

    /// End of the move.
    pub fn arrival(&self) -> DateTime<Utc> {
        self.stop_to.arrival
    }

    /// Travel time between the two stops.
    pub fn duration(&self) -> Duration {
        self.arrival() - self.departure()
    }

    /// Place id of the origin stop.
    pub fn place_from(&self) -> i32 {
        self.stop_from.place_id
    }

    /// Place id of the destination stop.
    pub fn place_to(&self) -> i32 {
        self.stop_to.place_id
    }

    /// Average speed over the path in meters per second; 0 when the move has
    /// zero duration.
    pub fn average_speed(&self) -> f64 {
        let secs = self.duration().num_milliseconds() as f64 / 1000.0;
        if secs > 0.0 {
            self.distance / secs
        } else {
            0.0
        }
    }
}

/// Derived features for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFeatures {
    /// The calendar day the features describe
    pub date: NaiveDate,
    /// Distinct non-noise places visited on the day
    pub number_of_places: usize,
    /// Fraction of matrix occupancy spent at the home place; -1 when no home
    /// place or the matrix sum is zero
    pub home_stay: f64,
    /// Total move distance departing on the day, meters
    pub total_distance: f64,
    /// log(var(lat) + var(lon) + 1) over the day's samples; 0 with fewer than
    /// two samples
    pub location_variance: f64,
    /// Time-place entropy (natural log); 0 when no time or a single place
    pub entropy: f64,
    /// Entropy divided by log(number of places); 0 when places <= 1
    pub normalized_entropy: f64,
    /// Mean occupancy overlap against prior days; -1 when no prior day is
    /// comparable
    pub routine_index: f64,
    /// The day's 24 x P occupancy matrix
    pub hour_matrix: HourMatrix,
}

/// Validate a sample batch: every coordinate in range and finite, timestamps
/// non-decreasing. Structural violations are programmer errors on the caller
/// side and surface loudly here.
pub fn validate_samples(samples: &[Sample]) -> Result<(), MobilityError> {
    for sample in samples {
        sample.location.validate()?;
    }
    for (i, pair) in samples.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(MobilityError::UnorderedSamples {
                index: i + 1,
                prev: pair[0].timestamp.timestamp_millis(),
                next: pair[1].timestamp.timestamp_millis(),
            });
        }
    }
    Ok(())
}
