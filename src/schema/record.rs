//! mobility.sample.v1 record definitions
//!
//! Flat serde records mirroring the engine's entities, with epoch-millisecond
//! timestamps instead of rich time types. Conversions validate coordinates
//! and timestamp representability on the way in.

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::MobilityError;
use crate::types::{Location, Move, Sample, Stop};

/// Current input schema version
pub const SCHEMA_VERSION: &str = "mobility.sample.v1";

/// Wire coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Location> for LocationRecord {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

/// Wire sample: coordinates plus epoch milliseconds (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Milliseconds since the Unix epoch, UTC
    pub datetime: i64,
}

impl SampleRecord {
    /// Check coordinate ranges without converting.
    pub fn validate(&self) -> Result<(), MobilityError> {
        Location::new(self.latitude, self.longitude).validate()
    }

    /// Convert to an engine sample, validating on the way.
    pub fn to_sample(&self) -> Result<Sample, MobilityError> {
        let location = Location::new(self.latitude, self.longitude);
        location.validate()?;
        let timestamp = DateTime::from_timestamp_millis(self.datetime).ok_or_else(|| {
            MobilityError::ParseError(format!("timestamp out of range: {}", self.datetime))
        })?;
        Ok(Sample::new(location, timestamp))
    }

    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            latitude: sample.location.latitude,
            longitude: sample.location.longitude,
            datetime: sample.timestamp.timestamp_millis(),
        }
    }
}

/// Wire stop: centroid, place assignment and visit interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub centroid: LocationRecord,
    pub place_id: i32,
    /// Milliseconds since the Unix epoch, UTC
    pub arrival: i64,
    /// Milliseconds since the Unix epoch, UTC
    pub departure: i64,
}

impl StopRecord {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            centroid: stop.centroid.into(),
            place_id: stop.place_id,
            arrival: stop.arrival.timestamp_millis(),
            departure: stop.departure.timestamp_millis(),
        }
    }

    /// Convert to an engine stop, validating centroid and interval.
    pub fn to_stop(&self) -> Result<Stop, MobilityError> {
        let centroid = Location::new(self.centroid.latitude, self.centroid.longitude);
        centroid.validate()?;
        let arrival = DateTime::from_timestamp_millis(self.arrival).ok_or_else(|| {
            MobilityError::ParseError(format!("arrival out of range: {}", self.arrival))
        })?;
        let departure = DateTime::from_timestamp_millis(self.departure).ok_or_else(|| {
            MobilityError::ParseError(format!("departure out of range: {}", self.departure))
        })?;
        if departure < arrival {
            return Err(MobilityError::ParseError(format!(
                "stop departs before it arrives: {} < {}",
                self.departure, self.arrival
            )));
        }
        let mut stop = Stop::new(centroid, arrival, departure);
        stop.place_id = self.place_id;
        Ok(stop)
    }
}

/// Wire move: two stop records and the path distance in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub stop_from: StopRecord,
    pub stop_to: StopRecord,
    pub distance: f64,
}

impl MoveRecord {
    pub fn from_move(mv: &Move) -> Self {
        Self {
            stop_from: StopRecord::from_stop(&mv.stop_from),
            stop_to: StopRecord::from_stop(&mv.stop_to),
            distance: mv.distance,
        }
    }

    pub fn to_move(&self) -> Result<Move, MobilityError> {
        Ok(Move::new(
            self.stop_from.to_stop()?,
            self.stop_to.to_stop()?,
            self.distance,
        ))
    }
}
