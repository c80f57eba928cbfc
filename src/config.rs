//! Tunable parameters for the mobility pipeline

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::MobilityError;

/// Default stop radius in meters
pub const DEFAULT_MIN_STOP_DISTANCE_M: f64 = 50.0;

/// Default minimum stop duration in seconds (10 minutes)
pub const DEFAULT_MIN_STOP_DURATION_SECS: i64 = 600;

/// Default place clustering epsilon in meters
pub const DEFAULT_MIN_PLACE_DISTANCE_M: f64 = 50.0;

/// Default minimum move duration in seconds (5 minutes)
pub const DEFAULT_MIN_MOVE_DURATION_SECS: i64 = 300;

/// Default rolling history window in days
pub const DEFAULT_HISTORY_WINDOW_DAYS: i64 = 28;

/// Tunable parameters controlling stop detection, place clustering, move
/// reconstruction and the routine-index history window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobilityConfig {
    /// Maximum distance from the running centroid for a sample to extend the
    /// current stop, meters
    pub min_stop_distance_m: f64,
    /// Minimum duration for a candidate stop to survive the filter, seconds
    pub min_stop_duration_secs: i64,
    /// DBSCAN epsilon over stop centroids, meters
    pub min_place_distance_m: f64,
    /// Minimum duration for a move to survive the filter, seconds
    pub min_move_duration_secs: i64,
    /// Days of history retained for routine-index comparison
    pub history_window_days: i64,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        Self {
            min_stop_distance_m: DEFAULT_MIN_STOP_DISTANCE_M,
            min_stop_duration_secs: DEFAULT_MIN_STOP_DURATION_SECS,
            min_place_distance_m: DEFAULT_MIN_PLACE_DISTANCE_M,
            min_move_duration_secs: DEFAULT_MIN_MOVE_DURATION_SECS,
            history_window_days: DEFAULT_HISTORY_WINDOW_DAYS,
        }
    }
}

impl MobilityConfig {
    /// Minimum stop duration as a [`Duration`].
    pub fn min_stop_duration(&self) -> Duration {
        Duration::seconds(self.min_stop_duration_secs)
    }

    /// Minimum move duration as a [`Duration`].
    pub fn min_move_duration(&self) -> Duration {
        Duration::seconds(self.min_move_duration_secs)
    }

    /// Reject configurations that cannot drive the pipeline.
    pub fn validate(&self) -> Result<(), MobilityError> {
        if !self.min_stop_distance_m.is_finite() || self.min_stop_distance_m <= 0.0 {
            return Err(MobilityError::InvalidConfig(format!(
                "min_stop_distance_m must be positive, got {}",
                self.min_stop_distance_m
            )));
        }
        if !self.min_place_distance_m.is_finite() || self.min_place_distance_m <= 0.0 {
            return Err(MobilityError::InvalidConfig(format!(
                "min_place_distance_m must be positive, got {}",
                self.min_place_distance_m
            )));
        }
        if self.min_stop_duration_secs < 0 {
            return Err(MobilityError::InvalidConfig(
                "min_stop_duration_secs must be non-negative".to_string(),
            ));
        }
        if self.min_move_duration_secs < 0 {
            return Err(MobilityError::InvalidConfig(
                "min_move_duration_secs must be non-negative".to_string(),
            ));
        }
        if self.history_window_days < 1 {
            return Err(MobilityError::InvalidConfig(
                "history_window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = MobilityConfig::default();
        assert_eq!(config.min_stop_distance_m, 50.0);
        assert_eq!(config.min_stop_duration(), Duration::minutes(10));
        assert_eq!(config.min_place_distance_m, 50.0);
        assert_eq!(config.min_move_duration(), Duration::minutes(5));
        assert_eq!(config.history_window_days, 28);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: MobilityConfig =
            serde_json::from_str(r#"{"min_stop_distance_m": 25.0}"#).unwrap();
        assert_eq!(config.min_stop_distance_m, 25.0);
        assert_eq!(config.min_stop_duration_secs, 600);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = MobilityConfig::default();
        config.min_stop_distance_m = 0.0;
        assert!(config.validate().is_err());

        let mut config = MobilityConfig::default();
        config.history_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = MobilityConfig::default();
        config.min_move_duration_secs = -1;
        assert!(config.validate().is_err());
    }
}
