//! Daily feature derivation
//!
//! Computes the per-day behavioral feature record from the clustered window:
//! place count, home-stay ratio, distance traveled, location variance,
//! time-place entropy and the cross-day routine index. Data-driven degenerate
//! inputs (no stops, a single place, an empty matrix) yield the documented
//! sentinel for the affected feature and never an error.

use chrono::NaiveDate;

use crate::error::MobilityError;
use crate::matrix::HourMatrix;
use crate::types::{DailyFeatures, Move, Place, Sample, Stop};

/// Feature deriver for one calendar day
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Derive the feature record for `day`.
    ///
    /// `stops`, `places` and `moves` span the whole processing window with
    /// place ids already assigned; `history` holds the occupancy matrices of
    /// prior days for the routine index. Fails only on structural violations
    /// (a stop straddling midnight, a place id outside the matrix).
    pub fn extract(
        day: NaiveDate,
        samples: &[Sample],
        stops: &[Stop],
        places: &[Place],
        moves: &[Move],
        history: &[HourMatrix],
    ) -> Result<DailyFeatures, MobilityError> {
        let matrix = HourMatrix::from_stops(stops, day, places.len())?;

        let day_stops: Vec<&Stop> = stops.iter().filter(|s| s.day() == day).collect();
        let number_of_places = count_distinct_places(&day_stops);
        let entropy = compute_entropy(&day_stops);

        Ok(DailyFeatures {
            date: day,
            number_of_places,
            home_stay: compute_home_stay(&matrix),
            total_distance: moves
                .iter()
                .filter(|m| m.departure().date_naive() == day)
                .map(|m| m.distance)
                .sum(),
            location_variance: compute_location_variance(samples, day),
            entropy,
            normalized_entropy: normalize_entropy(entropy, number_of_places),
            routine_index: compute_routine_index(&matrix, history),
            hour_matrix: matrix,
        })
    }
}

/// Distinct non-noise place ids among the day's stops.
fn count_distinct_places(day_stops: &[&Stop]) -> usize {
    let mut ids: Vec<i32> = day_stops
        .iter()
        .filter(|s| s.place_id >= 0)
        .map(|s| s.place_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids.len()
}

/// Fraction of matrix occupancy spent at the home place.
///
/// -1 when no home place can be determined or the matrix sums to zero.
fn compute_home_stay(matrix: &HourMatrix) -> f64 {
    let home = matrix.home_place_id();
    let total = matrix.sum();
    if home < 0 || total == 0.0 {
        return -1.0;
    }
    matrix.place_hours(home as usize) / total
}

/// log(var(lat) + var(lon) + 1) over the day's samples.
///
/// Population variance; 0 with fewer than two samples on the day.
fn compute_location_variance(samples: &[Sample], day: NaiveDate) -> f64 {
    let day_samples: Vec<&Sample> = samples
        .iter()
        .filter(|s| s.timestamp.date_naive() == day)
        .collect();
    if day_samples.len() < 2 {
        return 0.0;
    }
    let lats: Vec<f64> = day_samples.iter().map(|s| s.location.latitude).collect();
    let lons: Vec<f64> = day_samples.iter().map(|s| s.location.longitude).collect();
    (variance(&lats) + variance(&lons) + 1.0).ln()
}

fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

/// Time-place entropy over the day's stop durations, natural log.
///
/// `-sum((d_p / T) * ln(d_p / T))` with `d_p` the total duration at place p
/// and `T` the day's total; 0 when there is no time on record or only one
/// place was visited.
fn compute_entropy(day_stops: &[&Stop]) -> f64 {
    let mut durations: std::collections::HashMap<i32, f64> = std::collections::HashMap::new();
    for stop in day_stops {
        if stop.place_id >= 0 {
            *durations.entry(stop.place_id).or_insert(0.0) +=
                stop.duration().num_seconds() as f64;
        }
    }
    if durations.len() <= 1 {
        return 0.0;
    }
    let total: f64 = durations.values().sum();
    if total <= 0.0 {
        return 0.0;
    }
    -durations
        .values()
        .filter(|&&d| d > 0.0)
        .map(|d| {
            let p = d / total;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Entropy scaled by its maximum for the day's place count; 0 when a single
/// place (or none) makes the maximum undefined.
fn normalize_entropy(entropy: f64, number_of_places: usize) -> f64 {
    if number_of_places <= 1 {
        return 0.0;
    }
    entropy / (number_of_places as f64).ln()
}

/// Mean occupancy overlap of today's matrix against each comparable history
/// day; -1 when no history day is comparable.
fn compute_routine_index(today: &HourMatrix, history: &[HourMatrix]) -> f64 {
    let overlaps: Vec<f64> = history
        .iter()
        .map(|past| today.overlap(past))
        .filter(|&o| o >= 0.0)
        .collect();
    if overlaps.is_empty() {
        return -1.0;
    }
    overlaps.iter().sum::<f64>() / overlaps.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;
    use chrono::{DateTime, TimeZone, Utc};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn placed_stop(place_id: i32, from: DateTime<Utc>, to: DateTime<Utc>) -> Stop {
        let mut stop = Stop::new(Location::new(55.7, 12.55), from, to);
        stop.place_id = place_id;
        stop
    }

    fn place(id: i32) -> Place {
        Place {
            id,
            centroid: Location::new(55.7, 12.55),
            duration_secs: 0,
        }
    }

    #[test]
    fn test_home_stay_night_and_day_places() {
        // Place 0 holds the night (00:00-05:00 and 22:00-23:59), place 1 the
        // working day (09:00-17:00).
        let stops = vec![
            placed_stop(0, ts(0, 0), ts(5, 0)),
            placed_stop(1, ts(9, 0), ts(17, 0)),
            placed_stop(0, ts(22, 0), ts(23, 59)),
        ];
        let places = [place(0), place(1)];

        let features =
            FeatureExtractor::extract(day(), &[], &stops, &places, &[], &[]).unwrap();

        assert_eq!(features.number_of_places, 2);
        // Home hours 5 + 1h59m of 14h59m total.
        let expected = (5.0 + 119.0 / 60.0) / (13.0 + 119.0 / 60.0);
        assert!((features.home_stay - expected).abs() < 1e-9);
        assert!((features.home_stay - 7.0 / 15.0).abs() < 0.01);
    }

    #[test]
    fn test_home_stay_sentinel_without_night_presence() {
        let stops = vec![placed_stop(0, ts(9, 0), ts(17, 0))];
        let features =
            FeatureExtractor::extract(day(), &[], &stops, &[place(0)], &[], &[]).unwrap();
        assert_eq!(features.home_stay, -1.0);
    }

    #[test]
    fn test_empty_day_yields_sentinels() {
        let features = FeatureExtractor::extract(day(), &[], &[], &[], &[], &[]).unwrap();

        assert_eq!(features.number_of_places, 0);
        assert_eq!(features.home_stay, -1.0);
        assert_eq!(features.total_distance, 0.0);
        assert_eq!(features.location_variance, 0.0);
        assert_eq!(features.entropy, 0.0);
        assert_eq!(features.normalized_entropy, 0.0);
        assert_eq!(features.routine_index, -1.0);
    }

    #[test]
    fn test_entropy_two_equal_places_is_ln_two() {
        let stops = vec![
            placed_stop(0, ts(8, 0), ts(12, 0)),
            placed_stop(1, ts(13, 0), ts(17, 0)),
        ];
        let places = [place(0), place(1)];
        let features =
            FeatureExtractor::extract(day(), &[], &stops, &places, &[], &[]).unwrap();

        assert!((features.entropy - 2.0_f64.ln()).abs() < 1e-9);
        assert!((features.normalized_entropy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_entropy_single_place_sentinel() {
        let stops = vec![placed_stop(0, ts(8, 0), ts(18, 0))];
        let features =
            FeatureExtractor::extract(day(), &[], &stops, &[place(0)], &[], &[]).unwrap();

        assert_eq!(features.number_of_places, 1);
        assert_eq!(features.entropy, 0.0);
        assert_eq!(features.normalized_entropy, 0.0);
    }

    #[test]
    fn test_routine_index_identical_history_is_one() {
        let stops = vec![
            placed_stop(0, ts(0, 0), ts(6, 0)),
            placed_stop(1, ts(9, 0), ts(17, 0)),
        ];
        let places = [place(0), place(1)];
        let matrix = HourMatrix::from_stops(&stops, day(), 2).unwrap();
        let history = vec![matrix; 7];

        let features =
            FeatureExtractor::extract(day(), &[], &stops, &places, &[], &history).unwrap();
        assert!((features.routine_index - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_routine_index_skips_incomparable_days() {
        let stops = vec![placed_stop(0, ts(9, 0), ts(17, 0))];
        let today = HourMatrix::from_stops(&stops, day(), 1).unwrap();
        // One identical day, one empty day: the empty one is not comparable.
        let history = vec![today.clone(), HourMatrix::zeros(1)];

        let features =
            FeatureExtractor::extract(day(), &[], &stops, &[place(0)], &[], &history).unwrap();
        assert!((features.routine_index - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_distance_filters_by_departure_day() {
        let today_move = Move::new(
            placed_stop(0, ts(8, 0), ts(9, 0)),
            placed_stop(1, ts(9, 30), ts(11, 0)),
            1200.0,
        );
        let next = Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap();
        let tomorrow_move = Move::new(
            placed_stop(1, next, next + chrono::Duration::hours(1)),
            placed_stop(0, next + chrono::Duration::hours(2), next + chrono::Duration::hours(3)),
            900.0,
        );

        let stops = vec![
            placed_stop(0, ts(8, 0), ts(9, 0)),
            placed_stop(1, ts(9, 30), ts(11, 0)),
        ];
        let features = FeatureExtractor::extract(
            day(),
            &[],
            &stops,
            &[place(0), place(1)],
            &[today_move, tomorrow_move],
            &[],
        )
        .unwrap();

        assert!((features.total_distance - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_location_variance_stationary_is_zero() {
        let loc = Location::new(55.7, 12.55);
        let samples = vec![
            Sample::new(loc, ts(10, 0)),
            Sample::new(loc, ts(10, 5)),
            Sample::new(loc, ts(10, 10)),
        ];
        let features = FeatureExtractor::extract(day(), &samples, &[], &[], &[], &[]).unwrap();
        assert_eq!(features.location_variance, 0.0);
    }

    #[test]
    fn test_location_variance_grows_with_spread() {
        let near = vec![
            Sample::new(Location::new(55.7000, 12.5500), ts(10, 0)),
            Sample::new(Location::new(55.7001, 12.5501), ts(10, 5)),
        ];
        let far = vec![
            Sample::new(Location::new(55.0, 12.0), ts(10, 0)),
            Sample::new(Location::new(56.4, 13.1), ts(10, 5)),
        ];
        let near_features =
            FeatureExtractor::extract(day(), &near, &[], &[], &[], &[]).unwrap();
        let far_features = FeatureExtractor::extract(day(), &far, &[], &[], &[], &[]).unwrap();

        assert!(near_features.location_variance > 0.0);
        assert!(far_features.location_variance > near_features.location_variance);
    }

    #[test]
    fn test_location_variance_single_sample_is_zero() {
        let samples = vec![Sample::new(Location::new(55.7, 12.55), ts(10, 0))];
        let features = FeatureExtractor::extract(day(), &samples, &[], &[], &[], &[]).unwrap();
        assert_eq!(features.location_variance, 0.0);
    }
}
