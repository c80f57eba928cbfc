//! Stop detection
//!
//! Scans a chronologically ordered sample batch and emits stops: maximal
//! contiguous runs of samples whose running centroid stays within the stop
//! radius. The detector is a three-phase loop per candidate: seed at the
//! first uncovered sample, expand while the next sample lies within the
//! radius of the recomputed centroid, then emit and re-seed at the first
//! sample that fell outside. Candidates shorter than the minimum stop
//! duration are dropped in a final filter pass.

use crate::config::MobilityConfig;
use crate::error::MobilityError;
use crate::geo::{centroid, haversine};
use crate::types::{validate_samples, Location, Sample, Stop};

/// Detect stops in a chronologically ordered sample batch.
///
/// The centroid is recomputed after every included sample so the stop anchor
/// adapts to drift, while any sample beyond the radius forces closure, which
/// bounds each stop's spatial extent. Sample timestamps drive duration, not
/// wall clock. An empty batch yields an empty list.
///
/// Returns [`MobilityError::UnorderedSamples`] or
/// [`MobilityError::InvalidCoordinate`] for structurally invalid batches.
pub fn detect_stops(
    samples: &[Sample],
    config: &MobilityConfig,
) -> Result<Vec<Stop>, MobilityError> {
    validate_samples(samples)?;

    let mut candidates = Vec::new();
    let n = samples.len();
    let mut i = 0;

    while i < n {
        let mut window: Vec<Location> = vec![samples[i].location];
        let mut anchor = centroid(&window);
        let mut j = i + 1;

        // Inclusion uses <=, so a sample exactly at the radius extends the
        // stop; only a strictly greater distance closes it.
        while j < n && haversine(&samples[j].location, &anchor) <= config.min_stop_distance_m {
            window.push(samples[j].location);
            anchor = centroid(&window);
            j += 1;
        }

        candidates.push(Stop::new(
            anchor,
            samples[i].timestamp,
            samples[j - 1].timestamp,
        ));
        i = j;
    }

    let min_duration = config.min_stop_duration();
    Ok(candidates
        .into_iter()
        .filter(|stop| stop.duration() >= min_duration)
        .collect())
}

/// Split every stop that spans one or more midnights into per-day parts.
///
/// The hour aggregation requires arrival and departure on the same calendar
/// day (UTC); an overnight home stop becomes a tail part ending at 23:59:59.999
/// and a head part starting at the next midnight, both keeping the original
/// centroid and place id.
pub fn split_at_midnight(stops: &[Stop]) -> Vec<Stop> {
    let mut parts = Vec::with_capacity(stops.len());
    for stop in stops {
        let mut cursor = *stop;
        while cursor.departure.date_naive() != cursor.arrival.date_naive() {
            let day = cursor.arrival.date_naive();
            let mut head = cursor;
            head.departure = day
                .and_hms_milli_opt(23, 59, 59, 999)
                .expect("valid end of day")
                .and_utc();
            parts.push(head);
            cursor.arrival = day
                .succ_opt()
                .expect("valid next day")
                .and_hms_opt(0, 0, 0)
                .expect("valid midnight")
                .and_utc();
        }
        parts.push(cursor);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, 0).unwrap()
    }

    fn stationary(count: usize, lat: f64, lon: f64, start_h: u32, start_m: u32) -> Vec<Sample> {
        (0..count)
            .map(|k| {
                Sample::new(
                    Location::new(lat, lon),
                    ts(start_h, start_m) + Duration::minutes(k as i64),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_batch_yields_no_stops() {
        let stops = detect_stops(&[], &MobilityConfig::default()).unwrap();
        assert!(stops.is_empty());
    }

    #[test]
    fn test_single_sample_filtered_by_duration() {
        let samples = stationary(1, 55.7, 12.55, 10, 0);
        let stops = detect_stops(&samples, &MobilityConfig::default()).unwrap();
        assert!(stops.is_empty());
    }

    #[test]
    fn test_single_stationary_cluster() {
        // 20 samples at one spot, one per minute: one 19-minute stop.
        let samples = stationary(20, 55.7000, 12.5500, 10, 0);
        let stops = detect_stops(&samples, &MobilityConfig::default()).unwrap();

        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].centroid, Location::new(55.7000, 12.5500));
        assert_eq!(stops[0].arrival, ts(10, 0));
        assert_eq!(stops[0].departure, ts(10, 19));
        assert_eq!(stops[0].duration(), Duration::minutes(19));
    }

    #[test]
    fn test_short_visit_filtered() {
        // 4 samples = 3 minutes, below the 10-minute default.
        let samples = stationary(4, 55.7, 12.55, 10, 0);
        let stops = detect_stops(&samples, &MobilityConfig::default()).unwrap();
        assert!(stops.is_empty());
    }

    #[test]
    fn test_two_distant_clusters_yield_two_stops() {
        let mut samples = stationary(15, 55.7000, 12.5500, 10, 0);
        // ~1.5 km away, well beyond the 50 m radius.
        samples.extend(stationary(15, 55.7130, 12.5550, 10, 15));
        let stops = detect_stops(&samples, &MobilityConfig::default()).unwrap();

        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].departure, ts(10, 14));
        assert_eq!(stops[1].arrival, ts(10, 15));
    }

    #[test]
    fn test_stops_are_disjoint_and_chronological() {
        let mut samples = stationary(12, 55.7000, 12.5500, 8, 0);
        samples.extend(stationary(12, 55.7100, 12.5600, 8, 12));
        samples.extend(stationary(12, 55.7000, 12.5500, 8, 24));
        let stops = detect_stops(&samples, &MobilityConfig::default()).unwrap();

        assert_eq!(stops.len(), 3);
        for pair in stops.windows(2) {
            assert!(pair[0].departure <= pair[1].arrival);
            assert!(pair[0].arrival <= pair[0].departure);
        }
    }

    #[test]
    fn test_sample_exactly_at_radius_is_included() {
        let a = Location::new(55.7000, 12.5500);
        let b = Location::new(55.7003, 12.5500);
        let exact = haversine(&b, &a);

        let mut config = MobilityConfig::default();
        config.min_stop_distance_m = exact;

        let mut samples = stationary(10, a.latitude, a.longitude, 10, 0);
        samples.push(Sample::new(b, ts(10, 10)));
        samples.extend(stationary(5, a.latitude, a.longitude, 10, 11));

        let stops = detect_stops(&samples, &config).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].departure, ts(10, 15));
    }

    #[test]
    fn test_centroid_tracks_drift() {
        // A slow drift of ~4.5 m per minute: the median centroid trails the
        // newest sample by half the covered span, so the stop keeps absorbing
        // samples until the span reaches twice the radius, far longer than a
        // fixed anchor at the first sample would allow.
        let samples: Vec<Sample> = (0..25)
            .map(|k| {
                Sample::new(
                    Location::new(55.7000 + 0.00004 * k as f64, 12.5500),
                    ts(10, 0) + Duration::minutes(k),
                )
            })
            .collect();
        let stops = detect_stops(&samples, &MobilityConfig::default()).unwrap();
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].duration(), Duration::minutes(22));
    }

    #[test]
    fn test_split_same_day_stop_untouched() {
        let stop = Stop::new(Location::new(55.7, 12.55), ts(9, 0), ts(17, 0));
        let parts = split_at_midnight(&[stop]);
        assert_eq!(parts, vec![stop]);
    }

    #[test]
    fn test_split_overnight_stop_into_two_parts() {
        let mut stop = Stop::new(
            Location::new(55.7, 12.55),
            Utc.with_ymd_and_hms(2024, 5, 1, 22, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 2, 5, 0, 0).unwrap(),
        );
        stop.place_id = 3;
        let parts = split_at_midnight(&[stop]);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].arrival, stop.arrival);
        assert_eq!(
            parts[0].departure,
            Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap()
                + Duration::milliseconds(999)
        );
        assert_eq!(
            parts[1].arrival,
            Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
        );
        assert_eq!(parts[1].departure, stop.departure);
        assert!(parts.iter().all(|p| p.place_id == 3));
        assert!(parts.iter().all(|p| p.centroid == stop.centroid));
    }

    #[test]
    fn test_split_multi_day_stop() {
        let stop = Stop::new(
            Location::new(55.7, 12.55),
            Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap(),
        );
        let parts = split_at_midnight(&[stop]);

        assert_eq!(parts.len(), 3);
        for part in &parts {
            assert_eq!(part.arrival.date_naive(), part.departure.date_naive());
        }
        assert_eq!(parts[2].departure, stop.departure);
    }

    #[test]
    fn test_unordered_batch_rejected() {
        let loc = Location::new(55.7, 12.55);
        let samples = vec![Sample::new(loc, ts(10, 5)), Sample::new(loc, ts(10, 0))];
        assert!(matches!(
            detect_stops(&samples, &MobilityConfig::default()),
            Err(MobilityError::UnorderedSamples { .. })
        ));
    }
}
