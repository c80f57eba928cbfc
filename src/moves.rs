//! Move reconstruction
//!
//! Walks the stops of a window in chronological order and threads the raw
//! sample stream between them. Each move's distance is the cumulative
//! great-circle length of the sample path, not the stop-to-stop chord, so
//! average speed over a move reflects actual travel. When a stop's inter-stop
//! path is empty (possible only with host-loaded stops whose samples are
//! missing) the remaining samples are threaded into one final move toward an
//! unknown destination.

use crate::config::MobilityConfig;
use crate::error::MobilityError;
use crate::geo::path_distance;
use crate::types::{validate_samples, Location, Move, Sample, Stop};

/// Reconstruct the moves between consecutive stops.
///
/// The walk starts at the earliest sample timestamp with an unknown origin:
/// the first move runs from a synthetic zero-duration anchor at the first
/// sample to the first stop. Moves shorter than the minimum move duration are
/// dropped in a final filter pass.
pub fn reconstruct_moves(
    samples: &[Sample],
    stops: &[Stop],
    config: &MobilityConfig,
) -> Result<Vec<Move>, MobilityError> {
    validate_samples(samples)?;
    if samples.is_empty() || stops.is_empty() {
        return Ok(Vec::new());
    }

    let mut moves = Vec::new();
    let mut departure = samples[0].timestamp;
    let mut prev: Option<Stop> = None;

    for stop in stops {
        let path: Vec<Location> = samples
            .iter()
            .filter(|s| s.timestamp >= departure && s.timestamp <= stop.arrival)
            .map(|s| s.location)
            .collect();

        if !path.is_empty() {
            let stop_from =
                prev.unwrap_or_else(|| Stop::new(path[0], departure, departure));
            moves.push(Move::new(stop_from, *stop, path_distance(&path)));
            departure = stop.departure;
            prev = Some(*stop);
        } else {
            // Dead end: no samples bridge to this stop. Thread whatever
            // remains into a final move toward an unknown destination.
            let tail: Vec<&Sample> = samples
                .iter()
                .filter(|s| s.timestamp >= departure)
                .collect();
            if let Some(last) = tail.last() {
                let origin = prev
                    .unwrap_or_else(|| Stop::new(tail[0].location, departure, departure));
                let stop_to = Stop::new(last.location, last.timestamp, last.timestamp);
                let tail_path: Vec<Location> = tail.iter().map(|s| s.location).collect();
                moves.push(Move::new(origin, stop_to, path_distance(&tail_path)));
            }
            break;
        }
    }

    let min_duration = config.min_move_duration();
    Ok(moves
        .into_iter()
        .filter(|mv| mv.duration() >= min_duration)
        .collect())
}
