//! Place clustering
//!
//! Density-based clustering (DBSCAN) over stop centroids with great-circle
//! distance and a minimum neighborhood size of one. With `min_points = 1`
//! every stop is reachable, so the result is a partition of the stops into
//! connected components under the epsilon-neighbor relation. Cluster labels
//! become place ids; they are assigned in stop iteration order and are stable
//! only within a single processing run.

use std::collections::VecDeque;

use crate::config::MobilityConfig;
use crate::geo::{centroid, haversine};
use crate::types::{Location, Place, Stop, NOISE_PLACE};

/// Cluster stops into places and assign each stop's `place_id`.
///
/// This is the sole writer of `place_id`. Returns the places in id order;
/// each place's centroid is the median centroid of its member stops and its
/// duration the sum of member stop durations.
pub fn cluster_places(stops: &mut [Stop], config: &MobilityConfig) -> Vec<Place> {
    let n = stops.len();
    let mut labels: Vec<i32> = vec![NOISE_PLACE; n];
    let mut next_label: i32 = 0;

    for seed in 0..n {
        if labels[seed] != NOISE_PLACE {
            continue;
        }
        let label = next_label;
        next_label += 1;
        labels[seed] = label;

        // Expand the epsilon-connected component around the seed.
        let mut frontier = VecDeque::from([seed]);
        while let Some(idx) = frontier.pop_front() {
            for other in 0..n {
                if labels[other] == NOISE_PLACE
                    && haversine(&stops[idx].centroid, &stops[other].centroid)
                        <= config.min_place_distance_m
                {
                    labels[other] = label;
                    frontier.push_back(other);
                }
            }
        }
    }

    for (stop, label) in stops.iter_mut().zip(&labels) {
        stop.place_id = *label;
    }

    (0..next_label)
        .map(|id| {
            let members: Vec<&Stop> = stops.iter().filter(|s| s.place_id == id).collect();
            let centers: Vec<Location> = members.iter().map(|s| s.centroid).collect();
            Place {
                id,
                centroid: centroid(&centers),
                duration_secs: members.iter().map(|s| s.duration().num_seconds()).sum(),
            }
        })
        .collect()
}
