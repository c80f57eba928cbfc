//! Pipeline orchestration
//!
//! One processing cycle runs samples through stop detection, place
//! clustering and move reconstruction, then derives an occupancy matrix and
//! feature record for every calendar day the samples cover. The cycle is a
//! pure function of its inputs; the stateful [`MobilityProcessor`] adds a
//! rolling per-day matrix history so the routine index can compare against
//! days processed in earlier calls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::MobilityConfig;
use crate::error::MobilityError;
use crate::features::FeatureExtractor;
use crate::matrix::HourMatrix;
use crate::moves::reconstruct_moves;
use crate::places::cluster_places;
use crate::stops::{detect_stops, split_at_midnight};
use crate::types::{DailyFeatures, Sample};

/// Structured progress events delivered to an optional host-supplied sink.
///
/// The engine never prints; a host that wants visibility into a run installs
/// a sink with [`MobilityProcessor::set_event_sink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    StopsDetected { count: usize },
    PlacesClustered { count: usize },
    MovesReconstructed { count: usize },
    DayProcessed { date: NaiveDate, comparable_days: usize },
}

/// Host-supplied structured event callback
pub type EventSink = Box<dyn Fn(&PipelineEvent) + Send>;

/// Rolling store of per-day occupancy matrices for routine-index comparison
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatrixHistory {
    days: Vec<DayMatrix>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DayMatrix {
    date: NaiveDate,
    matrix: HourMatrix,
}

impl MatrixHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrices of days strictly before `day` and at most `window_days` old,
    /// oldest first.
    pub fn before(&self, day: NaiveDate, window_days: i64) -> Vec<HourMatrix> {
        self.days
            .iter()
            .filter(|entry| {
                let age = (day - entry.date).num_days();
                age >= 1 && age <= window_days
            })
            .map(|entry| entry.matrix.clone())
            .collect()
    }

    /// Insert or replace the matrix for a day, keeping dates sorted.
    pub fn insert(&mut self, date: NaiveDate, matrix: HourMatrix) {
        self.days.retain(|entry| entry.date != date);
        self.days.push(DayMatrix { date, matrix });
        self.days.sort_by_key(|entry| entry.date);
    }

    /// Drop days that can no longer fall inside a window ending after
    /// `latest`.
    pub fn trim(&mut self, latest: NaiveDate, window_days: i64) {
        self.days
            .retain(|entry| (latest - entry.date).num_days() < window_days);
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Stateful processor maintaining config, matrix history and the event sink.
///
/// Use this when windows arrive incrementally and the routine index should
/// reach back into previously processed days.
pub struct MobilityProcessor {
    config: MobilityConfig,
    history: MatrixHistory,
    event_sink: Option<EventSink>,
}

impl Default for MobilityProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MobilityProcessor {
    /// Create a processor with default parameters.
    pub fn new() -> Self {
        Self::with_config(MobilityConfig::default())
    }

    /// Create a processor with explicit parameters.
    pub fn with_config(config: MobilityConfig) -> Self {
        Self {
            config,
            history: MatrixHistory::new(),
            event_sink: None,
        }
    }

    pub fn config(&self) -> &MobilityConfig {
        &self.config
    }

    /// Install a structured-event callback; replaces any previous sink.
    pub fn set_event_sink(&mut self, sink: EventSink) {
        self.event_sink = Some(sink);
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(sink) = &self.event_sink {
            sink(&event);
        }
    }

    /// Process one sample window and emit a feature record per calendar day.
    ///
    /// Samples must be chronologically ordered with valid coordinates. Each
    /// day's routine index is computed against earlier days of this window
    /// plus retained history; afterwards the day's matrix joins the history
    /// and entries that fell out of the rolling window are evicted.
    pub fn process_window(
        &mut self,
        samples: &[Sample],
    ) -> Result<Vec<DailyFeatures>, MobilityError> {
        self.config.validate()?;
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let mut stops = detect_stops(samples, &self.config)?;
        self.emit(PipelineEvent::StopsDetected { count: stops.len() });

        let places = cluster_places(&mut stops, &self.config);
        self.emit(PipelineEvent::PlacesClustered {
            count: places.len(),
        });

        let moves = reconstruct_moves(samples, &stops, &self.config)?;
        self.emit(PipelineEvent::MovesReconstructed { count: moves.len() });

        // The aggregator requires same-day stops; overnight stops are split
        // here, after clustering, so both parts keep their place.
        let day_stops = split_at_midnight(&stops);

        let mut days: Vec<NaiveDate> = samples
            .iter()
            .map(|s| s.timestamp.date_naive())
            .collect();
        days.dedup();

        let mut features_out = Vec::with_capacity(days.len());
        for day in days {
            let history = self.history.before(day, self.config.history_window_days);
            let features = FeatureExtractor::extract(
                day,
                samples,
                &day_stops,
                &places,
                &moves,
                &history,
            )?;
            self.emit(PipelineEvent::DayProcessed {
                date: day,
                comparable_days: history.len(),
            });
            self.history.insert(day, features.hour_matrix.clone());
            features_out.push(features);
        }

        if let Some(latest) = features_out.last().map(|f| f.date) {
            self.history.trim(latest, self.config.history_window_days);
        }
        Ok(features_out)
    }

    /// Days currently retained for routine-index comparison.
    pub fn history_day_count(&self) -> usize {
        self.history.day_count()
    }

    /// Forget all retained matrices.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Serialize the matrix history for persistence by the host.
    pub fn save_history(&self) -> Result<String, MobilityError> {
        Ok(self.history.to_json()?)
    }

    /// Restore a matrix history produced by [`save_history`].
    ///
    /// [`save_history`]: MobilityProcessor::save_history
    pub fn load_history(&mut self, json: &str) -> Result<(), MobilityError> {
        self.history = MatrixHistory::from_json(json)?;
        Ok(())
    }
}

/// Process a sample window with no prior history (stateless, one-shot).
///
/// Days within the window still see each other: the routine index of a later
/// day compares against the earlier days of the same window.
pub fn run_window(
    samples: &[Sample],
    config: &MobilityConfig,
) -> Result<Vec<DailyFeatures>, MobilityError> {
    MobilityProcessor::with_config(*config).process_window(samples)
}
