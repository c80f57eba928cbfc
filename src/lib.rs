//! Sojourn - On-device mobility feature extraction engine
//!
//! Sojourn transforms a chronologically ordered stream of geolocation samples
//! into per-day behavioral features through a deterministic pipeline:
//! stop detection → place clustering → move reconstruction → hour-by-place
//! aggregation → feature derivation.
//!
//! The engine is pure compute: it performs no I/O, holds no resources between
//! runs, and never observes the host's scheduler. Acquisition, persistence
//! and upload belong to the embedding host, which talks to the engine through
//! plain value records.
//!
//! ## Modules
//!
//! - `stops`: incremental-centroid stop detection over the sample stream
//! - `places`: density-based clustering of stops into persistent places
//! - `moves`: path reconstruction between consecutive stops
//! - `matrix`: 24 x P hour-by-place occupancy per calendar day
//! - `features`: daily feature derivation including the cross-day routine index
//! - `pipeline`: orchestration, rolling matrix history, structured events

pub mod config;
pub mod encoder;
pub mod error;
pub mod features;
pub mod geo;
pub mod matrix;
pub mod moves;
pub mod pipeline;
pub mod places;
pub mod schema;
pub mod stops;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::MobilityConfig;
pub use encoder::{FeatureEncoder, FeatureReport, REPORT_VERSION};
pub use error::MobilityError;
pub use features::FeatureExtractor;
pub use matrix::HourMatrix;
pub use moves::reconstruct_moves;
pub use pipeline::{run_window, MatrixHistory, MobilityProcessor, PipelineEvent};
pub use places::cluster_places;
pub use stops::{detect_stops, split_at_midnight};
pub use types::{DailyFeatures, Location, Move, Place, Sample, Stop, NOISE_PLACE};

// Schema exports
pub use schema::{RecordAdapter, SampleRecord, SCHEMA_VERSION};

/// Engine version embedded in all emitted reports
pub const SOJOURN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for emitted reports
pub const PRODUCER_NAME: &str = "sojourn";
