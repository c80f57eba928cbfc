//! External record schema
//!
//! Text key-value records for interop with an embedding host: samples in,
//! stops and moves as host-visible intermediates. Timestamps on the wire are
//! integer milliseconds since the Unix epoch in UTC; the engine never assumes
//! a time zone beyond that.

pub mod adapter;
pub mod record;

pub use adapter::{RecordAdapter, RecordValidation};
pub use record::{LocationRecord, MoveRecord, SampleRecord, StopRecord, SCHEMA_VERSION};
