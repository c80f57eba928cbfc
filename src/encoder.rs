//! Feature report encoding
//!
//! Wraps derived daily features in a versioned report carrying producer and
//! provenance metadata, so hosts can attribute and deduplicate outputs.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MobilityError;
use crate::types::DailyFeatures;
use crate::{PRODUCER_NAME, SOJOURN_VERSION};

/// Current output report version
pub const REPORT_VERSION: &str = "mobility.features.v1";

/// Producer metadata embedded in every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// A versioned batch of daily feature records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub computed_at_utc: String,
    pub days: Vec<DailyFeatures>,
}

/// Encoder producing versioned feature reports
pub struct FeatureEncoder {
    instance_id: String,
}

impl Default for FeatureEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEncoder {
    /// Create an encoder with a unique instance id.
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance id.
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Wrap daily features in a report.
    pub fn encode(&self, days: Vec<DailyFeatures>) -> FeatureReport {
        FeatureReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: SOJOURN_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            days,
        }
    }

    /// Wrap daily features and serialize the report to JSON.
    pub fn encode_to_json(&self, days: Vec<DailyFeatures>) -> Result<String, MobilityError> {
        Ok(serde_json::to_string(&self.encode(days))?)
    }
}
