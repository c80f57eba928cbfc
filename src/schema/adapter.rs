//! Record parsing and validation
//!
//! Accepts newline-delimited JSON (one record per line) or a JSON array and
//! converts wire records into engine samples. Parsing is strict: a malformed
//! line fails the whole batch with its line number, since a silently dropped
//! sample would skew every downstream feature.

use crate::error::MobilityError;
use crate::schema::record::SampleRecord;
use crate::types::Sample;

/// Adapter between wire records and engine samples
pub struct RecordAdapter;

/// A single record's validation failure, by input position
#[derive(Debug, Clone)]
pub struct RecordValidation {
    pub index: usize,
    pub error: String,
}

impl RecordAdapter {
    /// Parse newline-delimited JSON; blank lines are skipped.
    pub fn parse_ndjson(input: &str) -> Result<Vec<SampleRecord>, MobilityError> {
        let mut records = Vec::new();
        for (line_no, line) in input.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: SampleRecord = serde_json::from_str(trimmed).map_err(|e| {
                MobilityError::ParseError(format!("line {}: {}", line_no + 1, e))
            })?;
            records.push(record);
        }
        Ok(records)
    }

    /// Parse a JSON array of records.
    pub fn parse_array(input: &str) -> Result<Vec<SampleRecord>, MobilityError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Convert records to engine samples, validating each.
    pub fn to_samples(records: &[SampleRecord]) -> Result<Vec<Sample>, MobilityError> {
        records.iter().map(SampleRecord::to_sample).collect()
    }

    /// Collect per-record validation failures without converting.
    pub fn validate_records(records: &[SampleRecord]) -> Vec<RecordValidation> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.to_sample().err().map(|e| RecordValidation {
                    index,
                    error: e.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = "\n{\"latitude\": 55.7, \"longitude\": 12.55, \"datetime\": 0}\n\n\
                     {\"latitude\": 55.8, \"longitude\": 12.56, \"datetime\": 60000}\n";
        let records = RecordAdapter::parse_ndjson(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].datetime, 60_000);
    }

    #[test]
    fn test_parse_ndjson_reports_line_number() {
        let input = "{\"latitude\": 55.7, \"longitude\": 12.55, \"datetime\": 0}\nnot json\n";
        let err = RecordAdapter::parse_ndjson(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_array() {
        let input = r#"[
            {"latitude": 55.7, "longitude": 12.55, "datetime": 0},
            {"latitude": 55.7, "longitude": 12.55, "datetime": 1000}
        ]"#;
        let records = RecordAdapter::parse_array(input).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_to_samples_rejects_first_invalid() {
        let records = vec![
            SampleRecord {
                latitude: 55.7,
                longitude: 12.55,
                datetime: 0,
            },
            SampleRecord {
                latitude: 120.0,
                longitude: 12.55,
                datetime: 1000,
            },
        ];
        assert!(RecordAdapter::to_samples(&records).is_err());
    }

    #[test]
    fn test_validate_records_indexes_failures() {
        let records = vec![
            SampleRecord {
                latitude: 55.7,
                longitude: 12.55,
                datetime: 0,
            },
            SampleRecord {
                latitude: 120.0,
                longitude: 12.55,
                datetime: 1000,
            },
            SampleRecord {
                latitude: 55.7,
                longitude: 200.0,
                datetime: 2000,
            },
        ];
        let failures = RecordAdapter::validate_records(&records);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].index, 1);
        assert_eq!(failures[1].index, 2);
    }
}
