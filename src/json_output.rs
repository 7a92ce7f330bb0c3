//! JSON output format for normalized trace datasets

use serde::Serialize;

use crate::dataset::TraceDataset;
use crate::record::{NormalizedRecord, PerRankMetadata};

/// Summary block of the JSON envelope
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_ranks: usize,
    pub total_records: usize,
}

/// Root JSON output structure
///
/// The record rows keep the stable NormalizedRecord schema; optional columns
/// are omitted when absent.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub records: &'a [NormalizedRecord],
    pub metadata: &'a [PerRankMetadata],
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Wrap a dataset in the versioned JSON envelope
    pub fn new(dataset: &'a TraceDataset) -> Self {
        JsonOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "ioreplay-json-v1".to_string(),
            records: &dataset.records,
            metadata: &dataset.metadata,
            summary: JsonSummary {
                total_ranks: dataset.metadata.len(),
                total_records: dataset.records.len(),
            },
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{Category, Interface, IoType};

    fn sample_record() -> NormalizedRecord {
        NormalizedRecord {
            rank: 0,
            function_id: 2,
            function_name: "write".to_string(),
            tstart: 0.1,
            tend: 0.2,
            time: 0.1,
            arg_count: 3,
            args: vec!["5".to_string(), "buf".to_string(), "10".to_string()],
            return_value: 10,
            file_name: Some("/tmp/a".to_string()),
            offset: Some(0),
            io_volume: Some(10),
            category: Category::Io,
            io_type: IoType::Write,
            interface: Interface::Posix,
            annotation: None,
        }
    }

    #[test]
    fn test_envelope_fields() {
        let dataset = TraceDataset {
            records: vec![sample_record()],
            metadata: vec![PerRankMetadata {
                rank: 0,
                start_timestamp: 0.1,
                end_timestamp: 0.2,
                time: 0.1,
                file_count: 1,
                total_records: 1,
            }],
        };
        let json = JsonOutput::new(&dataset).to_json().unwrap();
        assert!(json.contains("\"format\": \"ioreplay-json-v1\""));
        assert!(json.contains("\"total_ranks\": 1"));
        assert!(json.contains("\"function_name\": \"write\""));
        assert!(json.contains("\"io_type\": \"write\""));
        assert!(json.contains("\"interface\": \"posix\""));
    }

    #[test]
    fn test_optional_columns_omitted() {
        let mut record = sample_record();
        record.file_name = None;
        record.offset = None;
        record.io_volume = None;
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("file_name"));
        assert!(!json.contains("offset"));
        assert!(!json.contains("io_volume"));
        assert!(!json.contains("annotation"));
    }
}
