//! Raw and normalized call record schemas
//!
//! [`RawCallRecord`] mirrors what the instrumentation collector captures:
//! call arguments as raw byte strings, a return value, and timestamps.
//! [`NormalizedRecord`] is the schema-stable output row handed to downstream
//! analytics; its column names and semantics must not change across versions.

use serde::{Deserialize, Serialize};

use crate::classify::{Category, Interface, IoType};

/// Sentinel file identity for descriptors that could not be resolved
/// (opened before tracing began, or already closed).
pub const UNKNOWN_FILE: &str = "__unknown__";

/// Placeholder argument emitted when a record's argument bytes fail to decode.
pub const UNDECODABLE_ARG: &str = "<undecodable>";

/// One intercepted call as captured by the collector, before resolution
///
/// Arguments are byte strings exactly as intercepted; decoding them is the
/// replayer's job and may fail per record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCallRecord {
    /// Index into the process-wide function-id table
    pub func_id: usize,
    /// Start timestamp, seconds
    pub tstart: f64,
    /// End timestamp, seconds
    pub tend: f64,
    /// Return value; holds the new descriptor for open-family calls
    pub res: i64,
    /// Captured argument count; defaults to `args.len()` when absent
    #[serde(default)]
    pub arg_count: Option<usize>,
    /// Raw argument bytes, one entry per argument
    #[serde(default)]
    pub args: Vec<Vec<u8>>,
}

/// Outcome of decoding a record's argument bytes
///
/// Decode failure is a value, not an unwound error: the replayer emits the
/// record with placeholder arguments and skips file resolution for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedArgs {
    Decoded(Vec<String>),
    Failed,
}

impl RawCallRecord {
    /// Decode all argument byte strings to UTF-8
    ///
    /// Any undecodable argument fails the whole list, matching the
    /// all-or-nothing decode the collector interface exposes.
    pub fn decode_args(&self) -> DecodedArgs {
        let mut decoded = Vec::with_capacity(self.args.len());
        for raw in &self.args {
            match std::str::from_utf8(raw) {
                Ok(s) => decoded.push(s.to_string()),
                Err(_) => return DecodedArgs::Failed,
            }
        }
        DecodedArgs::Decoded(decoded)
    }

    /// Captured argument count, falling back to the decoded list length
    pub fn arg_count(&self) -> usize {
        self.arg_count.unwrap_or(self.args.len())
    }
}

/// Severity of a per-record annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// Non-fatal error or warning attached to one normalized record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub severity: Severity,
    pub message: String,
}

impl Annotation {
    pub fn error(message: impl Into<String>) -> Self {
        Annotation {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Annotation {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// One fully resolved call record, ready for aggregation
///
/// The de facto output contract: column names and semantics are stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub rank: u32,
    pub function_id: usize,
    pub function_name: String,
    pub tstart: f64,
    pub tend: f64,
    /// Elapsed time, `tend - tstart`
    pub time: f64,
    pub arg_count: usize,
    pub args: Vec<String>,
    pub return_value: i64,
    /// Resolved file identity; [`UNKNOWN_FILE`] when resolution failed,
    /// `None` when the call is not file-related
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Byte offset the call touched; `Some(-1)` when resolution failed,
    /// `None` for non-transfer calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    /// Bytes transferred; `None` for non-transfer calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_volume: Option<u64>,
    pub category: Category,
    pub io_type: IoType,
    pub interface: Interface,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<Annotation>,
}

/// Per-rank summary derived once after that rank's replay completes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerRankMetadata {
    pub rank: u32,
    /// Minimum tstart over the rank's records
    pub start_timestamp: f64,
    /// Maximum tend over the rank's records
    pub end_timestamp: f64,
    /// `end_timestamp - start_timestamp`
    pub time: f64,
    /// Distinct resolved file identities, excluding the unknown sentinel
    pub file_count: usize,
    pub total_records: usize,
}
