//! Trace directory reader
//!
//! Loads the collector's on-disk output: `functions.json` holding the
//! process-wide function-id table, and one `rank_<N>.json` per rank holding
//! that rank's raw call records in capture order. Structural problems
//! (unreadable directory, missing function table, malformed JSON) are fatal
//! for the read and surface as [`TraceReadError`]; everything downstream of a
//! successful read is infallible per record.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::record::RawCallRecord;

/// Name of the function-id table file inside a trace directory
pub const FUNCTION_TABLE_FILE: &str = "functions.json";

/// Errors reading a trace directory
#[derive(Error, Debug)]
pub enum TraceReadError {
    #[error("cannot read trace directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing function table {FUNCTION_TABLE_FILE} in {0}")]
    MissingFunctionTable(PathBuf),

    #[error("malformed function table: {0}")]
    MalformedFunctionTable(#[source] serde_json::Error),

    #[error("cannot read trace file for rank {rank}: {source}")]
    RankFile {
        rank: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed trace for rank {rank}: {source}")]
    MalformedRank {
        rank: u32,
        #[source]
        source: serde_json::Error,
    },
}

/// One rank's raw records, in capture order
#[derive(Debug, Clone, PartialEq)]
pub struct RankTrace {
    pub rank: u32,
    pub records: Vec<RawCallRecord>,
}

/// A whole captured run: the function-id table plus every rank's records
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrace {
    pub functions: Vec<String>,
    pub ranks: Vec<RankTrace>,
}

/// Parse a rank number out of a `rank_<N>.json` file name
fn rank_of(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("rank_")?
        .strip_suffix(".json")?
        .parse()
        .ok()
}

/// Read a trace directory into a [`RawTrace`]
///
/// Files not matching `rank_<N>.json` are ignored; ranks come back sorted by
/// rank number.
pub fn read_trace_dir(dir: &Path) -> Result<RawTrace, TraceReadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| TraceReadError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut rank_files: Vec<(u32, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| TraceReadError::Directory {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(rank) = rank_of(name) {
            rank_files.push((rank, path));
        } else if name != FUNCTION_TABLE_FILE {
            debug!(file = name, "ignoring unrecognized file in trace directory");
        }
    }
    rank_files.sort_by_key(|(rank, _)| *rank);

    let table_path = dir.join(FUNCTION_TABLE_FILE);
    if !table_path.is_file() {
        return Err(TraceReadError::MissingFunctionTable(dir.to_path_buf()));
    }
    let table_file = File::open(&table_path).map_err(|source| TraceReadError::Directory {
        path: table_path.clone(),
        source,
    })?;
    let functions: Vec<String> = serde_json::from_reader(BufReader::new(table_file))
        .map_err(TraceReadError::MalformedFunctionTable)?;

    let mut ranks = Vec::with_capacity(rank_files.len());
    for (rank, path) in rank_files {
        let file = File::open(&path).map_err(|source| TraceReadError::RankFile { rank, source })?;
        let records: Vec<RawCallRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| TraceReadError::MalformedRank { rank, source })?;
        ranks.push(RankTrace { rank, records });
    }

    Ok(RawTrace { functions, ranks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_of_parsing() {
        assert_eq!(rank_of("rank_0.json"), Some(0));
        assert_eq!(rank_of("rank_17.json"), Some(17));
        assert_eq!(rank_of("rank_.json"), None);
        assert_eq!(rank_of("rank_x.json"), None);
        assert_eq!(rank_of("functions.json"), None);
        assert_eq!(rank_of("rank_3.txt"), None);
    }
}
