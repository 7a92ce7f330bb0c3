//! Record assembler
//!
//! Collects per-rank normalized record sequences into one dataset and derives
//! the per-rank metadata summaries. Global record order is per-rank only:
//! ranks are concatenated in rank order, records within a rank stay in
//! non-decreasing tstart order as the replayer emitted them.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::classify::FunctionClassifier;
use crate::fd_table::EofTable;
use crate::reader::{self, RawTrace, TraceReadError};
use crate::record::{NormalizedRecord, PerRankMetadata, UNKNOWN_FILE};
use crate::replay::replay_rank;

/// The normalized output of one whole replay: the record table handed to
/// downstream analytics plus the per-rank metadata table.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceDataset {
    pub records: Vec<NormalizedRecord>,
    pub metadata: Vec<PerRankMetadata>,
}

impl TraceDataset {
    /// Concatenate per-rank record sequences and reduce each into metadata
    pub fn assemble(per_rank: Vec<(u32, Vec<NormalizedRecord>)>) -> Self {
        let mut records = Vec::new();
        let mut metadata = Vec::with_capacity(per_rank.len());
        for (rank, rank_records) in per_rank {
            metadata.push(rank_metadata(rank, &rank_records));
            records.extend(rank_records);
        }
        TraceDataset { records, metadata }
    }
}

fn rank_metadata(rank: u32, records: &[NormalizedRecord]) -> PerRankMetadata {
    let start_timestamp = records
        .iter()
        .map(|r| r.tstart)
        .fold(f64::INFINITY, f64::min);
    let end_timestamp = records
        .iter()
        .map(|r| r.tend)
        .fold(f64::NEG_INFINITY, f64::max);
    let (start_timestamp, end_timestamp) = if records.is_empty() {
        (0.0, 0.0)
    } else {
        (start_timestamp, end_timestamp)
    };

    let files: HashSet<&str> = records
        .iter()
        .filter_map(|r| r.file_name.as_deref())
        .filter(|f| *f != UNKNOWN_FILE)
        .collect();

    PerRankMetadata {
        rank,
        start_timestamp,
        end_timestamp,
        time: end_timestamp - start_timestamp,
        file_count: files.len(),
        total_records: records.len(),
    }
}

/// Replay every rank of a raw trace into the assembled dataset
///
/// Each rank gets its own freshly allocated descriptor table; the end-of-file
/// table is shared across all ranks of the replay, so ranks are replayed
/// sequentially in rank order.
pub fn normalize(trace: &RawTrace) -> TraceDataset {
    let mut classifier = FunctionClassifier::new();
    let mut eof = EofTable::new();

    let mut per_rank = Vec::with_capacity(trace.ranks.len());
    for rank_trace in &trace.ranks {
        debug!(
            rank = rank_trace.rank,
            records = rank_trace.records.len(),
            "replaying rank"
        );
        let records = replay_rank(
            rank_trace.rank,
            &rank_trace.records,
            &trace.functions,
            &mut classifier,
            &mut eof,
        );
        per_rank.push((rank_trace.rank, records));
    }

    TraceDataset::assemble(per_rank)
}

/// Read a trace directory and normalize it in one step
pub fn normalize_dir(dir: &Path) -> Result<TraceDataset, TraceReadError> {
    let trace = reader::read_trace_dir(dir)?;
    Ok(normalize(&trace))
}
