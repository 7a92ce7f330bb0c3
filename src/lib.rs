//! ioreplay - Trace normalization engine for multi-rank I/O instrumentation logs
//!
//! This library replays per-rank logs of intercepted I/O calls through a
//! simulated file-descriptor/offset state machine, resolving for every call
//! the file it operated on, the byte range it touched, its function category,
//! and any error/warning condition. The assembled, schema-stable record set
//! is the input contract for downstream analytics.

pub mod classify;
pub mod csv_output;
pub mod dataset;
pub mod fd_table;
pub mod json_output;
pub mod reader;
pub mod record;
pub mod replay;
