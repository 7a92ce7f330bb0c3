//! Trace directory reading and the read-then-normalize path

use std::fs;

use ioreplay::dataset::normalize_dir;
use ioreplay::reader::{read_trace_dir, TraceReadError};

fn write_functions(dir: &std::path::Path, names: &[&str]) {
    let json = serde_json::to_string(names).unwrap();
    fs::write(dir.join("functions.json"), json).unwrap();
}

#[test]
fn reads_ranks_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write_functions(dir.path(), &["open", "write"]);
    fs::write(
        dir.path().join("rank_1.json"),
        r#"[{"func_id":0,"tstart":0.2,"tend":0.3,"res":7,"args":[[47,98],[49]]}]"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("rank_0.json"),
        r#"[{"func_id":0,"tstart":0.1,"tend":0.2,"res":5,"args":[[47,97],[49]]}]"#,
    )
    .unwrap();

    let trace = read_trace_dir(dir.path()).unwrap();
    assert_eq!(trace.functions, vec!["open", "write"]);
    assert_eq!(trace.ranks.len(), 2);
    assert_eq!(trace.ranks[0].rank, 0);
    assert_eq!(trace.ranks[1].rank, 1);
    assert_eq!(trace.ranks[0].records[0].res, 5);
}

#[test]
fn ignores_unrelated_files() {
    let dir = tempfile::tempdir().unwrap();
    write_functions(dir.path(), &["open"]);
    fs::write(dir.path().join("rank_0.json"), "[]").unwrap();
    fs::write(dir.path().join("README.txt"), "not a trace").unwrap();
    fs::write(dir.path().join("rank_x.json"), "not a rank").unwrap();

    let trace = read_trace_dir(dir.path()).unwrap();
    assert_eq!(trace.ranks.len(), 1);
}

#[test]
fn missing_directory_is_fatal() {
    let err = read_trace_dir(std::path::Path::new("/nonexistent/trace-dir")).unwrap_err();
    assert!(matches!(err, TraceReadError::Directory { .. }));
}

#[test]
fn missing_function_table_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("rank_0.json"), "[]").unwrap();

    let err = read_trace_dir(dir.path()).unwrap_err();
    assert!(matches!(err, TraceReadError::MissingFunctionTable(_)));
}

#[test]
fn malformed_rank_file_names_the_rank() {
    let dir = tempfile::tempdir().unwrap();
    write_functions(dir.path(), &["open"]);
    fs::write(dir.path().join("rank_0.json"), "[]").unwrap();
    fs::write(dir.path().join("rank_3.json"), "{not json").unwrap();

    let err = read_trace_dir(dir.path()).unwrap_err();
    match err {
        TraceReadError::MalformedRank { rank, .. } => assert_eq!(rank, 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_function_table_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("functions.json"), "\"not an array").unwrap();

    let err = read_trace_dir(dir.path()).unwrap_err();
    assert!(matches!(err, TraceReadError::MalformedFunctionTable(_)));
}

#[test]
fn normalize_dir_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write_functions(dir.path(), &["open", "write", "close"]);
    // open /a -> fd 5, write 10 bytes, close
    let records = r#"[
        {"func_id":0,"tstart":0.1,"tend":0.2,"res":5,"args":[[47,97],[49]]},
        {"func_id":1,"tstart":0.2,"tend":0.3,"res":10,"args":[[53],[98,117,102],[49,48]]},
        {"func_id":2,"tstart":0.3,"tend":0.4,"res":0,"args":[[53]]}
    ]"#;
    fs::write(dir.path().join("rank_0.json"), records).unwrap();

    let dataset = normalize_dir(dir.path()).unwrap();
    assert_eq!(dataset.records.len(), 3);
    assert_eq!(dataset.records[1].file_name.as_deref(), Some("/a"));
    assert_eq!(dataset.records[1].offset, Some(0));
    assert_eq!(dataset.records[1].io_volume, Some(10));
    assert_eq!(dataset.metadata[0].file_count, 1);
}
