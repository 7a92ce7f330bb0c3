//! Trace replayer: the descriptor-resolution state machine
//!
//! Replays one rank's raw call records in start-time order against a fresh
//! [`DescriptorTable`], resolving for every call the file it operated on, the
//! byte range it touched, and any error/warning condition. Failures local to
//! one record never abort the rank: unresolvable descriptors fall back to the
//! unknown-file sentinel and the replay carries on.

use tracing::{debug, warn};

use crate::classify::{FunctionClassifier, OpKind};
use crate::fd_table::{DescriptorTable, EofTable, OpenFile};
use crate::record::{
    Annotation, DecodedArgs, NormalizedRecord, RawCallRecord, UNDECODABLE_ARG, UNKNOWN_FILE,
};

const ERR_UNKNOWN_DESCRIPTOR: &str = "unknown descriptor";
const ERR_FDOPEN_UNKNOWN: &str = "fdopen of non-existing descriptor";
const ERR_SEEK_BEFORE_START: &str = "seek beyond start of file";
const WARN_SEEK_PAST_END: &str = "seek beyond end of file";
const ERR_DECODE_FAILURE: &str = "argument decode failure";

/// Append flag value for the numeric-flags `open` variant
const APPEND_FLAG: i64 = 2;

/// File/offset resolution of a single call
#[derive(Debug, Default)]
struct Resolution {
    file_name: Option<String>,
    offset: Option<i64>,
    io_volume: Option<u64>,
    annotation: Option<Annotation>,
}

impl Resolution {
    /// A call that expected an open descriptor but found none
    fn unknown_descriptor(io_volume: Option<u64>, with_offset: bool) -> Self {
        Resolution {
            file_name: Some(UNKNOWN_FILE.to_string()),
            offset: with_offset.then_some(-1),
            io_volume,
            annotation: Some(Annotation::error(ERR_UNKNOWN_DESCRIPTOR)),
        }
    }
}

fn parse_int(args: &[String], index: usize) -> Option<i64> {
    args.get(index)?.trim().parse().ok()
}

/// Descriptor argument: missing or non-numeric parses to -1, which is never
/// an open descriptor and so takes the unknown path.
fn parse_fd(args: &[String], index: usize) -> i64 {
    parse_int(args, index).unwrap_or(-1)
}

fn parse_volume(args: &[String], index: usize) -> Option<u64> {
    args.get(index)?.trim().parse().ok()
}

/// Volume of an fwrite/fread call: element size times element count
fn buffered_volume(args: &[String]) -> Option<u64> {
    parse_volume(args, 1)?.checked_mul(parse_volume(args, 2)?)
}

/// Advance a descriptor's running offset by a transfer and extend EOF
fn advance_transfer(
    fds: &mut DescriptorTable,
    eof: &mut EofTable,
    fd: i64,
    io_volume: Option<u64>,
) -> Resolution {
    let Some(entry) = fds.get_mut(fd) else {
        debug!(fd, "transfer on unknown descriptor");
        return Resolution::unknown_descriptor(io_volume, true);
    };
    let start = entry.offset;
    if let Some(volume) = io_volume {
        entry.offset = entry.offset.saturating_add(volume);
    }
    let file_name = entry.file_name.clone();
    let new_offset = entry.offset;
    eof.extend(&file_name, new_offset);
    Resolution {
        file_name: Some(file_name),
        offset: Some(start as i64),
        io_volume,
        annotation: None,
    }
}

fn apply_open(
    record: &RawCallRecord,
    args: &[String],
    buffered: bool,
    fds: &mut DescriptorTable,
    eof: &mut EofTable,
) -> Resolution {
    let Some(file_name) = args.first() else {
        return Resolution {
            file_name: Some(UNKNOWN_FILE.to_string()),
            annotation: Some(Annotation::error("missing file name argument")),
            ..Resolution::default()
        };
    };
    eof.register(file_name);
    let append = if buffered {
        args.get(1).is_some_and(|mode| mode.contains('a'))
    } else {
        parse_int(args, 1) == Some(APPEND_FLAG)
    };
    let offset = if append { eof.end(file_name) } else { 0 };
    fds.insert(
        record.res,
        OpenFile {
            file_name: file_name.clone(),
            offset,
        },
    );
    Resolution {
        file_name: Some(file_name.clone()),
        ..Resolution::default()
    }
}

fn apply_duplicate(record: &RawCallRecord, args: &[String], fds: &mut DescriptorTable) -> Resolution {
    let source = parse_fd(args, 0);
    let Some(entry) = fds.get(source) else {
        debug!(source, "fdopen of unknown descriptor");
        return Resolution {
            file_name: Some(UNKNOWN_FILE.to_string()),
            annotation: Some(Annotation::error(ERR_FDOPEN_UNKNOWN)),
            ..Resolution::default()
        };
    };
    let file_name = entry.file_name.clone();
    fds.insert(
        record.res,
        OpenFile {
            file_name: file_name.clone(),
            offset: 0,
        },
    );
    Resolution {
        file_name: Some(file_name),
        ..Resolution::default()
    }
}

fn apply_seek(args: &[String], fds: &mut DescriptorTable, eof: &EofTable) -> Resolution {
    let fd = parse_fd(args, 0);
    let Some(entry) = fds.get_mut(fd) else {
        debug!(fd, "seek on unknown descriptor");
        return Resolution::unknown_descriptor(None, true);
    };
    let file_name = entry.file_name.clone();
    let (Some(delta), Some(whence)) = (parse_int(args, 1), parse_int(args, 2)) else {
        return Resolution {
            file_name: Some(file_name),
            offset: Some(entry.offset as i64),
            annotation: Some(Annotation::error("malformed seek arguments")),
            ..Resolution::default()
        };
    };
    let end = eof.end(&file_name) as i64;
    let target = match whence {
        0 => Some(delta),
        1 => Some((entry.offset as i64).saturating_add(delta)),
        2 => Some(end.saturating_add(delta)),
        _ => None,
    };
    let annotation = match target {
        None => Some(Annotation::error("unsupported seek whence")),
        Some(t) if t < 0 => {
            // not applied: offsets never go negative
            Some(Annotation::error(ERR_SEEK_BEFORE_START))
        }
        Some(t) => {
            entry.offset = t as u64;
            if (whence == 1 || whence == 2) && t > end {
                warn!(file = %file_name, target = t, end, "seek beyond end of file");
                Some(Annotation::warning(WARN_SEEK_PAST_END))
            } else {
                None
            }
        }
    };
    Resolution {
        file_name: Some(file_name),
        offset: Some(entry.offset as i64),
        io_volume: None,
        annotation,
    }
}

fn apply_positioned(args: &[String], fds: &DescriptorTable, eof: &mut EofTable) -> Resolution {
    let fd = parse_fd(args, 0);
    let io_volume = parse_volume(args, 2);
    let Some(entry) = fds.get(fd) else {
        debug!(fd, "positioned transfer on unknown descriptor");
        return Resolution::unknown_descriptor(io_volume, true);
    };
    let file_name = entry.file_name.clone();
    let Some(position) = parse_int(args, 3) else {
        return Resolution {
            file_name: Some(file_name),
            io_volume,
            annotation: Some(Annotation::error("malformed position argument")),
            ..Resolution::default()
        };
    };
    if position < 0 {
        return Resolution {
            file_name: Some(file_name),
            offset: Some(position),
            io_volume,
            annotation: Some(Annotation::error(ERR_SEEK_BEFORE_START)),
        };
    }
    let prior_end = eof.end(&file_name);
    let annotation = if position as u64 > prior_end {
        warn!(file = %file_name, position, end = prior_end, "positioned transfer beyond end of file");
        Some(Annotation::warning(WARN_SEEK_PAST_END))
    } else {
        None
    };
    eof.extend(
        &file_name,
        (position as u64).saturating_add(io_volume.unwrap_or(0)),
    );
    Resolution {
        file_name: Some(file_name),
        offset: Some(position),
        io_volume,
        annotation,
    }
}

fn apply_close(args: &[String], fds: &mut DescriptorTable) -> Resolution {
    let fd = parse_fd(args, 0);
    match fds.remove(fd) {
        Some(entry) => Resolution {
            file_name: Some(entry.file_name),
            ..Resolution::default()
        },
        None => {
            debug!(fd, "close of unknown descriptor");
            Resolution::unknown_descriptor(None, false)
        }
    }
}

fn apply_sync(args: &[String], fds: &DescriptorTable) -> Resolution {
    let fd = parse_fd(args, 0);
    match fds.get(fd) {
        Some(entry) => Resolution {
            file_name: Some(entry.file_name.clone()),
            ..Resolution::default()
        },
        None => {
            debug!(fd, "sync of unknown descriptor");
            Resolution::unknown_descriptor(None, false)
        }
    }
}

/// Feed one decoded call through the descriptor table
fn apply_call(
    op: OpKind,
    record: &RawCallRecord,
    args: &[String],
    fds: &mut DescriptorTable,
    eof: &mut EofTable,
) -> Resolution {
    match op {
        OpKind::Duplicate => apply_duplicate(record, args, fds),
        OpKind::Open { buffered } => apply_open(record, args, buffered, fds, eof),
        OpKind::BufferedTransfer => {
            let volume = buffered_volume(args);
            let fd = parse_fd(args, 3);
            advance_transfer(fds, eof, fd, volume)
        }
        OpKind::Seek => apply_seek(args, fds, eof),
        OpKind::Close => apply_close(args, fds),
        OpKind::Sync => apply_sync(args, fds),
        OpKind::VectorTransfer | OpKind::Transfer => {
            let volume = parse_volume(args, 2);
            let fd = parse_fd(args, 0);
            advance_transfer(fds, eof, fd, volume)
        }
        OpKind::PositionedTransfer => apply_positioned(args, fds, eof),
        OpKind::Fprintf => {
            let volume = parse_volume(args, 1);
            let fd = parse_fd(args, 0);
            advance_transfer(fds, eof, fd, volume)
        }
        OpKind::Other => Resolution::default(),
    }
}

/// Replay one rank's raw records into normalized records
///
/// Records are stably sorted by tstart (equal timestamps preserve capture
/// order) and fed sequentially through a fresh descriptor table. The
/// [`EofTable`] is threaded in from the caller so end-of-file tracking spans
/// all ranks of the replay.
pub fn replay_rank(
    rank: u32,
    records: &[RawCallRecord],
    functions: &[String],
    classifier: &mut FunctionClassifier,
    eof: &mut EofTable,
) -> Vec<NormalizedRecord> {
    let mut ordered: Vec<&RawCallRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.tstart.total_cmp(&b.tstart));

    let mut fds = DescriptorTable::new();
    let mut out = Vec::with_capacity(records.len());

    for record in ordered {
        let function_name = functions
            .get(record.func_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let classification = classifier.classify(&function_name);

        let (args, resolution) = match record.decode_args() {
            DecodedArgs::Decoded(args) => {
                let resolution = apply_call(classification.op, record, &args, &mut fds, eof);
                (args, resolution)
            }
            DecodedArgs::Failed => {
                debug!(rank, function = %function_name, "argument decode failure");
                let placeholders = vec![UNDECODABLE_ARG.to_string(); record.args.len()];
                let resolution = Resolution {
                    annotation: Some(Annotation::error(ERR_DECODE_FAILURE)),
                    ..Resolution::default()
                };
                (placeholders, resolution)
            }
        };

        out.push(NormalizedRecord {
            rank,
            function_id: record.func_id,
            function_name,
            tstart: record.tstart,
            tend: record.tend,
            time: record.tend - record.tstart,
            arg_count: record.arg_count(),
            args,
            return_value: record.res,
            file_name: resolution.file_name,
            offset: resolution.offset,
            io_volume: resolution.io_volume,
            category: classification.category,
            io_type: classification.io_type,
            interface: classification.interface,
            annotation: resolution.annotation,
        });
    }

    out
}
