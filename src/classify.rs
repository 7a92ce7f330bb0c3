//! Function classification tables
//!
//! Maps an intercepted function name to its library interface (POSIX, MPI-IO,
//! HDF5), its I/O type (read/write/metadata), its category (I/O,
//! communication, compute), and the replay operation kind. Classification is
//! a pure function of the name string; the [`FunctionClassifier`] memoizes it
//! per distinct name so the replayer never re-scans substrings per record.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// POSIX I/O function names
static POSIX_IO_FUNCTIONS: &[&str] = &[
    "open",
    "open64",
    "creat",
    "creat64",
    "close",
    "read",
    "write",
    "lseek",
    "lseek64",
    "pread",
    "pread64",
    "pwrite",
    "pwrite64",
    "readv",
    "writev",
    "mmap",
    "mmap64",
    "munmap",
    "msync",
    "fopen",
    "fopen64",
    "fdopen",
    "fclose",
    "fread",
    "fwrite",
    "fprintf",
    "fscanf",
    "fgets",
    "fputs",
    "fgetc",
    "fputc",
    "fflush",
    "fseek",
    "fseeko",
    "ftell",
    "ftello",
    "rewind",
    "fsync",
    "fdatasync",
    "ftruncate",
    "truncate",
    "stat",
    "stat64",
    "fstat",
    "fstat64",
    "lstat",
    "lstat64",
    "access",
    "faccessat",
    "unlink",
    "unlinkat",
    "remove",
    "rename",
    "mkdir",
    "rmdir",
    "opendir",
    "readdir",
    "closedir",
    "chmod",
    "fcntl",
    "dup",
    "dup2",
    "pipe",
    "link",
    "symlink",
    "readlink",
    "realpath",
    "getcwd",
    "chdir",
    "umask",
    "tmpfile",
];

/// MPI-IO function names (file manipulation through the MPI interface)
static MPI_IO_FUNCTIONS: &[&str] = &[
    "MPI_File_open",
    "MPI_File_close",
    "MPI_File_delete",
    "MPI_File_read",
    "MPI_File_read_all",
    "MPI_File_read_at",
    "MPI_File_read_at_all",
    "MPI_File_read_ordered",
    "MPI_File_read_shared",
    "MPI_File_iread",
    "MPI_File_iread_at",
    "MPI_File_write",
    "MPI_File_write_all",
    "MPI_File_write_at",
    "MPI_File_write_at_all",
    "MPI_File_write_ordered",
    "MPI_File_write_shared",
    "MPI_File_iwrite",
    "MPI_File_iwrite_at",
    "MPI_File_seek",
    "MPI_File_seek_shared",
    "MPI_File_get_position",
    "MPI_File_get_size",
    "MPI_File_set_size",
    "MPI_File_set_view",
    "MPI_File_get_view",
    "MPI_File_sync",
    "MPI_File_preallocate",
];

/// MPI communication and management function names
static MPI_COMM_FUNCTIONS: &[&str] = &[
    "MPI_Init",
    "MPI_Init_thread",
    "MPI_Finalize",
    "MPI_Comm_rank",
    "MPI_Comm_size",
    "MPI_Comm_dup",
    "MPI_Comm_split",
    "MPI_Comm_free",
    "MPI_Send",
    "MPI_Ssend",
    "MPI_Isend",
    "MPI_Recv",
    "MPI_Irecv",
    "MPI_Sendrecv",
    "MPI_Wait",
    "MPI_Waitall",
    "MPI_Waitany",
    "MPI_Waitsome",
    "MPI_Test",
    "MPI_Barrier",
    "MPI_Bcast",
    "MPI_Reduce",
    "MPI_Allreduce",
    "MPI_Gather",
    "MPI_Gatherv",
    "MPI_Allgather",
    "MPI_Allgatherv",
    "MPI_Scatter",
    "MPI_Scatterv",
    "MPI_Alltoall",
    "MPI_Alltoallv",
    "MPI_Scan",
    "MPI_Cart_create",
    "MPI_Cart_rank",
    "MPI_Cart_coords",
    "MPI_Type_commit",
    "MPI_Type_free",
    "MPI_Op_create",
    "MPI_Wtime",
    "MPI_Abort",
];

/// HDF5 function names
static HDF5_FUNCTIONS: &[&str] = &[
    "H5Fcreate",
    "H5Fopen",
    "H5Fclose",
    "H5Fflush",
    "H5Fget_filesize",
    "H5Dcreate",
    "H5Dcreate1",
    "H5Dcreate2",
    "H5Dopen",
    "H5Dopen1",
    "H5Dopen2",
    "H5Dclose",
    "H5Dread",
    "H5Dwrite",
    "H5Dget_space",
    "H5Dget_type",
    "H5Gcreate",
    "H5Gcreate1",
    "H5Gcreate2",
    "H5Gopen",
    "H5Gopen1",
    "H5Gopen2",
    "H5Gclose",
    "H5Acreate",
    "H5Acreate1",
    "H5Acreate2",
    "H5Aopen",
    "H5Aclose",
    "H5Aread",
    "H5Awrite",
    "H5Screate",
    "H5Screate_simple",
    "H5Sselect_hyperslab",
    "H5Sclose",
    "H5Tcopy",
    "H5Tclose",
    "H5Pcreate",
    "H5Pset_dxpl_mpio",
    "H5Pset_fapl_mpio",
    "H5Pclose",
];

/// Function category: where the call spends its time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Io,
    Communication,
    Compute,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Io => write!(f, "io"),
            Category::Communication => write!(f, "communication"),
            Category::Compute => write!(f, "compute"),
        }
    }
}

/// I/O type: whether the call moves bytes, and in which direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IoType {
    Read,
    Write,
    Metadata,
    NotIo,
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoType::Read => write!(f, "read"),
            IoType::Write => write!(f, "write"),
            IoType::Metadata => write!(f, "metadata"),
            IoType::NotIo => write!(f, "not_io"),
        }
    }
}

/// I/O interface the call goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interface {
    Posix,
    MpiIo,
    Hdf5,
    NotIo,
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interface::Posix => write!(f, "posix"),
            Interface::MpiIo => write!(f, "mpi_io"),
            Interface::Hdf5 => write!(f, "hdf5"),
            Interface::NotIo => write!(f, "not_io"),
        }
    }
}

/// Replay operation kind, dispatched by the descriptor table
///
/// Derived from the function name once per distinct name. Match priority is
/// fixed: `fdopen` before `fopen`/`open`, buffered transfers before `seek`,
/// vector and positioned transfers before the generic `write`/`read` match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// `fdopen`: duplicate an existing descriptor
    Duplicate,
    /// `fopen`/`open` family; `buffered` selects the mode-string append check
    Open { buffered: bool },
    /// `fwrite`/`fread`: volume = arg1 * arg2, descriptor = arg 3
    BufferedTransfer,
    /// `seek` family
    Seek,
    Close,
    Sync,
    /// `writev`/`readv`
    VectorTransfer,
    /// `pwrite`/`pread`: explicit position, running offset untouched
    PositionedTransfer,
    /// generic `write`/`read`: descriptor = arg 0, volume = arg 2
    Transfer,
    /// `fprintf`: descriptor = arg 0, volume = arg 1
    Fprintf,
    /// no descriptor interaction
    Other,
}

/// Full classification of one function name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub io_type: IoType,
    pub interface: Interface,
    pub op: OpKind,
}

fn operation_kind(name: &str) -> OpKind {
    if name.contains("fdopen") {
        OpKind::Duplicate
    } else if name.contains("fopen") {
        OpKind::Open { buffered: true }
    } else if name.contains("open") {
        OpKind::Open { buffered: false }
    } else if name.contains("fwrite") || name.contains("fread") {
        OpKind::BufferedTransfer
    } else if name.contains("seek") {
        OpKind::Seek
    } else if name.contains("close") {
        OpKind::Close
    } else if name.contains("sync") {
        OpKind::Sync
    } else if name.contains("writev") || name.contains("readv") {
        OpKind::VectorTransfer
    } else if name.contains("pwrite") || name.contains("pread") {
        OpKind::PositionedTransfer
    } else if name.contains("write") || name.contains("read") {
        OpKind::Transfer
    } else if name.contains("fprintf") {
        OpKind::Fprintf
    } else {
        OpKind::Other
    }
}

/// Classify a function name
///
/// Pure and total: any string classifies, unmatched names fall through to
/// compute / not-I/O.
pub fn classify(name: &str) -> Classification {
    let posix = POSIX_IO_FUNCTIONS.contains(&name);
    let mpi_io = MPI_IO_FUNCTIONS.contains(&name);
    let hdf5 = HDF5_FUNCTIONS.contains(&name);
    let in_io_table = posix || mpi_io || hdf5;

    let io_type = if name.contains("write") {
        IoType::Write
    } else if name.contains("read") {
        IoType::Read
    } else if in_io_table {
        IoType::Metadata
    } else {
        IoType::NotIo
    };

    let category = if in_io_table {
        Category::Io
    } else if MPI_COMM_FUNCTIONS.contains(&name) {
        Category::Communication
    } else {
        Category::Compute
    };

    let interface = if posix {
        Interface::Posix
    } else if mpi_io {
        Interface::MpiIo
    } else if hdf5 {
        Interface::Hdf5
    } else {
        Interface::NotIo
    };

    Classification {
        category,
        io_type,
        interface,
        op: operation_kind(name),
    }
}

/// Memoizing classifier shared across a whole replay
///
/// Traces repeat a small set of function names millions of times; caching the
/// classification per distinct name keeps the replay loop branch-free.
#[derive(Debug, Default)]
pub struct FunctionClassifier {
    cache: HashMap<String, Classification>,
}

impl FunctionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `name`, computing at most once per distinct name
    pub fn classify(&mut self, name: &str) -> Classification {
        if let Some(cached) = self.cache.get(name) {
            return *cached;
        }
        let classification = classify(name);
        self.cache.insert(name.to_string(), classification);
        classification
    }
}
