//! Descriptor and end-of-file state for one replay
//!
//! [`DescriptorTable`] simulates one rank's mapping from file descriptor to
//! file identity and running byte offset. Each rank owns an independently
//! allocated table; descriptors are freed on close and the integer may be
//! reused by a later open, so lookups always go through the current table
//! state.
//!
//! [`EofTable`] tracks the maximum offset ever reached per file identity. It
//! is shared across all ranks of a replay: a file genuinely opened by several
//! ranks has one end-of-file, matching filesystem semantics. File identities
//! outlive any one descriptor, so entries persist across open/close cycles.

use std::collections::HashMap;

/// An open file bound to a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFile {
    pub file_name: String,
    /// Current byte offset of the descriptor
    pub offset: u64,
}

/// Per-rank descriptor table, seeded with the standard streams
#[derive(Debug)]
pub struct DescriptorTable {
    entries: HashMap<i64, OpenFile>,
}

impl DescriptorTable {
    /// Fresh table with descriptors 0/1/2 bound to stdin/stdout/stderr
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for (fd, name) in [(0, "stdin"), (1, "stdout"), (2, "stderr")] {
            entries.insert(
                fd,
                OpenFile {
                    file_name: name.to_string(),
                    offset: 0,
                },
            );
        }
        DescriptorTable { entries }
    }

    pub fn get(&self, fd: i64) -> Option<&OpenFile> {
        self.entries.get(&fd)
    }

    pub fn get_mut(&mut self, fd: i64) -> Option<&mut OpenFile> {
        self.entries.get_mut(&fd)
    }

    /// Bind `fd` to `file`, replacing any previous binding of the integer
    pub fn insert(&mut self, fd: i64, file: OpenFile) {
        self.entries.insert(fd, file);
    }

    /// Unbind `fd`; returns the entry that was open, if any
    pub fn remove(&mut self, fd: i64) -> Option<OpenFile> {
        self.entries.remove(&fd)
    }

    pub fn contains(&self, fd: i64) -> bool {
        self.entries.contains_key(&fd)
    }
}

impl Default for DescriptorTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Maximum offset ever reached per file identity
#[derive(Debug, Default)]
pub struct EofTable {
    ends: HashMap<String, u64>,
}

impl EofTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file at end 0 if it has never been seen
    pub fn register(&mut self, file_name: &str) {
        self.ends.entry(file_name.to_string()).or_insert(0);
    }

    /// Current end-of-file; 0 for files never registered
    pub fn end(&self, file_name: &str) -> u64 {
        self.ends.get(file_name).copied().unwrap_or(0)
    }

    /// Raise the end-of-file to `end` if it extends past the current one
    pub fn extend(&mut self, file_name: &str, end: u64) {
        let entry = self.ends.entry(file_name.to_string()).or_insert(0);
        if end > *entry {
            *entry = end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_streams_seeded() {
        let table = DescriptorTable::new();
        assert_eq!(table.get(0).unwrap().file_name, "stdin");
        assert_eq!(table.get(1).unwrap().file_name, "stdout");
        assert_eq!(table.get(2).unwrap().file_name, "stderr");
        assert_eq!(table.get(1).unwrap().offset, 0);
        assert!(!table.contains(3));
    }

    #[test]
    fn test_descriptor_reuse_rebinds() {
        let mut table = DescriptorTable::new();
        table.insert(
            5,
            OpenFile {
                file_name: "/tmp/a".to_string(),
                offset: 10,
            },
        );
        assert!(table.remove(5).is_some());
        assert!(!table.contains(5));
        table.insert(
            5,
            OpenFile {
                file_name: "/tmp/b".to_string(),
                offset: 0,
            },
        );
        assert_eq!(table.get(5).unwrap().file_name, "/tmp/b");
        assert_eq!(table.get(5).unwrap().offset, 0);
    }

    #[test]
    fn test_eof_register_and_extend() {
        let mut eof = EofTable::new();
        assert_eq!(eof.end("/tmp/a"), 0);
        eof.register("/tmp/a");
        assert_eq!(eof.end("/tmp/a"), 0);
        eof.extend("/tmp/a", 100);
        assert_eq!(eof.end("/tmp/a"), 100);
        // extend never shrinks
        eof.extend("/tmp/a", 40);
        assert_eq!(eof.end("/tmp/a"), 100);
        // re-registering keeps the recorded end
        eof.register("/tmp/a");
        assert_eq!(eof.end("/tmp/a"), 100);
    }
}
