//! In-memory index of live records.
//!
//! Rebuilt from the log every time the store is opened; never persisted.

use crate::error::Result;
use crate::records::log::{LogEntry, RecordLog};
use crate::types::RecordId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Index mapping live record ids to the offset of the frame holding them.
pub struct RecordIndex {
    /// Record ID to frame offset.
    id_to_offset: RwLock<HashMap<RecordId, u64>>,

    /// Number of tombstones seen.
    deleted: RwLock<u64>,

    /// Number of frames seen.
    frames: RwLock<u64>,
}

impl RecordIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            id_to_offset: RwLock::new(HashMap::new()),
            deleted: RwLock::new(0),
            frames: RwLock::new(0),
        }
    }

    /// Replay every frame of `log` into a fresh index.
    pub fn rebuild(log: &RecordLog) -> Result<Self> {
        let index = Self::new();
        for frame in log.iter_from(0) {
            let frame = frame?;
            index.apply(frame.offset, &frame.entries);
        }
        Ok(index)
    }

    /// Apply the entries of one frame.
    pub fn apply(&self, offset: u64, entries: &[LogEntry]) {
        let mut ids = self.id_to_offset.write();
        for entry in entries {
            match entry {
                LogEntry::Insert(record) => {
                    ids.insert(record.id, offset);
                }
                LogEntry::Delete { id } => {
                    if ids.remove(id).is_some() {
                        *self.deleted.write() += 1;
                    }
                }
            }
        }
        *self.frames.write() += 1;
    }

    /// Get the frame offset for a live record.
    pub fn get_offset(&self, id: RecordId) -> Option<u64> {
        self.id_to_offset.read().get(&id).copied()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.id_to_offset.read().contains_key(&id)
    }

    /// Get count of live records.
    pub fn count(&self) -> usize {
        self.id_to_offset.read().len()
    }

    /// Get count of deleted records.
    pub fn deleted_count(&self) -> u64 {
        *self.deleted.read()
    }

    pub fn frame_count(&self) -> u64 {
        *self.frames.read()
    }
}

impl Default for RecordIndex {
    fn default() -> Self {
        Self::new()
    }
}
