//! Append-only purchase log.
//!
//! The log is a sequence of frames. Each frame carries one or more entries
//! (inserts or delete tombstones) behind a single CRC32. A frame cut short by
//! a crash is discarded when the log is reopened; a complete frame that fails
//! its checksum is an error and the file is left untouched.

use crate::error::{LedgerError, Result};
use crate::types::{NewPurchase, PurchaseRecord, RecordId, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Magic bytes for log frames.
const LOG_MAGIC: &[u8; 4] = b"PLG\0";

/// Current log format version.
const LOG_VERSION: u8 = 1;

/// Frame header size (fixed part).
const FRAME_HEADER_SIZE: u64 = 4 + 1 + 1 + 8 + 4; // magic + version + flags + timestamp + payload length

/// Trailing checksum size.
const FRAME_CHECKSUM_SIZE: u64 = 4;

/// One change recorded in the log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LogEntry {
    Insert(PurchaseRecord),
    Delete { id: RecordId },
}

/// A decoded frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Byte offset of the frame in the log.
    pub offset: u64,
    /// When the frame was written.
    pub timestamp: Timestamp,
    pub entries: Vec<LogEntry>,
}

/// Append-only purchase log.
pub struct RecordLog {
    /// Log file handle.
    file: RwLock<File>,

    /// Next record ID to assign.
    next_id: RwLock<u64>,

    /// End of the last valid frame (where the next frame goes).
    file_size: RwLock<u64>,

    /// Number of writes since last sync.
    writes_since_sync: RwLock<u64>,

    /// Sync every N writes.
    sync_interval: u64,
}

impl RecordLog {
    /// Every frame is synced before the append returns.
    pub const DEFAULT_SYNC_INTERVAL: u64 = 1;

    /// Open or create a log with the default sync interval.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_sync_interval(path, Self::DEFAULT_SYNC_INTERVAL)
    }

    /// Open or create a log with a custom sync interval.
    /// - sync_interval = 0 or 1: sync every frame
    /// - sync_interval = N: sync every N frames
    pub fn open_with_sync_interval(path: impl AsRef<Path>, sync_interval: u64) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;

        let (valid_end, max_id) = Self::recover(&mut file)?;

        Ok(Self {
            file: RwLock::new(file),
            next_id: RwLock::new(max_id + 1),
            file_size: RwLock::new(valid_end),
            writes_since_sync: RwLock::new(0),
            sync_interval: if sync_interval == 0 { 1 } else { sync_interval },
        })
    }

    /// Append inserts as a single frame, assigning ids and creation time.
    ///
    /// Returns the stored records and the frame offset.
    pub fn append_inserts(&self, inputs: Vec<NewPurchase>) -> Result<(Vec<PurchaseRecord>, u64)> {
        let mut file = self.file.write();

        let created_at = Timestamp::now();
        let first = *self.next_id.read();
        let count = inputs.len() as u64;

        let records: Vec<PurchaseRecord> = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| input.into_record(RecordId(first + i as u64), created_at))
            .collect();

        let entries: Vec<LogEntry> = records.iter().cloned().map(LogEntry::Insert).collect();
        let offset = self.write_frame(&mut file, &entries, created_at)?;

        // Ids are only consumed once the frame is in the log.
        *self.next_id.write() = first + count;

        Ok((records, offset))
    }

    /// Append a delete tombstone for `id`.
    pub fn append_delete(&self, id: RecordId) -> Result<u64> {
        let mut file = self.file.write();
        self.write_frame(&mut file, &[LogEntry::Delete { id }], Timestamp::now())
    }

    /// Force sync all pending writes to disk.
    pub fn sync(&self) -> Result<()> {
        let file = self.file.write();
        file.sync_all()?;
        *self.writes_since_sync.write() = 0;
        Ok(())
    }

    /// Read the frame at a given offset.
    ///
    /// Returns the frame and its encoded length.
    pub fn read_at(&self, offset: u64) -> Result<(Frame, u64)> {
        let end = *self.file_size.read();
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(offset))?;
        read_frame(&mut *file, offset, end.saturating_sub(offset))
    }

    /// Iterate all frames from a given offset.
    pub fn iter_from(&self, offset: u64) -> FrameIterator<'_> {
        FrameIterator {
            log: self,
            offset,
            end: *self.file_size.read(),
        }
    }

    /// Current size of the valid log.
    pub fn size(&self) -> u64 {
        *self.file_size.read()
    }

    /// Id the next insert will receive.
    pub fn next_id(&self) -> RecordId {
        RecordId(*self.next_id.read())
    }

    /// Encode and write one frame at the end of the log.
    fn write_frame(&self, file: &mut File, entries: &[LogEntry], timestamp: Timestamp) -> Result<u64> {
        let payload = rmp_serde::to_vec(entries)?;
        let payload_len = u32::try_from(payload.len())
            .map_err(|_| LedgerError::Serialization("frame payload exceeds 4 GiB".into()))?;

        let mut buf = Vec::with_capacity(
            FRAME_HEADER_SIZE as usize + payload.len() + FRAME_CHECKSUM_SIZE as usize,
        );
        buf.extend_from_slice(LOG_MAGIC);
        buf.push(LOG_VERSION);
        // Flags (reserved)
        buf.push(0u8);
        buf.extend_from_slice(&timestamp.0.to_le_bytes());
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&payload);
        buf.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());

        let offset = *self.file_size.read();
        let mut writes = self.writes_since_sync.write();
        let sync_now = *writes + 1 >= self.sync_interval;

        let written = file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| file.write_all(&buf))
            .and_then(|_| if sync_now { file.sync_all() } else { Ok(()) });

        if let Err(e) = written {
            // The caller sees a failure, so the frame must not survive in
            // the file either. file_size still marks the last complete frame.
            if let Err(trunc) = file.set_len(offset) {
                tracing::error!(offset, error = %trunc, "failed to discard partial frame");
            }
            return Err(e.into());
        }

        *self.file_size.write() = offset + buf.len() as u64;
        *writes = if sync_now { 0 } else { *writes + 1 };

        Ok(offset)
    }

    /// Scan the log, truncating a frame cut short at the end of the file.
    ///
    /// Any other decoding failure is returned as is and the file is not
    /// modified. Returns the end of the valid region and the highest id ever
    /// inserted.
    fn recover(file: &mut File) -> Result<(u64, u64)> {
        let file_size = file.metadata()?.len();
        let mut valid_end = 0u64;
        let mut max_id = 0u64;

        {
            file.seek(SeekFrom::Start(0))?;
            let mut reader = BufReader::new(&mut *file);

            while valid_end < file_size {
                match read_frame(&mut reader, valid_end, file_size - valid_end) {
                    Ok((frame, len)) => {
                        for entry in &frame.entries {
                            if let LogEntry::Insert(record) = entry {
                                max_id = max_id.max(record.id.0);
                            }
                        }
                        valid_end += len;
                    }
                    Err(LedgerError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                        tracing::warn!(
                            offset = valid_end,
                            discarded_bytes = file_size - valid_end,
                            "truncating incomplete frame at end of log"
                        );
                        break;
                    }
                    Err(e) => {
                        tracing::error!(offset = valid_end, error = %e, "corrupt frame in log");
                        return Err(e);
                    }
                }
            }
        }

        if valid_end < file_size {
            file.set_len(valid_end)?;
            file.sync_all()?;
        }

        Ok((valid_end, max_id))
    }
}

/// Decode one frame from the reader's current position.
///
/// `available` is the number of log bytes from `offset` to the end of the
/// file. A frame that would need more than that fails with `UnexpectedEof`
/// before its payload is allocated.
fn read_frame<R: Read>(reader: &mut R, offset: u64, available: u64) -> Result<(Frame, u64)> {
    // Magic
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != LOG_MAGIC {
        return Err(LedgerError::InvalidFormat("Invalid frame magic".into()));
    }

    // Version
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != LOG_VERSION {
        return Err(LedgerError::InvalidFormat(format!(
            "Unsupported log version: {}",
            version[0]
        )));
    }

    // Flags
    let mut _flags = [0u8; 1];
    reader.read_exact(&mut _flags)?;

    // Timestamp
    let mut ts_bytes = [0u8; 8];
    reader.read_exact(&mut ts_bytes)?;
    let timestamp = Timestamp(i64::from_le_bytes(ts_bytes));

    // Payload
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let payload_len = u32::from_le_bytes(len_bytes) as usize;
    let len = FRAME_HEADER_SIZE + payload_len as u64 + FRAME_CHECKSUM_SIZE;
    if len > available {
        return Err(LedgerError::Io(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("frame of {} bytes runs past end of log ({} left)", len, available),
        )));
    }
    let mut payload = vec![0u8; payload_len];
    reader.read_exact(&mut payload)?;

    // Checksum
    let mut checksum_bytes = [0u8; 4];
    reader.read_exact(&mut checksum_bytes)?;
    let stored_checksum = u32::from_le_bytes(checksum_bytes);
    let computed_checksum = crc32fast::hash(&payload);

    if stored_checksum != computed_checksum {
        return Err(LedgerError::ChecksumMismatch {
            expected: stored_checksum,
            got: computed_checksum,
        });
    }

    let entries: Vec<LogEntry> = rmp_serde::from_slice(&payload)?;

    Ok((
        Frame {
            offset,
            timestamp,
            entries,
        },
        len,
    ))
}

/// Iterator over frames in the log.
pub struct FrameIterator<'a> {
    log: &'a RecordLog,
    offset: u64,
    end: u64,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.end {
            return None;
        }

        match self.log.read_at(self.offset) {
            Ok((frame, len)) => {
                self.offset += len;
                Some(Ok(frame))
            }
            Err(e) => {
                self.offset = self.end; // Stop iteration on error
                Some(Err(e))
            }
        }
    }
}
