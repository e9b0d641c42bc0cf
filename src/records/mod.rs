//! Purchase log implementation.
//!
//! Records are stored in an append-only log of checksummed frames, with an
//! in-memory index of live record ids rebuilt on open.

mod index;
mod log;

pub use index::RecordIndex;
pub use log::{Frame, FrameIterator, LogEntry, RecordLog};
