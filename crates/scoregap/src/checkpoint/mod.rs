//! Resume markers: the next unprocessed index, the committed report length
//! and the running totals, persisted as a small line-oriented text file.

pub mod codec;
pub mod store;

pub use codec::{Checkpoint, CheckpointParseError, CheckpointState};
pub use store::{CheckpointError, CheckpointStore};
