//! Index Module
//!
//! In-memory map from key to the log offset of its latest record.
//!
//! ## Responsibilities
//! - O(1) point lookups for `get`
//! - Liveness oracle for merge: a record is live iff the index points at it
//! - Rebuilt from scratch by replaying the log at open time
//!
//! ## Data Structure Choice
//! A plain `HashMap<Vec<u8>, u64>`: no ordering is needed, and the store
//! guards it together with the log cursor under one `RwLock`, so the index
//! itself carries no lock.

mod keydir;
mod replay;

pub use keydir::Index;
pub use replay::ReplayResult;
