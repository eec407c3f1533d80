//! # Storage
//!
//! Local persistence of the ledger snapshot and the remote mirrors it is
//! synced to.
//!
//! - [`json`]: the snapshot as a JSON file in the data directory
//! - [`memory`]: an in-process slot, for tests and throwaway sessions
//! - [`remote`]: a simulated remote with configurable latency
//! - [`git`]: a git repository mirror

pub mod git;
pub mod json;
pub mod memory;
pub mod remote;
pub mod traits;

#[cfg(test)]
pub mod test_utils;

pub use git::GitMirrorRemote;
pub use json::{JsonConnection, SnapshotRepository};
pub use memory::MemoryStorage;
pub use remote::SimulatedRemote;
pub use traits::{RemoteStore, SnapshotStorage};
