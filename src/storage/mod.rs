//! Snapshot persistence module
//!
//! This module keeps the focus timer snapshot on the local device.

pub mod snapshot_store;

pub use snapshot_store::{SnapshotStore, SNAPSHOT_KEY};
