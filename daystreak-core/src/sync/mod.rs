//! Persistence and reconciliation of the statistics snapshot
//!
//! - [`local`]: the always-available key/value tier and snapshot codec
//! - [`queue`]: pending remote writes
//! - [`session`]: the authentication signal gating remote calls
//! - [`reconciler`]: the state machine tying the tiers together

pub mod local;
pub mod queue;
pub mod reconciler;
pub mod session;

pub use local::{
    clear_snapshot, keys, load_queue, load_snapshot, save_queue, save_snapshot, LocalTier,
    MemoryTier,
};
pub use queue::{SyncQueue, SyncToken};
pub use reconciler::{
    DrainOutcome, Initialized, PersistOutcome, Reconciler, SnapshotSource, SyncState,
};
pub use session::{Session, StaticSession};
