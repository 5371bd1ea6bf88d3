//! Local/remote reconciliation
//!
//! The local tier is written first on every persist and read first on
//! startup. The remote tier, when the session is authenticated and the server
//! is reachable, always wins: a successful fetch overwrites local state and
//! clears the local copy.
//!
//! Pending remote writes are stored in the local tier. While one is pending,
//! startup pushes the local snapshot instead of fetching, so an undelivered
//! day is never overwritten by an older remote copy.

use crate::config::SyncConfig;
use crate::remote::RemoteTier;
use crate::types::StatisticsSnapshot;

use super::local::{
    clear_snapshot, load_queue, load_snapshot, save_queue, save_snapshot, LocalTier,
};
use super::queue::{SyncQueue, SyncToken};
use super::session::Session;

/// Where the reconciler's view of the statistics came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing loaded yet
    Uninitialized,
    /// Local tier loaded; remote not reached
    Loaded,
    /// Remote tier fetched or written successfully
    Reconciled,
}

/// Which tier supplied the snapshot returned by [`Reconciler::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Local,
    Remote,
}

/// Result of [`Reconciler::initialize`].
#[derive(Debug, Clone)]
pub struct Initialized {
    pub snapshot: StatisticsSnapshot,
    pub source: SnapshotSource,
}

/// Result of [`Reconciler::persist`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Not authenticated; only the local tier was written
    LocalOnly,
    /// Written to both tiers
    Synced,
    /// Remote write failed; a retry token was enqueued
    Queued,
}

/// Result of [`Reconciler::drain_sync_queue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Queue empty or session not authenticated
    Idle,
    /// Pending write delivered
    Synced,
    /// Write failed and the token was dropped
    Dropped,
    /// Write failed and the token was put back
    Requeued,
}

/// Two-tier persistence with a retry queue.
pub struct Reconciler<L, R, S> {
    local: L,
    remote: R,
    session: S,
    queue: SyncQueue,
    state: SyncState,
    config: SyncConfig,
}

impl<L, R, S> Reconciler<L, R, S>
where
    L: LocalTier,
    R: RemoteTier,
    S: Session,
{
    pub fn new(local: L, remote: R, session: S, config: SyncConfig) -> Self {
        Self {
            local,
            remote,
            session,
            queue: SyncQueue::new(),
            state: SyncState::Uninitialized,
            config,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Whether a failed remote write is waiting to be retried.
    pub fn is_sync_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Load local state, then adopt the remote snapshot if it can be fetched.
    ///
    /// A failed fetch leaves the local snapshot in place and schedules
    /// nothing. When a write from an earlier run is still pending, the local
    /// snapshot is pushed instead and no fetch happens.
    pub async fn initialize(&mut self) -> Initialized {
        let local = load_snapshot(&self.local);
        for token in load_queue(&self.local).tokens() {
            self.queue.enqueue(token);
        }
        self.state = SyncState::Loaded;
        tracing::debug!(
            current_streak = local.current_streak,
            records = local.activity_logs.len(),
            pending = self.queue.len(),
            "Loaded local statistics"
        );

        if !self.session.is_authenticated() {
            return Initialized {
                snapshot: local,
                source: SnapshotSource::Local,
            };
        }

        if !self.queue.is_empty() {
            self.deliver_pending(&local).await;
            return Initialized {
                snapshot: local,
                source: SnapshotSource::Local,
            };
        }

        match self.remote.fetch().await {
            Ok(remote) => {
                tracing::info!(
                    current_streak = remote.current_streak,
                    records = remote.activity_logs.len(),
                    "Adopted remote statistics"
                );
                if let Err(e) = clear_snapshot(&self.local) {
                    tracing::warn!(
                        error = %e,
                        "Failed to clear local statistics after remote fetch"
                    );
                }
                self.state = SyncState::Reconciled;
                Initialized {
                    snapshot: remote,
                    source: SnapshotSource::Remote,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error fetching statistics, using local data");
                Initialized {
                    snapshot: local,
                    source: SnapshotSource::Local,
                }
            }
        }
    }

    /// Write `snapshot` locally, then remotely when authenticated.
    pub async fn persist(&mut self, snapshot: &StatisticsSnapshot) -> PersistOutcome {
        if let Err(e) = save_snapshot(&self.local, snapshot) {
            tracing::warn!(error = %e, "Error saving statistics locally");
        }

        if !self.session.is_authenticated() {
            return PersistOutcome::LocalOnly;
        }

        match self.remote.push(snapshot).await {
            Ok(()) => {
                // A full snapshot supersedes anything still pending
                if !self.queue.is_empty() {
                    self.queue.take_all();
                    self.store_queue();
                }
                self.state = SyncState::Reconciled;
                PersistOutcome::Synced
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error saving statistics, queued for retry");
                self.queue.enqueue(SyncToken::Statistics);
                self.store_queue();
                PersistOutcome::Queued
            }
        }
    }

    /// Retry a pending remote write once.
    ///
    /// The queue is cleared before the attempt. Unless
    /// `requeue_on_drain_failure` is set, a failed attempt drops the token.
    pub async fn drain_sync_queue(&mut self, snapshot: &StatisticsSnapshot) -> DrainOutcome {
        if !self.session.is_authenticated() || self.queue.is_empty() {
            return DrainOutcome::Idle;
        }

        let tokens = self.queue.take_all();
        self.store_queue();
        tracing::debug!(pending = tokens.len(), "Draining sync queue");

        match self.remote.push(snapshot).await {
            Ok(()) => {
                self.state = SyncState::Reconciled;
                DrainOutcome::Synced
            }
            Err(e) if self.config.requeue_on_drain_failure => {
                tracing::warn!(error = %e, "Error processing sync queue, requeued");
                for token in tokens {
                    self.queue.enqueue(token);
                }
                self.store_queue();
                DrainOutcome::Requeued
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error processing sync queue, retry dropped");
                DrainOutcome::Dropped
            }
        }
    }

    /// Push a write left pending by an earlier run. The token is kept on
    /// failure so the next start tries again.
    async fn deliver_pending(&mut self, snapshot: &StatisticsSnapshot) {
        match self.remote.push(snapshot).await {
            Ok(()) => {
                tracing::info!("Delivered statistics pending from an earlier run");
                self.queue.take_all();
                self.store_queue();
                self.state = SyncState::Reconciled;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Pending statistics still undelivered, keeping local data"
                );
            }
        }
    }

    fn store_queue(&self) {
        if let Err(e) = save_queue(&self.local, &self.queue) {
            tracing::warn!(error = %e, "Failed to store pending sync tokens");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use crate::sync::local::keys;
    use crate::sync::{MemoryTier, StaticSession};

    type TestReconciler = Reconciler<MemoryTier, MemoryRemote, StaticSession>;

    fn reconciler(authenticated: bool, remote: MemoryRemote) -> TestReconciler {
        Reconciler::new(
            MemoryTier::new(),
            remote,
            StaticSession::new(authenticated),
            SyncConfig::default(),
        )
    }

    fn snapshot(current: u32) -> StatisticsSnapshot {
        StatisticsSnapshot {
            current_streak: current,
            longest_streak: current,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initialize_local_only_when_signed_out() {
        let mut sync = reconciler(false, MemoryRemote::with_snapshot(snapshot(9)));
        save_snapshot(sync.local(), &snapshot(2)).unwrap();

        let init = sync.initialize().await;
        assert_eq!(init.source, SnapshotSource::Local);
        assert_eq!(init.snapshot.current_streak, 2);
        assert_eq!(sync.state(), SyncState::Loaded);
        assert_eq!(sync.remote().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_initialize_remote_wins_and_clears_local() {
        let mut sync = reconciler(true, MemoryRemote::with_snapshot(snapshot(9)));
        save_snapshot(sync.local(), &snapshot(2)).unwrap();

        let init = sync.initialize().await;
        assert_eq!(init.source, SnapshotSource::Remote);
        assert_eq!(init.snapshot.current_streak, 9);
        assert_eq!(sync.state(), SyncState::Reconciled);
        for key in keys::ALL {
            assert!(sync.local().get(key).unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_initialize_fetch_failure_keeps_local() {
        let remote = MemoryRemote::with_snapshot(snapshot(9));
        remote.set_available(false);
        let mut sync = reconciler(true, remote);
        save_snapshot(sync.local(), &snapshot(2)).unwrap();

        let init = sync.initialize().await;
        assert_eq!(init.source, SnapshotSource::Local);
        assert_eq!(init.snapshot.current_streak, 2);
        assert_eq!(sync.state(), SyncState::Loaded);
        assert!(!sync.is_sync_pending());
        assert!(sync.local().get(keys::CURRENT_STREAK).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_persist_signed_out_writes_local_only() {
        let mut sync = reconciler(false, MemoryRemote::new());

        assert_eq!(sync.persist(&snapshot(3)).await, PersistOutcome::LocalOnly);
        assert_eq!(load_snapshot(sync.local()).current_streak, 3);
        assert_eq!(sync.remote().push_count(), 0);
    }

    #[tokio::test]
    async fn test_persist_failure_enqueues_once() {
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut sync = reconciler(true, remote);

        assert_eq!(sync.persist(&snapshot(3)).await, PersistOutcome::Queued);
        assert_eq!(sync.persist(&snapshot(4)).await, PersistOutcome::Queued);
        assert_eq!(sync.queue().len(), 1);
        // Local write still happened
        assert_eq!(load_snapshot(sync.local()).current_streak, 4);
    }

    #[tokio::test]
    async fn test_drain_delivers_current_snapshot() {
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut sync = reconciler(true, remote);
        sync.persist(&snapshot(3)).await;

        sync.remote().set_available(true);
        assert_eq!(sync.drain_sync_queue(&snapshot(5)).await, DrainOutcome::Synced);
        assert!(!sync.is_sync_pending());
        assert_eq!(sync.remote().stored().unwrap().current_streak, 5);
        assert_eq!(sync.drain_sync_queue(&snapshot(5)).await, DrainOutcome::Idle);
    }

    #[tokio::test]
    async fn test_drain_failure_drops_token_by_default() {
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut sync = reconciler(true, remote);
        sync.persist(&snapshot(3)).await;

        assert_eq!(sync.drain_sync_queue(&snapshot(3)).await, DrainOutcome::Dropped);
        assert!(!sync.is_sync_pending());
    }

    #[tokio::test]
    async fn test_drain_failure_requeues_when_configured() {
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut sync = Reconciler::new(
            MemoryTier::new(),
            remote,
            StaticSession::new(true),
            SyncConfig {
                requeue_on_drain_failure: true,
            },
        );
        sync.persist(&snapshot(3)).await;

        assert_eq!(sync.drain_sync_queue(&snapshot(3)).await, DrainOutcome::Requeued);
        assert!(sync.is_sync_pending());
    }

    #[tokio::test]
    async fn test_drain_idle_when_signed_out() {
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut sync = reconciler(true, remote);
        sync.persist(&snapshot(3)).await;

        sync.session().set_authenticated(false);
        assert_eq!(sync.drain_sync_queue(&snapshot(3)).await, DrainOutcome::Idle);
        // Token survives until a drain is actually dispatched
        assert!(sync.is_sync_pending());
    }

    #[tokio::test]
    async fn test_pending_token_is_stored_locally() {
        crate::logging::init_test();
        let remote = MemoryRemote::new();
        remote.set_available(false);
        let mut sync = reconciler(true, remote);

        sync.persist(&snapshot(3)).await;
        assert!(load_queue(sync.local()).contains(SyncToken::Statistics));

        sync.remote().set_available(true);
        sync.drain_sync_queue(&snapshot(3)).await;
        assert!(sync.local().get(keys::SYNC_QUEUE).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_pushes_pending_instead_of_fetching() {
        crate::logging::init_test();
        let mut sync = reconciler(true, MemoryRemote::with_snapshot(snapshot(1)));
        save_snapshot(sync.local(), &snapshot(4)).unwrap();
        let mut pending = SyncQueue::new();
        pending.enqueue(SyncToken::Statistics);
        save_queue(sync.local(), &pending).unwrap();

        let init = sync.initialize().await;
        assert_eq!(init.source, SnapshotSource::Local);
        assert_eq!(init.snapshot.current_streak, 4);
        assert_eq!(sync.state(), SyncState::Reconciled);
        assert_eq!(sync.remote().fetch_count(), 0);
        assert_eq!(sync.remote().stored().unwrap().current_streak, 4);
        assert!(!sync.is_sync_pending());
        assert!(load_queue(sync.local()).is_empty());
    }

    #[tokio::test]
    async fn test_initialize_keeps_pending_when_remote_down() {
        let remote = MemoryRemote::with_snapshot(snapshot(1));
        remote.set_available(false);
        let mut sync = reconciler(true, remote);
        save_snapshot(sync.local(), &snapshot(4)).unwrap();
        let mut pending = SyncQueue::new();
        pending.enqueue(SyncToken::Statistics);
        save_queue(sync.local(), &pending).unwrap();

        let init = sync.initialize().await;
        assert_eq!(init.source, SnapshotSource::Local);
        assert_eq!(sync.state(), SyncState::Loaded);
        assert!(sync.is_sync_pending());
        assert!(load_queue(sync.local()).contains(SyncToken::Statistics));
        // Local data was not cleared
        assert_eq!(load_snapshot(sync.local()).current_streak, 4);
    }
}
