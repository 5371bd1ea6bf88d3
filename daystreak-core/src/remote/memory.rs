//! In-memory remote tier

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::RemoteTier;
use crate::error::{Error, Result};
use crate::types::StatisticsSnapshot;

/// A [`RemoteTier`] held in memory, with a switch to simulate outages.
///
/// Fetching before anything has been stored reports the remote as
/// unavailable, like a server without a record for the user.
#[derive(Debug)]
pub struct MemoryRemote {
    stored: Mutex<Option<StatisticsSnapshot>>,
    available: AtomicBool,
    pushes: AtomicUsize,
    fetches: AtomicUsize,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self {
            stored: Mutex::new(None),
            available: AtomicBool::new(true),
            pushes: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `snapshot` already stored.
    pub fn with_snapshot(snapshot: StatisticsSnapshot) -> Self {
        let remote = Self::new();
        *remote.lock() = Some(snapshot);
        remote
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// The last snapshot successfully pushed (or seeded).
    pub fn stored(&self) -> Option<StatisticsSnapshot> {
        self.lock().clone()
    }

    /// Push attempts, including failed ones.
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Fetch attempts, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<StatisticsSnapshot>> {
        self.stored.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::Remote("remote tier unavailable".to_string()))
        }
    }
}

#[async_trait]
impl RemoteTier for MemoryRemote {
    async fn fetch(&self) -> Result<StatisticsSnapshot> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.lock()
            .clone()
            .ok_or_else(|| Error::Remote("no statistics stored".to_string()))
    }

    async fn push(&self, snapshot: &StatisticsSnapshot) -> Result<()> {
        self.pushes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        *self.lock() = Some(snapshot.clone());
        Ok(())
    }
}
