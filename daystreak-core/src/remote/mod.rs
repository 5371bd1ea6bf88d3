//! Remote statistics tier
//!
//! The remote tier holds the authoritative copy of the statistics snapshot
//! once the user is signed in. Every exchange is a full-snapshot overwrite,
//! so repeating a request after a transient failure is harmless.
//!
//! ## Usage
//!
//! Enable the remote tier in `~/.config/daystreak/config.toml`:
//!
//! ```toml
//! [remote]
//! enabled = true
//! server_url = "https://tasks.example.com"
//! api_key = "xxxxxxxxxxxx"
//! ```

mod client;
mod memory;

pub use client::StatisticsClient;
pub use memory::MemoryRemote;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::StatisticsSnapshot;

/// Remote storage for the statistics snapshot.
///
/// Implementations report "remote unavailable" (transport failure, non-2xx,
/// or a payload flagged unsuccessful) as [`Error::Remote`].
#[async_trait]
pub trait RemoteTier: Send + Sync {
    /// Fetch the current remote snapshot.
    async fn fetch(&self) -> Result<StatisticsSnapshot>;

    /// Overwrite the remote snapshot.
    async fn push(&self, snapshot: &StatisticsSnapshot) -> Result<()>;
}

/// An unconfigured remote tier: every call fails as unavailable.
#[async_trait]
impl<R: RemoteTier> RemoteTier for Option<R> {
    async fn fetch(&self) -> Result<StatisticsSnapshot> {
        match self {
            Some(remote) => remote.fetch().await,
            None => Err(Error::Remote("remote tier is not configured".to_string())),
        }
    }

    async fn push(&self, snapshot: &StatisticsSnapshot) -> Result<()> {
        match self {
            Some(remote) => remote.push(snapshot).await,
            None => Err(Error::Remote("remote tier is not configured".to_string())),
        }
    }
}
