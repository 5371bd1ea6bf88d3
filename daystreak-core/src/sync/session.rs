//! Authentication signal for the remote tier

use std::sync::atomic::{AtomicBool, Ordering};

/// Whether remote operations are allowed right now.
///
/// Polled before every remote call.
pub trait Session: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// A session whose state is set by the host.
#[derive(Debug, Default)]
pub struct StaticSession {
    authenticated: AtomicBool,
}

impl StaticSession {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: AtomicBool::new(authenticated),
        }
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}

impl Session for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }
}
