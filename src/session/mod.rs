//! Browser-side session: token + profile persistence and the auth manager.

pub mod cookie;
pub mod manager;
pub mod store;

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub use cookie::CookieSessionStore;
pub use manager::{AuthBackend, AuthSession, AuthSessionManager, AuthSnapshot, LoginResult};
pub use store::{FileSessionStore, MemorySessionStore};

/// Raw persisted session. The token is the encoded `SessionToken`, the
/// profile is the JSON `UserProfile`. A backend may come back with only one
/// of the two; the manager treats that as invalid and clears both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: Option<String>,
    pub profile: Option<String>,
}

impl StoredSession {
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.profile.is_none()
    }
}

/// Persistence for the session. `save` and `clear` always act on token and
/// profile together.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> anyhow::Result<StoredSession>;
    fn save(&self, session: &StoredSession) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    fn load(&self) -> anyhow::Result<StoredSession> {
        (**self).load()
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        (**self).save(session)
    }

    fn clear(&self) -> anyhow::Result<()> {
        (**self).clear()
    }
}

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
