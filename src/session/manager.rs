use async_trait::async_trait;
use serde_json::Value;

use super::{Clock, SessionStore, StoredSession, SystemClock};
use crate::client::{ClientError, CONNECT_MESSAGE};
use crate::models::session::{LoginCredentials, SessionToken, UserProfile, DEFAULT_USER_ID};

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in both fields.";
pub const AUTH_FAILED_MESSAGE: &str = "Authentication failed. Check your credentials.";

/// Whatever answers `POST /api/auth/login`.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Returns the login body on HTTP success.
    async fn login(&self, credentials: &LoginCredentials) -> Result<Value, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub success: bool,
    pub message: Option<String>,
}

impl LoginResult {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(_) => true,
    }
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Login gate over a `SessionStore`.
///
/// Fails closed: anything unreadable, undecodable or expired in the store is
/// wiped and reported as "not authenticated". No method returns an error.
pub struct AuthSessionManager<S, B, C = SystemClock> {
    store: S,
    backend: B,
    clock: C,
}

impl<S, B> AuthSessionManager<S, B, SystemClock>
where
    S: SessionStore,
    B: AuthBackend,
{
    pub fn new(store: S, backend: B) -> Self {
        Self::with_clock(store, backend, SystemClock)
    }
}

impl<S, B, C> AuthSessionManager<S, B, C>
where
    S: SessionStore,
    B: AuthBackend,
    C: Clock,
{
    pub fn with_clock(store: S, backend: B, clock: C) -> Self {
        Self {
            store,
            backend,
            clock,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn login(&self, username: &str, password: &str) -> LoginResult {
        if username.trim().is_empty() || password.is_empty() {
            return LoginResult::failure(MISSING_FIELDS_MESSAGE);
        }

        let credentials = LoginCredentials {
            usuario: username.trim().to_string(),
            password: password.to_string(),
        };

        let body = match self.backend.login(&credentials).await {
            Ok(body) => body,
            Err(ClientError::Transport(e)) => {
                tracing::warn!("login request failed: {}", e);
                return LoginResult::failure(CONNECT_MESSAGE);
            }
            Err(e) => return LoginResult::failure(e.user_message(AUTH_FAILED_MESSAGE)),
        };

        if is_truthy(body.get("error")) {
            return LoginResult::failure(
                text_field(&body, "message").unwrap_or_else(|| AUTH_FAILED_MESSAGE.to_string()),
            );
        }

        let user = &credentials.usuario;
        let id = text_field(&body, "id").unwrap_or_else(|| DEFAULT_USER_ID.to_string());
        let profile = UserProfile {
            id: id.clone(),
            name: text_field(&body, "nombre").unwrap_or_else(|| user.clone()),
            email: text_field(&body, "email").unwrap_or_else(|| format!("{}@example.com", user)),
            role: text_field(&body, "role").unwrap_or_else(|| "user".to_string()),
        };

        let token = SessionToken::issue(id, self.clock.now_ms());
        let stored = match serde_json::to_string(&profile) {
            Ok(profile_json) => StoredSession {
                token: Some(token.encode()),
                profile: Some(profile_json),
            },
            Err(e) => {
                tracing::error!("failed to serialize profile: {}", e);
                return LoginResult::failure(AUTH_FAILED_MESSAGE);
            }
        };

        if let Err(e) = self.store.save(&stored) {
            tracing::error!("failed to persist session: {:#}", e);
            self.wipe();
            return LoginResult::failure(AUTH_FAILED_MESSAGE);
        }

        tracing::info!(user_id = %profile.id, "session started");
        LoginResult::ok()
    }

    /// Valid token and profile, or `None` after wiping whatever was stored.
    fn current(&self) -> Option<UserProfile> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!("session store unreadable, clearing: {:#}", e);
                self.wipe();
                return None;
            }
        };

        if stored.is_empty() {
            return None;
        }

        let now = self.clock.now_ms();
        let token = stored
            .token
            .as_deref()
            .and_then(|raw| SessionToken::decode(raw).ok())
            .filter(|t| !t.is_expired(now));
        let profile = stored
            .profile
            .as_deref()
            .and_then(|raw| serde_json::from_str::<UserProfile>(raw).ok());

        match (token, profile) {
            (Some(_), Some(profile)) => Some(profile),
            _ => {
                tracing::debug!("stored session invalid or expired, clearing");
                self.wipe();
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.current()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.current().map(|u| u.role == role).unwrap_or(false)
    }

    /// Raw token for attaching to requests, if one is stored.
    pub fn auth_token(&self) -> Option<String> {
        self.store.load().ok().and_then(|s| s.token)
    }

    pub fn logout(&self) {
        self.wipe();
        tracing::info!("session ended");
    }

    fn wipe(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!("failed to clear session store: {:#}", e);
        }
    }
}

/// What a page sees of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub user: Option<UserProfile>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }
}

/// Page-lifetime view of the session. Re-checks the store on mount and
/// every time the window regains focus, so expiry while the tab sat idle,
/// or a logout in another tab, shows up without a reload.
pub struct AuthSession<S, B, C = SystemClock> {
    manager: AuthSessionManager<S, B, C>,
    snapshot: AuthSnapshot,
}

impl<S, B, C> AuthSession<S, B, C>
where
    S: SessionStore,
    B: AuthBackend,
    C: Clock,
{
    pub fn new(manager: AuthSessionManager<S, B, C>) -> Self {
        Self {
            manager,
            snapshot: AuthSnapshot::default(),
        }
    }

    pub fn snapshot(&self) -> &AuthSnapshot {
        &self.snapshot
    }

    pub fn manager(&self) -> &AuthSessionManager<S, B, C> {
        &self.manager
    }

    pub fn mount(&mut self) -> &AuthSnapshot {
        self.revalidate()
    }

    pub fn on_focus(&mut self) -> &AuthSnapshot {
        self.revalidate()
    }

    fn revalidate(&mut self) -> &AuthSnapshot {
        let user = self.manager.user();
        self.snapshot = AuthSnapshot {
            is_authenticated: user.is_some(),
            user,
            is_loading: false,
        };
        &self.snapshot
    }

    pub async fn login(&mut self, username: &str, password: &str) -> LoginResult {
        let result = self.manager.login(username, password).await;
        if result.success {
            self.revalidate();
        }
        result
    }

    pub fn logout(&mut self) {
        self.manager.logout();
        self.snapshot = AuthSnapshot {
            user: None,
            is_authenticated: false,
            is_loading: false,
        };
    }
}
