use std::collections::BTreeMap;
use std::sync::Mutex;

use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use super::{SessionStore, StoredSession};
use crate::config::Config;
use crate::models::session::SESSION_TTL_SECS;

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";
pub const USER_DATA_COOKIE: &str = "user_data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Seconds; `-1` expires the cookie immediately.
    pub max_age: i64,
    pub secure: bool,
}

impl SessionCookie {
    fn set(name: &str, value: &str, secure: bool) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age: SESSION_TTL_SECS,
            secure,
        }
    }

    fn expire(name: &str) -> Self {
        Self {
            name: name.to_string(),
            value: String::new(),
            max_age: -1,
            secure: false,
        }
    }

    pub fn to_cookie(&self) -> Cookie<'static> {
        Cookie::build((self.name.clone(), self.value.clone()))
            .path("/")
            .max_age(Duration::seconds(self.max_age))
            .same_site(SameSite::Strict)
            .secure(self.secure)
            .build()
    }

    /// `Set-Cookie` header value, percent-encoded.
    pub fn to_header_value(&self) -> String {
        let cookie = self.to_cookie();
        cookie.encoded().to_string()
    }
}

/// Session store over the `auth_token` / `user_data` cookie pair.
///
/// Reads come from the jar (seeded from a `Cookie` request header); writes
/// update the jar and queue `Set-Cookie` values for the caller to emit.
#[derive(Debug, Default)]
pub struct CookieSessionStore {
    secure: bool,
    jar: Mutex<BTreeMap<String, String>>,
    pending: Mutex<Vec<SessionCookie>>,
}

impl CookieSessionStore {
    /// `secure` should be true in production so cookies never travel over
    /// plain HTTP.
    pub fn new(secure: bool) -> Self {
        Self {
            secure,
            ..Self::default()
        }
    }

    pub fn for_config(config: &Config) -> Self {
        Self::new(config.secure_cookies())
    }

    /// Seed the jar from a `Cookie` request header (`a=1; b=2`).
    pub fn from_cookie_header(header: &str, secure: bool) -> Self {
        let store = Self::new(secure);
        {
            let mut jar = store.jar.lock().unwrap_or_else(|e| e.into_inner());
            for parsed in Cookie::split_parse_encoded(header) {
                match parsed {
                    Ok(c) => {
                        jar.insert(c.name().to_string(), c.value().to_string());
                    }
                    Err(e) => tracing::debug!("skipping malformed cookie: {}", e),
                }
            }
        }
        store
    }

    /// Current jar rendered as a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        let jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
        jar.iter()
            .map(|(k, v)| Cookie::new(k.as_str(), v.as_str()).encoded().to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Drain the cookies written since the last call.
    pub fn take_set_cookies(&self) -> Vec<SessionCookie> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn queue(&self, cookies: impl IntoIterator<Item = SessionCookie>) {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(cookies);
    }
}

impl SessionStore for CookieSessionStore {
    fn load(&self) -> anyhow::Result<StoredSession> {
        let jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
        Ok(StoredSession {
            token: jar.get(AUTH_TOKEN_COOKIE).filter(|v| !v.is_empty()).cloned(),
            profile: jar.get(USER_DATA_COOKIE).filter(|v| !v.is_empty()).cloned(),
        })
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        let (Some(token), Some(profile)) = (&session.token, &session.profile) else {
            anyhow::bail!("a session needs both a token and a profile");
        };
        {
            let mut jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
            jar.insert(AUTH_TOKEN_COOKIE.to_string(), token.clone());
            jar.insert(USER_DATA_COOKIE.to_string(), profile.clone());
        }
        self.queue([
            SessionCookie::set(AUTH_TOKEN_COOKIE, token, self.secure),
            SessionCookie::set(USER_DATA_COOKIE, profile, self.secure),
        ]);
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        {
            let mut jar = self.jar.lock().unwrap_or_else(|e| e.into_inner());
            jar.remove(AUTH_TOKEN_COOKIE);
            jar.remove(USER_DATA_COOKIE);
        }
        self.queue([
            SessionCookie::expire(AUTH_TOKEN_COOKIE),
            SessionCookie::expire(USER_DATA_COOKIE),
        ]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> StoredSession {
        StoredSession {
            token: Some("eyJ1c2VySWQiOiIxIn0=".into()),
            profile: Some(r#"{"id":"1","name":"Ana Ruiz","email":"a@x.co","role":"user"}"#.into()),
        }
    }

    #[test]
    fn test_save_emits_both_cookies_with_attributes() {
        let store = CookieSessionStore::new(true);
        store.save(&session()).unwrap();

        let cookies = store.take_set_cookies();
        assert_eq!(cookies.len(), 2);
        let header = cookies[0].to_header_value();
        assert!(header.starts_with("auth_token="));
        assert!(header.contains("; Path=/"));
        assert!(header.contains("; Max-Age=604800"));
        assert!(header.contains("; SameSite=Strict"));
        assert!(header.contains("; Secure"));

        let parsed = Cookie::parse_encoded(header).unwrap();
        assert_eq!(parsed.value(), "eyJ1c2VySWQiOiIxIn0=");
        let profile = Cookie::parse_encoded(cookies[1].to_header_value()).unwrap();
        assert_eq!(profile.value(), session().profile.unwrap());

        assert!(store.take_set_cookies().is_empty());
    }

    #[test]
    fn test_not_secure_outside_production() {
        let store = CookieSessionStore::new(false);
        store.save(&session()).unwrap();
        for cookie in store.take_set_cookies() {
            assert!(!cookie.to_header_value().contains("Secure"));
        }
    }

    #[test]
    fn test_clear_expires_both() {
        let store = CookieSessionStore::new(false);
        store.save(&session()).unwrap();
        store.take_set_cookies();

        store.clear().unwrap();
        let cookies = store.take_set_cookies();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|c| c.max_age == -1));
        assert!(cookies[0].to_header_value().contains("Max-Age=-1"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_cookie_header_round_trip() {
        let store = CookieSessionStore::new(false);
        store.save(&session()).unwrap();

        let other_tab = CookieSessionStore::from_cookie_header(&store.cookie_header(), false);
        assert_eq!(other_tab.load().unwrap(), session());
    }

    #[test]
    fn test_save_requires_both_halves() {
        let store = CookieSessionStore::new(false);
        let half = StoredSession {
            token: Some("t".into()),
            profile: None,
        };
        assert!(store.save(&half).is_err());
        assert!(store.take_set_cookies().is_empty());
    }

    #[test]
    fn test_production_config_marks_cookies_secure() {
        let config = crate::config::from_lookup(|key| {
            (key == "PLANT_ACCESS_ENV").then(|| "production".to_string())
        })
        .unwrap();
        let store = CookieSessionStore::for_config(&config);
        store.save(&session()).unwrap();
        assert!(store
            .take_set_cookies()
            .iter()
            .all(|c| c.to_header_value().contains("; Secure")));

        let dev = CookieSessionStore::for_config(&Config::default());
        dev.save(&session()).unwrap();
        assert!(dev
            .take_set_cookies()
            .iter()
            .all(|c| !c.to_header_value().contains("Secure")));
    }
}
