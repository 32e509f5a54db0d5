use std::path::PathBuf;
use std::time::Duration;

use crate::vault::configured::ConfiguredResolver;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// True when PLANT_ACCESS_ENV (or RUST_ENV) is "production".
    /// Controls the `Secure` attribute on session cookies.
    pub production: bool,
    /// Browser origin allowed by CORS in addition to localhost.
    pub dashboard_origin: String,
    /// Total timeout for a single workflow call.
    pub upstream_timeout: Duration,
    /// Base URL of a running portal, used by the CLI client.
    pub portal_url: String,
    /// Where the CLI keeps its session between invocations.
    pub session_file: PathBuf,
    pub workflows: ConfiguredResolver,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            production: false,
            dashboard_origin: "http://localhost:3000".into(),
            upstream_timeout: Duration::from_secs(30),
            portal_url: "http://localhost:3000".into(),
            session_file: PathBuf::from(".plant-access-session.json"),
            workflows: ConfiguredResolver::default(),
        }
    }
}

impl Config {
    /// Session cookies carry `Secure` only in production.
    pub fn secure_cookies(&self) -> bool {
        self.production
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let port = match lookup("PLANT_ACCESS_PORT") {
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("PLANT_ACCESS_PORT must be a port number, got '{}'", v))?,
        None => defaults.port,
    };

    let env_mode = lookup("PLANT_ACCESS_ENV")
        .or_else(|| lookup("RUST_ENV"))
        .unwrap_or_default();

    Ok(Config {
        port,
        production: env_mode.eq_ignore_ascii_case("production"),
        dashboard_origin: lookup("DASHBOARD_ORIGIN").unwrap_or(defaults.dashboard_origin),
        upstream_timeout: lookup("PLANT_ACCESS_UPSTREAM_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout),
        portal_url: lookup("PLANT_ACCESS_PORTAL_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.portal_url),
        session_file: lookup("PLANT_ACCESS_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_file),
        workflows: ConfiguredResolver::from_lookup(&lookup),
    })
}
