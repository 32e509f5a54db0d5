use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;

use super::{SessionStore, StoredSession};

/// In-process store. Clones share state, the way two tabs share cookies.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<Mutex<StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the raw contents, bypassing the manager.
    pub fn put_raw(&self, session: StoredSession) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = session;
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> anyhow::Result<StoredSession> {
        Ok(self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        self.put_raw(session.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        self.put_raw(StoredSession::default());
        Ok(())
    }
}

/// JSON file store used by the CLI between invocations.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> anyhow::Result<StoredSession> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading session file {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("parsing session file {}", self.path.display()))
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing session file {}", self.path.display()))
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing session file {}", self.path.display())),
        }
    }
}
