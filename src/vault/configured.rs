use std::collections::HashMap;

use super::{CredentialResolver, Operation, ResolveError, WorkflowCredential};

/// Resolver backed by process configuration (`<OP>_URL` / `<OP>_TOKEN`).
///
/// Values are read once at startup. Missing entries are not fatal until a
/// route actually needs them.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredResolver {
    endpoints: HashMap<Operation, WorkflowCredential>,
    /// Variable found missing at load time, per operation.
    missing: HashMap<Operation, String>,
}

impl ConfiguredResolver {
    pub fn new(endpoints: HashMap<Operation, WorkflowCredential>) -> Self {
        Self {
            endpoints,
            missing: HashMap::new(),
        }
    }

    /// Build from a variable lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut endpoints = HashMap::new();
        let mut missing_vars = HashMap::new();
        for op in Operation::ALL {
            let url = lookup(&op.url_var()).filter(|v| !v.trim().is_empty());
            let token = lookup(&op.token_var()).filter(|v| !v.trim().is_empty());
            match (url, token) {
                (Some(url), Some(token)) => {
                    endpoints.insert(op, WorkflowCredential::new(url.trim(), token.trim()));
                }
                (url, _) => {
                    let missing = if url.is_none() { op.url_var() } else { op.token_var() };
                    tracing::warn!("workflow {} disabled: {} is not set", op, missing);
                    missing_vars.insert(op, missing);
                }
            }
        }
        Self {
            endpoints,
            missing: missing_vars,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn with(mut self, op: Operation, credential: WorkflowCredential) -> Self {
        self.missing.remove(&op);
        self.endpoints.insert(op, credential);
        self
    }
}

impl CredentialResolver for ConfiguredResolver {
    fn resolve(&self, op: Operation) -> Result<WorkflowCredential, ResolveError> {
        self.endpoints
            .get(&op)
            .cloned()
            .ok_or_else(|| {
                let var = self.missing.get(&op).cloned().unwrap_or_else(|| op.url_var());
                ResolveError::NotConfigured(op, var)
            })
    }
}
