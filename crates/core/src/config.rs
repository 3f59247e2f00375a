use std::collections::HashMap;

use crate::error::ConfigError;

/// Snapshot of the process environment taken once at startup.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Load `.env` from the working directory (if there is one) and snapshot
    /// the resulting environment.
    pub fn from_process() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("ignoring unreadable .env file: {}", e),
        }

        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// A variable's value; unset and empty are the same thing here.
    pub fn optional(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn require(&self, name: &str) -> Result<String, ConfigError> {
        self.require_all(&[name]).map(|mut v| v.remove(0))
    }

    /// All of `names`, or an error naming every one that is missing.
    pub fn require_all(&self, names: &[&str]) -> Result<Vec<String>, ConfigError> {
        let missing: Vec<String> = names
            .iter()
            .filter(|n| self.optional(n).is_none())
            .map(|n| n.to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ConfigError::Missing { names: missing });
        }

        Ok(names
            .iter()
            .filter_map(|n| self.optional(n))
            .map(str::to_string)
            .collect())
    }
}
