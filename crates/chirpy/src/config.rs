//! Process configuration.
//!
//! Layered, later layers winning:
//!
//! 1. built-in defaults ([`ChirpyConfig::default`]),
//! 2. an optional JSON config file,
//! 3. environment variables, falling back to a `.env` file in the working
//!    directory for variables the process does not set,
//! 4. explicit overrides applied by the caller (the CLI's flags).
//!
//! Example `chirpy.json`:
//! ```json
//! {
//!   "db_path": "/var/lib/chirpy/database.json",
//!   "jwt_secret": "change-me",
//!   "token_max_lifetime_secs": 3600
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crypto::password::{DEFAULT_HASH_COST, DEFAULT_HASH_MEMORY_KIB};
use crate::crypto::HashCost;
use crate::error::{ChirpyError, Result};
use crate::token::DEFAULT_MAX_LIFETIME_SECS;

pub const ENV_DB_PATH: &str = "CHIRPY_DB_PATH";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_TOKEN_MAX_LIFETIME: &str = "CHIRPY_TOKEN_MAX_LIFETIME";
pub const ENV_HASH_COST: &str = "CHIRPY_HASH_COST";
pub const ENV_HASH_MEMORY_KIB: &str = "CHIRPY_HASH_MEMORY_KIB";

const DEFAULT_DB_PATH: &str = "database.json";
const DOTENV_FILE: &str = ".env";

/// Everything the core needs to start.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChirpyConfig {
    /// Backing file of the document store.
    pub db_path: PathBuf,
    /// Shared secret for token signatures. Required.
    pub jwt_secret: String,
    /// Upper bound on issued token lifetimes.
    pub token_max_lifetime_secs: u64,
    /// Argon2 iterations.
    pub hash_cost: u32,
    /// Argon2 memory in KiB.
    pub hash_memory_kib: u32,
}

impl Default for ChirpyConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            jwt_secret: String::new(),
            token_max_lifetime_secs: DEFAULT_MAX_LIFETIME_SECS,
            hash_cost: DEFAULT_HASH_COST,
            hash_memory_kib: DEFAULT_HASH_MEMORY_KIB,
        }
    }
}

impl ChirpyConfig {
    /// Defaults, then `config_file` if given, then the process environment
    /// backed by `./.env`.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let dotenv = read_dotenv(Path::new(DOTENV_FILE))?;
        config.apply_env(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| dotenv.get(key).cloned())
        })?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ChirpyError::storage(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| ChirpyError::Config(format!("{}: {e}", path.display())))
    }

    /// Override fields from environment-style lookups.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_DB_PATH) {
            self.db_path = PathBuf::from(path);
        }
        if let Some(secret) = get(ENV_JWT_SECRET) {
            self.jwt_secret = secret;
        }
        if let Some(v) = get(ENV_TOKEN_MAX_LIFETIME) {
            self.token_max_lifetime_secs = parse_number(ENV_TOKEN_MAX_LIFETIME, &v)?;
        }
        if let Some(v) = get(ENV_HASH_COST) {
            self.hash_cost = parse_number(ENV_HASH_COST, &v)?;
        }
        if let Some(v) = get(ENV_HASH_MEMORY_KIB) {
            self.hash_memory_kib = parse_number(ENV_HASH_MEMORY_KIB, &v)?;
        }
        Ok(())
    }

    /// Reject configurations the core cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.is_empty() {
            return Err(ChirpyError::Config(format!(
                "signing secret is required (set {ENV_JWT_SECRET})"
            )));
        }
        if self.token_max_lifetime_secs == 0 {
            return Err(ChirpyError::Config(
                "token_max_lifetime_secs must be positive".into(),
            ));
        }
        if self.hash_cost == 0 {
            return Err(ChirpyError::Config("hash_cost must be positive".into()));
        }
        if self.db_path.as_os_str().is_empty() {
            return Err(ChirpyError::Config("db_path must not be empty".into()));
        }
        Ok(())
    }

    pub fn hash_params(&self) -> HashCost {
        HashCost {
            iterations: self.hash_cost,
            memory_kib: self.hash_memory_kib,
        }
    }
}

impl std::fmt::Debug for ChirpyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChirpyConfig")
            .field("db_path", &self.db_path)
            .field("jwt_secret", &"<redacted>")
            .field("token_max_lifetime_secs", &self.token_max_lifetime_secs)
            .field("hash_cost", &self.hash_cost)
            .field("hash_memory_kib", &self.hash_memory_kib)
            .finish()
    }
}

/// Variables defined in a `.env` file. A missing file defines none.
///
/// The process environment is not modified.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(ChirpyError::Config(format!("{}: {e}", path.display()))),
    };
    entries
        .map(|entry| entry.map_err(|e| ChirpyError::Config(format!("{}: {e}", path.display()))))
        .collect()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ChirpyError::Config(format!("{key} must be a non-negative integer, got {value:?}")))
}
