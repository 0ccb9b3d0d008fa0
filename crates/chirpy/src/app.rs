//! The owned service state handed to every request handler.
//!
//! [`Chirpy`] bundles the repository, the token service, and the
//! configuration they were built from. Build one at startup with
//! [`Chirpy::open`] and share it (e.g. behind an `Arc`) across request
//! threads; all methods take `&self`.

use serde::{Deserialize, Serialize};

use crate::config::ChirpyConfig;
use crate::crypto::CredentialManager;
use crate::error::Result;
use crate::model::Account;
use crate::repository::Repository;
use crate::storage::DocumentStore;
use crate::token::{bearer_token, TokenService};

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: u64,
    pub email: String,
    pub token: String,
}

/// Chirpy core: store, credentials, and tokens.
#[derive(Debug)]
pub struct Chirpy {
    config: ChirpyConfig,
    repository: Repository,
    tokens: TokenService,
}

impl Chirpy {
    /// Validate `config` and bring up the core.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Config` for an invalid configuration (notably
    /// an empty signing secret), or a storage error if the document cannot
    /// be created or read.
    pub fn open(config: ChirpyConfig) -> Result<Self> {
        config.validate()?;
        let tokens = TokenService::new(config.jwt_secret.clone(), config.token_max_lifetime_secs)?;
        let credentials = CredentialManager::new(config.hash_params())?;
        let repository = Repository::open(DocumentStore::new(&config.db_path), credentials)?;
        Ok(Self {
            config,
            repository,
            tokens,
        })
    }

    pub fn config(&self) -> &ChirpyConfig {
        &self.config
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Check credentials and mint a token valid for `expires_in_secs`
    /// (clamped to the configured maximum; 0 means the maximum).
    pub fn login(&self, email: &str, password: &str, expires_in_secs: u64) -> Result<LoginResponse> {
        let account = self.repository.authenticate(email, password)?;
        let token = self.tokens.issue(account.id, expires_in_secs)?;
        Ok(LoginResponse {
            id: account.id,
            email: account.email,
            token,
        })
    }

    /// Update the account named by the bearer token in `authorization`.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Auth` if the header carries no valid token, then
    /// whatever [`Repository::update_account`] returns.
    pub fn update_account_with_bearer(
        &self,
        authorization: &str,
        email: &str,
        password: &str,
    ) -> Result<Account> {
        let token = bearer_token(authorization)?;
        let account_id = self.tokens.verify(token)?;
        self.repository.update_account(account_id, email, password)
    }
}
