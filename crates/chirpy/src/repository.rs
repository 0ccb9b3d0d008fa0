//! Record repository: chirps and accounts on top of the document store.
//!
//! Every operation runs the load → mutate → store protocol against the
//! whole [`Document`](crate::model::Document). A single reader/writer lock
//! per repository guards both the document and the in-memory id counters:
//!
//! - reads (`list_messages`, `get_message`, `find_account_by_email`,
//!   `authenticate`) hold it shared across the load;
//! - writes (`create_message`, `create_account`, `update_account`) hold it
//!   exclusively across the full load → mutate → store sequence, so every
//!   writer starts from a fresh document and writers never interleave.
//!
//! Ids come from one counter per collection, seeded once at
//! [`Repository::open`] from the largest id on disk and advanced only after
//! a successful store. Ids are never reused.

use std::collections::btree_map::Entry;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::crypto::CredentialManager;
use crate::error::{ChirpyError, Result};
use crate::model::{validate_body, validate_email, Account, Chirp, User};
use crate::storage::DocumentStore;

/// Last id handed out in each collection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IdCounters {
    pub last_chirp_id: u64,
    pub last_user_id: u64,
}

/// Create/read access to chirps and accounts.
pub struct Repository {
    store: DocumentStore,
    credentials: CredentialManager,
    counters: RwLock<IdCounters>,
}

impl Repository {
    /// Open the repository over `store`.
    ///
    /// Creates the backing file if it is missing and seeds the id counters
    /// from the largest ids already persisted.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Storage` or `ChirpyError::Corruption` if the
    /// document cannot be created or read.
    pub fn open(store: DocumentStore, credentials: CredentialManager) -> Result<Self> {
        store.ensure_exists()?;
        let document = store.load()?;
        let counters = IdCounters {
            last_chirp_id: document.max_chirp_id(),
            last_user_id: document.max_user_id(),
        };
        log::info!(
            "opened {} (last chirp id {}, last user id {})",
            store.path().display(),
            counters.last_chirp_id,
            counters.last_user_id
        );
        Ok(Self {
            store,
            credentials,
            counters: RwLock::new(counters),
        })
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Snapshot of the id counters.
    pub fn counters(&self) -> IdCounters {
        *self.shared()
    }

    // ── Chirps ────────────────────────────────────────────────────────────────

    /// Create a chirp with the next chirp id.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::Validation` if `body` is longer than 140
    /// bytes, or `ChirpyError::Corruption` if the next id cannot be assigned
    /// (ids exhausted, or already taken by another writer on the same file).
    /// Nothing is written in either case.
    pub fn create_message(&self, body: &str) -> Result<Chirp> {
        validate_body(body)?;

        let mut counters = self.exclusive();
        let mut document = self.store.load()?;

        let id = self.next_id(counters.last_chirp_id, "chirp")?;
        let chirp = Chirp {
            id,
            body: body.to_string(),
        };
        match document.chirps.entry(id) {
            Entry::Occupied(_) => return Err(self.id_taken("chirp", id)),
            Entry::Vacant(slot) => {
                slot.insert(chirp.clone());
            }
        }
        self.store.store(&document)?;
        counters.last_chirp_id = id;

        log::info!("created chirp {id}");
        Ok(chirp)
    }

    /// All chirps, in ascending id order.
    pub fn list_messages(&self) -> Result<Vec<Chirp>> {
        let _guard = self.shared();
        let document = self.store.load()?;
        Ok(document.chirps.into_values().collect())
    }

    /// # Errors
    ///
    /// Returns `ChirpyError::NotFound` if no chirp has `id`.
    pub fn get_message(&self, id: u64) -> Result<Chirp> {
        let _guard = self.shared();
        let mut document = self.store.load()?;
        document
            .chirps
            .remove(&id)
            .ok_or_else(|| ChirpyError::NotFound(format!("chirp {id}")))
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    /// Create an account with the next account id.
    ///
    /// The uniqueness check and the insert happen under one exclusive hold,
    /// so two concurrent creates for the same email cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::DuplicateEmail` if the email is taken,
    /// `ChirpyError::Validation` for an empty email, or
    /// `ChirpyError::Corruption` if the next id cannot be assigned.
    pub fn create_account(&self, email: &str, password: &str) -> Result<Account> {
        validate_email(email)?;
        // Hashing is slow and independent of the document; keep it outside
        // the exclusive section.
        let credential = self.credentials.hash(password)?;

        let mut counters = self.exclusive();
        let mut document = self.store.load()?;

        if document.user_by_email(email).is_some() {
            log::info!("rejected duplicate account");
            return Err(ChirpyError::DuplicateEmail(email.to_string()));
        }

        let id = self.next_id(counters.last_user_id, "account")?;
        let user = User {
            id,
            email: email.to_string(),
            password: credential,
        };
        let account = Account::from(&user);
        match document.users.entry(id) {
            Entry::Occupied(_) => return Err(self.id_taken("account", id)),
            Entry::Vacant(slot) => {
                slot.insert(user);
            }
        }
        self.store.store(&document)?;
        counters.last_user_id = id;

        log::info!("created account {id}");
        Ok(account)
    }

    /// Replace both the email and the password of account `id`.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::NotFound` if the account does not exist, or
    /// `ChirpyError::DuplicateEmail` if `email` belongs to another account.
    pub fn update_account(&self, id: u64, email: &str, password: &str) -> Result<Account> {
        validate_email(email)?;
        let credential = self.credentials.hash(password)?;

        let _guard = self.exclusive();
        let mut document = self.store.load()?;

        if !document.users.contains_key(&id) {
            return Err(ChirpyError::NotFound(format!("account {id}")));
        }
        if document
            .user_by_email(email)
            .is_some_and(|other| other.id != id)
        {
            return Err(ChirpyError::DuplicateEmail(email.to_string()));
        }

        let user = User {
            id,
            email: email.to_string(),
            password: credential,
        };
        let account = Account::from(&user);
        document.users.insert(id, user);
        self.store.store(&document)?;

        log::info!("updated account {id}");
        Ok(account)
    }

    /// # Errors
    ///
    /// Returns `ChirpyError::NotFound` if no account has `id`.
    pub fn get_account(&self, id: u64) -> Result<Account> {
        let _guard = self.shared();
        let document = self.store.load()?;
        document
            .users
            .get(&id)
            .map(Account::from)
            .ok_or_else(|| ChirpyError::NotFound(format!("account {id}")))
    }

    /// Linear scan for an exact, case-sensitive email match.
    pub fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let _guard = self.shared();
        let document = self.store.load()?;
        Ok(document.user_by_email(email).map(Account::from))
    }

    /// Check a login attempt.
    ///
    /// # Errors
    ///
    /// Returns `ChirpyError::NotFound` if no account has `email`, or
    /// `ChirpyError::Auth` if the password does not match.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account> {
        let (account, credential) = {
            let _guard = self.shared();
            let document = self.store.load()?;
            let user = document
                .user_by_email(email)
                .ok_or_else(|| ChirpyError::NotFound("no account for email".into()))?;
            (Account::from(user), user.password.clone())
        };

        if !self.credentials.verify(&credential, password) {
            log::info!("password mismatch for account {}", account.id);
            return Err(ChirpyError::Auth("invalid email or password".into()));
        }
        Ok(account)
    }

    fn next_id(&self, last: u64, kind: &str) -> Result<u64> {
        last.checked_add(1).ok_or_else(|| ChirpyError::Corruption {
            path: self.store.path().to_path_buf(),
            reason: format!("{kind} ids exhausted at {last}"),
        })
    }

    // Another repository on the same file has moved ahead of this counter.
    fn id_taken(&self, kind: &str, id: u64) -> ChirpyError {
        log::warn!(
            "{kind} id {id} already present in {}; refusing to overwrite",
            self.store.path().display()
        );
        ChirpyError::Corruption {
            path: self.store.path().to_path_buf(),
            reason: format!("{kind} id {id} is already taken"),
        }
    }

    // A panic inside a critical section cannot leave the file half-written
    // (stores are atomic) and counters only move after a successful store,
    // so a poisoned lock is still consistent.
    fn shared(&self) -> RwLockReadGuard<'_, IdCounters> {
        self.counters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn exclusive(&self) -> RwLockWriteGuard<'_, IdCounters> {
        self.counters.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("store", &self.store)
            .field("counters", &self.counters())
            .finish()
    }
}
