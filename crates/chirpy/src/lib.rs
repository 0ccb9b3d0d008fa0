//! Chirpy: persistence and identity core for a small chirp service.
//!
//! Provides a whole-file JSON document store with concurrent-access
//! guarantees, monotonic id assignment, Argon2id password hashing, and
//! HS256 bearer tokens. HTTP routing and request decoding live outside
//! this crate and consume the API re-exported here.

pub mod app;
pub mod config;
pub mod crypto;
pub mod error;
pub mod model;
pub mod repository;
pub mod storage;
pub mod time;
pub mod token;

// Re-export primary types
pub use app::{Chirpy, LoginResponse};
pub use config::ChirpyConfig;
pub use crypto::{CredentialManager, HashCost};
pub use error::{ChirpyError, Result};
pub use model::{Account, Chirp, Document, MAX_CHIRP_LEN};
pub use repository::{IdCounters, Repository};
pub use storage::DocumentStore;
pub use token::{Claims, TokenService};
