//! Storage layer: the single JSON document backing a Chirpy instance.
//!
//! # File layout
//!
//! By convention the backing file is `database.json` in the working
//! directory:
//!
//! ```text
//! ./
//! ├── database.json       — the live document
//! └── database.json.tmp   — transient, only during a store
//! ```
//!
//! # Modules
//!
//! - [`document_store`]: whole-document load/store with atomic replace.

pub mod document_store;

pub use document_store::DocumentStore;
