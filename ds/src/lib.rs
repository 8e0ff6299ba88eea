//! DocStore - document collections on SQLite
//!
//! Stores JSON documents grouped into named collections. Each document
//! exposes a set of indexed fields that can be used for equality queries,
//! and writes can be grouped into a [`WriteBatch`] that commits atomically.
//!
//! # Layout
//!
//! ```text
//! {store_dir}/
//! └── docstore.db      # documents + document_indexes tables
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docstore::{Filter, Store};
//!
//! let mut store = Store::open(".docstore")?;
//! let mut batch = store.batch();
//! batch.set(&record)?;
//! store.commit(batch)?;
//! let found: Vec<MyRecord> = store.list(&[Filter::eq("userId", "u1")])?;
//! ```

pub mod cli;
pub mod config;
mod error;
mod store;

pub use error::StoreError;
pub use store::{Filter, FilterOp, IndexValue, Record, Store, WriteBatch, WriteOp};

/// File name of the SQLite database inside the store directory
pub const DB_FILE_NAME: &str = "docstore.db";
