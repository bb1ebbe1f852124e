//! # Starchain Store
//!
//! Storage abstraction for Starchain. Provides a trait-based interface
//! for height-keyed block persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The store module abstracts block storage behind the [`Store`] trait,
//! allowing the ledger to be storage-agnostic. Values are opaque bytes; the
//! ledger writes canonical block encodings and decodes them on read.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use starchain_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("chain.db").unwrap();
//!     store.put(0, Bytes::from_static(b"...")).await.unwrap();
//!     let rows = store.scan_all().await.unwrap();
//!     assert_eq!(rows[0].0, 0);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Ordered scans**: `scan_all` always returns ascending heights
//! - **Overwrites allowed**: the store does not police history; integrity is
//!   checked above it by hash links

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::Store;
