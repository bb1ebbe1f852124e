//! # Starchain Testkit
//!
//! Testing utilities for Starchain.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: A keypair, a shared memory store and a hand-driven clock
//! - **Generators**: Proptest strategies for stories, stars and addresses
//! - **Failure injection**: [`FailingStore`] for store-error paths
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use starchain_testkit::generators::story;
//!
//! proptest! {
//!     #[test]
//!     fn story_round_trips(text in story()) {
//!         let encoded = starchain_core::story::encode(&text);
//!         prop_assert_eq!(starchain_core::story::decode(&encoded).unwrap(), text);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,no_run
//! use starchain_testkit::fixtures::TestFixture;
//!
//! async fn example() {
//!     let fixture = TestFixture::new();
//!     let registrar = fixture.registrar().await;
//!     fixture.validate(&registrar);
//! }
//! ```

pub mod failing;
pub mod fixtures;
pub mod generators;

pub use failing::FailingStore;
pub use fixtures::{multi_party_fixtures, TestFixture, FIXTURE_EPOCH_MS};
