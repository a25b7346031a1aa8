//! # infra_store: Cache Infrastructure
//!
//! ## Layer 2 (Infrastructure) Role
//!
//! infra_store provides the process-wide cache consumed by the pipeline:
//! - `CacheStore`: the `get`/`set`-with-TTL capability (`store`)
//! - `MemoryStore`: concurrent in-memory store whose entries expire by TTL
//! - `NoopStore`: a store that never hits, for tests and cache-less runs
//! - `CacheStoreExt`: JSON payload helpers on top of any store (`codec`)
//! - `derive_key`: deterministic digest keys from parameter structures (`key`)
//!
//! Entries are never invalidated explicitly. A changed input yields a new
//! key and the old entry ages out.
//!
//! ## Usage Examples
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//! use infra_store::{derive_key, CacheStoreExt, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let params = BTreeMap::from([("r", 0.05)]);
//! let key = derive_key("greeks", &params).unwrap();
//!
//! store.set_json(&key, &vec![1.0, 2.0], Duration::from_secs(60)).unwrap();
//! let cached: Option<Vec<f64>> = store.get_json(&key);
//! assert_eq!(cached, Some(vec![1.0, 2.0]));
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod error;
pub mod key;
pub mod store;

pub use codec::CacheStoreExt;
pub use error::StoreError;
pub use key::{canonical_json, derive_key};
pub use store::{CacheStore, MemoryStore, NoopStore, DEFAULT_SWEEP_THRESHOLD};
