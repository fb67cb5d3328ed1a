//! Dedup cache: fingerprinting, the persistent seen-store, and the
//! classifier that splits a fetched feed into its newly-seen subset.

mod classify;
mod fingerprint;
mod store;

pub use classify::classify_new;
pub use fingerprint::fingerprint;
pub use store::{DedupStore, SqliteStore, StoreError};
