//! Bounded history of recent weather lookups.
//!
//! Keeps the most recent lookups in SQLite and evicts the oldest once the
//! configured limit is exceeded. History is optional: a disabled client
//! accepts every write and stores nothing.

pub mod client;
pub mod record;
pub mod store;

pub use client::HistoryClient;
pub use record::{LookupRecord, NewLookupRecord};
pub use store::{SqliteHistoryStore, MAX_RETAINED};
