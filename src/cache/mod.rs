//! Rate cache and its persistence
//!
//! `RateCache` holds the active snapshot in memory and decides when it must be
//! refreshed. `RateStore` carries that state across process restarts so the
//! provider is only contacted once the snapshot has actually gone stale.

mod engine;
mod store;

pub use engine::{next_refresh_after, RateCache, RateError, RefreshError, RefreshOutcome};
pub use store::{PersistenceError, RateStore, SCHEMA_VERSION};
