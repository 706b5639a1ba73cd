//! Local persistence

mod events;

pub use events::{EventQuery, EventStore, StoreStats, StoredEvent};
