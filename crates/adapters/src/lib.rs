//! postman adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `store`: SQLite and in-memory subscriber stores
//! - `mail`: HTTP mail API, dry-run and stub mail senders

pub mod mail;
mod store_memory;
mod store_sqlite;

/// Re-exports for subscriber store adapters
pub mod store {
    pub use crate::store_memory::InMemorySubscriberStore;
    pub use crate::store_sqlite::SqliteSubscriberStore;
}
