//! postman domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `hash`: Deterministic subscriber identity hashing
//! - `model`: Subscriber entity and token helpers
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `error`: Registry error taxonomy
//! - `usecases`: Subscription registry and newsletter dispatch

pub mod error;
pub mod hash;
pub mod model;
pub mod ports;
pub mod usecases;

pub use error::*;
pub use hash::sdbm_lower;
pub use model::*;
pub use ports::*;
pub use usecases::{
    DispatchConfig, DispatchError, DispatchReport, Newsletter, NewsletterDispatcher,
    SubscriptionRegistry, daily_subject,
};
