//! Application use cases / business logic

pub mod newsletter;
pub mod registry;

pub use newsletter::{
    DispatchConfig, DispatchError, DispatchReport, Newsletter, NewsletterDispatcher, daily_subject,
};
pub use registry::SubscriptionRegistry;
