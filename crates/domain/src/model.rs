//! Domain models and value objects

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

use crate::error::RegistryError;
use crate::hash::sdbm_lower;

/// Number of hex digits in an unsubscribe token
pub const TOKEN_LEN: usize = 8;

/// Human-readable subscription timestamp, e.g. `3/7/2024 9:05:02 PM`
const SUBSCRIBED_AT_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute]:[second] [period]"
);

/// A newsletter subscriber
///
/// Equality and hashing consider only `id`.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    /// Identity derived from the lower-cased email
    pub id: i32,
    /// Email address as the subscriber typed it
    pub email: String,
    /// When the subscription was created
    pub subscribed_at: String,
}

impl Subscriber {
    /// Create a fresh subscriber, deriving its id from `email`
    pub fn new(email: impl Into<String>, now: OffsetDateTime) -> Self {
        let email = email.into();
        Self {
            id: sdbm_lower(email.as_str()),
            email,
            subscribed_at: format_subscribed_at(now),
        }
    }

    /// Rebuild a subscriber from a persisted row
    pub fn restore(id: i32, email: impl Into<String>, subscribed_at: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            subscribed_at: subscribed_at.into(),
        }
    }

    /// Unsubscribe token: the id as unsigned, upper-case hex, 8 digits
    pub fn token(&self) -> String {
        format_token(self.id)
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}

impl Hash for Subscriber {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.email, self.token())
    }
}

/// Format an id as an unsubscribe token
pub fn format_token(id: i32) -> String {
    format!("{:08X}", id as u32)
}

/// Parse an unsubscribe token back into the subscriber id it encodes
pub fn parse_token(token: &str) -> Result<i32, RegistryError> {
    if token.trim().is_empty() {
        return Err(RegistryError::BlankToken);
    }

    let len = token.chars().count();
    if len != TOKEN_LEN {
        return Err(RegistryError::TokenLength {
            token: token.to_string(),
            len,
        });
    }

    // from_str_radix would also accept a leading sign
    if !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RegistryError::MalformedToken(token.to_string()));
    }

    u32::from_str_radix(token, 16)
        .map(|value| value as i32)
        .map_err(|_| RegistryError::MalformedToken(token.to_string()))
}

fn format_subscribed_at(now: OffsetDateTime) -> String {
    now.format(SUBSCRIBED_AT_FORMAT)
        .unwrap_or_else(|_| now.to_string())
}
