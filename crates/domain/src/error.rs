//! Registry error taxonomy

use thiserror::Error;

use crate::ports::StoreError;

/// Broad category of a registry failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: blank or invalid email, bad token
    Validation,
    /// Input is well-formed but conflicts with current roster state
    Conflict,
    /// The backing store failed; the roster was not mutated
    Persistence,
}

/// Error type for subscription registry operations
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Email address is empty")]
    BlankEmail,
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Token is empty")]
    BlankToken,
    #[error("Invalid token '{token}': expected 8 characters, got {len}")]
    TokenLength { token: String, len: usize },
    #[error("Invalid token '{0}': not a hexadecimal value")]
    MalformedToken(String),
    #[error("Email address is already subscribed: {email}")]
    AlreadySubscribed { email: String },
    #[error("Email address is not subscribed: {email}")]
    NotSubscribed { email: String },
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::BlankEmail
            | RegistryError::InvalidEmail(_)
            | RegistryError::BlankToken
            | RegistryError::TokenLength { .. }
            | RegistryError::MalformedToken(_) => ErrorKind::Validation,
            RegistryError::AlreadySubscribed { .. } | RegistryError::NotSubscribed { .. } => {
                ErrorKind::Conflict
            }
            RegistryError::Store(_) => ErrorKind::Persistence,
        }
    }

    /// True for failures handled locally as a plain "no" (validation and conflicts)
    pub fn is_rejection(&self) -> bool {
        self.kind() != ErrorKind::Persistence
    }
}
