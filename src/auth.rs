//! Caller authorization
//!
//! The timer engine never applies a transition for an unauthenticated
//! caller. Identity management itself lives outside this service; the
//! `AccessPolicy` trait is the seam where a deployment plugs in its own
//! provider. The bundled `TokenPolicy` accepts a fixed set of bearer
//! tokens handed out at deploy time.

use std::collections::HashSet;

use thiserror::Error;

/// Authorization failures, surfaced as 401 so clients can redirect to
/// re-authentication instead of showing a timer-specific error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,

    #[error("Not authorized, token failed")]
    InvalidToken,
}

/// Decides whether a caller may read or modify task timers.
pub trait AccessPolicy: Send + Sync {
    fn authorize(&self, bearer: Option<&str>) -> Result<(), AuthError>;
}

/// Fixed bearer-token allow list.
pub struct TokenPolicy {
    tokens: HashSet<String>,
}

impl TokenPolicy {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }
}

impl AccessPolicy for TokenPolicy {
    fn authorize(&self, bearer: Option<&str>) -> Result<(), AuthError> {
        let token = bearer.ok_or(AuthError::MissingToken)?;
        if self.tokens.contains(token) {
            Ok(())
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

/// Accepts every caller. For deployments that terminate auth in a fronting
/// proxy, and for tests.
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn authorize(&self, _bearer: Option<&str>) -> Result<(), AuthError> {
        Ok(())
    }
}
