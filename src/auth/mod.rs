//! Passwordless sign in with a hosted authentication provider.
//!
//! Signing in is optional. Without a session the app keeps transactions on
//! this device, with one the household's shared transactions are used.

#[cfg(test)]
pub(crate) mod fake;
mod middleware;
mod sign_in;
mod subscription;
mod supabase;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::watch;

use crate::Error;

pub use middleware::{onboarding_guard, onboarding_guard_hx};
pub use sign_in::{get_sign_in_page, sign_in_endpoint, sign_out_endpoint, verify_endpoint};
pub use subscription::AuthSubscription;
pub use supabase::SupabaseAuth;

/// The signed in user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// Proof that a user has signed in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The provider refused the request, e.g. because the code was wrong.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid response from the provider: {0}")]
    InvalidResponse(String),
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        Error::AuthProviderError(value.to_string())
    }
}

/// The operations the app needs from an authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, if a user is signed in.
    fn session(&self) -> Option<Session>;

    /// A receiver that is notified every time the session changes.
    fn watch(&self) -> watch::Receiver<Option<Session>>;

    /// Ask the provider to email a one-time sign in code to `email`.
    async fn sign_in_with_otp(&self, email: &str) -> Result<(), AuthError>;

    /// Exchange the code sent to `email` for a session.
    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;
}
