//! Authentication providers for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::auth::{AuthError, AuthProvider, AuthUser, Session};

/// Accepts a single code and remembers which emails asked for one.
#[derive(Debug)]
pub(crate) struct FakeAuthProvider {
    code: String,
    requested: Mutex<Vec<String>>,
    session: watch::Sender<Option<Session>>,
}

impl FakeAuthProvider {
    pub(crate) fn new(code: &str) -> Self {
        let (session, _) = watch::channel(None);

        Self {
            code: code.to_owned(),
            requested: Mutex::new(Vec::new()),
            session,
        }
    }

    /// Start with `user_id` already signed in.
    pub(crate) fn signed_in(user_id: &str) -> Self {
        let provider = Self::new("000000");
        provider.session.send_replace(Some(test_session(user_id)));

        provider
    }

    pub(crate) fn requested_emails(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

pub(crate) fn test_session(user_id: &str) -> Session {
    Session {
        access_token: format!("token-{user_id}"),
        user: AuthUser {
            id: user_id.to_owned(),
            email: format!("{user_id}@example.com"),
        },
    }
}

#[async_trait]
impl AuthProvider for FakeAuthProvider {
    fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), AuthError> {
        self.requested.lock().unwrap().push(email.to_owned());

        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        if code != self.code {
            return Err(AuthError::Rejected {
                status: 403,
                message: "Token has expired or is invalid".to_owned(),
            });
        }

        let session = Session {
            access_token: "token-user-1".to_owned(),
            user: AuthUser {
                id: "user-1".to_owned(),
                email: email.to_owned(),
            },
        };
        self.session.send_replace(Some(session.clone()));

        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session.send_replace(None);

        Ok(())
    }
}

/// Rejects every request as if the provider were unreachable.
#[derive(Debug)]
pub(crate) struct FailingAuthProvider {
    session: watch::Sender<Option<Session>>,
}

impl Default for FailingAuthProvider {
    fn default() -> Self {
        let (session, _) = watch::channel(None);

        Self { session }
    }
}

#[async_trait]
impl AuthProvider for FailingAuthProvider {
    fn session(&self) -> Option<Session> {
        None
    }

    fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn sign_in_with_otp(&self, _email: &str) -> Result<(), AuthError> {
        Err(AuthError::Rejected {
            status: 429,
            message: "Email rate limit exceeded".to_owned(),
        })
    }

    async fn verify_otp(&self, _email: &str, _code: &str) -> Result<Session, AuthError> {
        Err(AuthError::InvalidResponse("provider unavailable".to_owned()))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Err(AuthError::InvalidResponse("provider unavailable".to_owned()))
    }
}
