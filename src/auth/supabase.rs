use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tokio::sync::watch;

use crate::auth::{AuthError, AuthProvider, Session};

/// Email one-time code sign in through Supabase Auth (GoTrue).
#[derive(Debug)]
pub struct SupabaseAuth {
    client: Client,
    auth_url: String,
    anon_key: String,
    session: watch::Sender<Option<Session>>,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        let (session, _) = watch::channel(None);

        Self {
            client: Client::new(),
            auth_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            anon_key: anon_key.to_owned(),
            session,
        }
    }
}

/// Pull the human readable message out of an error response.
///
/// GoTrue has used several field names for this over time.
fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|field| value.get(field).and_then(Value::as_str))
        })
        .map(str::to_owned)
        .unwrap_or_else(|| body.to_owned())
}

async fn check_status(response: Response) -> Result<Response, AuthError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();

    Err(AuthError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    fn session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn watch(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn sign_in_with_otp(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(format!("{}/otp", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "create_user": true }))
            .send()
            .await?;

        check_status(response).await?;
        tracing::info!("Requested a sign in code for {email}");

        Ok(())
    }

    async fn verify_otp(&self, email: &str, code: &str) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(format!("{}/verify", self.auth_url))
            .header("apikey", &self.anon_key)
            .json(&json!({ "type": "email", "email": email, "token": code }))
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let session: Session = serde_json::from_str(&body)
            .map_err(|error| AuthError::InvalidResponse(error.to_string()))?;

        tracing::info!("User {} signed in", session.user.id);
        self.session.send_replace(Some(session.clone()));

        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.session.send_replace(None) else {
            return Ok(());
        };

        let response = self
            .client
            .post(format!("{}/logout", self.auth_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        check_status(response).await?;
        tracing::info!("User {} signed out", session.user.id);

        Ok(())
    }
}
