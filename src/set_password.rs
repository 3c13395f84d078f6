//! An administrative JSON endpoint for setting a user's password.
//!
//! Existing users get their password replaced, unknown email addresses get a
//! new, already confirmed user. The work is done by the authentication
//! provider's admin API using the service role key.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;

#[derive(Debug, thiserror::Error)]
pub enum AdminApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("the admin API responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// A user account as reported by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The admin listing is either a bare array or wrapped in an object,
/// depending on the provider version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UserListing {
    Users(Vec<AdminUser>),
    Page { users: Vec<AdminUser> },
}

impl UserListing {
    fn into_users(self) -> Vec<AdminUser> {
        match self {
            UserListing::Users(users) | UserListing::Page { users } => users,
        }
    }
}

/// The user management operations needed to set a password.
#[async_trait]
pub trait AdminUserApi: Send + Sync {
    /// Find the user whose email matches `email`, ignoring case.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AdminUser>, AdminApiError>;

    async fn update_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<AdminUser, AdminApiError>;

    /// Create a user whose email address is already confirmed.
    async fn create_user(&self, email: &str, password: &str) -> Result<AdminUser, AdminApiError>;
}

/// An [AdminUserApi] for the GoTrue admin API of a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseAdminApi {
    client: Client,
    users_url: String,
    service_role_key: String,
}

impl SupabaseAdminApi {
    pub fn new(base_url: &str, service_role_key: &str) -> Self {
        Self {
            client: Client::new(),
            users_url: format!("{}/auth/v1/admin/users", base_url.trim_end_matches('/')),
            service_role_key: service_role_key.to_owned(),
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AdminApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Admin API returned {status}: {body}");

    Err(AdminApiError::Status {
        status: status.as_u16(),
        body,
    })
}

fn same_email(user: &AdminUser, email: &str) -> bool {
    user.email
        .as_deref()
        .is_some_and(|user_email| user_email.to_lowercase() == email.to_lowercase())
}

#[async_trait]
impl AdminUserApi for SupabaseAdminApi {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AdminUser>, AdminApiError> {
        let response = self
            .request(reqwest::Method::GET, &self.users_url)
            .query(&[("email", email)])
            .send()
            .await?;

        let listing: UserListing = check_status(response).await?.json().await?;

        // The filter is only a hint to the provider, some versions return every user.
        Ok(listing
            .into_users()
            .into_iter()
            .find(|user| same_email(user, email)))
    }

    async fn update_password(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<AdminUser, AdminApiError> {
        let response = self
            .request(
                reqwest::Method::PATCH,
                &format!("{}/{user_id}", self.users_url),
            )
            .json(&json!({ "password": password }))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AdminUser, AdminApiError> {
        let response = self
            .request(reqwest::Method::POST, &self.users_url)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
            }))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

/// The state needed by the set password endpoint.
#[derive(Clone)]
pub struct SetPasswordState {
    pub admin_api: Option<Arc<dyn AdminUserApi>>,
}

impl FromRef<AppState> for SetPasswordState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            admin_api: state.admin_api.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SetPasswordRequest {
    email: Option<String>,
    password: Option<String>,
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

fn admin_error_response(context: &str, error: AdminApiError) -> Response {
    match error {
        AdminApiError::Status { status, body } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(json!({ "error": context, "detail": body })),
        )
            .into_response(),
        AdminApiError::Request(error) => {
            tracing::error!("set password error: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Server error", "detail": error.to_string() })),
            )
                .into_response()
        }
    }
}

fn success_response(action: &str, user: AdminUser) -> Response {
    Json(json!({
        "ok": true,
        "action": action,
        "user": { "id": user.id, "email": user.email },
    }))
    .into_response()
}

/// Set the password for the user with the given email, creating the user if
/// they do not exist yet.
///
/// Expects a JSON body `{"email": ..., "password": ...}` and only accepts
/// POST requests.
pub async fn set_password_endpoint(
    State(state): State<SetPasswordState>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    }

    let request: SetPasswordRequest = serde_json::from_slice(&body).unwrap_or_default();
    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            (email, password)
        }
        _ => return error_response(StatusCode::BAD_REQUEST, "Missing email or password"),
    };

    let Some(admin_api) = state.admin_api else {
        tracing::error!("set password called without SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY in env",
        );
    };

    let existing_user = match admin_api.find_user_by_email(&email).await {
        Ok(user) => user,
        Err(error) => return admin_error_response("Failed to query users", error),
    };

    match existing_user {
        Some(user) => match admin_api.update_password(&user.id, &password).await {
            Ok(updated) => {
                tracing::info!("updated password for user {}", updated.id);
                success_response("updated", updated)
            }
            Err(error) => admin_error_response("Failed to update password", error),
        },
        None => match admin_api.create_user(&email, &password).await {
            Ok(created) => {
                tracing::info!("created user {}", created.id);
                success_response("created", created)
            }
            Err(error) => admin_error_response("Failed to create user", error),
        },
    }
}


#[cfg(test)]
mod set_password_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{Router, http::StatusCode, routing::any};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        set_password::{
            AdminApiError, AdminUser, AdminUserApi, SetPasswordState, set_password_endpoint,
        },
    };

    /// Records the calls made to it and keeps users in memory.
    #[derive(Default)]
    struct FakeAdminApi {
        users: Mutex<Vec<AdminUser>>,
        passwords: Mutex<Vec<(String, String)>>,
        fail_lookup_with: Option<(u16, &'static str)>,
    }

    impl FakeAdminApi {
        fn with_user(id: &str, email: &str) -> Self {
            let api = Self::default();
            api.users.lock().unwrap().push(AdminUser {
                id: id.to_owned(),
                email: Some(email.to_owned()),
            });
            api
        }
    }

    #[async_trait]
    impl AdminUserApi for FakeAdminApi {
        async fn find_user_by_email(
            &self,
            email: &str,
        ) -> Result<Option<AdminUser>, AdminApiError> {
            if let Some((status, body)) = self.fail_lookup_with {
                return Err(AdminApiError::Status {
                    status,
                    body: body.to_owned(),
                });
            }

            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|user| user.email.as_deref() == Some(email))
                .cloned())
        }

        async fn update_password(
            &self,
            user_id: &str,
            password: &str,
        ) -> Result<AdminUser, AdminApiError> {
            self.passwords
                .lock()
                .unwrap()
                .push((user_id.to_owned(), password.to_owned()));

            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|user| user.id == user_id)
                .cloned()
                .unwrap())
        }

        async fn create_user(
            &self,
            email: &str,
            password: &str,
        ) -> Result<AdminUser, AdminApiError> {
            let user = AdminUser {
                id: "new-user".to_owned(),
                email: Some(email.to_owned()),
            };
            self.users.lock().unwrap().push(user.clone());
            self.passwords
                .lock()
                .unwrap()
                .push((user.id.clone(), password.to_owned()));

            Ok(user)
        }
    }

    fn get_test_server(admin_api: Option<Arc<FakeAdminApi>>) -> TestServer {
        let state = SetPasswordState {
            admin_api: admin_api.map(|api| api as Arc<dyn AdminUserApi>),
        };
        let app = Router::new()
            .route(endpoints::SET_PASSWORD, any(set_password_endpoint))
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let server = get_test_server(Some(Arc::new(FakeAdminApi::default())));

        let response = server.get(endpoints::SET_PASSWORD).await;

        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        response.assert_json(&json!({ "error": "Method not allowed" }));
    }

    #[tokio::test]
    async fn missing_fields_are_bad_request() {
        let server = get_test_server(Some(Arc::new(FakeAdminApi::default())));

        for body in [
            json!({ "email": "me@example.com" }),
            json!({ "email": "", "password": "hunter22" }),
            json!("not an object"),
        ] {
            let response = server.post(endpoints::SET_PASSWORD).json(&body).await;

            response.assert_status_bad_request();
            response.assert_json(&json!({ "error": "Missing email or password" }));
        }
    }

    #[tokio::test]
    async fn missing_admin_credentials_is_server_error() {
        let server = get_test_server(None);

        let response = server
            .post(endpoints::SET_PASSWORD)
            .json(&json!({ "email": "me@example.com", "password": "hunter22" }))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({
            "error": "Missing SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY in env"
        }));
    }

    #[tokio::test]
    async fn existing_user_gets_new_password() {
        let api = Arc::new(FakeAdminApi::with_user("u1", "me@example.com"));
        let server = get_test_server(Some(api.clone()));

        let response = server
            .post(endpoints::SET_PASSWORD)
            .json(&json!({ "email": "me@example.com", "password": "hunter22" }))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "ok": true,
            "action": "updated",
            "user": { "id": "u1", "email": "me@example.com" },
        }));
        assert_eq!(
            *api.passwords.lock().unwrap(),
            vec![("u1".to_owned(), "hunter22".to_owned())]
        );
    }

    #[tokio::test]
    async fn unknown_email_creates_user() {
        let api = Arc::new(FakeAdminApi::default());
        let server = get_test_server(Some(api.clone()));

        let response = server
            .post(endpoints::SET_PASSWORD)
            .json(&json!({ "email": "new@example.com", "password": "hunter22" }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["action"], "created");
        assert_eq!(body["user"]["email"], "new@example.com");
        assert_eq!(api.users.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upstream_failure_is_passed_through() {
        let api = Arc::new(FakeAdminApi {
            fail_lookup_with: Some((403, "forbidden")),
            ..Default::default()
        });
        let server = get_test_server(Some(api));

        let response = server
            .post(endpoints::SET_PASSWORD)
            .json(&json!({ "email": "me@example.com", "password": "hunter22" }))
            .await;

        response.assert_status(StatusCode::FORBIDDEN);
        response.assert_json(&json!({ "error": "Failed to query users", "detail": "forbidden" }));
    }
}
