//! The onboarding page and the endpoints for signing in and out.
//!
//! Onboarding saves an email and household code on this device. When a sign
//! in provider is configured a one-time code is then emailed to the user, and
//! entering it starts a session that switches the app to the household's
//! shared transactions.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    alert::Alert,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, link,
        loading_spinner, onboarding_card,
    },
    local_store::{HouseholdContext, load_household_context, save_household_context},
    preferences::SharedPreferences,
    sync::SyncState,
};

const SIGN_IN_HEADING: &str = "Welcome to Budget Bud";

fn sign_in_form(email: &str, household_id: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::SIGN_IN_API)
            hx-target="this"
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    type="email"
                    name="email"
                    id="email"
                    placeholder="you@example.com"
                    value=(email)
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="household_id" class=(FORM_LABEL_STYLE) { "Secret Code" }

                input
                    type="text"
                    name="household_id"
                    id="household_id"
                    placeholder="1234"
                    value=(household_id)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Sign In"
            }
        }
    }
}

fn verify_form(email: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::VERIFY_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            p class="text-sm text-gray-700 dark:text-gray-300"
            {
                "We sent a sign-in code to " strong { (email) } "."
            }

            div
            {
                label for="code" class=(FORM_LABEL_STYLE) { "Sign-in code" }

                input
                    type="text"
                    name="code"
                    id="code"
                    inputmode="numeric"
                    autocomplete="one-time-code"
                    placeholder="123456"
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Verify"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Not now? " (link(endpoints::ROOT, "Continue on this device only"))
            }
        }
    }
}

/// The state needed for the sign in page.
#[derive(Debug, Clone)]
pub struct SignInPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub preferences: SharedPreferences,
}

impl FromRef<AppState> for SignInPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            preferences: state.preferences.clone(),
        }
    }
}

/// Display the onboarding form, prefilled with any saved details.
pub async fn get_sign_in_page(
    State(state): State<SignInPageState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let context = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        load_household_context(&connection)?
    };
    let color_scheme = state.preferences.color_scheme(&headers)?;

    let HouseholdContext {
        email,
        household_id,
    } = context;
    let form = sign_in_form(
        email.as_deref().unwrap_or_default(),
        household_id.as_deref().unwrap_or_default(),
    );
    let content = onboarding_card(SIGN_IN_HEADING, &form);

    Ok(base("Sign In", Some(color_scheme), &[], &content).into_response())
}

/// The form data for onboarding.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub household_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Save the onboarding details and, if a provider is configured, email the
/// user a sign in code.
///
/// Responds with the code verification form when a code was sent, otherwise
/// redirects to the home page.
pub async fn sign_in_endpoint(
    State(state): State<SyncState>,
    Form(form): Form<SignInForm>,
) -> Response {
    let Some(email) = non_empty(form.email) else {
        return Error::MissingEmail.into_alert_response();
    };
    let Some(household_id) = non_empty(form.household_id) else {
        return Error::MissingHouseholdCode.into_alert_response();
    };

    let saved = match state.db_connection.lock() {
        Ok(connection) => save_household_context(&email, &household_id, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = saved {
        tracing::error!("could not save onboarding details: {error}");
        return error.into_alert_response();
    }

    // A signed in user may have switched households.
    let reloaded = match state.persistence_mode() {
        Ok(mode) => state.sync.switch_to(&mode).await,
        Err(error) => Err(error),
    };

    if let Err(error) = reloaded {
        tracing::error!("could not load transactions for household {household_id}: {error}");
        return error.into_alert_response();
    }

    let Some(auth) = state.auth else {
        tracing::info!("No sign in provider configured, continuing with local storage");
        return (HxRedirect(endpoints::ROOT.to_owned()), StatusCode::SEE_OTHER).into_response();
    };

    if let Err(error) = auth.sign_in_with_otp(&email).await {
        tracing::warn!("could not request a sign in code: {error}");
        return Error::from(error).into_alert_response();
    }

    let alert = Alert::Success {
        message: "Check your email for the sign-in code".to_owned(),
        details: String::new(),
    };

    html! {
        (verify_form(&email))
        (alert.into_html())
    }
    .into_response()
}

/// The form data for exchanging a sign in code for a session.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    #[serde(default)]
    pub code: Option<String>,
}

/// Exchange the emailed code for a session, then load the household's
/// transactions and redirect to the home page.
pub async fn verify_endpoint(
    State(state): State<SyncState>,
    Form(form): Form<VerifyForm>,
) -> Response {
    let Some(auth) = state.auth.clone() else {
        return (HxRedirect(endpoints::ROOT.to_owned()), StatusCode::SEE_OTHER).into_response();
    };

    let Some(code) = non_empty(form.code) else {
        return Error::MissingSignInCode.into_alert_response();
    };

    let email = match state.db_connection.lock() {
        Ok(connection) => load_household_context(&connection).map(|context| context.email),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let email = match email {
        Ok(Some(email)) if !email.is_empty() => email,
        Ok(_) => return Error::NoPendingSignIn.into_alert_response(),
        Err(error) => return error.into_alert_response(),
    };

    if let Err(error) = auth.verify_otp(&email, &code).await {
        tracing::warn!("could not verify sign in code: {error}");
        return Error::from(error).into_alert_response();
    }

    let result = match state.persistence_mode() {
        Ok(mode) => state.sync.switch_to(&mode).await,
        Err(error) => Err(error),
    };

    if let Err(error) = result {
        tracing::error!("could not load transactions after signing in: {error}");
        return error.into_alert_response();
    }

    (HxRedirect(endpoints::ROOT.to_owned()), StatusCode::SEE_OTHER).into_response()
}

/// End the session and go back to the transactions stored on this device.
pub async fn sign_out_endpoint(State(state): State<SyncState>) -> Response {
    if let Some(auth) = &state.auth
        && let Err(error) = auth.sign_out().await
    {
        tracing::warn!("sign out with the provider failed, clearing the session anyway: {error}");
    }

    if let Err(error) = state.sync.load_local() {
        tracing::error!("could not load local transactions after signing out: {error}");
        return error.into_alert_response();
    }

    (HxRedirect(endpoints::ROOT.to_owned()), StatusCode::SEE_OTHER).into_response()
}



#[cfg(test)]
mod verify_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        auth::{
            AuthProvider, fake::FakeAuthProvider, sign_in::VerifyForm, sign_out_endpoint,
            verify_endpoint,
        },
        db::initialize,
        endpoints,
        local_store::save_household_context,
        sync::{SyncPolicy, SyncState, fake::FakeTransactionService},
        test_utils::assert_hx_redirect,
    };

    fn sync_state(auth: Arc<FakeAuthProvider>, onboarded: bool) -> SyncState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        if onboarded {
            save_household_context("me@example.com", "house-1", &connection).unwrap();
        }
        let db_connection = Arc::new(Mutex::new(connection));
        let service = Arc::new(FakeTransactionService::default());
        service.seed("user-2", "house-1", -12.0, "Dining", "Chipotle");

        SyncState {
            sync: SyncPolicy::new(db_connection.clone(), Some(service)).unwrap(),
            auth: Some(auth),
            db_connection,
        }
    }

    fn code(code: &str) -> Form<VerifyForm> {
        Form(VerifyForm {
            code: Some(code.to_owned()),
        })
    }

    #[tokio::test]
    async fn correct_code_signs_in_and_loads_household() {
        let auth = Arc::new(FakeAuthProvider::new("123456"));
        let state = sync_state(auth.clone(), true);

        let response = verify_endpoint(State(state.clone()), code("123456")).await;

        assert_hx_redirect(&response, endpoints::ROOT);
        assert_eq!(auth.session().map(|session| session.user.id).as_deref(), Some("user-1"));
        let transactions = state.sync.snapshot().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].merchant, "Chipotle");
    }

    #[tokio::test]
    async fn wrong_code_is_rejected() {
        let auth = Arc::new(FakeAuthProvider::new("123456"));
        let state = sync_state(auth.clone(), true);

        let response = verify_endpoint(State(state.clone()), code("000000")).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(auth.session(), None);
        assert_eq!(state.sync.snapshot().unwrap()[0].merchant, "Salary");
    }

    #[tokio::test]
    async fn code_without_saved_email_is_rejected() {
        let state = sync_state(Arc::new(FakeAuthProvider::new("123456")), false);

        let response = verify_endpoint(State(state), code("123456")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_code_is_rejected() {
        let state = sync_state(Arc::new(FakeAuthProvider::new("123456")), true);

        let response = verify_endpoint(State(state), Form(VerifyForm { code: None })).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_out_returns_to_local_transactions() {
        let auth = Arc::new(FakeAuthProvider::new("123456"));
        let state = sync_state(auth.clone(), true);
        verify_endpoint(State(state.clone()), code("123456")).await;

        let response = sign_out_endpoint(State(state.clone())).await;

        assert_hx_redirect(&response, endpoints::ROOT);
        assert_eq!(auth.session(), None);
        let transactions = state.sync.snapshot().unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].merchant, "Salary");
    }
}
