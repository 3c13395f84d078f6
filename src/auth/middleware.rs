//! Middleware that sends visitors who have not finished onboarding to the sign in page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, endpoints, local_store::load_household_context};

/// The state needed for the onboarding middleware.
#[derive(Debug, Clone)]
pub struct OnboardingState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for OnboardingState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Checks that an email and household code have been saved on this device.
/// The request is executed normally if they have, otherwise the response from
/// `get_redirect` is returned.
///
/// Signing in with the provider is not required, only the onboarding details.
#[inline]
async fn onboarding_guard_internal(
    state: OnboardingState,
    request: Request,
    next: Next,
    get_redirect: impl Fn(&str) -> Response,
) -> Response {
    let context = match state.db_connection.lock() {
        Ok(connection) => load_household_context(&connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}. Redirecting to sign in.");
            return get_redirect(endpoints::SIGN_IN_VIEW);
        }
    };

    match context {
        Ok(context) if context.is_complete() => next.run(request).await,
        Ok(_) => get_redirect(endpoints::SIGN_IN_VIEW),
        Err(error) => {
            tracing::error!("could not read onboarding details: {error}. Redirecting to sign in.");
            get_redirect(endpoints::SIGN_IN_VIEW)
        }
    }
}

/// Middleware function that redirects to the sign in page if onboarding has
/// not been completed.
pub async fn onboarding_guard(
    State(state): State<OnboardingState>,
    request: Request,
    next: Next,
) -> Response {
    onboarding_guard_internal(state, request, next, |redirect_url| {
        Redirect::to(redirect_url).into_response()
    })
    .await
}

/// Middleware function that responds with a HTMX redirect to the sign in page
/// if onboarding has not been completed.
pub async fn onboarding_guard_hx(
    State(state): State<OnboardingState>,
    request: Request,
    next: Next,
) -> Response {
    onboarding_guard_internal(state, request, next, |redirect_url| {
        (HxRedirect(redirect_url.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

#[cfg(test)]
mod onboarding_guard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, middleware, response::Html, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        auth::{middleware::OnboardingState, onboarding_guard, onboarding_guard_hx},
        db::initialize,
        endpoints,
        local_store::save_household_context,
    };

    async fn test_handler() -> Html<&'static str> {
        Html("<h1>Hello, World!</h1>")
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_test_server(onboarded: bool) -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        if onboarded {
            save_household_context("me@example.com", "house-1", &connection).unwrap();
        }
        let state = OnboardingState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), onboarding_guard))
            .merge(
                Router::new()
                    .route(TEST_API_ROUTE, get(test_handler))
                    .route_layer(middleware::from_fn_with_state(
                        state.clone(),
                        onboarding_guard_hx,
                    )),
            )
            .with_state(state);

        TestServer::new(app)
    }

    #[tokio::test]
    async fn onboarded_visitor_gets_page() {
        let server = get_test_server(true);

        server.get(TEST_PROTECTED_ROUTE).await.assert_status_ok();
    }

    #[tokio::test]
    async fn new_visitor_is_redirected_to_sign_in() {
        let server = get_test_server(false);

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::SIGN_IN_VIEW);
    }

    #[tokio::test]
    async fn new_visitor_gets_hx_redirect_on_api_route() {
        let server = get_test_server(false);

        let response = server.get(TEST_API_ROUTE).add_header("HX-Request", "true").await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::SIGN_IN_VIEW);
    }

    #[tokio::test]
    async fn email_without_household_is_not_enough() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        save_household_context("me@example.com", "", &connection).unwrap();
        let state = OnboardingState {
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), onboarding_guard))
            .with_state(state);
        let server = TestServer::new(app);

        server.get(TEST_PROTECTED_ROUTE).await.assert_status_see_other();
    }
}
