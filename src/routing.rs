//! Application router configuration with onboarding-guarded and open route definitions.

use axum::{
    Router, middleware,
    routing::{any, delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    analytics::{budget_endpoint, get_analytics_page},
    auth::{
        get_sign_in_page, onboarding_guard, onboarding_guard_hx, sign_in_endpoint,
        sign_out_endpoint, verify_endpoint,
    },
    autocomplete::autocomplete_endpoint,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    set_password::set_password_endpoint,
    theme::toggle_theme_endpoint,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_confirm_delete_row,
        get_home_page, get_transaction_row, transaction_form_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let open_routes = Router::new()
        .route(endpoints::SIGN_IN_VIEW, get(get_sign_in_page))
        .route(endpoints::SIGN_IN_API, post(sign_in_endpoint))
        .route(endpoints::VERIFY_API, post(verify_endpoint))
        .route(endpoints::SIGN_OUT_API, post(sign_out_endpoint))
        .route(endpoints::THEME, post(toggle_theme_endpoint))
        // Other methods are answered with a JSON error by the handler itself.
        .route(endpoints::SET_PASSWORD, any(set_password_endpoint))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let onboarded_pages = Router::new()
        .route(endpoints::ROOT, get(get_home_page))
        .route(endpoints::ANALYTICS_VIEW, get(get_analytics_page))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            onboarding_guard,
        ));

    // htmx requests need the HX-Redirect header to be sent to the sign in page.
    let onboarded_api = Router::new()
        .route(
            endpoints::TRANSACTIONS_API,
            post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION, delete(delete_transaction_endpoint))
        .route(
            endpoints::CONFIRM_DELETE_TRANSACTION,
            get(get_confirm_delete_row),
        )
        .route(endpoints::TRANSACTION_ROW, get(get_transaction_row))
        .route(endpoints::TRANSACTION_FORM, post(transaction_form_endpoint))
        .route(endpoints::AUTOCOMPLETE, post(autocomplete_endpoint))
        .route(endpoints::BUDGET, post(budget_endpoint))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            onboarding_guard_hx,
        ));

    onboarded_pages
        .merge(onboarded_api)
        .merge(open_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, app_state::Integrations, build_router, endpoints,
        local_store::save_household_context,
    };

    fn get_test_server(onboarded: bool) -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "Etc/UTC",
            Integrations::default(),
        )
        .unwrap();
        if onboarded {
            save_household_context(
                "me@example.com",
                "1234",
                &state.db_connection.lock().unwrap(),
            )
            .unwrap();
        }

        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn new_visitor_is_sent_to_sign_in() {
        let server = get_test_server(false);

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::SIGN_IN_VIEW);
        server.get(endpoints::SIGN_IN_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn onboarding_then_adding_a_transaction() {
        let server = get_test_server(false);

        server
            .post(endpoints::SIGN_IN_API)
            .form(&[("email", "me@example.com"), ("household_id", "1234")])
            .await
            .assert_status_see_other();
        server
            .post(endpoints::TRANSACTIONS_API)
            .form(&[
                ("type_", "expense"),
                ("amount", "42.50"),
                ("category", "Groceries"),
                ("merchant", "Target"),
            ])
            .await
            .assert_status_see_other();

        let response = server.get(endpoints::ROOT).await;

        response.assert_status_ok();
        let text = response.text();
        assert!(text.contains("$1,157.50"), "balance missing from {text}");
        assert!(text.contains("Target"));
        server.get(endpoints::ANALYTICS_VIEW).await.assert_status_ok();
    }

    #[tokio::test]
    async fn api_requires_onboarding() {
        let server = get_test_server(false);

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .form(&[("type_", "expense"), ("amount", "1")])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::SIGN_IN_VIEW);
    }

    #[tokio::test]
    async fn set_password_rejects_get() {
        let server = get_test_server(false);

        server
            .get(endpoints::SET_PASSWORD)
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server(true);

        server.get("/nope").await.assert_status_not_found();
        server
            .get(endpoints::INTERNAL_ERROR_VIEW)
            .await
            .assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}
