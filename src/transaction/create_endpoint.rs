//! Defines the endpoint for creating a new transaction.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;

use crate::{endpoints, sync::SyncState, transaction::form::TransactionForm};

/// A route handler for creating a new transaction, redirects to the home page on success.
pub async fn create_transaction_endpoint(
    State(state): State<SyncState>,
    Form(form): Form<TransactionForm>,
) -> Response {
    let new_transaction = match form.to_new_transaction() {
        Ok(new_transaction) => new_transaction,
        Err(error) => {
            tracing::debug!("rejected transaction form: {error}");
            return error.into_alert_response();
        }
    };

    let mode = match state.persistence_mode() {
        Ok(mode) => mode,
        Err(error) => return error.into_alert_response(),
    };

    match state.sync.add(&mode, new_transaction).await {
        Ok(transaction) => {
            tracing::debug!("created transaction {}", transaction.id);
        }
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(endpoints::ROOT.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
