//! The endpoints behind the delete button of a transaction row: asking for
//! confirmation, cancelling, and deleting.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    Error,
    analytics::balance,
    sync::SyncState,
    transaction::{
        Transaction, TransactionId,
        view::{balance_card, confirm_delete_row, transaction_row},
    },
};

fn find_transaction(state: &SyncState, id: &TransactionId) -> Result<Transaction, Error> {
    state.sync.find(id)?.ok_or_else(|| {
        tracing::debug!("transaction {id} is not in the ledger");
        Error::NotFound
    })
}

/// A route handler that swaps a transaction row for a confirmation prompt.
pub async fn get_confirm_delete_row(
    State(state): State<SyncState>,
    Path(transaction_id): Path<String>,
) -> Response {
    match find_transaction(&state, &TransactionId::new(transaction_id)) {
        Ok(transaction) => confirm_delete_row(&transaction).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler that renders a single transaction row, e.g. after the
/// user cancels deleting it.
pub async fn get_transaction_row(
    State(state): State<SyncState>,
    Path(transaction_id): Path<String>,
) -> Response {
    match find_transaction(&state, &TransactionId::new(transaction_id)) {
        Ok(transaction) => transaction_row(&transaction).into_response(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for deleting a transaction.
///
/// Responds with an empty body, which removes the row, plus the updated
/// balance. When the remote service deletes nothing, e.g. because another
/// household member created the transaction, the row is returned unchanged.
pub async fn delete_transaction_endpoint(
    State(state): State<SyncState>,
    Path(transaction_id): Path<String>,
) -> Response {
    let id = TransactionId::new(transaction_id);

    let mode = match state.persistence_mode() {
        Ok(mode) => mode,
        Err(error) => return error.into_alert_response(),
    };

    let rows_affected = match state.sync.delete(&mode, &id).await {
        Ok(rows_affected) => rows_affected,
        Err(error) => {
            tracing::error!("Could not delete transaction {id}: {error}");
            return error.into_alert_response();
        }
    };

    let transactions = match state.sync.snapshot() {
        Ok(transactions) => transactions,
        Err(error) => return error.into_alert_response(),
    };

    // The status code has to be 200 OK or htmx will not swap the row.
    if rows_affected == 0
        && let Some(transaction) = transactions.iter().find(|transaction| transaction.id == id)
    {
        return transaction_row(transaction).into_response();
    }

    html! {
        (balance_card(balance(&transactions), true))
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        auth::fake::FakeAuthProvider,
        db::initialize,
        local_store::{load_transactions, save_household_context},
        sync::{PersistenceMode, SyncPolicy, SyncState, fake::FakeTransactionService},
        test_utils::parse_html_fragment,
        transaction::{
            NewTransaction, delete_transaction_endpoint, get_confirm_delete_row,
            get_transaction_row,
        },
    };

    fn get_test_connection() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        save_household_context("me@example.com", "house-1", &conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn local_state() -> SyncState {
        let db_connection = get_test_connection();

        SyncState {
            sync: SyncPolicy::new(db_connection.clone(), None).unwrap(),
            auth: None,
            db_connection,
        }
    }

    #[tokio::test]
    async fn confirm_then_cancel_round_trip() {
        let state = local_state();
        let id = state.sync.snapshot().unwrap()[0].id.to_string();

        let response = get_confirm_delete_row(State(state.clone()), Path(id.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Delete this transaction?"), "got {text}");

        let response = get_transaction_row(State(state), Path(id)).await;
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Salary"), "got {text}");
    }

    #[tokio::test]
    async fn confirm_for_unknown_transaction_is_not_found() {
        let response =
            get_confirm_delete_row(State(local_state()), Path("nope".to_owned())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_row_and_updates_balance() {
        let state = local_state();
        let added = state
            .sync
            .add(
                &PersistenceMode::Local,
                NewTransaction::expense(42.5, "Groceries", "Target"),
            )
            .await
            .unwrap();

        let response =
            delete_transaction_endpoint(State(state.clone()), Path(added.id.to_string())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let balance = html
            .select(&Selector::parse("#balance[hx-swap-oob] p").unwrap())
            .next()
            .expect("No balance found")
            .text()
            .collect::<String>();
        assert_eq!(balance.trim(), "$1,200.00");
        assert!(html.select(&Selector::parse("li").unwrap()).next().is_none());
        assert_eq!(state.sync.snapshot().unwrap().len(), 1);
        assert_eq!(
            load_transactions(&state.db_connection.lock().unwrap())
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn delete_unknown_transaction_locally_is_not_found() {
        let response =
            delete_transaction_endpoint(State(local_state()), Path("missing".to_owned())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_someone_elses_transaction_keeps_row() {
        let db_connection = get_test_connection();
        let service = Arc::new(FakeTransactionService::default());
        let theirs = service.seed("user-2", "house-1", -25.0, "Dining", "Chipotle");
        let state = SyncState {
            sync: SyncPolicy::new(db_connection.clone(), Some(service)).unwrap(),
            auth: Some(Arc::new(FakeAuthProvider::signed_in("user-1"))),
            db_connection,
        };
        let mode = state.persistence_mode().unwrap();
        state.sync.load(&mode).await.unwrap();

        let response =
            delete_transaction_endpoint(State(state.clone()), Path(theirs.id.to_string())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Chipotle"), "got {text}");
        assert_eq!(state.sync.snapshot().unwrap(), vec![theirs]);
    }
}
