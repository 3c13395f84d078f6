//! Defines the route handler for the home page.

use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    AppState, Error,
    analytics::balance,
    endpoints,
    html::{CARD_STYLE, CARD_TITLE_STYLE, PAGE_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::{NavBar, SessionStatus},
    preferences::SharedPreferences,
    sync::SyncState,
    transaction::{
        form::{TransactionForm, transaction_form},
        view::{balance_card, transaction_list},
    },
};

/// The state needed for the home page.
#[derive(Clone)]
pub struct HomePageState {
    pub sync_state: SyncState,
    pub preferences: SharedPreferences,
}

impl FromRef<AppState> for HomePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            sync_state: SyncState::from_ref(state),
            preferences: state.preferences.clone(),
        }
    }
}

/// Renders the balance, the new transaction form and the transaction list.
pub async fn get_home_page(
    State(state): State<HomePageState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let transactions = state.sync_state.sync.snapshot()?;
    let color_scheme = state.preferences.color_scheme(&headers)?;
    let session_status = SessionStatus::from_provider(state.sync_state.auth.as_deref());
    let nav_bar = NavBar::new(endpoints::ROOT, session_status).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (balance_card(balance(&transactions), false))

            section class=(CARD_STYLE)
            {
                h2 class=(CARD_TITLE_STYLE) { "Add Transaction" }
                (transaction_form(&TransactionForm::default()))
            }

            (transaction_list(&transactions))
        }
    };

    Ok(base("Home", Some(color_scheme), &[dollar_input_styles()], &content).into_response())
}
