//! HTML rendering for the balance card and the transaction list.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    html::{BUTTON_DELETE_STYLE, CARD_STYLE, CARD_TITLE_STYLE, format_currency},
    transaction::Transaction,
};

pub(crate) const BALANCE_CARD_ID: &str = "balance";

fn amount_class(amount: f64) -> &'static str {
    if amount < 0.0 {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    }
}

fn row_id(transaction: &Transaction) -> String {
    format!("transaction-{}", transaction.id)
}

/// The card showing the sum of every transaction.
///
/// Set `swap_oob` when the card is sent alongside another response so htmx
/// replaces the card already on the page.
pub(crate) fn balance_card(balance: f64, swap_oob: bool) -> Markup {
    html! {
        section
            id=(BALANCE_CARD_ID)
            hx-swap-oob=[swap_oob.then_some("true")]
            class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Balance" }
            p class={ "text-3xl font-bold " (amount_class(balance)) }
            {
                (format_currency(balance))
            }
        }
    }
}

pub(crate) fn transaction_row(transaction: &Transaction) -> Markup {
    let id = transaction.id.as_str();

    html! {
        li
            id=(row_id(transaction))
            class="flex items-center justify-between gap-4 py-3"
        {
            div class="min-w-0"
            {
                p class="font-medium truncate" { (transaction.title()) }
                p class="text-sm text-gray-500 dark:text-gray-400 truncate" { (transaction.category) }
            }

            div class="flex items-center gap-4 shrink-0"
            {
                span class={ "font-semibold " (amount_class(transaction.amount)) }
                {
                    (format_currency(transaction.amount.abs()))
                }

                button
                    type="button"
                    hx-get=(format_endpoint(endpoints::CONFIRM_DELETE_TRANSACTION, id))
                    hx-target="closest li"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

/// The row asking the user to confirm deleting `transaction`.
pub(crate) fn confirm_delete_row(transaction: &Transaction) -> Markup {
    let id = transaction.id.as_str();

    html! {
        li
            id=(row_id(transaction))
            class="flex items-center justify-between gap-4 py-3"
        {
            p class="font-medium" { "Delete this transaction?" }

            div class="flex items-center gap-4 shrink-0"
            {
                button
                    type="button"
                    hx-delete=(format_endpoint(endpoints::TRANSACTION, id))
                    hx-target="closest li"
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }

                button
                    type="button"
                    hx-get=(format_endpoint(endpoints::TRANSACTION_ROW, id))
                    hx-target="closest li"
                    hx-swap="outerHTML"
                    class="text-gray-600 dark:text-gray-300 underline"
                {
                    "Cancel"
                }
            }
        }
    }
}

pub(crate) fn transaction_list(transactions: &[Transaction]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Transactions" }

            @if transactions.is_empty() {
                p id="no-transactions" class="text-gray-500 dark:text-gray-400"
                {
                    "No transactions yet"
                }
            } @else {
                ul
                    id="transaction-list"
                    class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for transaction in transactions {
                        (transaction_row(transaction))
                    }
                }
            }
        }
    }
}
