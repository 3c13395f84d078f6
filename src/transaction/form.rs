//! The new transaction form: its fields, parsing and the endpoint that
//! re-renders it when the transaction type changes.

use axum::response::{IntoResponse, Response};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    autocomplete::AutocompleteField,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        loading_spinner,
    },
    transaction::NewTransaction,
};

/// The categories suggested for expenses.
pub const CATEGORY_OPTIONS: [&str; 9] = [
    "Groceries",
    "Movies",
    "Dining",
    "Credit Cards",
    "Loans",
    "Bills",
    "Rent",
    "Subscriptions",
    "Gas",
];

/// The kinds of income a user can record.
pub const INCOME_KINDS: [&str; 3] = ["OCTO", "BG", "FOREX"];

/// The income kind selected when the form is first shown.
pub const DEFAULT_INCOME_KIND: &str = "OCTO";

/// The merchants suggested for expenses in `category`.
pub fn merchant_options(category: &str) -> &'static [&'static str] {
    match category {
        "Groceries" => &["Target", "Walmart", "Wegmans", "Costco", "Harris Teeter"],
        "Credit Cards" => &[
            "Amex",
            "Chase",
            "Cap One - Savor",
            "Cap One - VentureX",
            "Discover",
            "Synchrony",
        ],
        "Bills" => &["Rent", "Car", "Electricity", "Gas", "Tolls", "T-Mobile"],
        "Subscriptions" => &["Netflix", "Regal"],
        _ => &[],
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

/// The form data for creating a transaction.
///
/// Every field is optional so that a partially filled form can be
/// re-rendered. Validation happens in [TransactionForm::to_new_transaction].
#[derive(Debug, Default, Deserialize)]
pub struct TransactionForm {
    #[serde(default)]
    pub type_: TransactionType,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub income_kind: Option<String>,
}

fn parse_amount(raw_amount: &str) -> Result<f64, Error> {
    let trimmed = raw_amount.trim();

    match trimmed.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(amount),
        _ => Err(Error::InvalidAmount(trimmed.to_owned())),
    }
}

impl TransactionForm {
    /// Validate the form.
    ///
    /// Expenses are stored as negative amounts and income as positive amounts,
    /// regardless of the sign that was entered.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if the amount is missing or not a finite number.
    pub fn to_new_transaction(&self) -> Result<NewTransaction, Error> {
        let amount = parse_amount(self.amount.as_deref().unwrap_or_default())?;

        let transaction = match self.type_ {
            TransactionType::Expense => NewTransaction::expense(
                amount,
                self.category.as_deref().unwrap_or_default().trim(),
                self.merchant.as_deref().unwrap_or_default().trim(),
            ),
            TransactionType::Income => NewTransaction::income(
                amount,
                self.income_kind.as_deref().unwrap_or(DEFAULT_INCOME_KIND),
            ),
        };

        Ok(transaction)
    }
}

fn type_option(value: &str, label: &str, selected: bool) -> Markup {
    html! {
        @if selected {
            option value=(value) selected { (label) }
        } @else {
            option value=(value) { (label) }
        }
    }
}

/// The fields that depend on the transaction type.
pub fn transaction_form_fields(form: &TransactionForm) -> Markup {
    let amount = form.amount.as_deref().unwrap_or_default();

    let amount_input = html! {
        div
        {
            label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

            div class="input-wrapper w-full"
            {
                input
                    name="amount"
                    id="amount"
                    type="number"
                    step="0.01"
                    inputmode="decimal"
                    placeholder="0.00"
                    value=(amount)
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    };

    match form.type_ {
        TransactionType::Expense => {
            let category = form.category.as_deref().unwrap_or_default();
            let merchant = form.merchant.as_deref().unwrap_or_default();

            html! {
                div
                {
                    label for="category" class=(FORM_LABEL_STYLE) { "Category" }
                    (AutocompleteField::Category.widget(category, category))
                }

                div
                {
                    label for="merchant" class=(FORM_LABEL_STYLE) { "Description" }
                    (AutocompleteField::Merchant.widget(merchant, category))
                }

                (amount_input)
            }
        }
        TransactionType::Income => {
            let income_kind = form.income_kind.as_deref().unwrap_or(DEFAULT_INCOME_KIND);

            html! {
                (amount_input)

                div
                {
                    label for="income_kind" class=(FORM_LABEL_STYLE) { "Income type" }

                    select name="income_kind" id="income_kind" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for kind in INCOME_KINDS {
                            (type_option(kind, kind, kind == income_kind))
                        }
                    }
                }
            }
        }
    }
}

/// The complete new transaction form.
pub fn transaction_form(form: &TransactionForm) -> Markup {
    let is_expense = form.type_ == TransactionType::Expense;

    html! {
        form
            id="transaction-form"
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="w-full space-y-4"
        {
            div
            {
                label for="type_" class=(FORM_LABEL_STYLE) { "Type" }

                select
                    name="type_"
                    id="type_"
                    hx-post=(endpoints::TRANSACTION_FORM)
                    hx-trigger="change"
                    hx-target="#transaction-form"
                    hx-swap="outerHTML"
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    (type_option("expense", "Expense", is_expense))
                    (type_option("income", "Income", !is_expense))
                }
            }

            (transaction_form_fields(form))

            div class="flex gap-3"
            {
                button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                {
                    span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                    "Add"
                }

                button
                    type="button"
                    hx-post=(endpoints::TRANSACTION_FORM)
                    hx-params="none"
                    hx-target="#transaction-form"
                    hx-swap="outerHTML"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Reset"
                }
            }
        }
    }
}

/// A route handler that re-renders the form, e.g. after the transaction type
/// changes. Submitting no fields gives an empty expense form.
pub async fn transaction_form_endpoint(Form(form): Form<TransactionForm>) -> Response {
    transaction_form(&form).into_response()
}
