//! The analytics page and the endpoint for changing the monthly budget.

use std::collections::BTreeMap;

use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;
use time::{OffsetDateTime, UtcOffset};

use crate::{
    AppState, Error,
    analytics::aggregation::{
        Analytics, BudgetComparison, BudgetStatus, CategoryTotal, MerchantTotal, MonthlyStats,
        TrendPoint, compare_to_budget, monthly_stats,
    },
    endpoints,
    html::{
        CARD_STYLE, CARD_TITLE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        dollar_input_styles, format_currency,
    },
    navigation::{NavBar, SessionStatus},
    preferences::SharedPreferences,
    sync::SyncState,
    timezone::get_local_offset,
};

const BUDGET_SECTION_ID: &str = "budget-section";

const TEXT_RED_STYLE: &str = "text-red-600 dark:text-red-400";
const TEXT_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";

/// The state needed for the analytics page.
#[derive(Clone)]
pub struct AnalyticsState {
    pub sync_state: SyncState,
    pub preferences: SharedPreferences,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            sync_state: SyncState::from_ref(state),
            preferences: state.preferences.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl AnalyticsState {
    fn local_offset(&self) -> Result<UtcOffset, Error> {
        get_local_offset(&self.local_timezone).ok_or_else(|| {
            tracing::error!("Invalid timezone {}", self.local_timezone);
            Error::InvalidTimezoneError(self.local_timezone.clone())
        })
    }
}

/// Display the monthly breakdown, category totals, top merchants, balance
/// trend and budget comparison for the current transaction list.
pub async fn get_analytics_page(
    State(state): State<AnalyticsState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let local_offset = state.local_offset()?;
    let transactions = state.sync_state.sync.snapshot()?;
    let preferences = state.preferences.snapshot()?;
    let color_scheme = state.preferences.color_scheme(&headers)?;

    let analytics = Analytics::compute(
        &transactions,
        preferences.budget,
        OffsetDateTime::now_utc(),
        local_offset,
    );

    let session_status = SessionStatus::from_provider(state.sync_state.auth.as_deref());
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW, session_status).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class=(CARD_STYLE)
            {
                h2 class=(CARD_TITLE_STYLE) { "Balance" }
                p id="analytics-balance" class="text-3xl font-bold" { (format_currency(analytics.balance)) }
            }

            (monthly_breakdown(&analytics.monthly))
            (category_breakdown(&analytics.categories))
            (top_merchants_table(&analytics.merchants))
            (balance_trend_table(&analytics.trend))
            (budget_section(preferences.budget, &analytics.budget))
        }
    };

    Ok(base("Analytics", Some(color_scheme), &[dollar_input_styles()], &content).into_response())
}

#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    pub budget: Option<String>,
}

/// Update the monthly budget and respond with the re-rendered budget section.
pub async fn budget_endpoint(
    State(state): State<AnalyticsState>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let raw_budget = form.budget.unwrap_or_default();
    let budget = match raw_budget.trim().parse::<f64>() {
        Ok(budget) if budget.is_finite() => budget,
        _ => {
            tracing::debug!("rejected budget {raw_budget:?}");
            return Error::InvalidAmount(raw_budget.trim().to_owned()).into_alert_response();
        }
    };

    match state.preferences.lock() {
        Ok(mut preferences) => preferences.budget = budget,
        Err(error) => {
            tracing::error!("could not acquire preferences lock: {error}");
            return Error::PreferencesLockError.into_alert_response();
        }
    }

    let local_offset = match state.local_offset() {
        Ok(local_offset) => local_offset,
        Err(error) => return error.into_alert_response(),
    };

    let transactions = match state.sync_state.sync.snapshot() {
        Ok(transactions) => transactions,
        Err(error) => return error.into_alert_response(),
    };

    let monthly = monthly_stats(&transactions, OffsetDateTime::now_utc(), local_offset);

    budget_section(budget, &compare_to_budget(&monthly, budget)).into_response()
}

fn empty_message() -> Markup {
    html! {
        p class="text-gray-500 dark:text-gray-400" { "No transactions yet" }
    }
}

fn monthly_breakdown(monthly: &BTreeMap<String, MonthlyStats>) -> Markup {
    html! {
        section id="monthly-breakdown" class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Monthly Breakdown" }

            @if monthly.is_empty() {
                (empty_message())
            } @else {
                table class="w-full text-sm text-left"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Spent" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Earned" }
                        }
                    }

                    tbody
                    {
                        // Most recent month first.
                        @for (month, stats) in monthly.iter().rev() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { (month) }
                                td class={ (TABLE_CELL_STYLE) " " (TEXT_RED_STYLE) }
                                {
                                    "-" (format_currency(stats.expense))
                                }
                                td class={ (TABLE_CELL_STYLE) " " (TEXT_GREEN_STYLE) }
                                {
                                    "+" (format_currency(stats.income))
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn category_breakdown(categories: &[CategoryTotal]) -> Markup {
    html! {
        section id="category-breakdown" class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Category Breakdown" }

            @if categories.is_empty() {
                (empty_message())
            } @else {
                table class="w-full text-sm text-left"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                        }
                    }

                    tbody
                    {
                        @for total in categories {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { (total.category) }
                                td class=(TABLE_CELL_STYLE) { (format_currency(total.value)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn top_merchants_table(merchants: &[MerchantTotal]) -> Markup {
    html! {
        section id="top-merchants" class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Top Merchants" }

            @if merchants.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "No merchants yet" }
            } @else {
                ol class="space-y-2"
                {
                    @for total in merchants {
                        li class="flex justify-between gap-4"
                        {
                            span { (total.merchant) }
                            span class="font-semibold" { (format_currency(total.value)) }
                        }
                    }
                }
            }
        }
    }
}

fn balance_trend_table(trend: &[TrendPoint]) -> Markup {
    html! {
        section id="balance-trend" class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Balance Trend" }

            @if trend.is_empty() {
                (empty_message())
            } @else {
                table class="w-full text-sm text-left"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Balance" }
                        }
                    }

                    tbody
                    {
                        @for point in trend {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    @if point.date.is_empty() {
                                        "Not synced"
                                    } @else {
                                        (point.date)
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (format_currency(point.balance)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn budget_section(budget: f64, comparisons: &[BudgetComparison]) -> Markup {
    html! {
        section id=(BUDGET_SECTION_ID) class=(CARD_STYLE)
        {
            h2 class=(CARD_TITLE_STYLE) { "Budget vs Actual" }

            form
                hx-post=(endpoints::BUDGET)
                hx-trigger="change"
                hx-target={ "#" (BUDGET_SECTION_ID) }
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class="mb-4"
            {
                label for="budget" class=(FORM_LABEL_STYLE) { "Monthly Budget" }

                div class="input-wrapper"
                {
                    input
                        id="budget"
                        name="budget"
                        type="number"
                        step="0.01"
                        value=(budget)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }
            }

            @if comparisons.is_empty() {
                (empty_message())
            } @else {
                ul id="budget-comparisons" class="space-y-1 text-sm"
                {
                    @for comparison in comparisons.iter().rev() {
                        @let (label, style) = match comparison.status {
                            BudgetStatus::Over => ("Over", TEXT_RED_STYLE),
                            BudgetStatus::Under => ("Under", TEXT_GREEN_STYLE),
                        };

                        li
                        {
                            (comparison.month) ": "
                            span class=(style)
                            {
                                (label) " Budget by " (format_currency(comparison.difference))
                            }
                        }
                    }
                }
            }
        }
    }
}
