//! The URIs of every page and API endpoint.
//!
//! For endpoints that take a parameter, e.g., '/api/transactions/{transaction_id}',
//! use [format_endpoint].

/// The home page: balance, the new transaction form and the transaction list.
pub const ROOT: &str = "/";
/// The charts and tables summarising the transactions.
pub const ANALYTICS_VIEW: &str = "/analytics";
/// The onboarding page that asks for an email and household code.
pub const SIGN_IN_VIEW: &str = "/sign_in";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route that saves the onboarding details and requests a sign in code.
pub const SIGN_IN_API: &str = "/api/sign_in";
/// The route that exchanges a sign in code for a session.
pub const VERIFY_API: &str = "/api/verify";
/// The route that ends the current session.
pub const SIGN_OUT_API: &str = "/api/sign_out";
/// The route to create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to delete a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for asking the user to confirm deleting a transaction.
pub const CONFIRM_DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}/confirm_delete";
/// The route for rendering a single row of the transaction list.
pub const TRANSACTION_ROW: &str = "/api/transactions/{transaction_id}/row";
/// The route that swaps the fields of the new transaction form when the type changes.
pub const TRANSACTION_FORM: &str = "/api/transaction_form";
/// The route that drives the autocomplete inputs.
pub const AUTOCOMPLETE: &str = "/api/autocomplete";
/// The route for changing the monthly budget.
pub const BUDGET: &str = "/api/budget";
/// The route for switching between light and dark mode.
pub const THEME: &str = "/api/theme";
/// The administrator route for setting a user's password.
pub const SET_PASSWORD: &str = "/api/set-password";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is the text between the first '{' and the following '}'.
/// For example, in the endpoint path '/api/transactions/{transaction_id}',
/// '{transaction_id}' is the parameter.
///
/// If no parameter is found in `endpoint_path`, the original path is returned.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let end = endpoint_path[start..]
        .find('}')
        .map(|offset| start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!("{}{}{}", &endpoint_path[..start], id, &endpoint_path[end..])
}
