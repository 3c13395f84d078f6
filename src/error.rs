//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFoundError};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The amount entered for a transaction is not a finite number.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// The sign in form was submitted without an email address.
    #[error("an email address is required")]
    MissingEmail,

    /// The sign in form was submitted without a household code.
    #[error("a household code is required")]
    MissingHouseholdCode,

    /// The verification form was submitted without a code.
    #[error("a sign in code is required")]
    MissingSignInCode,

    /// A sign in code was submitted before an email address was saved.
    #[error("no email address has been saved for signing in")]
    NoPendingSignIn,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Could not acquire the lock on the in-memory transaction list
    #[error("could not acquire the transaction list lock")]
    LedgerLockError,

    /// Could not acquire the lock on the user's preferences
    #[error("could not acquire the preferences lock")]
    PreferencesLockError,

    /// The remote transaction service rejected a request or could not be reached.
    ///
    /// The string holds the detail reported by the service, if any.
    #[error("the remote transaction service failed: {0}")]
    RemoteServiceError(String),

    /// The authentication provider rejected a request or could not be reached.
    #[error("the authentication provider failed: {0}")]
    AuthProviderError(String),

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the transaction list")]
    DeleteMissingTransaction,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError | Error::LedgerLockError | Error::PreferencesLockError => {
                InternalServerError::default().into_response()
            }
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidAmount(_) => (
                StatusCode::BAD_REQUEST,
                Alert::error_simple("Please enter a valid amount."),
            ),
            Error::MissingEmail => (
                StatusCode::BAD_REQUEST,
                Alert::error_simple("Enter your email"),
            ),
            Error::MissingHouseholdCode => (
                StatusCode::BAD_REQUEST,
                Alert::error_simple("Enter the secret code"),
            ),
            Error::MissingSignInCode => (
                StatusCode::BAD_REQUEST,
                Alert::error_simple("Enter the sign-in code from your email"),
            ),
            Error::NoPendingSignIn => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Sign-in error".to_owned(),
                    details: "Enter your email and secret code before entering a sign-in code."
                        .to_owned(),
                },
            ),
            Error::AuthProviderError(detail) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Sign-in error".to_owned(),
                    details: detail,
                },
            ),
            Error::RemoteServiceError(detail) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Failed to sync with the server".to_owned(),
                    details: detail,
                },
            ),
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Transaction not found".to_owned(),
                    details: "Try refreshing the page to see the latest transactions.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::Error;

    #[test]
    fn validation_errors_are_bad_requests() {
        for error in [
            Error::InvalidAmount("abc".to_owned()),
            Error::MissingEmail,
            Error::MissingHouseholdCode,
            Error::MissingSignInCode,
            Error::NoPendingSignIn,
        ] {
            assert_eq!(error.into_alert_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn remote_failures_are_bad_gateway() {
        let response = Error::RemoteServiceError("boom".to_owned()).into_alert_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }
}
