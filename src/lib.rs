//! Budget Bud is a web app for tracking a household's income and spending.
//!
//! This library provides a web server that directly serves HTML pages.
//! Transactions are kept on this device until the user signs in, after which
//! the household's shared transactions are read from and written to a hosted
//! transaction service.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod alert;
mod analytics;
mod app_state;
mod auth;
mod autocomplete;
mod config;
mod db;
mod endpoints;
mod error;
mod html;
mod internal_server_error;
mod local_store;
mod logging;
mod navigation;
mod not_found;
mod preferences;
mod routing;
mod set_password;
mod sync;
#[cfg(test)]
mod test_utils;
mod theme;
mod timezone;
mod transaction;

pub use app_state::{AppState, Integrations};
pub use config::SupabaseConfig;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
        },
    }

    handle.graceful_shutdown(Some(Duration::from_secs(1)));
}
