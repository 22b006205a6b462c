//! Bookkeeper is a service for keeping personal finance accounts in step with
//! the transactions recorded against them.
//!
//! Every transaction moves an amount from a source account to a destination
//! account, either of which may be outside the system. Creating, amending and
//! deleting a transaction books the matching change on the affected account
//! balances in a single atomic unit, so a transaction never exists without
//! its effect on the balances, or vice versa.
//!
//! This library provides a JSON REST API over the accounts, categories and
//! transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

pub mod account;
mod app_state;
pub mod booking;
pub mod category;
pub mod database_id;
mod db;
pub mod endpoints;
mod error;
pub mod gateway;
mod logging;
mod routing;
pub mod transaction;

pub use account::Account;
pub use app_state::AppState;
pub use category::Category;
pub use db::initialize as initialize_db;
pub use error::{Error, ValidationError};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use transaction::Transaction;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Could not listen for the Ctrl+C signal: {error}");
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
                tracing::error!("Could not install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
