//! A household budget ledger served as a JSON API.
//!
//! Users register, log in with a cookie session and record the money they
//! earn and spend. Each user's ledger is aggregated into a budget summary of
//! total income, total expense, a shared expense they set by hand, and the
//! balance left over.
//!
//! How the summary follows the ledger is chosen at start up, see
//! [SummaryStrategy].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod amount;
mod app_state;
mod auth;
mod database_id;
mod db;
mod endpoints;
mod error;
mod extract;
mod ledger;
mod logging;
mod password;
mod profile;
mod routing;
mod summary;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use amount::Amount;
pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use ledger::{DEFAULT_CURRENCY, LedgerConfig, reconcile_all_summaries, record_transaction};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use profile::{ProfileUpdate, save_profile};
pub use routing::build_router;
pub use summary::SummaryStrategy;
pub use transaction::{NewTransaction, TransactionKind};
pub use user::{User, UserID, create_user, get_user_by_id, parse_email};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
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
