//! Shutdown signal handling.

use tokio::signal;
use tracing::{info, warn};

use crate::logging::prefix::CLOSE;

/// Resolves when Ctrl+C or (on Unix) SIGTERM is received.
///
/// A handler that cannot be installed never fires; the other one still does.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("{} Received Ctrl+C, stopping after the current frame", CLOSE);
        }
        _ = terminate => {
            info!("{} Received terminate signal, stopping after the current frame", CLOSE);
        }
    }
}
