use actix_web::dev::ServerHandle;
use tokio::signal;
use tracing::{error, warn};

/// Resolves with the name of the first termination signal received.
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Waits for a termination signal, then lets in-flight requests finish
/// before the workers stop.
pub async fn stop_on_signal(handle: ServerHandle) {
    let received = shutdown_signal().await;
    warn!("🛑 {} received, draining in-flight requests...", received);
    handle.stop(true).await;
}
