use tokio::signal;
use tokio::sync::watch;

/// Receiver side handed to background tasks; flips to `true` once on shutdown.
pub(crate) type ShutdownRx = watch::Receiver<bool>;

pub(crate) fn channel() -> (watch::Sender<bool>, ShutdownRx) {
    watch::channel(false)
}

/// Waits for Ctrl+C or SIGTERM, then tells every background task to stop.
pub(crate) async fn signal_and_broadcast(tx: watch::Sender<bool>) {
    shutdown_signal().await;
    if tx.send(true).is_err() {
        tracing::debug!("no background tasks left to notify about shutdown");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
