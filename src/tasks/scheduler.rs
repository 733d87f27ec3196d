use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::core::shutdown::ShutdownRx;
use crate::core::state::AppState;
use crate::services::presence;

/// Background work owned by the server process. Returns once `shutdown`
/// flips; nothing is published after that.
pub(crate) async fn run(state: AppState, shutdown: ShutdownRx) {
    if state.settings().presence().service_token.is_empty() {
        tracing::info!("SERVICE_TOKEN is not set; presence refresh disabled");
        return;
    }

    presence_loop(state, shutdown).await;
}

async fn presence_loop(state: AppState, mut shutdown: ShutdownRx) {
    let period = Duration::from_secs(state.settings().presence().refresh_seconds);
    let mut tick = interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {}
        }

        // an in-flight fetch is dropped on shutdown
        let fetched = tokio::select! {
            _ = shutdown.changed() => break,
            fetched = presence::fetch_online(&state) => fetched,
        };
        if *shutdown.borrow() {
            break;
        }

        match fetched {
            Ok(snapshot) => {
                let online_count = snapshot.online_count;
                state.presence().publish(snapshot).await;
                tracing::debug!(online_count, "Presence snapshot refreshed");
            }
            Err(err) => tracing::warn!(
                error = %err,
                "Presence refresh failed; keeping previous snapshot"
            ),
        }
    }

    tracing::info!("Presence refresh stopped");
}
