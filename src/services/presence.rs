use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::core::time::now_rfc3339;
use crate::schemas::{deserialize_id, CollectionBody};
use crate::services::upstream::{Credentials, UpstreamError};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub(crate) struct PresenceSnapshot {
    /// Unset until the first successful refresh.
    pub(crate) refreshed_at: Option<String>,
    pub(crate) online_user_ids: Vec<String>,
    pub(crate) online_count: usize,
}

impl PresenceSnapshot {
    pub(crate) fn is_online(&self, user_id: &str) -> bool {
        self.online_user_ids.iter().any(|id| id == user_id)
    }
}

/// Latest known set of online users, written only by the presence task.
#[derive(Debug, Clone, Default)]
pub(crate) struct PresenceBoard {
    snapshot: Arc<RwLock<PresenceSnapshot>>,
}

impl PresenceBoard {
    pub(crate) async fn snapshot(&self) -> PresenceSnapshot {
        self.snapshot.read().await.clone()
    }

    pub(crate) async fn publish(&self, snapshot: PresenceSnapshot) {
        *self.snapshot.write().await = snapshot;
    }
}

#[derive(Debug, Deserialize)]
struct OnlineUser {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
}

/// Pulls the online list from the auth service with the service token. The
/// caller decides whether the result gets published.
pub(crate) async fn fetch_online(state: &AppState) -> Result<PresenceSnapshot, UpstreamError> {
    let request_id = Uuid::new_v4().to_string();
    let credentials =
        Credentials { token: &state.settings().presence().service_token, request_id: &request_id };

    let body: CollectionBody<OnlineUser> = state
        .upstream()
        .get_json(credentials, UpstreamService::Auth, "/api/users/online", "fetch online users")
        .await?;

    let mut online_user_ids: Vec<String> = body.into_vec().into_iter().map(|user| user.id).collect();
    online_user_ids.sort();
    online_user_ids.dedup();

    Ok(PresenceSnapshot {
        refreshed_at: Some(now_rfc3339()),
        online_count: online_user_ids.len(),
        online_user_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn board_starts_empty_and_reflects_publish() {
        let board = PresenceBoard::default();
        assert_eq!(board.snapshot().await, PresenceSnapshot::default());

        board
            .publish(PresenceSnapshot {
                refreshed_at: Some("2025-01-01T00:00:00Z".to_string()),
                online_user_ids: vec!["u1".to_string()],
                online_count: 1,
            })
            .await;

        let snapshot = board.snapshot().await;
        assert!(snapshot.is_online("u1"));
        assert!(!snapshot.is_online("u2"));
        assert_eq!(snapshot.online_count, 1);
    }
}
