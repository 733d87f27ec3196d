use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::core::config::UpstreamService;
use crate::core::state::AppState;
use crate::schemas::CollectionBody;
use crate::services::collections::CollectionStore;
use crate::services::session::Session;

/// Where a list lives upstream and what its snapshot is called.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RemoteCollection<'a> {
    pub(crate) service: UpstreamService,
    pub(crate) path: &'a str,
    pub(crate) resource: &'a str,
    pub(crate) action: &'a str,
}

pub(crate) fn snapshots(state: &AppState) -> &CollectionStore {
    state.collections()
}

/// The caller's copy of a collection: the cached snapshot when there is one
/// and `refresh` is off, otherwise a fresh fetch that becomes the snapshot.
pub(crate) async fn fetch_collection<T>(
    state: &AppState,
    session: &Session,
    remote: RemoteCollection<'_>,
    refresh: bool,
) -> Result<Vec<T>, ApiError>
where
    T: Serialize + DeserializeOwned,
{
    snapshots(state)
        .fetch_or_load(session.user_id(), remote.resource, refresh, || async {
            let body: CollectionBody<T> = state
                .upstream()
                .get_json(session.credentials(), remote.service, remote.path, remote.action)
                .await?;
            Ok(body.into_vec())
        })
        .await
        .map_err(ApiError::from)
}
