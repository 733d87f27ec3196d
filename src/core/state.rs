use std::sync::Arc;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::collections::CollectionStore;
use crate::services::mutations::MutationLocks;
use crate::services::presence::PresenceBoard;
use crate::services::upstream::UpstreamClient;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    redis: RedisHandle,
    upstream: UpstreamClient,
    collections: CollectionStore,
    mutations: MutationLocks,
    presence: PresenceBoard,
}

impl AppState {
    pub(crate) fn new(settings: Settings, redis: RedisHandle, upstream: UpstreamClient) -> Self {
        let collections = CollectionStore::from_settings(&settings, redis.clone());
        Self {
            inner: Arc::new(InnerState {
                settings,
                redis,
                upstream,
                collections,
                mutations: MutationLocks::default(),
                presence: PresenceBoard::default(),
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    pub(crate) fn upstream(&self) -> &UpstreamClient {
        &self.inner.upstream
    }

    pub(crate) fn collections(&self) -> &CollectionStore {
        &self.inner.collections
    }

    pub(crate) fn mutations(&self) -> &MutationLocks {
        &self.inner.mutations
    }

    pub(crate) fn presence(&self) -> &PresenceBoard {
        &self.inner.presence
    }
}
