use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Ids with a mutation currently in flight. A key is held from the moment a
/// handler accepts the mutation until its guard drops.
#[derive(Debug, Clone, Default)]
pub(crate) struct MutationLocks {
    pending: Arc<Mutex<HashSet<String>>>,
}

impl MutationLocks {
    pub(crate) fn try_acquire(&self, key: impl Into<String>) -> Option<MutationGuard> {
        let key = key.into();
        if !self.pending_set().insert(key.clone()) {
            return None;
        }
        Some(MutationGuard { pending: Arc::clone(&self.pending), key })
    }

    fn pending_set(&self) -> MutexGuard<'_, HashSet<String>> {
        lock_pending(&self.pending)
    }
}

fn lock_pending(pending: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    // insert/remove only, so a poisoned set is still consistent
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub(crate) struct MutationGuard {
    pending: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        lock_pending(&self.pending).remove(&self.key);
    }
}
