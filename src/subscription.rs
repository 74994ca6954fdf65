use std::collections::HashSet;
use std::sync::Mutex;

/// Conversations the UI is currently observing for aggregate changes.
///
/// The lock is only ever held for set membership operations; bulk
/// notification snapshots the ids under the lock and notifies outside it.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    inner: Mutex<HashSet<String>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, conversation_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .insert(conversation_id.to_string());
    }

    pub fn unsubscribe(&self, conversation_id: &str) {
        self.inner.lock().unwrap().remove(conversation_id);
    }

    pub fn is_subscribed(&self, conversation_id: &str) -> bool {
        self.inner.lock().unwrap().contains(conversation_id)
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.inner.lock().unwrap().iter().cloned().collect()
    }
}
