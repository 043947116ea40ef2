//! Keyed conversation store.
//!
//! Every read-modify-write of one conversation goes through [`ConversationStore::lock`],
//! which hands out exclusive access for that key only. Different keys never
//! contend with each other.

use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    dashmap::DashMap,
    talapker_common::ConversationKey,
    tokio::sync::{Mutex, OwnedMutexGuard},
    tracing::debug,
};

use crate::Conversation;

/// Exclusive handle on one conversation. Changes are visible to the next
/// holder as soon as the guard is dropped.
pub type ConversationGuard = Box<dyn DerefMut<Target = Conversation> + Send>;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Snapshot of a conversation; the default conversation when absent.
    async fn get(&self, key: &ConversationKey) -> Conversation;

    /// Replace a conversation wholesale.
    async fn set(&self, key: &ConversationKey, conversation: Conversation);

    /// Drop a conversation. Returns `false` when it did not exist.
    async fn delete(&self, key: &ConversationKey) -> bool;

    /// Exclusive access for the duration of one inbound message.
    async fn lock(&self, key: &ConversationKey) -> ConversationGuard;

    /// Drop conversations untouched for longer than `max_idle` and not
    /// currently locked. Returns how many were dropped.
    async fn evict_idle(&self, max_idle: Duration) -> usize;

    /// Number of live conversations.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Slot {
    conversation: Conversation,
    last_seen: Instant,
    /// Set when the slot was removed from the map; holders of a stale `Arc`
    /// must retry against the map.
    evicted: bool,
}

impl Slot {
    fn new() -> Self {
        Self {
            conversation: Conversation::default(),
            last_seen: Instant::now(),
            evicted: false,
        }
    }
}

struct SlotGuard(OwnedMutexGuard<Slot>);

impl Deref for SlotGuard {
    type Target = Conversation;

    fn deref(&self) -> &Conversation {
        &self.0.conversation
    }
}

impl DerefMut for SlotGuard {
    fn deref_mut(&mut self) -> &mut Conversation {
        &mut self.0.conversation
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.last_seen = Instant::now();
    }
}

/// Process-local store backed by a sharded map of per-key mutexes.
#[derive(Default)]
pub struct InMemoryConversationStore {
    slots: DashMap<ConversationKey, Arc<Mutex<Slot>>>,
}

impl InMemoryConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn lock_slot(&self, key: &ConversationKey) -> OwnedMutexGuard<Slot> {
        loop {
            // Clone the Arc out so the shard lock is released before awaiting.
            let slot = Arc::clone(
                self.slots
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(Slot::new())))
                    .value(),
            );
            let guard = slot.lock_owned().await;
            if !guard.evicted {
                return guard;
            }
        }
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, key: &ConversationKey) -> Conversation {
        let Some(slot) = self.slots.get(key).map(|s| Arc::clone(s.value())) else {
            return Conversation::default();
        };
        let guard = slot.lock().await;
        if guard.evicted {
            Conversation::default()
        } else {
            guard.conversation.clone()
        }
    }

    async fn set(&self, key: &ConversationKey, conversation: Conversation) {
        let mut guard = self.lock_slot(key).await;
        guard.conversation = conversation;
        guard.last_seen = Instant::now();
    }

    async fn delete(&self, key: &ConversationKey) -> bool {
        let Some((_, slot)) = self.slots.remove(key) else {
            return false;
        };
        slot.lock().await.evicted = true;
        true
    }

    async fn lock(&self, key: &ConversationKey) -> ConversationGuard {
        Box::new(SlotGuard(self.lock_slot(key).await))
    }

    async fn evict_idle(&self, max_idle: Duration) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| match slot.try_lock() {
            Ok(mut guard) if guard.last_seen.elapsed() > max_idle => {
                guard.evicted = true;
                false
            },
            // Busy or recently used.
            _ => true,
        });
        let evicted = before.saturating_sub(self.slots.len());
        if evicted > 0 {
            debug!(evicted, remaining = self.slots.len(), "evicted idle conversations");
        }
        evicted
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, talapker_common::Language};

    fn key(k: &str) -> ConversationKey {
        ConversationKey::new(k)
    }

    #[tokio::test]
    async fn get_missing_returns_default_without_creating() {
        let store = InMemoryConversationStore::new();
        assert_eq!(store.get(&key("a")).await, Conversation::default());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn set_then_get() {
        let store = InMemoryConversationStore::new();
        let mut conv = Conversation::default();
        conv.select_language(Language::Kz);
        store.set(&key("a"), conv.clone()).await;

        assert_eq!(store.get(&key("a")).await, conv);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn lock_changes_are_persisted() {
        let store = InMemoryConversationStore::new();
        {
            let mut guard = store.lock(&key("a")).await;
            guard.push_user("hello");
            guard.arm_smalltalk(1);
        }
        let conv = store.get(&key("a")).await;
        assert_eq!(conv.history().len(), 1);
        assert_eq!(conv.smalltalk_window(), 1);
    }

    #[tokio::test]
    async fn delete_removes_and_reports() {
        let store = InMemoryConversationStore::new();
        store.lock(&key("a")).await.push_user("x");

        assert!(store.delete(&key("a")).await);
        assert!(!store.delete(&key("a")).await);
        assert_eq!(store.get(&key("a")).await, Conversation::default());
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let store = InMemoryConversationStore::new();
        store.lock(&key("a")).await.select_language(Language::Kz);
        assert_eq!(store.get(&key("b")).await.language(), Language::Ru);
    }

    #[tokio::test]
    async fn concurrent_updates_on_one_key_are_not_lost() {
        let store = Arc::new(InMemoryConversationStore::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let mut guard = store.lock(&key("shared")).await;
                let window = guard.smalltalk_window();
                tokio::task::yield_now().await;
                guard.arm_smalltalk(window + 1);
                guard.push_user(format!("m{i}"));
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        let conv = store.get(&key("shared")).await;
        assert_eq!(conv.smalltalk_window(), 32);
        assert_eq!(conv.history().len(), crate::HISTORY_LIMIT);
    }

    #[tokio::test]
    async fn lock_blocks_second_holder() {
        let store = Arc::new(InMemoryConversationStore::new());
        let guard = store.lock(&key("a")).await;

        let contender = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store.lock(&key("a")).await.push_user("second");
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(store.get(&key("a")).await.history().len(), 1);
    }

    #[tokio::test]
    async fn evict_idle_skips_recent_and_locked() {
        let store = InMemoryConversationStore::new();
        store.lock(&key("old")).await.push_user("x");
        store.lock(&key("busy")).await.push_user("y");
        tokio::time::sleep(Duration::from_millis(20)).await;

        let busy_guard = store.lock(&key("busy")).await;
        store.lock(&key("fresh")).await.push_user("z");

        let evicted = store.evict_idle(Duration::from_millis(10)).await;
        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 2);
        drop(busy_guard);

        assert_eq!(store.get(&key("old")).await, Conversation::default());
        assert_eq!(store.get(&key("fresh")).await.history().len(), 1);
    }
}
