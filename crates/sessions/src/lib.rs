//! Per-conversation dialogue state.
//!
//! A [`Conversation`] holds the selected language, the casual-chat stickiness
//! window and a short rolling history. Conversations live in a keyed
//! [`ConversationStore`]; lookups of unknown keys yield a fresh default
//! conversation, so there is no separate "create" path.

pub mod conversation;
pub mod store;

pub use {
    conversation::{Conversation, HISTORY_LIMIT},
    store::{ConversationGuard, ConversationStore, InMemoryConversationStore},
};
