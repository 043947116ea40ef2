//! Shared types, error definitions, and utilities used across all talapker crates.

pub mod error;
pub mod types;

pub use {
    error::{Error, FromMessage, Result},
    types::{ConversationKey, Language, Role, Turn},
};
