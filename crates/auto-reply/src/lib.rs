//! Inbound message processing: the reply pipeline, output sanitizing and
//! per-conversation ordering.
//!
//! Flow: transport message → [`queue::ConversationQueue`] (one FIFO per
//! conversation) → [`engine::ReplyEngine::handle`] → [`reply::Reply`] → transport.

pub mod engine;
pub mod error;
pub mod queue;
pub mod reply;
pub mod sanitize;

pub use {
    engine::{EngineSettings, ReplyEngine},
    error::{Error, Result},
    queue::{ConversationQueue, QueueHandler},
    reply::{Reply, Stage},
    sanitize::Sanitizer,
};
