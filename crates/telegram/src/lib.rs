//! Telegram transport for the admissions bot.
//!
//! Long-polls `getUpdates` with teloxide, funnels text messages through the
//! per-conversation queue into the reply engine, and sends each reply back
//! with its reply keyboard.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;

pub use {
    bot::{PollingHandle, start_polling},
    error::{Error, Result},
    handlers::{InboundText, TelegramHandler, conversation_key},
    outbound::TelegramOutbound,
};
