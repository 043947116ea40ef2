use {
    std::time::Duration,
    talapker_auto_reply::Reply,
    talapker_routing::ReplyKeyboard,
    teloxide::{
        RequestError,
        payloads::SendMessageSetters,
        prelude::*,
        types::{ChatId, KeyboardButton, KeyboardMarkup},
    },
    tracing::{debug, warn},
};

use crate::Result;

const TELEGRAM_RETRY_AFTER_MAX_RETRIES: usize = 4;

/// Sends engine replies to Telegram chats.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send one reply, honouring Telegram's flood-control `retry_after`.
    pub async fn send_reply(&self, chat_id: ChatId, reply: &Reply) -> Result<()> {
        let mut retries = 0usize;

        loop {
            let mut request = self.bot.send_message(chat_id, &reply.text);
            if let Some(keyboard) = &reply.keyboard {
                request = request.reply_markup(keyboard_markup(keyboard));
            }

            match request.await {
                Ok(_) => {
                    debug!(chat_id = chat_id.0, stage = %reply.stage, "reply sent");
                    return Ok(());
                },
                Err(err) => {
                    let Some(wait) = retry_after_duration(&err) else {
                        return Err(err.into());
                    };
                    if retries >= TELEGRAM_RETRY_AFTER_MAX_RETRIES {
                        warn!(
                            chat_id = chat_id.0,
                            retries,
                            retry_after_secs = wait.as_secs(),
                            "telegram rate limit persisted after retries"
                        );
                        return Err(err.into());
                    }
                    retries += 1;
                    warn!(
                        chat_id = chat_id.0,
                        retries,
                        retry_after_secs = wait.as_secs(),
                        "telegram rate limited, waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                },
            }
        }
    }
}

/// Resized reply keyboard with one Telegram button per label.
#[must_use]
pub fn keyboard_markup(keyboard: &ReplyKeyboard) -> KeyboardMarkup {
    KeyboardMarkup::new(
        keyboard
            .rows
            .iter()
            .map(|row| row.iter().map(|label| KeyboardButton::new(*label))),
    )
    .resize_keyboard()
}

fn retry_after_duration(error: &RequestError) -> Option<Duration> {
    match error {
        RequestError::RetryAfter(wait) => Some(wait.duration()),
        _ => None,
    }
}
