use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    talapker_auto_reply::{ConversationQueue, ReplyEngine},
    talapker_config::TelegramConfig,
    talapker_routing::Command,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    handlers::{self, InboundText, TelegramHandler, conversation_key},
    outbound::TelegramOutbound,
};

/// Extra time the HTTP client waits beyond the long-poll timeout.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// A running polling loop.
pub struct PollingHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollingHandle {
    /// Token that stops the loop when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel polling and wait for queued messages to be answered.
    pub async fn stop(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Wait for the loop to end on its own (e.g. on a polling conflict).
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "telegram polling task failed");
        }
    }
}

/// Connect the bot and spawn the long-polling loop.
pub async fn start_polling(config: &TelegramConfig, engine: Arc<ReplyEngine>) -> Result<PollingHandle> {
    let poll_timeout = config.poll_timeout_secs;
    // The HTTP client must outlive the long-poll or it aborts every request.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(poll_timeout)) + CLIENT_TIMEOUT_MARGIN)
        .build()?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    let me = bot.get_me().await?;
    bot.delete_webhook().send().await?;

    let commands: Vec<_> = Command::REGISTERED
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }

    info!(username = ?me.username, "telegram bot connected (webhook cleared)");

    let cancel = CancellationToken::new();
    let handler = Arc::new(TelegramHandler::new(engine, TelegramOutbound::new(bot.clone())));
    let queue: ConversationQueue<InboundText> = ConversationQueue::new(handler);
    let task = tokio::spawn(poll_loop(bot, poll_timeout, queue, cancel.clone()));

    Ok(PollingHandle { cancel, task })
}

async fn poll_loop(
    bot: Bot,
    poll_timeout: u32,
    mut queue: ConversationQueue<InboundText>,
    cancel: CancellationToken,
) {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = bot
                .get_updates()
                .offset(offset)
                .timeout(poll_timeout)
                .allowed_updates(vec![AllowedUpdate::Message])
                .send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            if let Some(inbound) = handlers::inbound_from_message(&msg) {
                                let key = conversation_key(inbound.chat_id);
                                debug!(conversation = %key, "queueing telegram message");
                                queue.dispatch(key, inbound);
                            }
                        },
                        other => debug!("ignoring non-message update: {other:?}"),
                    }
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling stopped: another instance is already running with this token");
                cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(ERROR_BACKOFF) => {},
                }
            },
        }
    }

    info!(active = queue.active(), "telegram polling stopped, draining conversations");
    queue.shutdown().await;
}
