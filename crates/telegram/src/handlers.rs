use std::sync::Arc;

use {
    async_trait::async_trait,
    talapker_auto_reply::{QueueHandler, ReplyEngine},
    talapker_common::ConversationKey,
    teloxide::types::{ChatId, Message},
    tracing::{debug, error},
};

use crate::outbound::TelegramOutbound;

/// A text message waiting in a conversation queue.
#[derive(Debug, Clone)]
pub struct InboundText {
    pub chat_id: ChatId,
    pub text: String,
}

/// Conversation key for a Telegram chat: `telegram:{chat_id}`.
#[must_use]
pub fn conversation_key(chat_id: ChatId) -> ConversationKey {
    ConversationKey::new(format!("telegram:{}", chat_id.0))
}

/// Plain text messages only; captions, media and service messages are skipped.
#[must_use]
pub fn inbound_from_message(msg: &Message) -> Option<InboundText> {
    let Some(text) = msg.text() else {
        debug!(chat_id = msg.chat.id.0, "ignoring non-text message");
        return None;
    };
    Some(InboundText {
        chat_id: msg.chat.id,
        text: text.to_string(),
    })
}

/// Runs the engine for a queued message and sends the reply.
pub struct TelegramHandler {
    engine: Arc<ReplyEngine>,
    outbound: TelegramOutbound,
}

impl TelegramHandler {
    #[must_use]
    pub fn new(engine: Arc<ReplyEngine>, outbound: TelegramOutbound) -> Self {
        Self { engine, outbound }
    }
}

#[async_trait]
impl QueueHandler<InboundText> for TelegramHandler {
    async fn handle(&self, key: ConversationKey, message: InboundText) {
        let reply = self.engine.handle(&key, &message.text).await;
        if let Err(e) = self.outbound.send_reply(message.chat_id, &reply).await {
            error!(conversation = %key, error = %e, "failed to send telegram reply");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        std::sync::Mutex,
        talapker_auto_reply::{ConversationQueue, EngineSettings},
        talapker_common::Language,
        talapker_routing::{LANGUAGE_PROMPT, texts},
        talapker_service_traits::{self as services, Content, ContentProvider},
        talapker_sessions::{ConversationStore, InMemoryConversationStore},
    };

    use {
        axum::{Json, Router, body::Bytes, extract::State, http::Uri, routing::post},
        serde::{Deserialize, Serialize},
        serde_json::{Value, json},
        tokio::sync::oneshot,
    };

    #[derive(Debug, Clone, Deserialize)]
    struct SendMessageRequest {
        chat_id: i64,
        text: String,
        #[serde(default)]
        reply_markup: Option<Value>,
    }

    #[derive(Debug, Serialize)]
    struct TelegramApiResponse {
        ok: bool,
        result: Value,
    }

    #[derive(Clone, Default)]
    struct MockTelegramApi {
        sent: Arc<Mutex<Vec<SendMessageRequest>>>,
    }

    async fn telegram_api_handler(
        State(state): State<MockTelegramApi>,
        uri: Uri,
        body: Bytes,
    ) -> Json<TelegramApiResponse> {
        let method = uri.path().rsplit('/').next().unwrap_or_default();
        if method == "SendMessage"
            && let Ok(req) = serde_json::from_slice::<SendMessageRequest>(&body)
        {
            state.sent.lock().expect("lock sent").push(req);
        }
        Json(TelegramApiResponse {
            ok: true,
            result: json!({
                "message_id": 1,
                "date": 0,
                "chat": { "id": 42, "type": "private" },
                "text": "ok"
            }),
        })
    }

    struct NoContent;

    #[async_trait]
    impl ContentProvider for NoContent {
        async fn get(&self, topic: &str, language: Language) -> services::Result<Content> {
            Err(services::Error::not_found(topic, language))
        }
    }

    async fn spawn_mock_api() -> (MockTelegramApi, teloxide::Bot, oneshot::Sender<()>) {
        let api = MockTelegramApi::default();
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(api.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        let bot = teloxide::Bot::new("test-token").set_api_url(api_url);
        (api, bot, shutdown_tx)
    }

    fn engine(store: Arc<InMemoryConversationStore>) -> Arc<ReplyEngine> {
        Arc::new(
            ReplyEngine::new(
                store as Arc<dyn ConversationStore>,
                Arc::new(NoContent),
                None,
                EngineSettings::default(),
            )
            .expect("engine"),
        )
    }

    fn text_message(chat_id: i64, text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 1,
            "date": 1,
            "chat": { "id": chat_id, "type": "private", "first_name": "Aruzhan" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Aruzhan" },
            "text": text
        }))
        .expect("deserialize text message")
    }

    fn keyboard_rows(markup: &Value) -> Vec<Vec<String>> {
        markup["keyboard"]
            .as_array()
            .expect("keyboard rows")
            .iter()
            .map(|row| {
                row.as_array()
                    .expect("row")
                    .iter()
                    .map(|b| b["text"].as_str().expect("button text").to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn conversation_key_is_namespaced() {
        assert_eq!(conversation_key(ChatId(-100_42)).as_str(), "telegram:-10042");
    }

    #[test]
    fn only_text_messages_are_inbound() {
        let inbound = inbound_from_message(&text_message(42, "привет")).expect("text");
        assert_eq!(inbound.chat_id, ChatId(42));
        assert_eq!(inbound.text, "привет");

        let photo: Message = serde_json::from_value(json!({
            "message_id": 2,
            "date": 1,
            "chat": { "id": 42, "type": "private", "first_name": "Aruzhan" },
            "from": { "id": 1001, "is_bot": false, "first_name": "Aruzhan" },
            "photo": [{ "file_id": "f", "file_unique_id": "u", "width": 1, "height": 1 }],
            "caption": "🎁 Гранты"
        }))
        .expect("deserialize photo message");
        assert!(inbound_from_message(&photo).is_none());
    }

    #[tokio::test]
    async fn start_then_language_sends_prompts_with_keyboards() {
        let (api, bot, shutdown) = spawn_mock_api().await;
        let store = Arc::new(InMemoryConversationStore::new());
        let handler = TelegramHandler::new(engine(Arc::clone(&store)), TelegramOutbound::new(bot));

        let mut queue: ConversationQueue<InboundText> = ConversationQueue::new(Arc::new(handler));
        for text in ["/start", "🇰🇿 Қазақша", "🎁 Гранттар"] {
            let inbound = inbound_from_message(&text_message(42, text)).expect("text");
            queue.dispatch(conversation_key(inbound.chat_id), inbound);
        }
        queue.shutdown().await;

        let sent = api.sent.lock().expect("lock sent").clone();
        assert_eq!(sent.len(), 3, "{sent:?}");
        assert!(sent.iter().all(|m| m.chat_id == 42));

        assert_eq!(sent[0].text, LANGUAGE_PROMPT);
        let markup = sent[0].reply_markup.as_ref().expect("language keyboard");
        assert_eq!(keyboard_rows(markup), [["🇰🇿 Қазақша", "🇷🇺 Русский"]]);
        assert_eq!(markup["resize_keyboard"], json!(true));

        assert_eq!(sent[1].text, texts(Language::Kz).menu_prompt);
        let markup = sent[1].reply_markup.as_ref().expect("menu keyboard");
        assert_eq!(keyboard_rows(markup).len(), 4);

        assert_eq!(sent[2].text, texts(Language::Kz).content_unavailable);
        assert!(sent[2].reply_markup.is_none());

        let conv = store.get(&conversation_key(ChatId(42))).await;
        assert_eq!(conv.selected_language(), Some(Language::Kz));

        let _ = shutdown.send(());
    }
}
