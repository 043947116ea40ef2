//! The reply pipeline.
//!
//! Stages, first reply wins:
//! 1. `/start` resets the conversation, `/help` answers statically
//! 2. Language selector labels
//! 3. Menu labels → content store
//! 4. Sticky window or local casual-chat heuristic → generator
//! 5. Remote classifier says smalltalk → generator (same as 4)
//! 6. Generic chat through the generator
//! 7. "Didn't understand" with the section menu
//!
//! Service failures never escape: each maps to a fixed reply.

use std::sync::Arc;

use {
    talapker_common::{ConversationKey, Language},
    talapker_config::RoutingConfig,
    talapker_routing::{
        Command, HELP, LANGUAGE_PROMPT, Route, TextClassifier, Topic, language_keyboard,
        menu_keyboard, resolve, texts,
    },
    talapker_service_traits::{Advisor, ContentProvider, Generation},
    talapker_sessions::{Conversation, ConversationStore},
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    reply::{Reply, Stage},
    sanitize::Sanitizer,
};

/// Tunables taken from `[routing]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub confidence_threshold: f64,
    pub smalltalk_window: u32,
    pub route_classified_topics: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&RoutingConfig::default())
    }
}

impl From<&RoutingConfig> for EngineSettings {
    fn from(config: &RoutingConfig) -> Self {
        Self {
            confidence_threshold: config.confidence_threshold,
            smalltalk_window: config.smalltalk_window,
            route_classified_topics: config.route_classified_topics,
        }
    }
}

pub struct ReplyEngine {
    store: Arc<dyn ConversationStore>,
    content: Arc<dyn ContentProvider>,
    advisor: Option<Arc<dyn Advisor>>,
    classifier: TextClassifier,
    sanitizer: Sanitizer,
    settings: EngineSettings,
}

impl ReplyEngine {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        content: Arc<dyn ContentProvider>,
        advisor: Option<Arc<dyn Advisor>>,
        settings: EngineSettings,
    ) -> Result<Self> {
        Ok(Self {
            store,
            content,
            advisor,
            classifier: TextClassifier::new()?,
            sanitizer: Sanitizer::new()?,
            settings,
        })
    }

    /// Produce the one reply for `text`, updating the conversation.
    pub async fn handle(&self, key: &ConversationKey, text: &str) -> Reply {
        let mut conversation = self.store.lock(key).await;

        let reply = match resolve(text) {
            Route::Command(Command::Start) => {
                conversation.reset();
                Reply::new(Stage::Command, LANGUAGE_PROMPT).with_keyboard(language_keyboard())
            },
            Route::Command(Command::Help) => Reply::new(Stage::Command, HELP),
            Route::SelectLanguage(language) => {
                conversation.select_language(language);
                Reply::new(Stage::LanguageSelection, texts(language).menu_prompt)
                    .with_keyboard(menu_keyboard(language))
            },
            Route::Menu(topic) => {
                Reply::new(Stage::Menu, self.content_text(topic, conversation.language()).await)
            },
            Route::FreeText => self.converse(key, &mut conversation, text).await,
        };

        info!(
            conversation = %key,
            stage = %reply.stage,
            language = %conversation.language(),
            history = conversation.history().len(),
            "reply ready"
        );
        reply
    }

    /// Stages 4–7.
    async fn converse(
        &self,
        key: &ConversationKey,
        conversation: &mut Conversation,
        text: &str,
    ) -> Reply {
        let language = conversation.language();
        let Some(advisor) = self.advisor.as_deref() else {
            debug!(conversation = %key, "no advisor configured");
            return not_understood(language);
        };

        let sticky = conversation.consume_smalltalk();
        if sticky || self.classifier.is_casual_chat(text) {
            debug!(conversation = %key, sticky, "casual chat");
            return self
                .casual_chat(advisor, conversation, text, Stage::CasualChat)
                .await;
        }

        let normalized = self.classifier.normalize_for_classification(text);
        if !normalized.is_empty() {
            match advisor.classify(&normalized).await {
                Ok(c) if c.confidence >= self.settings.confidence_threshold => {
                    if c.is_smalltalk() {
                        return self
                            .casual_chat(advisor, conversation, text, Stage::Classified)
                            .await;
                    }
                    if self.settings.route_classified_topics
                        && let Some(topic) = Topic::from_slug(&c.category)
                    {
                        debug!(conversation = %key, %topic, "classified as topic");
                        return Reply::new(Stage::Classified, self.content_text(topic, language).await);
                    }
                    debug!(conversation = %key, category = %c.category, "classification not routed");
                },
                Ok(c) => {
                    debug!(conversation = %key, category = %c.category, confidence = c.confidence, "low confidence");
                },
                Err(e) => warn!(conversation = %key, error = %e, "classification failed"),
            }
        }

        conversation.push_user(text);
        match advisor
            .generate(text, language, &conversation.history_snapshot())
            .await
        {
            Ok(generation) => {
                let answer = self.answer_text(&generation, language);
                conversation.push_assistant(answer.clone());
                Reply::new(Stage::Chat, answer)
            },
            Err(e) => {
                warn!(conversation = %key, error = %e, "generation failed");
                not_understood(language)
            },
        }
    }

    /// Generate with the history, fall back to the canned line on failure,
    /// and keep the conversation in casual-chat mode.
    async fn casual_chat(
        &self,
        advisor: &dyn Advisor,
        conversation: &mut Conversation,
        text: &str,
        stage: Stage,
    ) -> Reply {
        let language = conversation.language();
        conversation.push_user(text);

        let answer = match advisor
            .generate(text, language, &conversation.history_snapshot())
            .await
        {
            Ok(generation) => self.answer_text(&generation, language),
            Err(e) => {
                warn!(error = %e, "casual generation failed, using canned reply");
                texts(language).casual_fallback.to_string()
            },
        };

        conversation.push_assistant(answer.clone());
        conversation.arm_smalltalk(self.settings.smalltalk_window);
        Reply::new(stage, answer)
    }

    fn answer_text(&self, generation: &Generation, language: Language) -> String {
        let raw = generation
            .preferred()
            .unwrap_or(texts(language).empty_answer);
        self.sanitizer.sanitize(raw, language)
    }

    async fn content_text(&self, topic: Topic, language: Language) -> String {
        match self.content.get(topic.slug(), language).await {
            Ok(content) => content.render(),
            Err(e) => {
                warn!(%topic, %language, error = %e, "content lookup failed");
                texts(language).content_unavailable.to_string()
            },
        }
    }
}

fn not_understood(language: Language) -> Reply {
    Reply::new(Stage::Fallback, texts(language).not_understood).with_keyboard(menu_keyboard(language))
}
