use {std::fmt, talapker_routing::ReplyKeyboard};

/// Pipeline stage that produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Command,
    LanguageSelection,
    Menu,
    /// Sticky window or local heuristic.
    CasualChat,
    /// Remote classifier said smalltalk (or a topic, when topic routing is on).
    Classified,
    Chat,
    Fallback,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::LanguageSelection => "language",
            Self::Menu => "menu",
            Self::CasualChat => "casual_chat",
            Self::Classified => "classified",
            Self::Chat => "chat",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single outbound message produced for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub stage: Stage,
    pub text: String,
    pub keyboard: Option<ReplyKeyboard>,
}

impl Reply {
    #[must_use]
    pub fn new(stage: Stage, text: impl Into<String>) -> Self {
        Self {
            stage,
            text: text.into(),
            keyboard: None,
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: ReplyKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
