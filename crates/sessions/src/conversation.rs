use std::collections::VecDeque;

use talapker_common::{Language, Turn};

/// Maximum number of turns kept in a conversation history.
pub const HISTORY_LIMIT: usize = 8;

/// Dialogue state of a single conversation.
///
/// Fields are private so the history bound and the reset rules cannot be
/// bypassed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    language: Option<Language>,
    smalltalk_window: u32,
    history: VecDeque<Turn>,
}

impl Conversation {
    /// Effective reply language (the default when none was selected).
    #[must_use]
    pub fn language(&self) -> Language {
        self.language.unwrap_or_default()
    }

    /// Language explicitly chosen by the user, if any.
    #[must_use]
    pub fn selected_language(&self) -> Option<Language> {
        self.language
    }

    /// Switch language. Starts a fresh dialogue in the new language.
    pub fn select_language(&mut self, language: Language) {
        self.language = Some(language);
        self.smalltalk_window = 0;
        self.history.clear();
    }

    /// Forget everything, as for a brand-new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn smalltalk_window(&self) -> u32 {
        self.smalltalk_window
    }

    /// Consult the casual-chat window, consuming one unit when it is open.
    pub fn consume_smalltalk(&mut self) -> bool {
        if self.smalltalk_window == 0 {
            return false;
        }
        self.smalltalk_window -= 1;
        true
    }

    /// Keep the next `turns` messages in casual-chat mode.
    pub fn arm_smalltalk(&mut self, turns: u32) {
        self.smalltalk_window = turns;
    }

    /// Append a turn, dropping the oldest ones past [`HISTORY_LIMIT`].
    pub fn push(&mut self, turn: Turn) {
        self.history.push_back(turn);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Turn::user(text));
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(Turn::assistant(text));
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = &Turn> {
        self.history.iter()
    }

    /// Owned copy of the history, oldest first.
    #[must_use]
    pub fn history_snapshot(&self) -> Vec<Turn> {
        self.history.iter().cloned().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, talapker_common::Role};

    #[test]
    fn fresh_conversation_uses_default_language() {
        let conv = Conversation::default();
        assert_eq!(conv.language(), Language::Ru);
        assert_eq!(conv.selected_language(), None);
        assert_eq!(conv.smalltalk_window(), 0);
        assert_eq!(conv.history().len(), 0);
    }

    #[test]
    fn history_keeps_most_recent_turns_in_order() {
        let mut conv = Conversation::default();
        for i in 0..20 {
            conv.push_user(format!("u{i}"));
            assert!(conv.history().len() <= HISTORY_LIMIT);
        }
        let texts: Vec<_> = conv.history().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["u12", "u13", "u14", "u15", "u16", "u17", "u18", "u19"]);
    }

    #[test]
    fn window_is_consumed_one_unit_per_check() {
        let mut conv = Conversation::default();
        assert!(!conv.consume_smalltalk());

        conv.arm_smalltalk(2);
        assert!(conv.consume_smalltalk());
        assert!(conv.consume_smalltalk());
        assert!(!conv.consume_smalltalk());
        assert_eq!(conv.smalltalk_window(), 0);
    }

    #[test]
    fn language_selection_clears_window_and_history() {
        let mut conv = Conversation::default();
        conv.arm_smalltalk(1);
        conv.push_user("hi");
        conv.push_assistant("hello");

        conv.select_language(Language::Kz);

        assert_eq!(conv.selected_language(), Some(Language::Kz));
        assert_eq!(conv.smalltalk_window(), 0);
        assert_eq!(conv.history().len(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut conv = Conversation::default();
        conv.select_language(Language::Kz);
        conv.arm_smalltalk(1);
        conv.push_assistant("x");

        conv.reset();

        assert_eq!(conv, Conversation::default());
    }

    #[test]
    fn snapshot_preserves_roles() {
        let mut conv = Conversation::default();
        conv.push_user("q");
        conv.push_assistant("a");
        let roles: Vec<_> = conv.history_snapshot().into_iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant]);
    }
}
