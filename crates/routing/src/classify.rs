//! Local text heuristics: casual-chat detection and classifier normalization.
//!
//! Casual chat is recognised when the message is
//! * nothing but a greeting (`привет!`, `сәлем`, `hello`), or
//! * contains a "how are you" phrase, or
//! * starts with a greeting and addresses the bot as a buddy (`hey bro ...`).
//!
//! A bare buddy word (`бро`) is not casual chat on its own. Leading fillers
//! (`ну привет`, `слушай, привет`) are dropped before matching. All four
//! pattern families live in one [`RegexSet`], so a message is scanned once.

use {
    regex::{Regex, RegexSet},
    tracing::trace,
};

use crate::Result;

const GREETING: &str = r"привет(ик|ствую)?|здравствуй(те)?|здорово|хай|салам|салют|доброе\s+утро|добрый\s+(день|вечер)|сәлем(етсіз\s+бе)?|салем|ассалаумағалейкум|қайырлы\s+(таң|күн|кеш)|hi|hello|hey|hiya|yo|good\s+(morning|afternoon|evening)";

const HOW_ARE_YOU: &str = r"как\s+(ты|дела|делишки|жизнь|поживаешь|поживаете|настроение)|что\s+нового|ты\s+тут|қалайсыз|қалайсың|хал(ың)?\s+қалай|жағдай(ың)?\s+қалай|не\s+жаңалық|how\s+are\s+(you|u|things)|how['’]?s\s+it\s+going|how\s+is\s+it\s+going|what['’]?s\s+(up|new)|whats\s+up";

const BUDDY: &str = r"бро|братан|брат|дружище|друг|чувак|досым|дос|бауырым|bro|bruh|dude|buddy|mate";

/// Discourse fillers dropped before remote classification.
const FILLERS: &[&str] = &[
    "ну", "типа", "короче", "вообще", "вообщем", "смотри", "слушай", "эй", "ей", "чё", "че",
    "ёу", "ээ", "аа", "енді", "әлгі", "жаңағы", "um", "uh", "erm", "hmm",
];

const GREETING_ONLY: usize = 0;
const HOW_ARE_YOU_ANY: usize = 1;
const BUDDY_ANY: usize = 2;
const GREETING_LEAD: usize = 3;

/// Compiled heuristics. Build once and share.
#[derive(Debug)]
pub struct TextClassifier {
    casual: RegexSet,
    fillers: Regex,
    spaces: Regex,
}

impl TextClassifier {
    pub fn new() -> Result<Self> {
        let casual = RegexSet::new([
            format!(r"(?i)^\W*({GREETING})\W*$"),
            format!(r"(?i)\b({HOW_ARE_YOU})\b"),
            format!(r"(?i)\b({BUDDY})\b"),
            format!(r"(?i)^\W*({GREETING})\b"),
        ])?;
        let alternation = FILLERS
            .iter()
            .map(|f| regex::escape(f))
            .collect::<Vec<_>>()
            .join("|");
        let fillers = Regex::new(&format!(r"(?i)\b({alternation})\b"))?;
        let spaces = Regex::new(r"\s+")?;
        Ok(Self {
            casual,
            fillers,
            spaces,
        })
    }

    /// Whether `text` reads as casual chat rather than an admissions question.
    #[must_use]
    pub fn is_casual_chat(&self, text: &str) -> bool {
        let m = self.casual.matches(&self.normalize_for_classification(text));
        let casual = m.matched(GREETING_ONLY)
            || m.matched(HOW_ARE_YOU_ANY)
            || (m.matched(BUDDY_ANY) && (m.matched(GREETING_LEAD) || m.matched(HOW_ARE_YOU_ANY)));
        trace!(casual, "casual-chat heuristic");
        casual
    }

    /// Lower-case, drop fillers, collapse whitespace.
    #[must_use]
    pub fn normalize_for_classification(&self, text: &str) -> String {
        let lowered = text.trim().to_lowercase();
        let stripped = self.fillers.replace_all(&lowered, " ");
        self.spaces.replace_all(&stripped, " ").trim().to_string()
    }
}
