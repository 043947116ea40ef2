use {std::fmt, talapker_common::Language};

/// Content section reachable from the menu. The slug is the content-store key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Programs,
    Documents,
    Grants,
    Dorm,
}

impl Topic {
    pub const ALL: [Self; 4] = [Self::Programs, Self::Documents, Self::Grants, Self::Dorm];

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Programs => "programs",
            Self::Documents => "documents",
            Self::Grants => "grants",
            Self::Dorm => "dorm",
        }
    }

    /// Topic for a content slug, as reported by the remote classifier.
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.slug() == slug)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

struct MenuTable {
    language: Language,
    selector: &'static str,
    items: [(&'static str, Topic); 4],
}

static TABLES: [MenuTable; 2] = [
    MenuTable {
        language: Language::Kz,
        selector: "🇰🇿 Қазақша",
        items: [
            ("🎓 Білім беру бағдарламалары", Topic::Programs),
            ("📑 Құжаттар", Topic::Documents),
            ("🎁 Гранттар", Topic::Grants),
            ("🏠 Жатақхана", Topic::Dorm),
        ],
    },
    MenuTable {
        language: Language::Ru,
        selector: "🇷🇺 Русский",
        items: [
            ("🎓 Образовательные программы", Topic::Programs),
            ("📑 Документы", Topic::Documents),
            ("🎁 Гранты", Topic::Grants),
            ("🏠 Общежитие", Topic::Dorm),
        ],
    },
];

fn table(language: Language) -> &'static MenuTable {
    match language {
        Language::Kz => &TABLES[0],
        Language::Ru => &TABLES[1],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// Name and description as registered with the transport.
    pub const REGISTERED: [(&'static str, &'static str); 2] =
        [("start", "Запустить бота"), ("help", "Помощь")];

    /// Parse an exact slash command, optionally addressed as `/cmd@botname`.
    /// Anything after the command word makes it plain text.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let head = text.trim().strip_prefix('/')?;
        if head.contains(char::is_whitespace) {
            return None;
        }
        let name = head.split_once('@').map_or(head, |(name, _)| name);
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

/// Outcome of exact-match dispatch on an inbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    SelectLanguage(Language),
    Menu(Topic),
    /// Not a fixed label; needs classification.
    FreeText,
}

/// Resolve an inbound text against the command and label tables.
#[must_use]
pub fn resolve(text: &str) -> Route {
    if let Some(cmd) = Command::parse(text) {
        return Route::Command(cmd);
    }
    let text = text.trim();
    if let Some(t) = TABLES.iter().find(|t| t.selector == text) {
        return Route::SelectLanguage(t.language);
    }
    TABLES
        .iter()
        .flat_map(|t| t.items.iter())
        .find(|(label, _)| *label == text)
        .map_or(Route::FreeText, |(_, topic)| Route::Menu(*topic))
}

/// Transport-neutral reply keyboard: rows of button labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<&'static str>>,
}

/// Both language selectors on a single row.
#[must_use]
pub fn language_keyboard() -> ReplyKeyboard {
    ReplyKeyboard {
        rows: vec![TABLES.iter().map(|t| t.selector).collect()],
    }
}

/// One menu item per row, in the given language.
#[must_use]
pub fn menu_keyboard(language: Language) -> ReplyKeyboard {
    ReplyKeyboard {
        rows: table(language)
            .items
            .iter()
            .map(|(label, _)| vec![*label])
            .collect(),
    }
}
