//! Message classification tables for the admissions bot.
//!
//! Exact-match dispatch (precedence):
//! 1. Commands (`/start`, `/help`, optional `@botname` suffix)
//! 2. Language selector labels
//! 3. Section menu labels (either language)
//! 4. Free text, left to the heuristic classifier and the advisor
//!
//! Every user-visible string lives in per-language tables in [`texts`] and
//! [`menu`], so the two languages cannot drift apart.

pub mod classify;
pub mod error;
pub mod menu;
pub mod texts;

pub use {
    classify::TextClassifier,
    error::{Error, Result},
    menu::{Command, ReplyKeyboard, Route, Topic, language_keyboard, menu_keyboard, resolve},
    texts::{HELP, LANGUAGE_PROMPT, Texts, texts},
};
