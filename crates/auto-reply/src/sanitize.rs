use {regex::Regex, talapker_common::Language, talapker_routing::texts};

use crate::Result;

/// Chat-template artifacts the generator sometimes leaks into its output.
const LEAKED_TOKENS: &[&str] = &[
    "<|im_start|>assistant",
    "<|im_start|>",
    "<|im_end|>",
    "<|endoftext|>",
    "<|eot_id|>",
    "<think>",
    "</think>",
    "[INST]",
    "[/INST]",
    "<s>",
    "</s>",
    "### Assistant:",
    "### Response:",
];

const BANNED: &str = r"(?i)\b(ху[йяеёию]\w*|пизд\w*|[её]ба\w*|еб[ау]ть\w*|заеб\w*|выеб\w*|бля\w*|сук[аи]|муда[кч]\w*|пидор\w*|шлюх\w*|порн\w*|секс\w*|сіг(ейін|ем|у)\w*|қотақ\w*|амыңды|fuck\w*|shit\w*|bitch\w*|cunt\w*|asshole\w*|dick|porn\w*|nude\w*|sex|xxx)\b";

/// Cleans generated answers before they reach the user.
#[derive(Debug)]
pub struct Sanitizer {
    banned: Regex,
}

impl Sanitizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            banned: Regex::new(BANNED)?,
        })
    }

    /// Strip leaked tokens until none remain, then replace blank or banned
    /// text with the language's redirect sentence. Never returns an empty
    /// string, and `sanitize(sanitize(x)) == sanitize(x)`.
    #[must_use]
    pub fn sanitize(&self, text: &str, language: Language) -> String {
        let mut out = text.to_string();
        loop {
            let before = out.len();
            for token in LEAKED_TOKENS {
                out = out.replace(token, "");
            }
            if out.len() == before {
                break;
            }
        }

        let out = out.trim();
        if out.is_empty() || self.banned.is_match(out) {
            return texts(language).redirect.to_string();
        }
        out.to_string()
    }
}
