use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::config::{Building, DisplayType};
use crate::error::{Error, Result};

/// Keyword fragments joined into one case-insensitive pattern. Built once, never changed.
#[derive(Debug, Clone)]
pub struct TriggerSet {
    fragments: Vec<String>,
    pattern: Regex,
}

impl TriggerSet {
    /// Fragments are regex pieces, e.g. `f[o]{2,}d`.
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        if fragments.is_empty() {
            return Err(Error::config_error("a trigger set needs at least one fragment"));
        }
        let alternation = fragments
            .iter()
            .map(|f| format!("(?:{f})"))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&alternation)
            .case_insensitive(true)
            .build()?;
        Ok(Self { fragments, pattern })
    }

    pub fn matches(&self, message: &str) -> bool {
        self.pattern.is_match(message)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

/// Which plan a triggering message asks for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MenuRequest {
    pub building: Building,
    pub display_type: DisplayType,
}

impl MenuRequest {
    /// Request words count only as whole words, so "weekend" stays a plain trigger.
    pub fn from_message(message: &str) -> Self {
        static MENSARIA: OnceLock<Regex> = OnceLock::new();
        static WEEK: OnceLock<Regex> = OnceLock::new();
        static NEXT: OnceLock<Regex> = OnceLock::new();

        let building = if word(&MENSARIA, r"\bmensaria\b").is_match(message) {
            Building::Mensaria
        } else {
            Building::Mensa
        };
        let display_type = if !word(&WEEK, r"\b(?:woche|week)\b").is_match(message) {
            DisplayType::Today
        } else if word(&NEXT, r"\b(?:nächste|next)\b").is_match(message) {
            DisplayType::NextWeek
        } else {
            DisplayType::Week
        };
        Self {
            building,
            display_type,
        }
    }
}

fn word(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("request pattern should be valid")
    })
}
