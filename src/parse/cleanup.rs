//! Text transforms applied to each counter's text, in [`CleanupStep::ORDER`].
//!
//! The order matters: headings are recognized only after pipes became newlines,
//! and marker links are built only after parentheses were stripped.
use std::{borrow::Cow, sync::OnceLock};

use regex::{Captures, Regex};

pub const MENU_LABEL: &str = "- Menü";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CleanupStep {
    PipesToNewlines,
    StripParentheses,
    DropBlankLines,
    CollapseSpaces,
    LinkDietaryTags,
    DropMenuLabel,
    AusgabeHeading,
}

/// What the steps need to know besides the text.
#[derive(Clone, Copy, Debug)]
pub struct CleanupOptions<'c> {
    pub icon_base_url: &'c str,
    pub markdown_images: bool,
}

impl CleanupStep {
    pub const ORDER: [Self; 7] = [
        Self::PipesToNewlines,
        Self::StripParentheses,
        Self::DropBlankLines,
        Self::CollapseSpaces,
        Self::LinkDietaryTags,
        Self::DropMenuLabel,
        Self::AusgabeHeading,
    ];

    pub fn apply<'a>(self, text: &'a str, options: &CleanupOptions<'_>) -> Cow<'a, str> {
        match self {
            Self::PipesToNewlines => pipes_to_newlines(text),
            Self::StripParentheses => strip_parentheses(text),
            Self::DropBlankLines => drop_blank_lines(text),
            Self::CollapseSpaces => collapse_spaces(text),
            Self::LinkDietaryTags if options.markdown_images => {
                link_dietary_tags(text, options.icon_base_url)
            }
            Self::LinkDietaryTags => Cow::Borrowed(text),
            Self::DropMenuLabel => drop_menu_label(text),
            Self::AusgabeHeading => ausgabe_heading(text),
        }
    }
}

/// Runs every step of [`CleanupStep::ORDER`] over one counter's text.
pub fn clean_counter(text: &str, options: &CleanupOptions<'_>) -> String {
    CleanupStep::ORDER
        .into_iter()
        .fold(text.to_owned(), |acc, step| {
            step.apply(&acc, options).into_owned()
        })
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("regex should be valid"))
}

pub fn pipes_to_newlines(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\s*\|\s*").replace_all(s, "\n")
}

/// Allergen and additive footnotes, e.g. `Schnitzel (Schwein, Ei)`.
pub fn strip_parentheses(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\(.+?\)").replace_all(s, "")
}

// Best effort only: a blank line made of spaces at the very end of the text stays.
pub fn drop_blank_lines(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"(?m)^\s*[\r\n]").replace_all(s, "")
}

/// Collapses runs of spaces only; tabs and newlines are kept.
pub fn collapse_spaces(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r" {2,}").replace_all(s, " ")
}

/// `[Veggi]` becomes `![Veggi](<base>Veggi.png)`, likewise any `[Veg…]` marker.
pub fn link_dietary_tags<'a>(s: &'a str, icon_base_url: &str) -> Cow<'a, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\[(Veg[^\]\n]*)\]").replace_all(s, |caps: &Captures| {
        let tag = &caps[1];
        format!("![{tag}]({icon_base_url}{tag}.png)")
    })
}

pub fn drop_menu_label(s: &str) -> Cow<'_, str> {
    if s.contains(MENU_LABEL) {
        Cow::Owned(s.replace(MENU_LABEL, ""))
    } else {
        Cow::Borrowed(s)
    }
}

/// A leading `Ausgabe N` becomes a `## Ausgabe N` heading with the rest of its line below it.
pub fn ausgabe_heading(s: &str) -> Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\A\s+(Ausgabe\s\d)\s+(.*)").replace(s, "\n## ${1}\n${2}")
}
