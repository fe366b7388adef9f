use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;

/// Collapses every whitespace run (newlines and `&nbsp;` included) into one space.
pub fn normalize_whitespace<'a>(s: &'a str) -> Cow<'a, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\s+").expect("regex should be valid"));
    let out: Cow<'a, str> = Regex::replace_all(re, s, " ");
    out
}
