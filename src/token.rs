//! Placeholder grammar - `%identifier%` or `%identifier_arg1_arg2%`
//!
//! - token: everything between the two `%`
//! - identifier: token prefix up to the first `_` (registry key)
//! - arguments: everything after the first `_`, opaque to the engine

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

/// Pre-compiled regex for `%token%` (no nested `%`, balanced delimiters)
pub static PLACEHOLDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%([^%]+)%").unwrap());

/// Iterate over every token in `text`, in order of appearance
pub fn find_tokens(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
}

/// Registry key of a token: `coins_total` -> `coins`
#[inline]
pub fn identifier(token: &str) -> &str {
    token.split_once('_').map_or(token, |(id, _)| id)
}

/// Argument part of a token: `coins_total` -> `Some("total")`
#[inline]
pub fn arguments(token: &str) -> Option<&str> {
    token.split_once('_').map(|(_, args)| args)
}

/// Check if `text` contains at least one well-formed token
#[inline]
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}

/// `coins_total` -> `%coins_total%`
pub fn wrap(token: &str) -> String {
    format!("%{}%", token)
}

/// Replace every `%token%` found in `values`, in one pass.
///
/// Tokens missing from `values` stay verbatim. Replacement text is never
/// re-scanned, so a value that itself looks like `%x%` is inserted as-is.
/// Returns `Cow::Borrowed` when `text` has no delimiter at all.
pub fn substitute<'a, V>(text: &'a str, values: &FxHashMap<String, V>) -> Cow<'a, str>
where
    V: AsRef<str>,
{
    if values.is_empty() || !text.contains('%') {
        return Cow::Borrowed(text);
    }

    PLACEHOLDER_RE.replace_all(text, |cap: &Captures<'_>| match values.get(&cap[1]) {
        Some(value) => value.as_ref().to_string(),
        None => cap[0].to_string(),
    })
}
