//! Best-effort JSON extraction from free-form model output.
//!
//! Models asked for "strictly JSON" still wrap their answer in code fences
//! or surround it with prose often enough that the raw response cannot be
//! fed to a parser directly. [`extract_json`] narrows the text without ever
//! parsing it: fenced regions are replaced by their inner content, then the
//! substring from the first `{` to the last `}` is taken. When no brace
//! pair exists the de-fenced text is returned unchanged, leaving the caller
//! to discover the problem at parse time.

use once_cell::sync::Lazy;
use regex::Regex;

// Matches ```lang\n ... ``` as well as bare ``` ... ``` fences.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:[A-Za-z0-9_+-]*\n)?([\s\S]*?)```").unwrap());

/// Narrow arbitrary text down to its most plausible JSON object.
///
/// Tolerant by contract: the output is not guaranteed to be valid JSON,
/// only a tighter candidate for parsing.
pub fn extract_json(text: &str) -> String {
    let defenced = FENCE_RE.replace_all(text, "$1");
    let candidate: &str = defenced.as_ref();
    match (candidate.find('{'), candidate.rfind('}')) {
        (Some(first), Some(last)) if last > first => candidate[first..=last].to_string(),
        _ => defenced.into_owned(),
    }
}
