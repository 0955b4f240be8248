//! Named-section lookup over an edition payload.
//!
//! Recognized names (matched case-insensitively): `overview`, `magic`,
//! `horoscope`, and `news<N>` with a 1-based index into the news list.
//! `None` is the "not found" outcome, surfaced as a 404 by the HTTP layer.

use serde_json::{Value, json};

use crate::models::EditionPayload;

/// Extract the named sub-part of a payload.
pub fn section(payload: &EditionPayload, name: &str) -> Option<Value> {
    let name = name.to_ascii_lowercase();
    match name.as_str() {
        "overview" => Some(json!({ "overview": payload.overview })),
        "magic" => Some(json!({ "magicTip": payload.magic_tip })),
        "horoscope" => payload
            .horoscope
            .as_ref()
            .map(|h| json!({ "horoscope": h })),
        _ => news_item(payload, &name),
    }
}

fn news_item(payload: &EditionPayload, name: &str) -> Option<Value> {
    let index: usize = name.strip_prefix("news")?.parse().ok()?;
    if index == 0 {
        return None;
    }
    let item = payload.news.get(index - 1)?;
    serde_json::to_value(item).ok()
}
