//! Data models for the daily edition.
//!
//! This module defines the structures that cross the two boundaries of the
//! service:
//! - [`EditionPayload`]: the structured document the model is asked to
//!   produce, and the shape served back to HTTP clients
//! - [`EditionRecord`]: the persisted unit stored in the key-value store,
//!   pairing the payload with its creation timestamp
//! - [`EditionSummary`]: the condensed `{date, overview, titles}` view
//!
//! Field names use camelCase on the wire to match the JSON schema embedded
//! in the generation prompt, hence the `rename_all` attributes. Every
//! payload field is defaulted: the model's output is accepted as-is when it
//! parses as an object at all, and missing fields are not treated as a
//! parse failure.

use serde::{Deserialize, Serialize};

/// A single news item of the edition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    /// Stable identifier within the edition ("1", "2", ...).
    #[serde(default)]
    pub id: String,
    /// Headline, 5-8 words as requested from the model.
    #[serde(default)]
    pub title: String,
    /// Body text, roughly 30-40 words as requested from the model.
    #[serde(default)]
    pub description: String,
}

/// The structured document of one daily edition.
///
/// A well-formed payload comes straight from parsing the model's JSON.
/// When parsing fails the degraded shape from [`EditionPayload::fallback`]
/// is used instead: empty fields plus `raw_text` holding the full,
/// unmodified model output for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditionPayload {
    /// Edition date as produced by the model, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// One or two sentence overview of the day.
    #[serde(default)]
    pub overview: String,
    /// The repeating news items.
    #[serde(default)]
    pub news: Vec<NewsItem>,
    /// Short magical advice, one sentence.
    #[serde(default)]
    pub magic_tip: String,
    /// Daily horoscope; only requested by the themed schema variant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horoscope: Option<String>,
    /// Original model output, present only on fallback records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl EditionPayload {
    /// Degraded payload used when the model's answer was not valid JSON.
    ///
    /// `raw_text` receives the original response text, not the extracted
    /// substring, so nothing is lost for later inspection.
    pub fn fallback(date_key: &str, raw_text: String) -> Self {
        Self {
            date: date_key.to_string(),
            overview: String::new(),
            news: Vec::new(),
            magic_tip: String::new(),
            horoscope: None,
            raw_text: Some(raw_text),
        }
    }
}

/// The persisted unit of cached content, stored under `daily:<DateKey>`.
///
/// `created_at` is an RFC-3339 timestamp set once at construction time and
/// never mutated. Freshness is always recomputed from it; no expiry flag
/// is stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditionRecord {
    pub created_at: String,
    pub payload: EditionPayload,
}

/// Headline entry of the summary view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsTitle {
    pub id: String,
    pub title: String,
}

/// The condensed `{date, overview, titles}` view served at `/today`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EditionSummary {
    pub date: String,
    pub overview: String,
    pub titles: Vec<NewsTitle>,
}

impl EditionSummary {
    /// Derive the summary from a payload, falling back to `fallback_date`
    /// (today's date key) when the model left the date field empty.
    pub fn from_payload(payload: &EditionPayload, fallback_date: &str) -> Self {
        let date = if payload.date.is_empty() {
            fallback_date.to_string()
        } else {
            payload.date.clone()
        };
        Self {
            date,
            overview: payload.overview.clone(),
            titles: payload
                .news
                .iter()
                .map(|item| NewsTitle {
                    id: item.id.clone(),
                    title: item.title.clone(),
                })
                .collect(),
        }
    }
}
