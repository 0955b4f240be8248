//! Edition generation against an OpenAI-compatible completion API.
//!
//! This module owns the full "ask the model for today's paper" path:
//! - [`CompletionBackend`]: the seam over the external service, so tests
//!   can substitute a canned backend
//! - [`OpenAiBackend`]: the real client, a single `chat/completions` call
//! - [`SchemaTemplate`]: renders the natural-language instruction that
//!   embeds the date key and the exact JSON shape expected back
//! - [`EditionGenerator`]: extract-then-parse of the model's answer, with
//!   a degraded fallback record when the answer wasn't valid JSON
//!
//! # Failure policy
//!
//! "The service did not answer" (transport error, non-success status, or a
//! success body with no text in it) is fatal and propagates as
//! [`GazetteError::Upstream`]. "The service answered garbage" is not: the
//! request still completes with a fallback record carrying the raw text.
//! No retry and no deadline are applied here; a decorator around
//! [`CompletionBackend`] is where either would go.

use async_trait::async_trait;
use chrono::Utc;
use clap::ValueEnum;
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::GazetteError;
use crate::extract::extract_json;
use crate::models::{EditionPayload, EditionRecord};
use crate::utils::truncate_for_log;

/// Async seam over the text-generation service.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send one prompt, get the model's raw text back.
    async fn complete(&self, prompt: &str) -> Result<String, GazetteError>;
}

/// Content schema variant. The themed edition additionally asks the model
/// for a daily horoscope; the generator path is otherwise identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EditionTheme {
    Plain,
    Themed,
}

/// Parameterized prompt template for one edition.
#[derive(Debug, Clone)]
pub struct SchemaTemplate {
    /// Name of the fictional paper, quoted in the prompt.
    pub paper_name: String,
    /// Language the edition should be written in.
    pub language: String,
    pub theme: EditionTheme,
}

impl SchemaTemplate {
    /// Render the generation instruction for a date key.
    pub fn render(&self, date_key: &str) -> String {
        let horoscope_field = match self.theme {
            EditionTheme::Plain => "",
            EditionTheme::Themed => ",\n  \"horoscope\": \"Daily horoscope (one sentence)\"",
        };
        format!(
            r#"You are a generator of fictional newspaper dispatches. Create the JSON object for the daily edition of "{paper}" dated {date}, written in {language}. Return strictly the JSON with no extra commentary, using exactly this structure:
{{
  "date": "YYYY-MM-DD",
  "overview": "Short overall description of the day (1-2 sentences)",
  "news": [
    {{ "id": "1", "title": "...", "description": "30-40 words" }},
    {{ "id": "2", "title": "...", "description": "30-40 words" }},
    {{ "id": "3", "title": "...", "description": "30-40 words" }}
  ],
  "magicTip": "Short magical advice (one sentence)"{horoscope_field}
}}

Output requirements:
- The date field is mandatory and must equal {date}
- Descriptions: around 30-40 words each (never shorter than 25 or longer than 50 words)
- Titles: 5-8 words at most
- No text outside the JSON

This JSON feeds API clients directly; strict JSON validation happens server-side."#,
            paper = self.paper_name,
            date = date_key,
            language = self.language,
            horoscope_field = horoscope_field,
        )
    }
}

/// Real backend: one `chat/completions` request per generation.
///
/// No timeout is configured on the client; an unresponsive upstream stalls
/// the whole request (accepted, see DESIGN.md).
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiBackend {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, GazetteError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GazetteError::upstream(format!(
                "status {}: {}",
                status,
                truncate_for_log(&text, 300)
            )));
        }

        let data: serde_json::Value = response.json().await?;
        let content = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|t| t.as_str());

        match content {
            Some(text) => {
                info!(bytes = text.len(), "completion received");
                Ok(text.to_string())
            }
            // A success status with no text is still "the service did not
            // answer" as far as the caller is concerned.
            None => Err(GazetteError::upstream(format!(
                "success response carried no message content: {}",
                truncate_for_log(&data.to_string(), 300)
            ))),
        }
    }
}

/// Builds one [`EditionRecord`] per call from a date key.
pub struct EditionGenerator {
    backend: Box<dyn CompletionBackend>,
    template: SchemaTemplate,
}

impl EditionGenerator {
    pub fn new(backend: Box<dyn CompletionBackend>, template: SchemaTemplate) -> Self {
        Self { backend, template }
    }

    /// Ask the model for the edition of `date_key` and parse the answer.
    ///
    /// Parse success takes the payload as-is (field completeness is not
    /// validated). Parse failure yields the fallback payload with the full
    /// raw response preserved in `raw_text`. Upstream call failure
    /// propagates.
    #[instrument(level = "info", skip_all, fields(%date_key))]
    pub async fn generate(&self, date_key: &str) -> Result<EditionRecord, GazetteError> {
        let prompt = self.template.render(date_key);
        let raw = self.backend.complete(&prompt).await?;

        let narrowed = extract_json(&raw);
        let payload = match serde_json::from_str::<EditionPayload>(&narrowed) {
            Ok(payload) => {
                info!(news_items = payload.news.len(), "parsed structured edition");
                payload
            }
            Err(e) => {
                warn!(
                    error = %e,
                    response_preview = %truncate_for_log(&raw, 300),
                    "model returned non-conforming JSON; building fallback record"
                );
                EditionPayload::fallback(date_key, raw)
            }
        };

        Ok(EditionRecord {
            created_at: Utc::now().to_rfc3339(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    struct CannedBackend {
        reply: Result<String, String>,
    }

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, GazetteError> {
            self.reply
                .clone()
                .map_err(GazetteError::upstream)
        }
    }

    fn template(theme: EditionTheme) -> SchemaTemplate {
        SchemaTemplate {
            paper_name: "The Daily Gazette".to_string(),
            language: "English".to_string(),
            theme,
        }
    }

    fn generator_with_reply(reply: Result<String, String>) -> EditionGenerator {
        EditionGenerator::new(
            Box::new(CannedBackend { reply }),
            template(EditionTheme::Plain),
        )
    }

    #[test]
    fn test_template_embeds_date_and_schema() {
        let prompt = template(EditionTheme::Plain).render("2026-08-29");
        assert!(prompt.contains("2026-08-29"));
        assert!(prompt.contains("\"magicTip\""));
        assert!(prompt.contains("The Daily Gazette"));
        assert!(!prompt.contains("horoscope"));
    }

    #[test]
    fn test_themed_template_requests_horoscope() {
        let prompt = template(EditionTheme::Themed).render("2026-08-29");
        assert!(prompt.contains("\"horoscope\""));
    }

    #[tokio::test]
    async fn test_generate_parses_fenced_reply() {
        let reply = "Sure! ```json\n{\"date\":\"2026-08-29\",\"overview\":\"Calm.\",\"news\":[{\"id\":\"1\",\"title\":\"T\",\"description\":\"D\"}],\"magicTip\":\"Tip.\"}\n```";
        let generator = generator_with_reply(Ok(reply.to_string()));
        let record = generator.generate("2026-08-29").await.unwrap();
        assert_eq!(record.payload.overview, "Calm.");
        assert_eq!(record.payload.news.len(), 1);
        assert!(record.payload.raw_text.is_none());
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_garbage_reply() {
        let raw = "I cannot produce JSON today, sorry.";
        let generator = generator_with_reply(Ok(raw.to_string()));
        let record = generator.generate("2026-08-29").await.unwrap();
        assert_eq!(record.payload.date, "2026-08-29");
        // The fallback keeps the original response, not the narrowed text.
        assert_eq!(record.payload.raw_text.as_deref(), Some(raw));
        assert!(record.payload.news.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_keeps_fences_in_raw_text() {
        let raw = "```json\nnot json after all\n```";
        let generator = generator_with_reply(Ok(raw.to_string()));
        let record = generator.generate("2026-08-29").await.unwrap();
        assert_eq!(record.payload.raw_text.as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let generator = generator_with_reply(Err("status 503: overloaded".to_string()));
        let err = generator.generate("2026-08-29").await.unwrap_err();
        assert!(matches!(err, GazetteError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_created_at_is_rfc3339() {
        let generator = generator_with_reply(Ok("{}".to_string()));
        let record = generator.generate("2026-08-29").await.unwrap();
        assert!(DateTime::parse_from_rfc3339(&record.created_at).is_ok());
    }
}
