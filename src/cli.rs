//! Command-line interface definitions for the daily gazette service.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most options can be provided via command-line flags or environment
//! variables.

use clap::Parser;

use crate::generator::EditionTheme;

/// Command-line arguments for the daily gazette service.
///
/// # Examples
///
/// ```sh
/// # In-memory cache, default model
/// daily_gazette --api-key sk-...
///
/// # Durable cache on disk, themed edition in Russian, keys at UTC+3
/// daily_gazette --store-dir ./editions --theme themed \
///     --language Russian --utc-offset-hours 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind the HTTP server on
    #[arg(short, long, env = "GAZETTE_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(
        long,
        env = "OPENAI_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    pub api_base_url: String,

    /// API key for the completion service
    #[arg(long, env = "OPENAI_API_KEY")]
    pub api_key: String,

    /// Model identifier sent with every generation request
    #[arg(long, env = "GAZETTE_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,

    /// Sampling temperature for generation
    #[arg(long, default_value_t = 0.9)]
    pub temperature: f32,

    /// Output token budget per generation
    #[arg(long, default_value_t = 800)]
    pub max_tokens: u32,

    /// Fixed whole-hour UTC offset used to derive the daily cache key
    #[arg(
        long,
        env = "GAZETTE_UTC_OFFSET",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub utc_offset_hours: i32,

    /// Name of the fictional newspaper, quoted in the generation prompt
    #[arg(long, default_value = "The Daily Gazette")]
    pub paper_name: String,

    /// Language the edition is written in
    #[arg(long, default_value = "English")]
    pub language: String,

    /// Content schema variant (themed additionally requests a horoscope)
    #[arg(long, value_enum, default_value = "plain")]
    pub theme: EditionTheme,

    /// Directory for the file-backed store; in-memory cache when omitted
    #[arg(long, env = "GAZETTE_STORE_DIR")]
    pub store_dir: Option<String>,

    /// Seconds between scheduled cache-warming ticks (0 disables the loop)
    #[arg(long, default_value_t = 3600)]
    pub refresh_interval_secs: u64,
}
