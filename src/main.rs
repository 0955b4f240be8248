//! # Daily Gazette
//!
//! An HTTP service that serves a once-daily fictional newspaper edition,
//! generated on demand through an OpenAI-compatible completion API and
//! cached in a key-value store for the rest of the calendar day.
//!
//! ## Behavior
//!
//! - The first request of a day (or a periodic background tick) triggers a
//!   generation call; the parsed record is stored under `daily:<date>` and
//!   every later request that day is served from the cache
//! - A model answer that isn't valid JSON still produces a usable record:
//!   the raw text is preserved in a degraded fallback payload
//! - Only an unreachable completion service or a failing store surface as
//!   errors to clients
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=sk-... daily_gazette --bind 0.0.0.0:8080
//! ```
//!
//! ## Architecture
//!
//! Request flow: axum handler -> `EditionCache::get_or_create` (freshness
//! recomputed from the record's timestamp) -> on miss/stale,
//! `EditionGenerator` (prompt -> completion API -> JSON extraction ->
//! parse-or-fallback) -> store write -> section/summary slicing.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cache;
mod cli;
mod datekey;
mod error;
mod extract;
mod generator;
mod http;
mod models;
mod sections;
mod utils;

use cache::{EditionCache, FileStore, KvStore, MemoryStore};
use cli::Cli;
use datekey::DateKeyer;
use generator::{EditionGenerator, OpenAiBackend, SchemaTemplate};
use http::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("daily_gazette starting up");

    let args = Cli::parse();
    debug!(?args.bind, ?args.model, ?args.theme, "Parsed CLI arguments");

    let offset = FixedOffset::east_opt(args.utc_offset_hours * 3600)
        .ok_or("UTC offset out of range (must be within +-23 hours)")?;
    let keyer = DateKeyer::new(offset);

    let template = SchemaTemplate {
        paper_name: args.paper_name.clone(),
        language: args.language.clone(),
        theme: args.theme,
    };
    let backend = OpenAiBackend::new(
        args.api_base_url.clone(),
        args.api_key.clone(),
        args.model.clone(),
        args.temperature,
        args.max_tokens,
    );

    let store: Arc<dyn KvStore> = match &args.store_dir {
        Some(dir) => {
            info!(%dir, "using file-backed store");
            Arc::new(FileStore::new(dir))
        }
        None => {
            info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let generator = EditionGenerator::new(Box::new(backend), template);
    let cache = EditionCache::new(store, generator, keyer);
    let state = Arc::new(AppState { cache, keyer });

    // --- Scheduled tick: keep today's edition warm ---
    if args.refresh_interval_secs > 0 {
        let tick_state = Arc::clone(&state);
        let period = Duration::from_secs(args.refresh_interval_secs);
        info!(period_secs = args.refresh_interval_secs, "starting scheduled refresh loop");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let today = tick_state.keyer.today();
                match tick_state.cache.get_or_create(&today).await {
                    Ok(_) => debug!(%today, "scheduled tick ensured today's edition"),
                    // The loop outlives a failed tick; the next one retries.
                    Err(e) => error!(%today, error = %e, "scheduled tick failed"),
                }
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(addr = %args.bind, "listening");
    axum::serve(listener, http::router(state)).await?;

    Ok(())
}
