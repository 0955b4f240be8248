//! HTTP boundary.
//!
//! Thin axum handlers over [`EditionCache`]; every read path goes through
//! `get_or_create`, so the first request of the day (or a cold cache) pays
//! for generation and later ones are served from the store.
//!
//! | Route | Core call | Response |
//! |---|---|---|
//! | `GET /` | — | endpoint listing |
//! | `GET /all` | `get_or_create(today)` | entire payload |
//! | `GET /today` | `get_or_create(today)` | `{date, overview, titles}` |
//! | `GET /section/{name}` | `get_or_create(today)` + section lookup | section value or 404 |
//! | `POST /refresh` | `force_refresh(today)` | entire payload |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::cache::EditionCache;
use crate::datekey::DateKeyer;
use crate::error::GazetteError;
use crate::models::{EditionPayload, EditionSummary};
use crate::sections;

/// Shared state behind every handler.
pub struct AppState {
    pub cache: EditionCache,
    pub keyer: DateKeyer,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/all", get(all))
        .route("/today", get(today))
        .route("/section/{name}", get(section))
        .route("/refresh", post(refresh))
        .with_state(state)
}

async fn index() -> &'static str {
    "OK — daily gazette. Endpoints: GET /all, GET /today, GET /section/{name}, POST /refresh\n"
}

async fn all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EditionPayload>, GazetteError> {
    let record = state.cache.get_or_create(&state.keyer.today()).await?;
    Ok(Json(record.payload))
}

async fn today(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EditionSummary>, GazetteError> {
    let today = state.keyer.today();
    let record = state.cache.get_or_create(&today).await?;
    Ok(Json(EditionSummary::from_payload(&record.payload, &today)))
}

async fn section(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Response, GazetteError> {
    let record = state.cache.get_or_create(&state.keyer.today()).await?;
    match sections::section(&record.payload, &name) {
        Some(value) => Ok(Json(value).into_response()),
        None => {
            info!(%name, "section not found");
            Ok((StatusCode::NOT_FOUND, "not found").into_response())
        }
    }
}

async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EditionPayload>, GazetteError> {
    let today = state.keyer.today();
    info!(%today, "manual refresh requested");
    let record = state.cache.force_refresh(&today).await?;
    Ok(Json(record.payload))
}
