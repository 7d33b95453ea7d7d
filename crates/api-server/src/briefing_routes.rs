//! Read-only access to briefing artifacts written by the pipeline.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use briefing_pipeline::{BriefingArtifact, BRIEFING_PREFIX};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct BriefingSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub has_html: bool,
}

#[derive(Debug, Serialize)]
pub struct BriefingList {
    pub briefings: Vec<BriefingSummary>,
    pub total: usize,
}

pub fn briefing_routes() -> Router<AppState> {
    Router::new()
        .route("/api/briefings", get(list_briefings))
        .route("/api/briefings/:id", get(get_briefing))
}

/// Ids are artifact timestamps: `YYYYMMDD_HHMMSS`.
fn is_briefing_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'_'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 8 || b.is_ascii_digit())
}

async fn list_briefings(State(state): State<AppState>) -> Result<Json<BriefingList>, AppError> {
    let entries = state
        .store
        .list(BRIEFING_PREFIX, "json")
        .map_err(|e| anyhow::anyhow!("Failed to list briefings: {}", e))?;

    let briefings: Vec<BriefingSummary> = entries
        .into_iter()
        .filter(|entry| is_briefing_id(&entry.slug))
        .map(|entry| BriefingSummary {
            has_html: state
                .store
                .path_for(BRIEFING_PREFIX, &entry.slug, "html")
                .is_file(),
            created_at: DateTime::<Utc>::from(entry.modified),
            id: entry.slug,
        })
        .collect();

    Ok(Json(BriefingList {
        total: briefings.len(),
        briefings,
    }))
}

async fn get_briefing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BriefingArtifact>, AppError> {
    if !is_briefing_id(&id) {
        return Err(AppError::bad_request(format!(
            "Invalid briefing id '{}': expected YYYYMMDD_HHMMSS",
            id
        )));
    }

    let path = state.store.path_for(BRIEFING_PREFIX, &id, "json");
    if !path.is_file() {
        return Err(AppError::not_found(format!("Briefing '{}' not found", id)));
    }

    let artifact: BriefingArtifact = state
        .store
        .read_json(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read briefing {}: {}", id, e))?;
    Ok(Json(artifact))
}
