//! HTTP route handlers for Axum.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::{
    api::types::{EventDto, EventQuery},
    calendar::snapshot::Snapshot,
    config::Settings,
};

use super::AppState;

type ApiError = (StatusCode, String);
type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn calendar(states: State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let path = states.settings.calendar_path();
    let body = tokio::fs::read_to_string(&path).await.map_err(|_| {
        warn!(path = %path.display(), "calendar missing; run build first");
        (
            StatusCode::NOT_FOUND,
            "calendar not generated yet; run `readout-calendar build`".to_string(),
        )
    })?;
    Ok(([(header::CONTENT_TYPE, "text/calendar; charset=utf-8")], body))
}

pub async fn snapshot(states: State<AppState>) -> ApiResult<Snapshot> {
    load_snapshot(&states.settings).map(Json)
}

pub async fn list_events(
    states: State<AppState>,
    Query(query): Query<EventQuery>,
) -> ApiResult<Vec<EventDto>> {
    let snapshot = load_snapshot(&states.settings)?;
    let events = snapshot
        .events
        .into_iter()
        .filter(|e| query.matches(e))
        .map(EventDto::from)
        .collect();
    Ok(Json(events))
}

fn load_snapshot(settings: &Settings) -> Result<Snapshot, ApiError> {
    let path = settings.snapshot_path();
    if !path.exists() {
        warn!("events.json missing; run build first");
        return Err((
            StatusCode::NOT_FOUND,
            "snapshot not generated yet; run `readout-calendar build`".to_string(),
        ));
    }
    Snapshot::read(&path).map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
