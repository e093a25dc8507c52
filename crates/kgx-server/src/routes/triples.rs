use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use kgx::store::{export_file_name, to_csv, TripleRecord, TripleStore};

use crate::error::ApiError;
use crate::routes::run_blocking;
use crate::state::AppState;

async fn stored_records(state: &AppState) -> Result<Vec<TripleRecord>, ApiError> {
    let path = state.settings.store.path.clone();
    run_blocking(move || TripleStore::open(path)?.fetch_triples()).await
}

async fn list_triples(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(stored_records(&state).await?))
}

async fn export_triples(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = stored_records(&state).await?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(Utc::now()));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        to_csv(&records),
    ))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/triples", get(list_triples))
        .route("/api/triples/export", get(export_triples))
        .with_state(state)
}
