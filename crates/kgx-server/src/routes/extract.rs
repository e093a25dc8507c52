use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use kgx::loader::{truncate_chars, WebLoader};
use kgx::models::triple::Triple;
use kgx::pipeline::TriplePipeline;
use kgx::providers::openai::OpenAiProvider;
use kgx::settings::Overrides;
use kgx::store::TripleStore;

use crate::error::ApiError;
use crate::routes::run_blocking;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize)]
struct ExtractRequest {
    url: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    max_chars: Option<usize>,
}

#[derive(Debug, Serialize)]
struct StageCounts {
    extracted: usize,
    verified: usize,
    confirmed: usize,
}

#[derive(Debug, Serialize)]
struct ExtractResponse {
    preview: String,
    triples: Vec<Triple>,
    inserted: usize,
    stages: StageCounts,
}

async fn extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, ApiError> {
    let mut settings = (*state.settings).clone();
    settings.apply(Overrides {
        api_key: request.api_key,
        host: request.base_url,
        model: request.model,
        max_chars: request.max_chars,
    });

    let provider = OpenAiProvider::new(settings.provider.to_config())?;
    let loader = WebLoader::new(settings.loader.strategy, settings.loader.timeout())?;

    let page = loader.fetch_main_text(&request.url).await?;
    if page.is_empty() {
        return Err(ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "No readable text was found on the page",
        ));
    }
    let text = truncate_chars(&page, settings.max_chars());

    let pipeline =
        TriplePipeline::new(Box::new(provider)).with_options(settings.pipeline_options());
    let run = pipeline.run_stages(text).await?;

    let inserted = if run.confirmed.is_empty() {
        0
    } else {
        let path = settings.store.path.clone();
        let triples = run.confirmed.clone();
        let url = request.url.clone();
        run_blocking(move || TripleStore::open(path)?.insert_triples(&triples, &url)).await?
    };
    info!(url = %request.url, inserted, "extraction finished");

    Ok(Json(ExtractResponse {
        preview: text.to_string(),
        stages: StageCounts {
            extracted: run.extracted.len(),
            verified: run.verified.len(),
            confirmed: run.confirmed.len(),
        },
        triples: run.confirmed,
        inserted,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/extract", post(extract))
        .with_state(state)
}
