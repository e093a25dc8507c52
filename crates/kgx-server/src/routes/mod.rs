pub mod extract;
pub mod triples;

use axum::Router;

use kgx::errors::KgResult;

use crate::error::ApiError;
use crate::state::AppState;

/// Run a store operation on the blocking pool so SQLite I/O stays off the async workers
pub(crate) async fn run_blocking<T, F>(operation: F) -> Result<T, ApiError>
where
    F: FnOnce() -> KgResult<T> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(operation).await??)
}

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(extract::routes(state.clone()))
        .merge(triples::routes(state))
}
