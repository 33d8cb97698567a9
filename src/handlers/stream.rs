use crate::error::AppError;
use crate::state::{SharedState, StreamQuery};
use axum::{
    extract::{Query, State},
    response::Html,
};
use std::time::Instant;

pub async fn get_stream(
    State(state): State<SharedState>,
    Query(params): Query<StreamQuery>,
) -> Result<Html<String>, AppError> {
    let request = reporterstream::parse_request(
        params.keywords.as_deref(),
        params.reporters.as_deref(),
        params.days.as_deref(),
        chrono::Utc::now(),
    )
    .map_err(|e| {
        tracing::info!("Rejected stream request: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(
        "Received stream request: keywords={:?} reporters={:?} days={}",
        request.keywords,
        request.reporters,
        request.days
    );

    let started = Instant::now();
    let html = tokio::time::timeout(
        state.config.request_deadline,
        reporterstream::get_stream(
            &state.http_client,
            &state.config.bsky_api_url,
            state.config.page_limit,
            &request,
        ),
    )
    .await
    .map_err(|_| AppError::Timeout)??;

    tracing::info!(
        "Rendered stream for {} reporters in {:?}",
        request.reporters.len(),
        started.elapsed()
    );

    Ok(Html(html))
}
