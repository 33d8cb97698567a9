pub mod api;
pub mod logic;
pub mod render;

use crate::api::BlueskyFetcher;
use crate::logic::StreamRequest;
use anyhow::Result;
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;

pub use logic::{parse_request, ValidationError, USAGE};

/// 検証済みリクエストからフラグメント HTML を生成する
pub async fn get_stream(
    client: &Client,
    bsky_api_url: &str,
    page_limit: usize,
    request: &StreamRequest,
) -> Result<String> {
    let fetcher = Arc::new(BlueskyFetcher::new(client.clone(), bsky_api_url, page_limit));
    let posts = logic::collect_stream(fetcher, request).await?;

    Ok(render::render_stream(request, &posts, Utc::now()))
}
