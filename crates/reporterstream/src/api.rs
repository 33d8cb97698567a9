use anyhow::{Context, Result};
use bsky_core::{AuthorFeedResponse, PostView};
use reqwest::Client;

pub const DEFAULT_PAGE_LIMIT: usize = 50;
pub const MAX_PAGE_LIMIT: usize = 100;

/// getAuthorFeed 1ページ分の取得結果
#[derive(Debug, Clone)]
pub enum PageFetch {
    Page {
        posts: Vec<PostView>,
        cursor: Option<String>,
    },
    /// API が成功以外のステータスを返した。エラーではなく「これ以上取得しない」の合図
    Rejected { status: u16 },
}

#[async_trait::async_trait]
pub trait AuthorFeedFetcher: Send + Sync {
    async fn get_author_feed(&self, actor: &str, cursor: Option<String>) -> Result<PageFetch>;
}

pub struct BlueskyFetcher {
    client: Client,
    base_url: String,
    page_limit: usize,
}

impl BlueskyFetcher {
    pub fn new(client: Client, base_url: &str, page_limit: usize) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit: page_limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

#[async_trait::async_trait]
impl AuthorFeedFetcher for BlueskyFetcher {
    async fn get_author_feed(&self, actor: &str, cursor: Option<String>) -> Result<PageFetch> {
        let url = format!("{}/xrpc/app.bsky.feed.getAuthorFeed", self.base_url);

        let limit = self.page_limit.to_string();

        let mut req = self
            .client
            .get(&url)
            .query(&[("actor", actor), ("limit", limit.as_str())]);

        if let Some(c) = cursor {
            req = req.query(&[("cursor", c)]);
        }

        let res = req
            .send()
            .await
            .context(format!("Author feed request failed for {}", actor))?;

        let status = res.status();
        if !status.is_success() {
            return Ok(PageFetch::Rejected {
                status: status.as_u16(),
            });
        }

        let feed: AuthorFeedResponse = res
            .json()
            .await
            .context(format!("Failed to parse author feed for {}", actor))?;

        let cursor = feed.next_cursor();
        Ok(PageFetch::Page {
            posts: feed.into_posts(),
            cursor,
        })
    }
}
