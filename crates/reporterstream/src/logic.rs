use crate::api::{AuthorFeedFetcher, PageFetch};
use anyhow::{Context, Result};
use bsky_core::{FacetFeature, PostView};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::task::JoinSet;

pub const DEFAULT_DAYS: i64 = 7;

pub const USAGE: &str =
    "Usage: /api/stream?keywords=Kobe Bufkin,Bufkin&reporters=mikeascotto.bsky.social&days=7";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{}", USAGE)]
    MissingFilters,
    #[error("Invalid days value {0:?}: expected a positive integer. {}", USAGE)]
    InvalidDays(String),
}

/// 検証済みのリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRequest {
    /// 大文字小文字を無視した集合。表示用に最初の表記を残す
    pub keywords: Vec<String>,
    /// 指定順のまま（重複も除かない）
    pub reporters: Vec<String>,
    pub days: i64,
    pub cutoff: DateTime<Utc>,
}

impl StreamRequest {
    /// 照合用に小文字化したキーワード
    pub fn needles(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.to_lowercase()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPost {
    pub created_at: DateTime<Utc>,
    pub post_url: String,
}

impl MatchedPost {
    fn from_post(post: &PostView) -> Self {
        Self {
            created_at: post.indexed_at_or_epoch(),
            post_url: post.permalink(),
        }
    }
}

/// 1 人の reporter についてページ送りを止めた理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// カーソルが返らなかった
    Exhausted,
    EmptyPage,
    /// ページの先頭からカットオフより古かった
    Stale,
    /// API が成功以外のステータスを返した
    Upstream(u16),
}

#[derive(Debug, Clone)]
pub struct ReporterOutcome {
    pub posts: Vec<MatchedPost>,
    pub pages: usize,
    pub stop: StopReason,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_days(raw: Option<&str>) -> Result<i64, ValidationError> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Ok(DEFAULT_DAYS);
    }

    match trimmed.parse::<i64>() {
        Ok(days) if days > 0 => Ok(days),
        _ => Err(ValidationError::InvalidDays(trimmed.to_string())),
    }
}

/// クエリパラメータを検証し、カットオフ時刻を計算する
pub fn parse_request(
    keywords: Option<&str>,
    reporters: Option<&str>,
    days: Option<&str>,
    now: DateTime<Utc>,
) -> Result<StreamRequest, ValidationError> {
    let mut unique_keywords: Vec<String> = Vec::new();
    for keyword in split_list(keywords) {
        let lower = keyword.to_lowercase();
        if !unique_keywords.iter().any(|k| k.to_lowercase() == lower) {
            unique_keywords.push(keyword);
        }
    }
    let reporters = split_list(reporters);

    if unique_keywords.is_empty() || reporters.is_empty() {
        return Err(ValidationError::MissingFilters);
    }

    let days = parse_days(days)?;
    let cutoff = Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| ValidationError::InvalidDays(days.to_string()))?;

    Ok(StreamRequest {
        keywords: unique_keywords,
        reporters,
        days,
        cutoff,
    })
}

/// 本文 + facet の値 + 投稿者 handle を連結し、小文字化したもの
pub fn searchable_text(post: &PostView) -> String {
    let raw_text = post.record.text.as_deref().unwrap_or_default();

    let facet_text = post
        .record
        .facets
        .iter()
        .flatten()
        .map(|facet| {
            facet
                .features
                .iter()
                .flatten()
                .map(FacetFeature::searchable_value)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!("{} {} {}", raw_text, facet_text, post.author.handle).to_lowercase()
}

/// 単純な部分一致。単語境界は見ない（"bufkin" は "Bufkinson" にもマッチする）
///
/// `text` と `needles` はどちらも小文字化済みであること。
pub fn matches_keywords(text: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| text.contains(needle.as_str()))
}

/// 1 人の reporter の投稿をページ送りしながら集める
///
/// API は新しい順に返す前提。カットオフより古い投稿が出たらそのページの走査を打ち切り、
/// ページの先頭から古かった場合はページ送り自体を止める。
pub async fn collect_reporter_posts<F>(
    fetcher: &F,
    reporter: &str,
    cutoff: DateTime<Utc>,
    needles: &[String],
) -> Result<ReporterOutcome>
where
    F: AuthorFeedFetcher + ?Sized,
{
    let mut posts = Vec::new();
    let mut pages = 0;
    let mut cursor: Option<String> = None;

    let stop = loop {
        let (page, next_cursor) = match fetcher.get_author_feed(reporter, cursor.take()).await? {
            PageFetch::Page { posts: page, cursor: next } => (page, next),
            PageFetch::Rejected { status } => {
                tracing::warn!(
                    "Author feed for {} returned {}; treating as end of feed",
                    reporter,
                    status
                );
                break StopReason::Upstream(status);
            }
        };
        pages += 1;

        if page.is_empty() {
            break StopReason::EmptyPage;
        }

        let mut fresh = 0;
        let mut reached_cutoff = false;
        for post in &page {
            if post.indexed_at_or_epoch() < cutoff {
                reached_cutoff = true;
                break;
            }
            fresh += 1;

            if matches_keywords(&searchable_text(post), needles) {
                posts.push(MatchedPost::from_post(post));
            }
        }

        tracing::debug!(
            "{} page {}: {} items, {} fresh, {} matched so far",
            reporter,
            pages,
            page.len(),
            fresh,
            posts.len()
        );

        if reached_cutoff && fresh == 0 {
            break StopReason::Stale;
        }

        match next_cursor {
            Some(c) => cursor = Some(c),
            None => break StopReason::Exhausted,
        }
    };

    Ok(ReporterOutcome { posts, pages, stop })
}

/// reporter ごとにタスクを起動し、全タスクの完了後に結果をまとめて新しい順に並べる
pub async fn collect_stream<F>(fetcher: Arc<F>, request: &StreamRequest) -> Result<Vec<MatchedPost>>
where
    F: AuthorFeedFetcher + ?Sized + 'static,
{
    let needles = Arc::new(request.needles());
    let mut tasks = JoinSet::new();

    for (index, reporter) in request.reporters.iter().cloned().enumerate() {
        let fetcher = Arc::clone(&fetcher);
        let needles = Arc::clone(&needles);
        let cutoff = request.cutoff;

        tasks.spawn(async move {
            let outcome = collect_reporter_posts(fetcher.as_ref(), &reporter, cutoff, &needles)
                .await
                .with_context(|| format!("Failed to fetch posts for {}", reporter));
            (index, reporter, outcome)
        });
    }

    // 完了順ではなく reporter の指定順でマージする
    let mut outcomes: Vec<Option<ReporterOutcome>> = vec![None; request.reporters.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, reporter, outcome) = joined.context("Reporter task panicked")?;
        let outcome = outcome?;
        tracing::info!(
            "{}: {} matched posts over {} pages ({:?})",
            reporter,
            outcome.posts.len(),
            outcome.pages,
            outcome.stop
        );
        outcomes[index] = Some(outcome);
    }

    let mut all: Vec<MatchedPost> = outcomes
        .into_iter()
        .flatten()
        .flat_map(|outcome| outcome.posts)
        .collect();

    // 安定ソート: 同時刻は reporter 順・ページ順を保つ
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(all)
}
