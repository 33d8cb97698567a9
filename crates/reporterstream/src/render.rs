use crate::logic::{MatchedPost, StreamRequest};
use chrono::{DateTime, SecondsFormat, Utc};

pub const EMBED_SCRIPT: &str =
    r#"<script async src="https://embed.bsky.app/static/embed.js" charset="utf-8"></script>"#;

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// HTML コメント内に埋め込めるようにする（`--` でコメントが閉じられないよう崩す）
fn comment_escape(s: &str) -> String {
    let mut escaped = html_escape(s);
    while escaped.contains("--") {
        escaped = escaped.replace("--", "- -");
    }
    escaped
}

fn render_embed(post: &MatchedPost) -> String {
    format!(
        r#"<blockquote class="bluesky-embed"><a href="{}"></a></blockquote>"#,
        html_escape(&post.post_url)
    )
}

/// 埋め込み用 HTML フラグメントを組み立てる
///
/// `posts` は並べ替え済みであること（この関数では順序を変えない）。
pub fn render_stream(
    request: &StreamRequest,
    posts: &[MatchedPost],
    generated_at: DateTime<Utc>,
) -> String {
    let keywords = request
        .keywords
        .iter()
        .map(|k| comment_escape(k))
        .collect::<Vec<_>>()
        .join(" | ");
    let reporters = request
        .reporters
        .iter()
        .map(|r| comment_escape(r))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut blocks = Vec::with_capacity(posts.len() + 1);
    blocks.push(EMBED_SCRIPT.to_string());
    blocks.extend(posts.iter().map(render_embed));

    format!(
        "<!-- Bluesky stream | keywords: {} | reporters: {} | generated: {} -->\n<div class=\"bsky-stream\">\n{}\n</div>\n",
        keywords,
        reporters,
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        blocks.join("\n")
    )
}
