use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `bsky.app` 上の投稿パーマリンクのベース
pub const BSKY_APP_PROFILE_URL: &str = "https://bsky.app/profile";

/// `app.bsky.feed.getAuthorFeed` のレスポンス型
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthorFeedResponse {
    #[serde(default)]
    pub feed: Option<Vec<FeedViewPost>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl AuthorFeedResponse {
    /// `feed` を取り出す（欠落・null は空ページ扱い）
    pub fn into_posts(self) -> Vec<PostView> {
        self.feed
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.post)
            .collect()
    }

    /// 次ページのカーソル。空文字列は「次ページなし」とみなす
    pub fn next_cursor(&self) -> Option<String> {
        self.cursor.clone().filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub uri: String,
    #[serde(rename = "indexedAt", default, skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<String>,
    pub author: ProfileViewBasic,
    #[serde(default)]
    pub record: PostRecord,
}

impl PostView {
    /// `indexedAt` を UTC に変換する。欠落・解析不能な値は Unix epoch 扱い
    pub fn indexed_at_or_epoch(&self) -> DateTime<Utc> {
        self.indexed_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn rkey(&self) -> &str {
        rkey_from_uri(&self.uri)
    }

    pub fn permalink(&self) -> String {
        post_permalink(&self.author.handle, &self.uri)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileViewBasic {
    pub handle: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<Facet>>,
}

/// リンク・メンション・ハッシュタグなどのリッチテキスト注釈
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Facet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<FacetFeature>>,
}

/// link は `uri`、tag は `tag` を持つ。mention (`did`) などはどちらも持たない
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl FacetFeature {
    /// キーワード照合に使う値: `uri` 優先、次に `tag`、どちらもなければ空
    pub fn searchable_value(&self) -> &str {
        self.uri
            .as_deref()
            .or(self.tag.as_deref())
            .unwrap_or_default()
    }
}

/// AT-URI の最後のセグメント (rkey) を取り出す
///
/// `at://did:plc:xxx/app.bsky.feed.post/3kabc` -> `3kabc`
pub fn rkey_from_uri(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// `https://bsky.app/profile/<handle>/post/<rkey>` を組み立てる
///
/// handle と rkey はパスセグメントとしてエンコードする。正しい handle / rkey では何も変わらない。
pub fn post_permalink(handle: &str, uri: &str) -> String {
    format!(
        "{}/{}/post/{}",
        BSKY_APP_PROFILE_URL,
        urlencoding::encode(handle),
        urlencoding::encode(rkey_from_uri(uri))
    )
}
