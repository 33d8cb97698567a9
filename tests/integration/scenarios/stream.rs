use crate::helpers::{client::TestClient, mock_server::MockServer};
use axum::http::StatusCode;
use std::time::Duration;

const USAGE: &str =
    "Usage: /api/stream?keywords=Kobe Bufkin,Bufkin&reporters=mikeascotto.bsky.social&days=7";

/// 観点: ページ送りしながら新しい投稿だけを返し、古い投稿は除外する
#[tokio::test]
async fn test_stream_paginates_and_filters_by_age() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    let res = client
        .get_stream("keywords=keyword&reporters=test.bsky.social&days=2")
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.content_type.as_deref(),
        Some("text/html; charset=utf-8")
    );
    assert!(res
        .body
        .contains("https://bsky.app/profile/test.bsky.social/post/post1_uri"));
    assert!(!res
        .body
        .contains("https://bsky.app/profile/test.bsky.social/post/post2_uri"));
    assert!(res
        .body
        .contains("https://bsky.app/profile/test.bsky.social/post/post3_uri"));

    // 2 ページ目はカーソル付きで取得している
    let calls = server.calls_for("test.bsky.social");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].cursor, None);
    assert_eq!(calls[0].limit.as_deref(), Some("50"));
    assert_eq!(calls[1].cursor.as_deref(), Some("cursor-1"));
}

/// 観点: 複数 reporter の結果が新しい順に並ぶ（facet のタグでもマッチする）
#[tokio::test]
async fn test_stream_sorts_across_reporters() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    let res = client
        .get_stream("keywords=KEYWORD&reporters=test.bsky.social,%20other.bsky.social&days=2")
        .await;

    assert_eq!(res.status, StatusCode::OK);

    let other = res.body.find("/post/other1").expect("other1 missing");
    let post1 = res.body.find("/post/post1_uri").expect("post1 missing");
    let post3 = res.body.find("/post/post3_uri").expect("post3 missing");
    assert!(other < post1 && post1 < post3, "body: {}", res.body);

    assert!(res
        .body
        .starts_with("<!-- Bluesky stream | keywords: KEYWORD | reporters: test.bsky.social | other.bsky.social | generated: "));
    assert!(res.body.contains(
        r#"<script async src="https://embed.bsky.app/static/embed.js" charset="utf-8"></script>"#
    ));
    assert_eq!(res.body.matches("<blockquote class=\"bluesky-embed\">").count(), 3);
}

/// 観点: 失敗した reporter は無視され、他の reporter の結果は返る
#[tokio::test]
async fn test_stream_swallows_failing_reporter() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    let res = client
        .get_stream("keywords=keyword&reporters=broken.bsky.social,other.bsky.social")
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res
        .body
        .contains("https://bsky.app/profile/other.bsky.social/post/other1"));
    assert_eq!(server.calls_for("broken.bsky.social").len(), 1);
}

/// 観点: キーワード・reporter が空なら 400 と使い方を返す
#[tokio::test]
async fn test_stream_requires_filters() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    for query in [
        "",
        "keywords=keyword",
        "reporters=test.bsky.social",
        "keywords=%20,%20&reporters=,,",
    ] {
        let res = client.get_stream(query).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "query: {}", query);
        assert_eq!(res.body, USAGE);
    }

    // 検証で弾いたリクエストは API を呼ばない
    assert!(server.calls_for("test.bsky.social").is_empty());
}

/// 観点: days が数値でなければ 400
#[tokio::test]
async fn test_stream_rejects_invalid_days() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    let res = client
        .get_stream("keywords=keyword&reporters=test.bsky.social&days=abc")
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body.contains("\"abc\""));
    assert!(res.body.contains(USAGE));
}

/// 観点: API のレスポンスが壊れていたら 500 で内部の詳細は返さない
#[tokio::test]
async fn test_stream_malformed_upstream_is_internal_error() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    let res = client
        .get_stream("keywords=keyword&reporters=garbage.bsky.social")
        .await;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, "Error: Failed to fetch posts for garbage.bsky.social");
}

/// 観点: 期限内に終わらなければ 504
#[tokio::test]
async fn test_stream_deadline() {
    let server = MockServer::start().await;
    let client =
        TestClient::new_with_deadline(server.base_url(), Duration::from_millis(200)).await;

    let res = client
        .get_stream("keywords=keyword&reporters=slow.bsky.social")
        .await;

    assert_eq!(res.status, StatusCode::GATEWAY_TIMEOUT);
    assert!(res.body.starts_with("Error: "));
}

/// 観点: 該当投稿がなくても 200 で空のフラグメントを返す
#[tokio::test]
async fn test_stream_no_matches() {
    let server = MockServer::start().await;
    let client = TestClient::new_with_bsky_url(server.base_url()).await;

    let res = client
        .get_stream("keywords=nothing-matches-this&reporters=test.bsky.social&days=2")
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(!res.body.contains("bluesky-embed\">"));
    assert!(res.body.contains("<div class=\"bsky-stream\">"));
}
