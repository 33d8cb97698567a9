pub async fn root() -> String {
    format!(
        "Bluesky のキーワード付き投稿ストリームを HTML フラグメントで返します\n{}\n",
        reporterstream::USAGE
    )
}

pub async fn health() -> &'static str {
    "OK"
}
