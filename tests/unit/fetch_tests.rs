// HttpFetcher tests against a local origin

use std::time::Duration;

use imagine::config::FetchConfig;
use imagine::fetch::{HttpFetcher, SourceFetcher};
use url::Url;

use super::origin::{png, OriginServer, Route};

fn fetcher(config: FetchConfig) -> HttpFetcher {
    HttpFetcher::new(&config).expect("fetcher should build")
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let body = png(4, 4);
    let origin = OriginServer::start(vec![("/a.png", Route::ok("image/png", body.clone()))]).await;

    let url = Url::parse(&origin.url("/a.png")).unwrap();
    let bytes = fetcher(FetchConfig::default()).fetch(&url).await.unwrap();

    assert_eq!(bytes.as_ref(), body.as_slice());
}

#[tokio::test]
async fn test_fetch_non_success_status_fails() {
    let origin = OriginServer::start(vec![("/gone.png", Route::status(500))]).await;

    let url = Url::parse(&origin.url("/gone.png")).unwrap();
    let err = fetcher(FetchConfig::default()).fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), "fetch_failure");
    assert!(err.to_string().contains("500"), "got: {}", err);
}

#[tokio::test]
async fn test_fetch_unknown_path_is_404_failure() {
    let origin = OriginServer::start(vec![]).await;

    let url = Url::parse(&origin.url("/missing.png")).unwrap();
    let err = fetcher(FetchConfig::default()).fetch(&url).await.unwrap_err();

    assert!(err.to_string().contains("404"), "got: {}", err);
}

#[tokio::test]
async fn test_fetch_follows_redirects() {
    let body = png(2, 2);
    let origin = OriginServer::start(vec![
        ("/old.png", Route::redirect("/new.png")),
        ("/new.png", Route::ok("image/png", body.clone())),
    ])
    .await;

    let url = Url::parse(&origin.url("/old.png")).unwrap();
    let bytes = fetcher(FetchConfig::default()).fetch(&url).await.unwrap();

    assert_eq!(bytes.as_ref(), body.as_slice());
}

#[tokio::test]
async fn test_fetch_redirect_limit() {
    let origin = OriginServer::start(vec![
        ("/old.png", Route::redirect("/new.png")),
        ("/new.png", Route::ok("image/png", png(2, 2))),
    ])
    .await;

    let config = FetchConfig {
        max_redirects: 0,
        ..Default::default()
    };
    let url = Url::parse(&origin.url("/old.png")).unwrap();
    let err = fetcher(config).fetch(&url).await.unwrap_err();

    // Redirects disabled: the 302 itself is a non-success status
    assert!(err.to_string().contains("302"), "got: {}", err);
}

#[tokio::test]
async fn test_fetch_rejects_oversized_source() {
    let origin =
        OriginServer::start(vec![("/big.png", Route::ok("image/png", vec![0u8; 4096]))]).await;

    let config = FetchConfig {
        max_source_bytes: 1024,
        ..Default::default()
    };
    let url = Url::parse(&origin.url("/big.png")).unwrap();
    let err = fetcher(config).fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), "fetch_failure");
    assert!(err.to_string().contains("exceeds maximum 1024 bytes"), "got: {}", err);
}

#[tokio::test]
async fn test_fetch_times_out_on_slow_origin() {
    let origin = OriginServer::start(vec![(
        "/slow.png",
        Route::ok("image/png", png(2, 2)).delayed(Duration::from_secs(5)),
    )])
    .await;

    let config = FetchConfig {
        timeout_secs: 1,
        ..Default::default()
    };
    let url = Url::parse(&origin.url("/slow.png")).unwrap();

    let started = std::time::Instant::now();
    let err = fetcher(config).fetch(&url).await.unwrap_err();

    assert_eq!(err.kind(), "fetch_failure");
    assert!(started.elapsed() < Duration::from_secs(4));
}
