//! `HttpFetcher` and `GalleryCache` against a local HTTP responder.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use vaaradhi::cache::{CacheStatus, GalleryCache, SnapshotSource};
use vaaradhi::config::GalleryConfig;
use vaaradhi::fetch::{FetchError, Fetcher, HttpFetcher};

const TIMEOUT: Duration = Duration::from_secs(2);

/// Serve `response` to every connection after `delay`.
async fn serve(response: Vec<u8>, delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let response = response.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}

fn http_response(status: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

fn fetcher(limit: usize) -> HttpFetcher {
    HttpFetcher::with_client(reqwest::Client::new(), limit)
}

fn photo_url(c: char) -> String {
    format!(
        "https://lh3.googleusercontent.com/pw/AF1Qip{}",
        c.to_string().repeat(60)
    )
}

// =========================================================================
// Fetch classification
// =========================================================================

#[tokio::test]
async fn ok_response_returns_full_body() {
    let addr = serve(http_response("200 OK", b"<html>album</html>"), Duration::ZERO).await;
    let body = fetcher(1024)
        .fetch(&format!("http://{addr}/share/abc"), TIMEOUT)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<html>album</html>");
}

#[tokio::test]
async fn error_status_is_classified() {
    let addr = serve(http_response("404 Not Found", b""), Duration::ZERO).await;
    let err = fetcher(1024)
        .fetch(&format!("http://{addr}/missing"), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::HttpStatus { code: 404 });
    assert!(!err.is_transient());
}

#[tokio::test]
async fn slow_host_times_out() {
    let addr = serve(http_response("200 OK", b"late"), Duration::from_secs(5)).await;
    let timeout = Duration::from_millis(200);
    let err = fetcher(1024)
        .fetch(&format!("http://{addr}/slow"), timeout)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::Timeout(timeout));
}

#[tokio::test]
async fn declared_oversize_body_is_refused() {
    let addr = serve(http_response("200 OK", &[b'x'; 2048]), Duration::ZERO).await;
    let err = fetcher(1024)
        .fetch(&format!("http://{addr}/big"), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::TooLarge { limit: 1024 });
}

#[tokio::test]
async fn streamed_oversize_body_is_refused() {
    // No Content-Length: the cap has to be enforced while reading.
    let mut response =
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
    for _ in 0..4 {
        response.extend_from_slice(b"200\r\n");
        response.extend_from_slice(&[b'y'; 0x200]);
        response.extend_from_slice(b"\r\n");
    }
    response.extend_from_slice(b"0\r\n\r\n");
    let addr = serve(response, Duration::ZERO).await;

    let err = fetcher(1024)
        .fetch(&format!("http://{addr}/stream"), TIMEOUT)
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::TooLarge { limit: 1024 });
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher(1024)
        .fetch(&format!("http://{addr}/"), TIMEOUT)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    assert!(err.is_transient());
}

// =========================================================================
// Cache over the real fetcher
// =========================================================================

#[tokio::test]
async fn cache_syncs_album_from_host() {
    let html = format!(
        "<img src=\"{a}=w400\"><img src=\"{b}=w400\"><script>[\"{a}\"]</script>",
        a = photo_url('a'),
        b = photo_url('b')
    );
    let addr = serve(http_response("200 OK", html.as_bytes()), Duration::ZERO).await;
    let config = GalleryConfig {
        album_url: format!("http://{addr}/share/album"),
        fetch_timeout_secs: 2,
        ..GalleryConfig::default()
    };
    let cache = GalleryCache::from_config(fetcher(1024 * 1024), &config);

    let lookup = cache.lookup().await.unwrap();
    assert_eq!(lookup.source, SnapshotSource::Refreshed);
    let srcs: Vec<&str> = lookup
        .snapshot
        .images()
        .iter()
        .map(|r| r.source_url.as_str())
        .collect();
    assert_eq!(
        srcs,
        vec![
            format!("{}=w1200", photo_url('a')),
            format!("{}=w1200", photo_url('b'))
        ]
    );
    assert_eq!(cache.status().await, CacheStatus::Fresh);

    let again = cache.lookup().await.unwrap();
    assert_eq!(again.source, SnapshotSource::Cache);
}

#[tokio::test]
async fn cold_start_against_dead_host_is_an_error() {
    let addr = serve(http_response("503 Service Unavailable", b""), Duration::ZERO).await;
    let config = GalleryConfig {
        album_url: format!("http://{addr}/share/album"),
        ..GalleryConfig::default()
    };
    let cache = GalleryCache::from_config(fetcher(1024), &config);
    assert!(cache.get_images().await.is_err());
    assert_eq!(cache.status().await, CacheStatus::Empty);
}
