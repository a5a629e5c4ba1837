//! End-to-end forwarding tests against mock chat upstreams.

use std::time::{Duration, Instant};

use futures_util::StreamExt;

mod common;

const CHUNKS: [&str; 4] = ["data: one\n\n", "data: two\n\n", "data: three\n\n", "data: [DONE]\n\n"];
const DELAY: Duration = Duration::from_millis(200);

/// Read the whole body, recording when each piece arrived.
async fn arrivals(res: reqwest::Response, start: Instant) -> (Vec<Duration>, String) {
    let mut times = Vec::new();
    let mut body = Vec::new();
    let mut stream = res.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        if !chunk.is_empty() {
            times.push(start.elapsed());
            body.extend_from_slice(&chunk);
        }
    }
    (times, String::from_utf8(body).unwrap())
}

#[tokio::test]
async fn test_streaming_relays_each_chunk_as_it_arrives() {
    let (upstream, tally) = common::start_chunked_backend(CHUNKS.to_vec(), DELAY).await;
    let gateway = common::spawn_gateway(common::config_with_chat(upstream)).await;

    let start = Instant::now();
    let res = common::client()
        .post(gateway.url("/api/chat/stream"))
        .body(r#"{"query":"hi"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/event-stream");

    let (times, body) = arrivals(res, start).await;
    assert_eq!(body, CHUNKS.concat());
    assert_eq!(times.len(), CHUNKS.len(), "expected one arrival per chunk, got {:?}", times);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= DELAY / 2, "arrivals too close: {:?}", times);
    }
    // The first event reaches the client well before the upstream finishes.
    assert!(times[0] < DELAY * 3, "first chunk at {:?}", times[0]);
    assert!(tally.completed());
}

#[tokio::test]
async fn test_buffered_delivers_the_body_once_complete() {
    let (upstream, tally) = common::start_chunked_backend(CHUNKS.to_vec(), DELAY).await;
    let gateway = common::spawn_gateway(common::config_with_chat(upstream)).await;

    let start = Instant::now();
    let res = common::client()
        .post(gateway.url("/api/chat"))
        .body(r#"{"query":"hi"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let (times, body) = arrivals(res, start).await;
    assert_eq!(body, CHUNKS.concat());
    // Nothing reaches the client until the last upstream chunk was written.
    assert!(times[0] >= DELAY * 4, "first bytes at {:?}", times[0]);
    assert!(tally.completed());
}

#[tokio::test]
async fn test_client_disconnect_cancels_upstream() {
    let chunks = vec!["data: tick\n\n"; 20];
    let (upstream, tally) = common::start_chunked_backend(chunks, Duration::from_millis(100)).await;
    let gateway = common::spawn_gateway(common::config_with_chat(upstream)).await;

    let res = common::client()
        .post(gateway.url("/api/chat/stream"))
        .body("{}")
        .send()
        .await
        .unwrap();
    let mut stream = res.bytes_stream();
    let first = stream.next().await.unwrap().unwrap();
    assert!(!first.is_empty());
    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(3);
    while !tally.disconnected() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(tally.disconnected(), "upstream connection should have been dropped");
    assert!(!tally.completed());
}

#[tokio::test]
async fn test_client_disconnect_before_headers_cancels_upstream() {
    let (upstream, tally) = common::start_silent_backend().await;
    let gateway = common::spawn_gateway(common::config_with_chat(upstream)).await;

    let pending = common::client().post(gateway.url("/api/chat/stream")).body("{}").send();
    let outcome = tokio::time::timeout(Duration::from_millis(300), pending).await;
    assert!(outcome.is_err(), "upstream never answers, so the client must still be waiting");
    assert_eq!(tally.accepted(), 1);

    let deadline = Instant::now() + Duration::from_secs(3);
    while !tally.disconnected() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(tally.disconnected(), "in-flight upstream request should have been dropped");
}

#[tokio::test]
async fn test_unreachable_upstream_is_502() {
    let gateway = common::spawn_gateway(common::config_with_chat(common::closed_port().await)).await;

    let res = common::client().post(gateway.url("/api/chat")).body("{}").send().await.unwrap();
    assert_eq!(res.status(), 502);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_upstream_failure_is_not_retried() {
    let (upstream, tally) = common::start_closing_backend().await;
    let gateway = common::spawn_gateway(common::config_with_chat(upstream)).await;

    let res = common::client().post(gateway.url("/api/chat/stream")).body("{}").send().await.unwrap();
    assert_eq!(res.status(), 502);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(tally.accepted(), 1);
}

#[tokio::test]
async fn test_silent_upstream_is_504() {
    let (upstream, tally) = common::start_silent_backend().await;
    let mut config = common::config_with_chat(upstream);
    config.timeouts.upstream_response_secs = 1;
    let gateway = common::spawn_gateway(config).await;

    let start = Instant::now();
    let res = common::client().post(gateway.url("/api/chat")).body("{}").send().await.unwrap();
    assert_eq!(res.status(), 504);
    assert!(start.elapsed() < Duration::from_secs(5));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
    assert_eq!(tally.accepted(), 1);
}

#[tokio::test]
async fn test_request_is_rewritten_for_the_upstream() {
    let (upstream, tally) = common::start_recording_backend().await;
    let gateway = common::spawn_gateway(common::config_with_chat(upstream)).await;

    let res = common::client()
        .post(gateway.url("/api/chat?conversation=7"))
        .header("authorization", "Bearer token-1")
        .header("x-request-id", "req-chat-1")
        .header("keep-alive", "timeout=5")
        .header("content-type", "application/json")
        .body(r#"{"query":"hello"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-request-id"], "req-chat-1");
    assert_eq!(res.text().await.unwrap(), r#"{"ok":true}"#);

    let request = tally.last_request().unwrap().to_ascii_lowercase();
    assert!(request.starts_with("post /api/chat?conversation=7 http/1.1\r\n"), "{}", request);
    assert!(request.contains(&format!("host: {}\r\n", upstream)));
    assert!(request.contains("authorization: bearer token-1\r\n"));
    assert!(request.contains("x-request-id: req-chat-1\r\n"));
    assert!(!request.contains("keep-alive: timeout=5"));
    assert!(request.ends_with(r#"{"query":"hello"}"#));
}
