use appforge_generation::{ChatCompletionsClient, CollaboratorError, ProviderConfig, TextGenerator};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use warp::http::{HeaderValue, StatusCode};
use warp::{Filter, Reply};

type Captured = mpsc::UnboundedReceiver<(Option<String>, Value)>;

/// Serve one canned answer on `/v1/chat/completions`, recording what was sent
fn spawn_stub(status: StatusCode, retry_after: Option<&'static str>, reply: Value) -> (String, Captured) {
    let (tx, rx) = mpsc::unbounded_channel();
    let route = warp::path!("v1" / "chat" / "completions")
        .and(warp::post())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::json())
        .map(move |auth: Option<String>, body: Value| {
            let _ = tx.send((auth, body));
            let mut res = warp::reply::with_status(warp::reply::json(&reply), status).into_response();
            if let Some(secs) = retry_after {
                res.headers_mut()
                    .insert("retry-after", HeaderValue::from_static(secs));
            }
            res
        });
    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (format!("http://{addr}/v1"), rx)
}

fn client(base_url: String, api_key: Option<&str>) -> ChatCompletionsClient {
    ChatCompletionsClient::new(&ProviderConfig {
        base_url,
        api_key: api_key.map(str::to_string),
        max_tokens: 512,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_completion_content_and_request_shape() {
    let (base, mut seen) = spawn_stub(
        StatusCode::OK,
        None,
        json!({ "choices": [{ "message": { "role": "assistant", "content": "function App() {}" } }] }),
    );
    let client = client(base, Some("sk-test"));

    let text = client.complete("build a tip calculator", "some/model").await.unwrap();
    assert_eq!(text, "function App() {}");

    let (auth, body) = seen.recv().await.unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "some/model");
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["messages"][0]["role"], "user");
    assert_eq!(body["messages"][0]["content"], "build a tip calculator");
}

#[tokio::test]
async fn test_no_choices_is_empty_text() {
    let (base, _seen) = spawn_stub(StatusCode::OK, None, json!({ "choices": [] }));
    let text = client(base, None).complete("p", "m").await.unwrap();
    assert_eq!(text, "");
}

#[tokio::test]
async fn test_blank_key_sends_no_authorization() {
    let (base, mut seen) = spawn_stub(StatusCode::OK, None, json!({ "choices": [] }));
    client(base, Some("")).complete("p", "m").await.unwrap();
    let (auth, _) = seen.recv().await.unwrap();
    assert_eq!(auth, None);
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let (base, _seen) = spawn_stub(
        StatusCode::TOO_MANY_REQUESTS,
        Some("7"),
        json!({ "error": "slow down" }),
    );
    let err = client(base, None).complete("p", "m").await.unwrap_err();
    assert_eq!(
        err,
        CollaboratorError::RateLimited {
            retry_after: Some(Duration::from_secs(7))
        }
    );
}

#[tokio::test]
async fn test_auth_and_server_errors() {
    let (base, _seen) = spawn_stub(StatusCode::UNAUTHORIZED, None, json!({ "error": "bad key" }));
    assert_eq!(
        client(base, Some("sk-bad")).complete("p", "m").await.unwrap_err(),
        CollaboratorError::Unauthenticated
    );

    let (base, _seen) = spawn_stub(StatusCode::BAD_GATEWAY, None, json!({ "error": "upstream" }));
    let err = client(base, None).complete("p", "m").await.unwrap_err();
    assert!(!err.is_terminal());
    assert!(matches!(err, CollaboratorError::Transient(ref msg) if msg.starts_with("HTTP 502")));
}

#[tokio::test]
async fn test_refused_connection_is_unavailable() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = client(format!("http://127.0.0.1:{port}/v1"), None)
        .complete("p", "m")
        .await
        .unwrap_err();
    assert!(matches!(err, CollaboratorError::Unavailable(_)), "{err:?}");
}
