use appforge_core::{AppStore, InMemoryAppStore, NewApp};
use appforge_generation::{CollaboratorError, GenerationConfig, Orchestrator};
use appforge_sandbox::SandboxConfig;
use appforge_service::{routes, ServiceState};
use appforge_test_utils::{
    tip_calculator_with_import, valid_artifact, ScriptedGenerator, PARSE_FAILURES, TIP_CALCULATOR,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;

fn state_with(generator: ScriptedGenerator) -> (ServiceState, Arc<InMemoryAppStore>) {
    let store = Arc::new(InMemoryAppStore::new());
    let config = GenerationConfig::default().with_retry_delay(Duration::ZERO);
    let orchestrator = Orchestrator::new(Arc::new(generator), config);
    let state = ServiceState::new(orchestrator, store.clone(), &SandboxConfig::default()).unwrap();
    (state, store)
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn tip_body() -> Value {
    json!({ "description": "a tip calculator", "category": "Finance", "price": 0.75 })
}

#[tokio::test]
async fn test_generate_app_returns_code_and_attempts() {
    let (state, _) = state_with(
        ScriptedGenerator::new()
            .then_text(tip_calculator_with_import())
            .then_text(TIP_CALCULATOR),
    );
    let api = routes(state);

    let res = warp::test::request()
        .method("POST")
        .path("/api/generate-app")
        .json(&tip_body())
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res.body());
    assert_eq!(body["success"], true);
    assert_eq!(body["attempts"], 2);
    assert_eq!(body["code"], TIP_CALCULATOR.trim());
}

#[tokio::test]
async fn test_generate_app_rejects_bad_input_without_calling_model() {
    let generator = Arc::new(ScriptedGenerator::new().then_text(TIP_CALCULATOR));
    let store = Arc::new(InMemoryAppStore::new());
    let orchestrator = Orchestrator::new(generator.clone(), GenerationConfig::default());
    let api = routes(ServiceState::new(orchestrator, store, &SandboxConfig::default()).unwrap());

    let cases = [
        (json!({ "description": "  ", "category": "Finance", "price": 1.0 }), "Description"),
        (json!({ "description": "tips", "category": "", "price": 1.0 }), "Category"),
        (json!({ "description": "tips", "category": "Finance", "price": 11.0 }), "Price"),
        (json!({ "description": "tips", "category": "Finance" }), "Price"),
    ];
    for (body, field) in cases {
        let res = warp::test::request()
            .method("POST")
            .path("/api/generate-app")
            .json(&body)
            .reply(&api)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let message = body_json(res.body())["message"].as_str().unwrap().to_string();
        assert!(message.starts_with(field), "{message}");
    }
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_generate_app_maps_terminal_errors() {
    let cases = [
        (CollaboratorError::Unavailable("HTTP 503".into()), StatusCode::SERVICE_UNAVAILABLE),
        (CollaboratorError::Unauthenticated, StatusCode::INTERNAL_SERVER_ERROR),
        (
            CollaboratorError::RateLimited {
                retry_after: Some(Duration::from_secs(30)),
            },
            StatusCode::TOO_MANY_REQUESTS,
        ),
    ];
    for (error, status) in cases {
        let (state, _) = state_with(ScriptedGenerator::new().then_error(error));
        let res = warp::test::request()
            .method("POST")
            .path("/api/generate-app")
            .json(&tip_body())
            .reply(&routes(state))
            .await;

        assert_eq!(res.status(), status);
        let message = body_json(res.body())["message"].as_str().unwrap().to_string();
        assert!(!message.is_empty());
        assert!(!message.to_lowercase().contains("bearer"));
        if status == StatusCode::TOO_MANY_REQUESTS {
            assert_eq!(res.headers()["retry-after"], "30");
        }
    }
}

#[tokio::test]
async fn test_generate_app_exhausted_is_bad_gateway() {
    let (state, _) = state_with(
        ScriptedGenerator::new()
            .then_text(PARSE_FAILURES[0])
            .then_text(PARSE_FAILURES[1])
            .then_text(PARSE_FAILURES[2]),
    );

    let res = warp::test::request()
        .method("POST")
        .path("/api/generate-app")
        .json(&tip_body())
        .reply(&routes(state))
        .await;

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    let message = body_json(res.body())["message"].as_str().unwrap().to_string();
    assert!(message.contains("after 3 attempts"), "{message}");
}

#[tokio::test]
async fn test_create_app_revalidates_code() {
    let (state, store) = state_with(ScriptedGenerator::new());
    let api = routes(state);

    let res = warp::test::request()
        .method("POST")
        .path("/api/apps")
        .json(&json!({
            "name": "Tips",
            "description": "Splits a bill",
            "category": "Finance",
            "price": 0.75,
            "code": tip_calculator_with_import(),
        }))
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res.body());
    assert_eq!(body["message"], "Invalid app data");
    assert!(body["reason"].as_str().unwrap().contains("import"));
    assert!(store.is_empty());

    let res = warp::test::request()
        .method("POST")
        .path("/api/apps")
        .json(&json!({
            "name": "Tips",
            "description": "Splits a bill",
            "category": "Finance",
            "price": 0.75,
            "code": TIP_CALCULATOR,
        }))
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res.body());
    assert_eq!(body["status"], "draft");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_list_get_patch_delete() {
    let (state, store) = state_with(ScriptedGenerator::new());
    let api = routes(state);
    let app = store
        .create(
            NewApp {
                name: "Tips".into(),
                description: "Splits a bill".into(),
                category: "Finance".into(),
                price: 0.75,
                thumbnail: None,
            },
            &valid_artifact(),
        )
        .await
        .unwrap();

    let res = warp::test::request().path("/api/apps").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    let list = body_json(res.body());
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert!(list[0].get("code").is_none());

    let path = format!("/api/apps/{}", app.id);
    let res = warp::test::request().path(&path).reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res.body())["code"], valid_artifact().source());

    let res = warp::test::request()
        .method("PATCH")
        .path(&path)
        .json(&json!({ "status": "deployed", "deploymentTxId": "tx-9" }))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res.body())["deploymentTxId"], "tx-9");

    let res = warp::test::request().method("DELETE").path(&path).reply(&api).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = warp::test::request().path(&path).reply(&api).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res.body())["message"], "App not found");
}

#[tokio::test]
async fn test_runtime_document_is_sandboxed() {
    let (state, store) = state_with(ScriptedGenerator::new());
    let api = routes(state);
    let app = store
        .create(
            NewApp {
                name: "Tip <Calculator>".into(),
                description: "Splits a bill".into(),
                category: "Finance".into(),
                price: 0.75,
                thumbnail: None,
            },
            &valid_artifact(),
        )
        .await
        .unwrap();

    let res = warp::test::request()
        .path(&format!("/api/apps/{}/runtime?generation=7", app.id))
        .reply(&api)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-security-policy"], "sandbox allow-scripts");
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = std::str::from_utf8(res.body()).unwrap();
    assert!(html.contains("<title>Tip &lt;Calculator&gt;</title>"));
    assert!(html.contains("\"generation\":7,"));

    let res = warp::test::request()
        .path(&format!("/api/apps/{}/runtime?generation=0", app.id))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route_and_bad_body() {
    let (state, _) = state_with(ScriptedGenerator::new());
    let api = routes(state);

    let res = warp::test::request().path("/api/nope").reply(&api).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = warp::test::request()
        .method("POST")
        .path("/api/generate-app")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res.body())["message"], "Invalid request body");
}
