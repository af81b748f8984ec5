use axum::body::Body;
use axum::http::{Request, StatusCode};
use imageocr_gateway::server::{router, AppState};
use imageocr_gateway::{Gateway, GatewayConfig, OcrCommands, StaticCredentials};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer, cooldown: Duration) -> axum::Router {
    let config = GatewayConfig {
        free_ocr_url: server.uri(),
        ocr_space_url: server.uri(),
        ocr_space_api_key: "test-key".to_string(),
        vision_url: server.uri(),
        request_timeout: Duration::from_secs(2),
    };
    let gateway = Gateway::new(config, Arc::new(StaticCredentials::new())).unwrap();
    let commands = OcrCommands::new(Arc::new(gateway), cooldown, 2000);

    router(AppState {
        commands: Arc::new(commands),
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let response = app(&server, Duration::ZERO)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_info_reports_missing_vision_key() {
    let server = MockServer::start().await;
    let response = app(&server, Duration::from_secs(5))
        .oneshot(Request::builder().uri("/info").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["vision_configured"], false);
    assert_eq!(json["cooldown_secs"], 5);
    assert_eq!(json["commands"], json!(["freeocr", "ocr"]));
}

#[tokio::test]
async fn test_freeocr_uses_history_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ocr/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "textAnnotations": [{"description": "hello"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server, Duration::ZERO)
        .oneshot(post_json(
            "/commands/freeocr",
            json!({
                "user_id": "1",
                "history_images": ["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"]
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"]["kind"], "pages");
    assert_eq!(json["reply"]["pages"], json!(["```\nhello\n```"]));
}

#[tokio::test]
async fn test_ocr_without_images_replies_with_notice() {
    let server = MockServer::start().await;
    let response = app(&server, Duration::ZERO)
        .oneshot(post_json(
            "/commands/ocr",
            json!({"user_id": "1", "detect_handwriting": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"]["kind"], "message");
    assert_eq!(
        json["reply"]["content"],
        "No images or direct image links were detected. 😢"
    );
}

#[tokio::test]
async fn test_malformed_request_is_rejected() {
    let server = MockServer::start().await;
    let response = app(&server, Duration::ZERO)
        .oneshot(post_json("/commands/freeocr", json!({"image": "https://x/y.png"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_second_call_hits_cooldown() {
    let server = MockServer::start().await;
    let app = app(&server, Duration::from_secs(5));
    let request = json!({"user_id": "7"});

    let first = app
        .clone()
        .oneshot(post_json("/commands/freeocr", request.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json("/commands/freeocr", request))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let json = body_json(second).await;
    assert!(json["reply"]["content"]
        .as_str()
        .unwrap()
        .starts_with("This command is on cooldown."));
}

#[tokio::test]
async fn test_reply_images_win_over_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/ocr/image"))
        .and(query_param("url", "https://cdn.example.com/replied.png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "textAnnotations": [{"description": "from the reply"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = app(&server, Duration::ZERO)
        .oneshot(post_json(
            "/commands/freeocr",
            json!({
                "user_id": "1",
                "reply_to": "1187",
                "reply_images": ["https://cdn.example.com/replied.png"],
                "history_images": ["https://cdn.example.com/older.png"]
            }),
        ))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["reply"]["pages"], json!(["```\nfrom the reply\n```"]));
}
