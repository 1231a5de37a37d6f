//! Route definitions for web server.

use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;

use super::api;
use crate::core::Assistant;

/// Create the API router.
pub fn create_api_router(max_concurrent_commands: usize) -> Router<Arc<Assistant>> {
    Router::new()
        .route(
            "/command",
            post(api::execute_command)
                .layer(ConcurrencyLimitLayer::new(max_concurrent_commands.max(1))),
        )
        .route("/settings", get(api::get_settings).put(api::update_settings))
        .route("/events", get(api::stream_events))
}

/// Create the full app router.
pub fn create_app_router(assistant: Arc<Assistant>, max_concurrent_commands: usize) -> Router {
    Router::new()
        .nest("/api", create_api_router(max_concurrent_commands))
        .route("/", get(index))
        .route("/health", get(health_check))
        .with_state(assistant)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Minimal command console.
async fn index(State(assistant): State<Arc<Assistant>>) -> Html<String> {
    let theme = assistant.settings().await.theme;
    let (background, foreground) = if theme == "dark" {
        ("#111827", "#f9fafb")
    } else {
        ("#ffffff", "#111827")
    };

    Html(format!(
        r#"<!doctype html>
<html data-theme="{theme}">
<head><meta charset="utf-8"><title>NeuroFusion</title>
<style>body{{background:{background};color:{foreground};font-family:sans-serif;max-width:40rem;margin:2rem auto}}#log{{white-space:pre-wrap}}</style>
</head>
<body>
<h1>NeuroFusion</h1>
<form id="f"><input id="c" autofocus size="50" placeholder="Type a command"><button>Send</button></form>
<div id="log"></div>
<script>
const log = document.getElementById('log');
document.getElementById('f').onsubmit = async (e) => {{
  e.preventDefault();
  const input = document.getElementById('c');
  const res = await fetch('/api/command', {{method: 'POST', headers: {{'Content-Type': 'application/json'}}, body: JSON.stringify({{command: input.value}})}});
  const body = await res.json();
  log.textContent = '> ' + input.value + '\n' + body.response + '\n\n' + log.textContent;
  input.value = '';
}};
</script>
</body>
</html>"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::config::Settings;
    use crate::platform::testing::{FakeLookup, FakePlatform};
    use crate::web::api::command::CommandResponse;
    use crate::web::api::settings::SettingsResponse;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let assistant = Arc::new(Assistant::new(
            Settings::default(),
            Capabilities::none(),
            Arc::new(FakePlatform::default()),
            Arc::new(FakeLookup::default()),
        ));
        create_app_router(assistant, 4)
    }

    fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"OK");
    }

    #[tokio::test]
    async fn command_endpoint_returns_text() {
        let response = app()
            .oneshot(json_request(
                "POST",
                "/api/command",
                r#"{"command": "calculate 2 + 2 * 3"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: CommandResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.response, "Result: 8");
    }

    #[tokio::test]
    async fn empty_command_is_invalid_not_an_error() {
        let response = app()
            .oneshot(json_request("POST", "/api/command", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: CommandResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.response, "Invalid command");
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request("PUT", "/api/settings", r#"{"theme": "dark"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/api/settings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body: SettingsResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(
            body,
            SettingsResponse {
                wake_word: "neuro".to_string(),
                theme: "dark".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let response = app()
            .oneshot(json_request("PUT", "/api/settings", r#"{"theme": "neon"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_reflects_theme() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains(r#"data-theme="light""#));
    }
}
