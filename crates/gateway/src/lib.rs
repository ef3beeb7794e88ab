//! Webhook gateway for threadwise.
//!
//! [`InvocationHandler`] does the work for one `{headers, body}` call;
//! [`build_router`] exposes it over HTTP for a long-running deployment.
//!
//! Built on Axum.

pub mod factory;
pub mod invocation;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use tracing::info;

pub use factory::{ClientFactory, Collaborators, LiveClientFactory};
pub use invocation::{InvocationEvent, InvocationHandler, InvocationResponse, RETRY_NUM_HEADER};

type SharedHandler = Arc<InvocationHandler>;

/// Build the Axum router with all gateway routes.
pub fn build_router(handler: SharedHandler) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack/events", post(events_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(handler)
}

/// Start the gateway HTTP server.
pub async fn start(handler: InvocationHandler) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!(
        "{}:{}",
        handler.config().gateway.host,
        handler.config().gateway.port
    );
    let app = build_router(Arc::new(handler));

    info!(addr = %addr, "Gateway listening on /slack/events");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn events_handler(
    State(handler): State<SharedHandler>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();

    let response = handler.handle(InvocationEvent::new(headers, body)).await;
    into_http(response)
}

fn into_http(response: InvocationResponse) -> Response {
    let status = StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::OK);
    if response.body.is_empty() {
        status.into_response()
    } else {
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            response.body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use threadwise_config::{AppConfig, EnvSecretStore};
    use threadwise_tools::ChecklistRegistry;
    use tower::ServiceExt;

    fn test_handler() -> SharedHandler {
        Arc::new(InvocationHandler::new(
            AppConfig::default(),
            "system".into(),
            ChecklistRegistry::builtin().unwrap(),
            Arc::new(EnvSecretStore::with_lookup(|_| None)),
            Arc::new(LiveClientFactory),
        ))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_handler());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn retry_over_http() {
        let app = build_router(test_handler());

        let req = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("X-Slack-Retry-Num", "1")
            .header("X-Slack-Retry-Reason", "http_timeout")
            .body(Body::from("{}"))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["message"], "No need to resend");
    }

    #[tokio::test]
    async fn challenge_over_http() {
        let app = build_router(test_handler());

        let req = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .header("Content-Type", "application/json")
            .body(Body::from(
                r#"{"type":"url_verification","challenge":"xyz","token":"t"}"#,
            ))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["challenge"], "xyz");
    }

    #[tokio::test]
    async fn unavailable_secret_still_returns_200() {
        let app = build_router(test_handler());

        let req = Request::builder()
            .method("POST")
            .uri("/slack/events")
            .body(Body::from(
                r#"{"type":"event_callback","event":{"type":"message","text":"hi","channel":"C1","ts":"1.0"}}"#,
            ))
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
