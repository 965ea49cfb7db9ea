use std::net::SocketAddr;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::state::{PrintState, RelayState};
use crate::{print, relay};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn build_relay_app(state: RelayState) -> Router {
    with_tracing(
        Router::new()
            .merge(relay::router())
            .route("/health", get(health))
            .with_state(state),
    )
}

pub fn build_print_app(state: PrintState) -> Router {
    with_tracing(
        Router::new()
            .merge(print::router())
            .route("/health", get(health))
            .with_state(state),
    )
}

fn with_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
            })
            .on_response(
                |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    let latency_ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(%status, latency_ms, "response");
                    } else {
                        tracing::info!(%status, latency_ms, "response");
                    }
                },
            ),
    )
}

/// `RUST_LOG` filter, JSON lines when `LOG_FORMAT=json`.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "shopdesk=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::print::{spooler::fake::FakeSpooler, testing::TemplateDir};
    use crate::relay::services::fake::FakePortal;

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn relay_app_routes() {
        let portal = Arc::new(FakePortal::with_login(json!({ "token": "t" })));
        let app = build_relay_app(RelayState::fake(portal));

        let (status, body) = send(app.clone(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));

        let (status, body) = send(app.clone(), post_json("/attendance", json!({ "pin": 123456 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));

        let (status, body) = send(app, post_json("/profile", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "Invalid PIN" }));
    }

    #[tokio::test]
    async fn print_app_routes() {
        let dirs = TemplateDir::new();
        let spooler = Arc::new(FakeSpooler {
            printers: vec!["Samsung M2020 Series".into()],
            ..Default::default()
        });
        let app = build_print_app(PrintState::fake(spooler, &dirs));

        let (status, body) = send(app.clone(), Request::get("/printers").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "printers": ["Samsung M2020 Series"] }));

        let (status, body) = send(app, post_json("/print", json!({ "time": "2024/03/05 10:00" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required invoice data" }));
    }

    #[tokio::test]
    async fn bodies_without_json_content_type_keep_json_errors() {
        let portal = Arc::new(FakePortal::with_login(json!({ "token": "t" })));
        let relay = build_relay_app(RelayState::fake(portal.clone()));
        let req = Request::post("/attendance").body(Body::from(r#"{"pin":"123456"}"#)).unwrap();
        let (status, body) = send(relay.clone(), req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "Invalid PIN" }));

        let req = Request::post("/profile")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(relay, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "message": "Invalid PIN" }));
        assert_eq!(portal.logins(), 0);

        let dirs = TemplateDir::new();
        let app = build_print_app(PrintState::fake(Arc::new(FakeSpooler::default()), &dirs));
        let req = Request::post("/print").body(Body::from("metal=gold")).unwrap();
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing required invoice data" }));
    }
}
