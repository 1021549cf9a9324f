//! Router construction and the in-process server handle.

use std::net::SocketAddr;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::{MockConfig, MockState};

/// Build the mock service router.
pub fn router(state: MockState) -> Router {
    let authenticated = Router::new()
        .route(
            "/memberships",
            get(api::list_memberships).post(api::create_membership),
        )
        .route(
            "/memberships/:id",
            get(api::get_membership)
                .put(api::update_membership)
                .delete(api::delete_membership),
        )
        .route("/rooms", post(api::create_room))
        .route("/people", post(api::create_person))
        .route("/people/me", get(api::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_token,
        ));

    Router::new()
        .route("/health", get(api::health))
        .merge(authenticated)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A mock service running on a background task.
///
/// The server stops when the handle is dropped.
pub struct MockServer {
    addr: SocketAddr,
    state: MockState,
    task: JoinHandle<()>,
}

impl MockServer {
    /// Start on a free loopback port with default settings.
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(MockConfig {
            port: 0,
            ..MockConfig::default()
        })
        .await
    }

    /// Start on loopback with `config` (`port: 0` picks a free port).
    ///
    /// An invalid `self_email` fails with [`std::io::ErrorKind::InvalidInput`].
    pub async fn start_with(config: MockConfig) -> std::io::Result<Self> {
        let state = MockState::new(config)?;
        let listener = TcpListener::bind(("127.0.0.1", state.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = router(state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock server stopped");
            }
        });

        tracing::info!(%addr, "Mock server listening");
        Ok(Self { addr, state, task })
    }

    /// Address the server listens on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL to point an SDK client at.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Bearer token the server accepts.
    pub fn access_token(&self) -> &str {
        &self.state.config.access_token
    }

    /// Direct access to the service state, for fixtures and assertions.
    pub fn state(&self) -> &MockState {
        &self.state
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let server = MockServer::start().await.unwrap();
        let resp = reqwest::get(format!("{}/health", server.base_url()))
            .await
            .unwrap();
        assert!(resp.status().is_success());
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_start_with_invalid_self_email_fails() {
        let err = MockServer::start_with(MockConfig {
            port: 0,
            self_email: "not-an-email".into(),
            ..MockConfig::default()
        })
        .await
        .err()
        .unwrap();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_memberships_require_token() {
        let server = MockServer::start().await.unwrap();
        let resp = reqwest::get(format!("{}/memberships", server.base_url()))
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body: Value = resp.json().await.unwrap();
        assert!(body["trackingId"].as_str().unwrap().starts_with("MOCK_"));
    }

    #[tokio::test]
    async fn test_membership_round_trip_over_http() {
        let server = MockServer::start().await.unwrap();
        let room = server.state().create_room("r").unwrap();
        let other = server
            .state()
            .create_person("other@example.com", None)
            .unwrap();
        let client = reqwest::Client::new();
        let auth = format!("Bearer {}", server.access_token());

        let created: Value = client
            .post(format!("{}/memberships", server.base_url()))
            .header("Authorization", &auth)
            .json(&json!({ "roomId": room.id, "personId": other.id }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(created["personEmail"], "other@example.com");
        assert_eq!(created["isModerator"], false);
        assert_eq!(created["isMonitor"], false);

        let id = created["id"].as_str().unwrap();
        let resp = client
            .delete(format!("{}/memberships/{}", server.base_url(), id))
            .header("Authorization", &auth)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 204);

        let resp = client
            .get(format!("{}/memberships/{}", server.base_url(), id))
            .header("Authorization", &auth)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_create_requires_exactly_one_selector() {
        let server = MockServer::start().await.unwrap();
        let room = server.state().create_room("r").unwrap();
        let client = reqwest::Client::new();
        let auth = format!("Bearer {}", server.access_token());

        for body in [
            json!({ "roomId": room.id }),
            json!({ "roomId": room.id, "personId": server.state().self_id, "personEmail": "a@a.com" }),
        ] {
            let resp = client
                .post(format!("{}/memberships", server.base_url()))
                .header("Authorization", &auth)
                .json(&body)
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 400);
        }
    }
}
