//! Test utilities: a real portal server on an ephemeral port.
#![allow(dead_code, clippy::field_reassign_with_default)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{Json, Router, routing::get};
use portal::api::{self, AppState, ProtectedRoutes};
use portal::auth::{AuthConfig, AuthState, CurrentUser};
use portal_client::{ApiClient, Navigator, SessionStore, TokenStorage};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const SECRET: &str = "client-test-secret-with-at-least-32-characters";
pub const OTHER_SECRET: &str = "a-second-server-signing-with-another-secret";

pub fn auth_config(secret: &str) -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt_secret = Some(secret.to_string());
    config.seed_demo_accounts = true;
    config.expose_test_accounts = true;
    config.bcrypt_cost = 4;
    config
}

async fn records(user: CurrentUser) -> Json<Value> {
    Json(json!({"owner": user.email()}))
}

/// A running server and the state behind it.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
}

pub async fn spawn_server_with(config: AuthConfig) -> TestServer {
    let state = AppState::new(AuthState::from_config(config).unwrap());
    let routes = ProtectedRoutes::new()
        .admin(Router::new().route("/records", get(records)))
        .faculty(Router::new().route("/records", get(records)))
        .student(Router::new().route("/records", get(records)));
    let app = api::create_router_with_routes(state.clone(), routes);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}"),
        state,
    }
}

/// Serve an arbitrary router; returns its base URL.
pub async fn spawn_router(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub async fn spawn_server(secret: &str) -> TestServer {
    spawn_server_with(auth_config(secret)).await
}

/// Client that ignores proxy settings from the environment.
pub fn client_for(server: &TestServer) -> Arc<ApiClient> {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    Arc::new(ApiClient::with_http(&server.base_url, http))
}

/// Navigator that counts how often it was asked to show the login page.
#[derive(Default)]
pub struct CountingNavigator {
    calls: AtomicUsize,
}

impl CountingNavigator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Navigator for CountingNavigator {
    fn to_login(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

pub async fn open_store(
    server: &TestServer,
    storage: Arc<dyn TokenStorage>,
) -> (Arc<SessionStore>, Arc<CountingNavigator>) {
    let navigator = Arc::new(CountingNavigator::default());
    let store = SessionStore::open(client_for(server), storage, navigator.clone()).await;
    (store, navigator)
}
