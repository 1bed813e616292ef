//! API route definitions.

use axum::http::{HeaderValue, Method, header};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use portal_protocol::routes;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{AllowedRoles, auth_middleware, require_role};

use super::handlers;
use super::state::AppState;

/// Route groups mounted behind the auth gate and a role gate.
///
/// Groups left unset are not mounted at all.
#[derive(Default)]
pub struct ProtectedRoutes {
    admin: Option<Router<AppState>>,
    faculty: Option<Router<AppState>>,
    student: Option<Router<AppState>>,
}

impl ProtectedRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes under `/admin`, admins only.
    pub fn admin(mut self, router: Router<AppState>) -> Self {
        self.admin = Some(router);
        self
    }

    /// Routes under `/api/faculty`, faculty and admins.
    pub fn faculty(mut self, router: Router<AppState>) -> Self {
        self.faculty = Some(router);
        self
    }

    /// Routes under `/student`, students only.
    pub fn student(mut self, router: Router<AppState>) -> Self {
        self.student = Some(router);
        self
    }

    fn into_groups(self) -> impl Iterator<Item = (&'static str, Router<AppState>, AllowedRoles)> {
        [
            (routes::ADMIN_GROUP, self.admin, AllowedRoles::ADMIN),
            (routes::FACULTY_GROUP, self.faculty, AllowedRoles::FACULTY),
            (routes::STUDENT_GROUP, self.student, AllowedRoles::STUDENT),
        ]
        .into_iter()
        .filter_map(|(mount, router, allowed)| router.map(|router| (mount, router, allowed)))
    }
}

/// Create the application router with no role-gated groups.
pub fn create_router(state: AppState) -> Router {
    create_router_with_routes(state, ProtectedRoutes::default())
}

/// Create the application router, mounting the given role-gated groups.
pub fn create_router_with_routes(state: AppState, protected: ProtectedRoutes) -> Router {
    // CORS configuration - use specific origins from config
    let cors = build_cors_layer(&state);

    // Tracing layer with request IDs and timing
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let auth_state = state.auth.clone();

    let mut public_routes = Router::new()
        .route(routes::HEALTH, get(handlers::health))
        .route(routes::LOGIN, post(handlers::login))
        .route(routes::LOGOUT, get(handlers::logout));

    if state.auth.exposes_test_accounts() {
        tracing::warn!("Test account listing is enabled");
        public_routes = public_routes.route(routes::TEST_ACCOUNTS, get(handlers::test_accounts));
    }

    // Protected routes (require authentication)
    let session_routes = Router::new()
        .route(routes::PROFILE, get(handlers::profile))
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            auth_middleware,
        ));

    let mut app = Router::new().merge(public_routes).merge(session_routes);

    // Role gate runs inside the auth gate, so layer it first.
    for (mount, group, allowed) in protected.into_groups() {
        let group = group
            .route_layer(middleware::from_fn_with_state(allowed, require_role))
            .route_layer(middleware::from_fn_with_state(
                auth_state.clone(),
                auth_middleware,
            ));
        app = app.nest(mount, group);
    }

    app.layer(trace_layer).layer(cors).with_state(state)
}

/// Build CORS layer from the configured origins.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins = state.auth.allowed_origins();

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::OPTIONS,
    ];

    let headers = [
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::ORIGIN,
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("CORS: Invalid origin in config: {}", origin);
                None
            })
        })
        .collect();

    if origins.is_empty() {
        tracing::warn!("CORS: No valid origins configured, denying all cross-origin requests");
        CorsLayer::new().allow_origin(AllowOrigin::exact(HeaderValue::from_static("null")))
    } else {
        tracing::info!("CORS: Allowing {} origin(s)", origins.len());
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(true)
    }
}
