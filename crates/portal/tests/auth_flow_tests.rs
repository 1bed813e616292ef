//! End-to-end auth flows against the full router.

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use chrono::Utc;
use portal::auth::TOKEN_TTL_SECS;
use portal_protocol::{ErrorBody, LoginRequest, LoginResponse, ProfileResponse, Role};

mod common;
use common::{demo_credentials, test_app_with_groups, token_for};

fn server() -> (TestServer, portal::api::AppState) {
    let (app, state) = test_app_with_groups();
    (TestServer::new(app).unwrap(), state)
}

#[tokio::test]
async fn test_login_then_profile_reproduces_identity() {
    let (server, _) = server();

    for role in [Role::Admin, Role::Faculty, Role::Student] {
        let (email, password) = demo_credentials(role);
        let response = server
            .post("/auth/login")
            .json(&LoginRequest::new(email, password))
            .await;
        response.assert_status_ok();

        let login: LoginResponse = response.json();
        assert!(login.success);
        assert_eq!(login.user.role, role);

        let profile: ProfileResponse = server
            .get("/auth/profile")
            .authorization_bearer(&login.token)
            .await
            .json();
        assert_eq!(profile.user, login.user);
    }
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let (server, _) = server();

    let unknown = server
        .post("/auth/login")
        .json(&LoginRequest::new("nobody@test.com", "student123"))
        .await;
    let wrong = server
        .post("/auth/login")
        .json(&LoginRequest::new("student@test.com", "wrong"))
        .await;

    unknown.assert_status(StatusCode::UNAUTHORIZED);
    wrong.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.text(), wrong.text());

    let body: ErrorBody = wrong.json();
    assert_eq!(body.error, "Invalid email or password");
}

#[tokio::test]
async fn test_every_gate_rejection_has_the_same_body() {
    let (server, state) = server();

    let student = state
        .auth
        .authenticate("student@test.com", "student123")
        .await
        .unwrap()
        .unwrap();
    let issued_long_ago = Utc::now().timestamp() - TOKEN_TTL_SECS - 60;
    let expired = state
        .auth
        .codec()
        .issue_at(&student, issued_long_ago)
        .unwrap();

    let missing = server.get("/auth/profile").await;
    let wrong_scheme = server
        .get("/auth/profile")
        .add_header(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"))
        .await;
    let garbage = server
        .get("/auth/profile")
        .authorization_bearer("not.a.token")
        .await;
    let expired = server
        .get("/auth/profile")
        .authorization_bearer(&expired)
        .await;

    let bodies = [missing, wrong_scheme, garbage, expired].map(|response| {
        response.assert_status_unauthorized();
        response.text()
    });
    assert!(bodies.iter().all(|body| body == &bodies[0]));

    let body: ErrorBody = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(body.error, "Authentication required");
    assert_eq!(body.code, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let (server, _) = server();

    let mut other = common::test_auth_config();
    other.jwt_secret = Some("a-completely-different-secret-of-enough-length".to_string());
    let other = common::test_state_with(other);
    let foreign = token_for(&other, Role::Admin).await;

    server
        .get("/admin/dashboard")
        .authorization_bearer(&foreign)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn test_role_groups() {
    let (server, state) = server();
    let admin = token_for(&state, Role::Admin).await;
    let faculty = token_for(&state, Role::Faculty).await;
    let student = token_for(&state, Role::Student).await;

    let cases = [
        ("/admin/dashboard", &admin, StatusCode::OK),
        ("/admin/dashboard", &faculty, StatusCode::FORBIDDEN),
        ("/admin/dashboard", &student, StatusCode::FORBIDDEN),
        ("/api/faculty/records", &admin, StatusCode::OK),
        ("/api/faculty/records", &faculty, StatusCode::OK),
        ("/api/faculty/records", &student, StatusCode::FORBIDDEN),
        ("/student/records", &admin, StatusCode::FORBIDDEN),
        ("/student/records", &faculty, StatusCode::FORBIDDEN),
        ("/student/records", &student, StatusCode::OK),
    ];

    for (path, token, expected) in cases {
        let response = server.get(path).authorization_bearer(token).await;
        assert_eq!(response.status_code(), expected, "{path}");

        if expected == StatusCode::FORBIDDEN {
            let body: ErrorBody = response.json();
            assert_eq!(body.error, "Insufficient permissions");
            assert_eq!(body.code, "FORBIDDEN");
        }
    }

    let response = server
        .get("/student/records")
        .authorization_bearer(&student)
        .await;
    assert_eq!(response.text(), "student@test.com");
}

#[tokio::test]
async fn test_role_groups_require_authentication() {
    let (server, _) = server();

    for path in ["/admin/dashboard", "/api/faculty/records", "/student/records"] {
        server.get(path).await.assert_status_unauthorized();
    }
}
