use mediadash_client::{
    ApiClient, ApiConfig, FailureKind, HttpClient, SignupForm, TokenStore, UserPatch,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer, store: TokenStore) -> ApiClient {
    let config = ApiConfig::from_base_url(&server.uri()).unwrap();
    ApiClient::new(HttpClient::new(config, store).unwrap())
}

async fn forbid_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/refresh-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_persists_session_and_authenticates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "ada@example.com", "userName": "ada" },
            "tokens": { "accessToken": "a1", "refreshToken": "r1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = TokenStore::in_memory();
    let api = api_for(&server, store.clone());
    assert!(!api.auth.is_authenticated());

    let response = api.auth.login("ada@example.com", "hunter2").await.unwrap();

    assert_eq!(response.user.user_name, "ada");
    let credentials = store.credentials();
    assert_eq!(credentials.access_token.as_deref(), Some("a1"));
    assert_eq!(credentials.refresh_token.as_deref(), Some("r1"));
    assert_eq!(store.user(), Some(response.user.clone()));
    assert!(api.auth.is_authenticated());
}

#[tokio::test]
async fn rejected_login_reports_backend_message_without_refreshing() {
    let server = MockServer::start().await;
    forbid_refresh(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let err = api.auth.login("ada@example.com", "wrong").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Unauthorized);
    assert_eq!(err.message, "Invalid credentials");
    assert!(!api.auth.is_authenticated());
}

#[tokio::test]
async fn login_without_backend_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let err = api.auth.login("ada@example.com", "pw").await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(502));
    assert_eq!(err.message, "Login failed");
}

#[tokio::test]
async fn signup_with_success_false_fails_with_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "fullName": "Ada Lovelace",
            "password": "pw"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": false, "message": "Email exists" })),
        )
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let err = api
        .auth
        .signup("ada@example.com", "Ada Lovelace", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Backend);
    assert_eq!(err.message, "Email exists");
}

#[tokio::test]
async fn rejected_signup_is_not_retried_through_refresh() {
    let server = MockServer::start().await;
    forbid_refresh(&server).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Not allowed" })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let err = api
        .auth
        .signup("ada@example.com", "Ada Lovelace", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.kind, FailureKind::Unauthorized);
    assert_eq!(err.message, "Not allowed");
}

#[tokio::test]
async fn signup_without_success_flag_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "userId": "u9" })))
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let err = api
        .auth
        .signup("ada@example.com", "Ada Lovelace", "pw")
        .await
        .unwrap_err();

    assert_eq!(err.message, "Registration failed");
}

#[tokio::test]
async fn signup_success_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({ "success": true, "message": "Account created" })),
        )
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let response = api
        .auth
        .signup("ada@example.com", "Ada Lovelace", "pw")
        .await
        .unwrap();

    assert_eq!(response.success, Some(true));
    assert_eq!(response.message.as_deref(), Some("Account created"));
}

#[tokio::test]
async fn mismatched_passwords_fail_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/signup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    let form = SignupForm {
        email: "ada@example.com".into(),
        full_name: "Ada Lovelace".into(),
        password: "one".into(),
        confirm_password: "two".into(),
    };
    let err = api.auth.signup_checked(&form).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Validation);
    assert_eq!(err.message, "Passwords do not match");
}

#[tokio::test]
async fn logout_clears_local_session_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "ada@example.com", "userName": "ada" },
            "tokens": { "accessToken": "a1", "refreshToken": "r1" }
        })))
        .mount(&server)
        .await;

    let store = TokenStore::in_memory();
    let api = api_for(&server, store.clone());
    api.auth.login("ada@example.com", "pw").await.unwrap();

    api.auth.logout().unwrap();

    assert!(!api.auth.is_authenticated());
    assert_eq!(store.credentials(), Default::default());
    assert_eq!(store.user(), None);
    // Only the login call reached the backend.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_user_merges_into_stored_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": "u1", "email": "ada@example.com", "userName": "ada" },
            "tokens": { "accessToken": "a1", "refreshToken": "r1" }
        })))
        .mount(&server)
        .await;

    let api = api_for(&server, TokenStore::in_memory());
    assert_eq!(api.auth.update_user(UserPatch::default()).unwrap(), None);

    api.auth.login("ada@example.com", "pw").await.unwrap();
    let updated = api
        .auth
        .update_user(UserPatch {
            user_name: Some("countess".into()),
            ..UserPatch::default()
        })
        .unwrap()
        .unwrap();

    assert_eq!(updated.user_name, "countess");
    assert_eq!(updated.email, "ada@example.com");
    assert_eq!(api.auth.current_user(), Some(updated));
}
