#![cfg(feature = "web")]

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use climate_insights::auth::AuthGate;
use climate_insights::identity::{FirebaseIdentityProvider, IdentityProvider};
use climate_insights::session::SessionState;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Stand-in for the Identity Toolkit: one known account, everything else fails
async fn identity_toolkit(uri: Uri, Json(body): Json<Value>) -> axum::response::Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default();
    let error = |message: &str| {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": { "code": 400, "message": message } }))).into_response()
    };

    match uri.path() {
        "/accounts:signInWithPassword" if email == "ada@example.org" && password == "secret1" => {
            Json(json!({ "idToken": "id-token", "email": email })).into_response()
        }
        "/accounts:signInWithPassword" => error("INVALID_LOGIN_CREDENTIALS"),
        "/accounts:signUp" if email == "ada@example.org" => error("EMAIL_EXISTS"),
        "/accounts:signUp" => Json(json!({ "idToken": "new-token", "email": email })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn mock_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().fallback(identity_toolkit))
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn sign_in_returns_the_token() {
    let provider = FirebaseIdentityProvider::with_base_url("test-key", mock_server().await);
    let user = provider.sign_in("ada@example.org", "secret1").await.unwrap();
    assert_eq!(user.email, "ada@example.org");
    assert_eq!(user.token, "id-token");
    assert_eq!(provider.name(), "firebase");
}

#[tokio::test]
async fn provider_messages_are_passed_through() {
    let gate = AuthGate::new(Arc::new(FirebaseIdentityProvider::with_base_url(
        "test-key",
        mock_server().await,
    )));
    let mut session = SessionState::default();

    let err = gate
        .login(&mut session, "ada@example.org", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "INVALID_LOGIN_CREDENTIALS");
    assert!(!session.authenticated);

    let err = gate
        .register(&mut session, "ada@example.org", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "EMAIL_EXISTS");

    gate.register(&mut session, "grace@example.org", "secret1")
        .await
        .unwrap();
    assert!(session.authenticated);
    assert_eq!(session.user.map(|u| u.token), Some("new-token".to_string()));
}
