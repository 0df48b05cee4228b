#![cfg(feature = "web")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use climate_insights::app::{AppState, router};
use climate_insights::config::{Config, IdentityConfig};
use climate_insights::identity::LocalIdentityProvider;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const CSV: &str = "\
Year,CO2(ppm),Temperature(C),Rainfall(mm)
2000,400.0,0.80,1000.0
2001,410.0,1.00,950.0
2002,420.0,1.10,1020.0
";

struct Harness {
    app: Router,
    dir: TempDir,
}

fn harness(with_data: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("climate.csv");
    if with_data {
        fs::write(&data_path, CSV).unwrap();
    }

    let users_path = dir.path().join("users.json");
    let config = Config {
        data_path,
        feedback_path: dir.path().join("feedback.csv"),
        feed_interval: Duration::ZERO,
        identity: IdentityConfig::Local {
            users_path: users_path.clone(),
        },
        ..Config::default()
    };
    let provider = LocalIdentityProvider::new(users_path);
    provider.init_database().unwrap();

    let state = AppState::new(config, Arc::new(provider)).unwrap();
    Harness {
        app: router(Arc::new(state)),
        dir,
    }
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, form: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

fn session_cookie(response: &Response) -> String {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    value.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Register a fresh account and return the session cookie issued at sign-in
async fn signed_in(app: &Router) -> String {
    let response = app.clone().oneshot(get("/login", None)).await.unwrap();
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(post_form(
            "/login",
            Some(&cookie),
            "email=ada%40example.org&password=secret1&action=register",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard");
    session_cookie(&response)
}

#[tokio::test]
async fn anonymous_visitors_are_sent_to_login() {
    let h = harness(true);

    let response = h.app.clone().oneshot(get("/dashboard", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(session_cookie(&response).starts_with("session="));

    let response = h.app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(location(&response), "/dashboard");
}

#[tokio::test]
async fn failed_login_shows_the_message() {
    let h = harness(true);

    let response = h
        .app
        .clone()
        .oneshot(post_form("/login", None, "email=ghost%40example.org&password=nope123&action=login"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cookie = session_cookie(&response);
    assert!(body_text(response).await.contains("Invalid credentials"));

    let response = h.app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn login_issues_a_fresh_session_id() {
    let h = harness(true);

    let response = h.app.clone().oneshot(get("/login", None)).await.unwrap();
    let before = session_cookie(&response);

    let response = h
        .app
        .clone()
        .oneshot(post_form(
            "/login",
            Some(&before),
            "email=ada%40example.org&password=secret1&action=register",
        ))
        .await
        .unwrap();
    assert_eq!(location(&response), "/dashboard");
    let after = session_cookie(&response);
    assert!(after.starts_with("session="));
    assert_ne!(after, before);

    let response = h.app.clone().oneshot(get("/dashboard", Some(&after))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // the id handed out before sign-in no longer opens the dashboard
    let response = h.app.clone().oneshot(get("/dashboard", Some(&before))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn signed_in_users_navigate_by_page_name() {
    let h = harness(true);
    let cookie = signed_in(&h.app).await;

    let response = h.app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Quick Facts"));
    assert!(html.contains("420.0 ppm"));
    assert!(html.contains("ada@example.org"));

    let response = h
        .app
        .clone()
        .oneshot(get("/dashboard?page=Advanced%20Analytics", Some(&cookie)))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Correlation between numeric values"));

    // unknown names keep the current page
    let response = h
        .app
        .clone()
        .oneshot(get("/dashboard?page=Settings", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Correlation between numeric values"));
}

#[tokio::test]
async fn logout_returns_to_the_login_page() {
    let h = harness(true);
    let cookie = signed_in(&h.app).await;

    let response = h.app.clone().oneshot(post_form("/logout", Some(&cookie), "")).await.unwrap();
    assert_eq!(location(&response), "/login");

    let response = h.app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn missing_dataset_only_breaks_data_pages() {
    let h = harness(false);
    let cookie = signed_in(&h.app).await;

    let response = h.app.clone().oneshot(get("/dashboard", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("Data unavailable"));

    let response = h
        .app
        .clone()
        .oneshot(get("/dashboard?page=Feedback", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn feedback_form_appends_one_row() {
    let h = harness(true);
    let cookie = signed_in(&h.app).await;

    let response = h
        .app
        .clone()
        .oneshot(post_form(
            "/dashboard/feedback",
            Some(&cookie),
            "name=&email=ada%40example.org&rating=4&comments=",
        ))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Please fill name"));
    assert!(!h.dir.path().join("feedback.csv").exists());

    let response = h
        .app
        .clone()
        .oneshot(post_form(
            "/dashboard/feedback",
            Some(&cookie),
            "name=Ada&email=ada%40example.org&rating=4&comments=Lovely",
        ))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Feedback submitted!"));

    let written = fs::read_to_string(h.dir.path().join("feedback.csv")).unwrap();
    assert_eq!(written, "Ada,ada@example.org,4,Lovely\n");
}

#[tokio::test]
async fn feedback_rating_is_read_leniently() {
    let h = harness(true);
    let cookie = signed_in(&h.app).await;

    let response = h
        .app
        .clone()
        .oneshot(post_form(
            "/dashboard/feedback",
            Some(&cookie),
            "name=Ada&email=ada%40example.org&rating=abc&comments=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Rating must be a number"));
    assert!(!h.dir.path().join("feedback.csv").exists());

    let response = h
        .app
        .clone()
        .oneshot(post_form(
            "/dashboard/feedback",
            Some(&cookie),
            "name=Ada&email=ada%40example.org&rating=999&comments=",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Feedback submitted!"));

    let response = h
        .app
        .clone()
        .oneshot(post_form("/dashboard/feedback", Some(&cookie), "name=Bo&email=bo%40example.org"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let written = fs::read_to_string(h.dir.path().join("feedback.csv")).unwrap();
    assert_eq!(written, "Ada,ada@example.org,5,\nBo,bo@example.org,3,\n");
}

#[tokio::test]
async fn live_feed_streams_every_year() {
    let h = harness(true);

    let response = h.app.clone().oneshot(get("/api/live", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let cookie = signed_in(&h.app).await;
    let response = h.app.clone().oneshot(get("/api/live", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

    let body = body_text(response).await;
    let events: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("event:"))
        .map(str::trim)
        .collect();
    assert_eq!(events, ["frame", "frame", "frame", "done"]);
    assert!(body.contains("Year 2002 (3 of 3"));
}
