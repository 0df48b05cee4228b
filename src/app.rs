use axum::{
    Extension, Form, Router,
    extract::{Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{
        Html, IntoResponse, Redirect, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use futures_util::stream::{self, Stream, StreamExt};
use handlebars::Handlebars;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::auth::{AuthAction, AuthGate};
use crate::config::{Config, IdentityConfig};
use crate::dataset::{Dataset, load_dataset};
use crate::error::{DashboardError, Result};
use crate::feed::LiveFeed;
use crate::feedback::FeedbackSubmission;
use crate::identity::{FirebaseIdentityProvider, IdentityProvider, LocalIdentityProvider};
use crate::pages::{Page, PageRegistry, RenderContext, frame_html};
use crate::session::{SessionState, SessionStore};
use crate::templates::build_templates;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

const SESSION_EXPIRED: &str = "Your session expired, please sign in again";

/// How often expired sessions are swept out
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Shared state of the web server
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub gate: AuthGate,
    pub registry: PageRegistry,
    pub templates: Handlebars<'static>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn IdentityProvider>) -> Result<Self> {
        Ok(Self {
            sessions: SessionStore::new(config.session_ttl),
            gate: AuthGate::new(provider),
            registry: PageRegistry::standard(&config),
            templates: build_templates()?,
            config,
        })
    }

    /// Build the state with the identity provider named in the config
    pub fn from_config(config: Config) -> Result<Self> {
        let provider: Arc<dyn IdentityProvider> = match &config.identity {
            IdentityConfig::Local { users_path } => {
                let local = LocalIdentityProvider::new(users_path.clone());
                local.init_database().map_err(|e| {
                    DashboardError::Config(format!("cannot create {}: {}", users_path.display(), e))
                })?;
                Arc::new(local)
            }
            IdentityConfig::Firebase { api_key } => Arc::new(FirebaseIdentityProvider::new(api_key.clone())),
        };
        log::info!("Using {} identity provider", provider.name());
        Self::new(config, provider)
    }

    /// Replace the page registry
    pub fn with_registry(mut self, registry: PageRegistry) -> Self {
        self.registry = registry;
        self
    }
}

/// Id of the session attached to the current request
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    action: String,
}

#[derive(Deserialize)]
struct LoginQuery {
    mode: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .route("/login", get(serve_login).post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/dashboard", get(serve_dashboard))
        .route("/dashboard/feedback", post(submit_feedback))
        .route("/api/live", get(live_feed))
        .nest_service("/static", ServeDir::new("static"))
        .layer(middleware::from_fn_with_state(state.clone(), attach_session))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::from_config(config)?);

    let sweeper = Arc::clone(&state);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sweeper.sessions.purge_expired();
            if purged > 0 {
                log::debug!("Purged {} expired sessions", purged);
            }
        }
    });

    let listener = TcpListener::bind(&state.config.bind_addr).await?;
    log::info!("Listening on http://{}", state.config.bind_addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Make sure every request carries a live session
///
/// Requests without a valid `session` cookie get a fresh anonymous session
/// and the cookie is set on the response.
async fn attach_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|id| state.sessions.contains(id));

    let (session_id, fresh) = match existing {
        Some(id) => (id, false),
        None => (state.sessions.create(), true),
    };
    request.extensions_mut().insert(SessionId(session_id.clone()));

    let response = next.run(request).await;
    // a handler that rotated the session has already set the cookie
    if !fresh || sets_session_cookie(&response) {
        return response;
    }

    (jar.add(session_cookie(session_id)), response).into_response()
}

fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .build()
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", SESSION_COOKIE);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|value| value.to_str().is_ok_and(|v| v.starts_with(&prefix)))
}

/// Session of the request, if it has passed the gate
fn authenticated(state: &AppState, session_id: &str) -> Option<SessionState> {
    state.sessions.get(session_id).filter(|s| s.authenticated)
}

async fn serve_login(
    State(state): State<Arc<AppState>>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    Query(query): Query<LoginQuery>,
) -> Response {
    if authenticated(&state, &session_id).is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    let register = query.mode.as_deref() == Some("register");
    render_login(&state, StatusCode::OK, register, "", None)
}

async fn handle_login(
    State(state): State<Arc<AppState>>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let mut session = state.sessions.get(&session_id).unwrap_or_default();
    let action = AuthAction::from_name(&form.action);

    match state
        .gate
        .authenticate(&mut session, action, &form.email, &form.password)
        .await
    {
        Ok(()) => {
            // never promote the pre-login id
            match state.sessions.rotate(&session_id, session) {
                Some(new_id) => (jar.add(session_cookie(new_id)), Redirect::to("/dashboard")).into_response(),
                None => {
                    log::warn!("Session expired while {} was signing in", form.email);
                    render_login(
                        &state,
                        StatusCode::UNAUTHORIZED,
                        action == AuthAction::Register,
                        &form.email,
                        Some(SESSION_EXPIRED.to_string()),
                    )
                }
            }
        }
        Err(e) => {
            let status = match action {
                AuthAction::Login => StatusCode::UNAUTHORIZED,
                AuthAction::Register => StatusCode::BAD_REQUEST,
            };
            render_login(
                &state,
                status,
                action == AuthAction::Register,
                &form.email,
                Some(e.to_string()),
            )
        }
    }
}

async fn handle_logout(
    State(state): State<Arc<AppState>>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Redirect {
    let mut session = state.sessions.get(&session_id).unwrap_or_default();
    state.gate.logout(&mut session);
    state.sessions.put(&session_id, session);

    Redirect::to("/login")
}

async fn serve_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(mut session) = authenticated(&state, &session_id) else {
        return Redirect::to("/login").into_response();
    };

    if let Some(name) = params.get("page") {
        if session.select_page(name).is_none() {
            log::debug!("Ignoring unknown page {:?}", name);
        }
    }
    state.sessions.put(&session_id, session.clone());

    render_dashboard(&state, &session, &params, None)
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    Form(entry): Form<FeedbackSubmission>,
) -> Response {
    let Some(mut session) = authenticated(&state, &session_id) else {
        return Redirect::to("/login").into_response();
    };

    session.current_page = Page::Feedback;
    state.sessions.put(&session_id, session.clone());

    render_dashboard(&state, &session, &HashMap::new(), Some(entry))
}

/// Stream the live feed as server-sent events
///
/// Closing the connection drops the stream, which cancels the feed.
async fn live_feed(
    State(state): State<Arc<AppState>>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Response {
    if authenticated(&state, &session_id).is_none() {
        return (StatusCode::UNAUTHORIZED, "Login required").into_response();
    }

    let dataset = match load_dataset(&state.config.data_path) {
        Ok(dataset) => dataset,
        Err(e) => {
            log::error!("{}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    let feed = LiveFeed::new(dataset);
    log::info!("Live feed started with {} steps", feed.total_steps());

    Sse::new(frame_events(feed, state.config.feed_interval))
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// One `frame` event per feed step, `interval` apart, then a `done` event
///
/// The first frame is sent immediately.
pub fn frame_events(
    feed: LiveFeed,
    interval: Duration,
) -> impl Stream<Item = std::result::Result<Event, Infallible>> + Send + 'static {
    let frames = stream::unfold((feed, true), move |(mut feed, first)| async move {
        if !first {
            tokio::time::sleep(interval).await;
        }
        let frame = feed.next()?;
        let event = match frame_html(&frame) {
            Ok(html) => Event::default().event("frame").data(html),
            Err(e) => {
                log::error!("Live feed frame {} failed: {}", frame.step, e);
                Event::default().event("error").data(e.to_string())
            }
        };
        Some((Ok::<_, Infallible>(event), (feed, false)))
    });

    frames.chain(stream::once(async {
        Ok(Event::default().event("done").data("complete"))
    }))
}

fn render_login(
    state: &AppState,
    status: StatusCode,
    register: bool,
    email: &str,
    error: Option<String>,
) -> Response {
    let data = json!({ "register": register, "email": email, "error": error });
    match state.templates.render("login", &data) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => template_failure(e.into()),
    }
}

/// Draw the session's current page inside the layout
fn render_dashboard(
    state: &AppState,
    session: &SessionState,
    params: &HashMap<String, String>,
    submission: Option<FeedbackSubmission>,
) -> Response {
    let page = session.current_page;

    let dataset: Option<Dataset> = if page.requires_dataset() {
        match load_dataset(&state.config.data_path) {
            Ok(dataset) => Some(dataset),
            Err(e) => {
                log::error!("{}", e);
                return error_page(state, session, &e);
            }
        }
    } else {
        None
    };

    let mut ctx = RenderContext::new(&state.templates, session, params);
    if let Some(entry) = submission {
        ctx = ctx.with_submission(entry);
    }

    let body = match state.registry.render(page, dataset.as_ref(), &mut ctx) {
        Some(Ok(body)) => body,
        Some(Err(e)) => {
            log::error!("Rendering {} failed: {}", page, e);
            return error_page(state, session, &e);
        }
        None => String::new(),
    };

    layout(state, session, StatusCode::OK, body)
}

fn error_page(state: &AppState, session: &SessionState, error: &DashboardError) -> Response {
    let title = match error {
        DashboardError::Load { .. } => "Data unavailable",
        _ => "Something went wrong",
    };
    let notice = json!({ "kind": "error", "title": title, "message": error.to_string() });
    match state.templates.render("notice", &notice) {
        Ok(body) => layout(state, session, StatusCode::INTERNAL_SERVER_ERROR, body),
        Err(e) => template_failure(e.into()),
    }
}

fn layout(state: &AppState, session: &SessionState, status: StatusCode, body: String) -> Response {
    let nav: Vec<_> = state
        .registry
        .pages()
        .into_iter()
        .map(|p| {
            json!({
                "name": p.title(),
                "href": format!("/dashboard?page={}", urlencoding::encode(p.title())),
                "selected": p == session.current_page,
            })
        })
        .collect();

    let data = json!({
        "page_title": session.current_page.title(),
        "nav": nav,
        "user_email": session.user.as_ref().map(|u| u.email.as_str()),
        "body": body,
    });

    match state.templates.render("layout", &data) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => template_failure(e.into()),
    }
}

fn template_failure(error: DashboardError) -> Response {
    log::error!("{}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
}
