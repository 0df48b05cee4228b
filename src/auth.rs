use crate::error::{DashboardError, Result};
use crate::identity::IdentityProvider;
use crate::pages::Page;
use crate::session::SessionState;
use std::sync::Arc;

/// Which form the user submitted on the login page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("register") {
            AuthAction::Register
        } else {
            AuthAction::Login
        }
    }
}

/// Guards the dashboard behind an identity provider
///
/// The gate is the only place that flips `authenticated`. A failed attempt
/// never touches the session: the caller gets the provider's message back
/// and the state stays anonymous.
#[derive(Clone)]
pub struct AuthGate {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthGate {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Run a login or registration attempt against the provider
    pub async fn authenticate(
        &self,
        session: &mut SessionState,
        action: AuthAction,
        email: &str,
        password: &str,
    ) -> Result<()> {
        match action {
            AuthAction::Login => self.login(session, email, password).await,
            AuthAction::Register => self.register(session, email, password).await,
        }
    }

    /// Verify existing credentials and enter the dashboard
    ///
    /// # Errors
    /// * `DashboardError::Auth` carrying the provider's message
    pub async fn login(&self, session: &mut SessionState, email: &str, password: &str) -> Result<()> {
        match self.provider.sign_in(email, password).await {
            Ok(user) => {
                log::info!("User {} signed in via {}", user.email, self.provider.name());
                enter(session, user);
                Ok(())
            }
            Err(e) => {
                log::warn!("Sign-in rejected for {}: {}", email, e);
                Err(as_auth_error(e))
            }
        }
    }

    /// Create an account and enter the dashboard
    ///
    /// # Errors
    /// * `DashboardError::Auth` carrying the provider's message
    pub async fn register(&self, session: &mut SessionState, email: &str, password: &str) -> Result<()> {
        match self.provider.sign_up(email, password).await {
            Ok(user) => {
                log::info!("User {} registered via {}", user.email, self.provider.name());
                enter(session, user);
                Ok(())
            }
            Err(e) => {
                log::warn!("Registration rejected for {}: {}", email, e);
                Err(as_auth_error(e))
            }
        }
    }

    /// Leave the dashboard
    pub fn logout(&self, session: &mut SessionState) {
        if let Some(user) = &session.user {
            log::info!("User {} signed out", user.email);
        }
        *session = SessionState::default();
    }
}

fn enter(session: &mut SessionState, user: crate::session::UserHandle) {
    session.authenticated = true;
    session.user = Some(user);
    session.current_page = Page::default();
}

fn as_auth_error(e: DashboardError) -> DashboardError {
    match e {
        DashboardError::Auth(msg) => DashboardError::Auth(msg),
        other => DashboardError::Auth(other.to_string()),
    }
}
