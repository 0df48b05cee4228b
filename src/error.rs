use thiserror::Error;

/// Failures surfaced by the dashboard
///
/// Every variant carries a message that is safe to show to the user. Web
/// handlers turn these into HTML notices instead of letting them escape.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DashboardError {
    /// The dataset could not be read or parsed. Fatal to the affected page.
    #[error("failed to load dataset {path}: {reason}")]
    Load { path: String, reason: String },

    /// The identity provider rejected the credentials or failed.
    #[error("{0}")]
    Auth(String),

    /// A required form field was missing or invalid.
    #[error("{0}")]
    Validation(String),

    /// Appending to a flat file failed.
    #[error("failed to record feedback: {0}")]
    Write(String),

    /// A template or chart could not be produced.
    #[error("failed to render page: {0}")]
    Render(String),

    /// An environment override could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn load(path: impl AsRef<std::path::Path>, reason: impl ToString) -> Self {
        DashboardError::Load {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Short label used in notices and logs
    pub fn kind(&self) -> &'static str {
        match self {
            DashboardError::Load { .. } => "load",
            DashboardError::Auth(_) => "auth",
            DashboardError::Validation(_) => "validation",
            DashboardError::Write(_) => "write",
            DashboardError::Render(_) => "render",
            DashboardError::Config(_) => "config",
        }
    }
}

impl From<handlebars::RenderError> for DashboardError {
    fn from(e: handlebars::RenderError) -> Self {
        DashboardError::Render(e.to_string())
    }
}

impl From<handlebars::TemplateError> for DashboardError {
    fn from(e: handlebars::TemplateError) -> Self {
        DashboardError::Render(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
