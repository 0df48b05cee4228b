//! The six dashboard views and the registry that dispatches between them.

mod analytics;
mod feedback;
mod live;
mod overview;
mod predictions;
mod regions;

pub use analytics::AnalyticsPage;
pub use feedback::FeedbackPage;
pub use live::{LiveDataPage, frame_html};
pub use overview::OverviewPage;
pub use predictions::PredictionsPage;
pub use regions::RegionsPage;

use crate::config::Config;
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::feedback::{FeedbackRecorder, FeedbackSubmission};
use crate::session::SessionState;
use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Named views of the dashboard, in navigation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Page {
    #[default]
    Dashboard,
    LiveData,
    Analytics,
    Predictions,
    Regions,
    Feedback,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Dashboard,
        Page::LiveData,
        Page::Analytics,
        Page::Predictions,
        Page::Regions,
        Page::Feedback,
    ];

    /// Name shown in the navigation selector
    pub fn title(&self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::LiveData => "Live Data",
            Page::Analytics => "Advanced Analytics",
            Page::Predictions => "AI Predictions",
            Page::Regions => "Regional Insights",
            Page::Feedback => "Feedback",
        }
    }

    pub fn from_name(name: &str) -> Option<Page> {
        Self::ALL.into_iter().find(|p| p.title() == name.trim())
    }

    /// Whether the page reads the dataset
    pub fn requires_dataset(&self) -> bool {
        !matches!(self, Page::Feedback)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Everything a renderer may consult besides the dataset
pub struct RenderContext<'a> {
    pub templates: &'a Handlebars<'static>,
    pub session: &'a SessionState,
    /// Query parameters of the current request
    pub params: &'a HashMap<String, String>,
    /// Feedback form submitted with this request, if any
    pub submission: Option<FeedbackSubmission>,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        templates: &'a Handlebars<'static>,
        session: &'a SessionState,
        params: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            templates,
            session,
            params,
            submission: None,
        }
    }

    pub fn with_submission(mut self, entry: impl Into<FeedbackSubmission>) -> Self {
        self.submission = Some(entry.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn render_template<T: Serialize>(&self, name: &str, data: &T) -> Result<String> {
        Ok(self.templates.render(name, data)?)
    }
}

/// Something that can draw one dashboard page
pub trait PageRenderer: Send + Sync {
    /// Page this renderer is responsible for
    fn page(&self) -> Page;

    /// Produce the HTML body of the page
    ///
    /// Renderers must not fail on user input; they report problems inside
    /// the returned markup. Errors are reserved for missing data and broken
    /// templates.
    fn render(&self, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String>;
}

/// Dataset for pages that cannot work without rows
pub(crate) fn require_rows(dataset: Option<&Dataset>) -> Result<&Dataset> {
    match dataset {
        Some(d) if !d.is_empty() => Ok(d),
        Some(_) => Err(DashboardError::Load {
            path: "dataset".to_string(),
            reason: "no records".to_string(),
        }),
        None => Err(DashboardError::Load {
            path: "dataset".to_string(),
            reason: "not loaded".to_string(),
        }),
    }
}

pub(crate) fn chart_error(e: Box<dyn std::error::Error>) -> DashboardError {
    DashboardError::Render(e.to_string())
}

/// Maps each page to the renderer that draws it
#[derive(Default)]
pub struct PageRegistry {
    renderers: HashMap<Page, Box<dyn PageRenderer>>,
}

impl PageRegistry {
    /// Empty registry; pages without a renderer render nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six standard renderers
    pub fn standard(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(OverviewPage));
        registry.register(Box::new(LiveDataPage::new(config.feed_interval)));
        registry.register(Box::new(AnalyticsPage));
        registry.register(Box::new(PredictionsPage::default()));
        registry.register(Box::new(RegionsPage));
        registry.register(Box::new(FeedbackPage::new(FeedbackRecorder::new(
            config.feedback_path.clone(),
        ))));
        registry
    }

    /// Install a renderer, returning the one it replaces
    pub fn register(&mut self, renderer: Box<dyn PageRenderer>) -> Option<Box<dyn PageRenderer>> {
        self.renderers.insert(renderer.page(), renderer)
    }

    /// Pages with a renderer, in navigation order
    pub fn pages(&self) -> Vec<Page> {
        Page::ALL
            .into_iter()
            .filter(|p| self.renderers.contains_key(p))
            .collect()
    }

    /// Invoke the renderer for `page`
    ///
    /// Returns `None` if no renderer is registered for it.
    pub fn render(&self, page: Page, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Option<Result<String>> {
        let renderer = self.renderers.get(&page)?;
        Some(renderer.render(dataset, ctx))
    }

    /// Invoke the renderer for the page called `name`
    ///
    /// Unknown names are a no-op and return `None`.
    pub fn dispatch(&self, name: &str, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Option<Result<String>> {
        let page = Page::from_name(name)?;
        self.render(page, dataset, ctx)
    }
}
