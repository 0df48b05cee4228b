use super::{Page, PageRenderer, RenderContext};
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::feedback::{DEFAULT_RATING, FeedbackRecorder, FeedbackSubmission, MAX_RATING, MIN_RATING};
use serde_json::json;

/// Feedback form; the only page that writes anything
pub struct FeedbackPage {
    recorder: FeedbackRecorder,
}

impl FeedbackPage {
    pub fn new(recorder: FeedbackRecorder) -> Self {
        Self { recorder }
    }
}

impl PageRenderer for FeedbackPage {
    fn page(&self) -> Page {
        Page::Feedback
    }

    fn render(&self, _dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String> {
        let mut form = FeedbackSubmission {
            name: String::new(),
            email: ctx
                .session
                .user
                .as_ref()
                .map(|u| u.email.clone())
                .unwrap_or_default(),
            rating: DEFAULT_RATING.to_string(),
            comments: String::new(),
        };
        let mut notice = None;

        if let Some(submission) = ctx.submission.take() {
            match submission.clone().parse().and_then(|entry| self.recorder.record(entry)) {
                Ok(_) => {
                    notice = Some(json!({ "kind": "success", "message": "Feedback submitted!" }));
                }
                Err(e) => {
                    if let DashboardError::Write(_) = e {
                        log::error!("{}", e);
                    }
                    notice = Some(json!({ "kind": "error", "message": e.to_string() }));
                    // keep what the user typed so they can fix it
                    form = submission;
                }
            }
        }

        ctx.render_template(
            "pages/feedback",
            &json!({
                "form": form,
                "min_rating": MIN_RATING,
                "max_rating": MAX_RATING,
                "notice": notice,
            }),
        )
    }
}
