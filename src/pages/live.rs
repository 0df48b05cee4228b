use super::{Page, PageRenderer, RenderContext, chart_error, require_rows};
use crate::chart::{ChartOptions, Series, line_chart, palette};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::feed::FeedFrame;
use serde_json::json;
use std::time::Duration;

/// Start button and the placeholder the live feed stream draws into
pub struct LiveDataPage {
    interval: Duration,
}

impl LiveDataPage {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl PageRenderer for LiveDataPage {
    fn page(&self) -> Page {
        Page::LiveData
    }

    fn render(&self, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String> {
        let dataset = require_rows(dataset)?;
        let years = dataset.years();

        ctx.render_template(
            "pages/live",
            &json!({
                "steps": years.len(),
                "first_year": years.first(),
                "last_year": years.last(),
                "interval_ms": self.interval.as_millis() as u64,
                "stream_url": "/api/live",
            }),
        )
    }
}

/// Markup for one frame of the live feed
///
/// A marker-line chart of the running CO₂ and temperature averages plus a
/// progress caption.
pub fn frame_html(frame: &FeedFrame) -> Result<String> {
    let co2 = frame
        .averages
        .iter()
        .map(|a| (a.year as f64, a.co2_ppm))
        .collect();
    let temperature = frame
        .averages
        .iter()
        .map(|a| (a.year as f64, a.temperature_c))
        .collect();

    let series = vec![
        Series::new("CO2(ppm)", palette::PRIMARY, co2).with_markers(),
        Series::new("Temperature(C)", palette::DANGER, temperature).with_markers(),
    ];
    let options = ChartOptions::titled(format!("Climate Metrics up to {}", frame.year), "Year", "Average");
    let svg = line_chart(&series, &options).map_err(chart_error)?;

    Ok(format!(
        "<p class=\"feed-progress\">Year {} ({} of {}, {} rows)</p>\n{}",
        frame.year, frame.step, frame.total, frame.rows_seen, svg
    ))
}
