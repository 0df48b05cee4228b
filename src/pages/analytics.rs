use super::{Page, PageRenderer, RenderContext, chart_error, require_rows};
use crate::analytics::{anomaly_counts, correlation_matrix, temperature_by_anomaly};
use crate::chart::{ChartOptions, bar_chart, heatmap, palette};
use crate::dataset::Dataset;
use crate::error::Result;
use serde_json::json;

/// Correlation heatmap and anomaly breakdown
pub struct AnalyticsPage;

impl PageRenderer for AnalyticsPage {
    fn page(&self) -> Page {
        Page::Analytics
    }

    fn render(&self, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String> {
        let dataset = require_rows(dataset)?;

        let matrix = correlation_matrix(dataset);
        let labels: Vec<String> = matrix.columns.iter().map(|c| c.label().to_string()).collect();
        let heatmap_svg = heatmap(
            &labels,
            &matrix.values,
            &ChartOptions::titled("Correlation", "", "").size(640, 480),
        )
        .map_err(chart_error)?;

        let counts: Vec<(String, f64)> = anomaly_counts(dataset)
            .into_iter()
            .map(|(a, n)| (a.name().to_string(), n as f64))
            .collect();
        let counts_svg = bar_chart(
            &counts,
            palette::WARNING,
            &ChartOptions::titled("Anomalies", "Anomaly", "Count"),
        )
        .map_err(chart_error)?;

        let summary: Vec<_> = temperature_by_anomaly(dataset)
            .into_iter()
            .map(|s| {
                json!({
                    "anomaly": s.anomaly.name(),
                    "count": s.count,
                    "min": format!("{:.2}", s.min),
                    "mean": format!("{:.2}", s.mean),
                    "max": format!("{:.2}", s.max),
                })
            })
            .collect();

        ctx.render_template(
            "pages/analytics",
            &json!({
                "heatmap": heatmap_svg,
                "anomaly_chart": counts_svg,
                "summary": summary,
            }),
        )
    }
}
