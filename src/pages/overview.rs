use super::{Page, PageRenderer, RenderContext, chart_error, require_rows};
use crate::analytics::climate_alerts;
use crate::chart::{ChartOptions, area_chart, palette};
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use serde_json::json;

/// Quick facts, trend charts, alerts and the raw table
pub struct OverviewPage;

impl PageRenderer for OverviewPage {
    fn page(&self) -> Page {
        Page::Dashboard
    }

    fn render(&self, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String> {
        let dataset = require_rows(dataset)?;
        let latest = dataset
            .latest()
            .ok_or_else(|| DashboardError::Render("no latest record".to_string()))?;

        let co2: Vec<(f64, f64)> = dataset.iter().map(|r| (r.year as f64, r.co2_ppm)).collect();
        let temperature: Vec<(f64, f64)> = dataset
            .iter()
            .map(|r| (r.year as f64, r.temperature_c))
            .collect();

        let co2_chart = area_chart(&co2, palette::ACCENT, &ChartOptions::titled("CO₂", "Year", "ppm"))
            .map_err(chart_error)?;
        let temp_chart = area_chart(
            &temperature,
            palette::DANGER,
            &ChartOptions::titled("Temperature", "Year", "°C"),
        )
        .map_err(chart_error)?;

        let alerts: Vec<_> = climate_alerts(latest)
            .into_iter()
            .map(|a| {
                json!({
                    "metric": a.metric,
                    "value": format!("{} {}", a.value, a.unit),
                    "message": a.message,
                    "triggered": a.triggered,
                })
            })
            .collect();

        let rows: Vec<_> = dataset
            .iter()
            .map(|r| {
                json!({
                    "year": r.year,
                    "co2": format!("{:.1}", r.co2_ppm),
                    "temperature": format!("{:.2}", r.temperature_c),
                    "rainfall": format!("{:.1}", r.rainfall_mm),
                    "region": r.region.name(),
                    "anomaly": r.anomaly.name(),
                })
            })
            .collect();

        ctx.render_template(
            "pages/overview",
            &json!({
                "year": latest.year,
                "co2": format!("{:.1} ppm", latest.co2_ppm),
                "temperature": format!("{:.2} °C", latest.temperature_c),
                "entries": dataset.len(),
                "co2_chart": co2_chart,
                "temp_chart": temp_chart,
                "alert_year": latest.year,
                "alerts": alerts,
                "rows": rows,
            }),
        )
    }
}
