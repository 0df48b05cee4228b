use super::{Page, PageRenderer, RenderContext, chart_error, require_rows};
use crate::analytics::{rainfall_by_region, regional_temperatures};
use crate::chart::{ChartOptions, Series, bar_chart, line_chart, palette};
use crate::dataset::{Dataset, Region};
use crate::error::Result;
use serde_json::json;

/// Temperature of one region and rainfall across all of them
pub struct RegionsPage;

impl PageRenderer for RegionsPage {
    fn page(&self) -> Page {
        Page::Regions
    }

    fn render(&self, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String> {
        let dataset = require_rows(dataset)?;
        let regions = dataset.regions();

        // fall back to the first region when the query names one we don't have
        let selected = ctx
            .param("region")
            .and_then(Region::from_name)
            .filter(|r| regions.contains(r))
            .or_else(|| regions.first().copied())
            .unwrap_or(Region::North);

        let temperatures: Vec<(f64, f64)> = regional_temperatures(dataset, selected)
            .into_iter()
            .map(|(year, t)| (year as f64, t))
            .collect();
        let temp_chart = line_chart(
            &[Series::new("Temperature(C)", palette::DANGER, temperatures)],
            &ChartOptions::titled(format!("Temperature in {}", selected), "Year", "°C"),
        )
        .map_err(chart_error)?;

        let rainfall: Vec<(String, f64)> = rainfall_by_region(dataset)
            .into_iter()
            .map(|(r, total)| (r.name().to_string(), total))
            .collect();
        let rain_chart = bar_chart(
            &rainfall,
            palette::PRIMARY,
            &ChartOptions::titled("Total rainfall by region", "Region", "mm"),
        )
        .map_err(chart_error)?;

        let options: Vec<_> = regions
            .iter()
            .map(|r| json!({ "name": r.name(), "selected": *r == selected }))
            .collect();

        ctx.render_template(
            "pages/regions",
            &json!({
                "regions": options,
                "selected": selected.name(),
                "temperature_chart": temp_chart,
                "rainfall_chart": rain_chart,
            }),
        )
    }
}
