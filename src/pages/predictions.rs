use super::{Page, PageRenderer, RenderContext, chart_error, require_rows};
use crate::chart::{ChartOptions, Series, line_chart, palette};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::regression::{LinearRegression, TEST_SIZE, mean_squared_error, train_test_split};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;

pub const FORECAST_YEARS: std::ops::RangeInclusive<i32> = 2025..=2030;

/// Smallest dataset that leaves two training rows after the split
pub const MIN_ROWS: usize = 3;

/// Linear CO₂ trend fitted on a random 80/20 split
#[derive(Default)]
pub struct PredictionsPage {
    /// Fixed shuffle seed; `None` draws a fresh split on every render
    seed: Option<u64>,
}

impl PredictionsPage {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl PageRenderer for PredictionsPage {
    fn page(&self) -> Page {
        Page::Predictions
    }

    fn render(&self, dataset: Option<&Dataset>, ctx: &mut RenderContext<'_>) -> Result<String> {
        let dataset = require_rows(dataset)?;

        if dataset.len() < MIN_ROWS {
            return ctx.render_template(
                "pages/predictions",
                &json!({ "notice": format!("At least {} records are needed to train a model.", MIN_ROWS) }),
            );
        }

        let xs: Vec<f64> = dataset.iter().map(|r| r.year as f64).collect();
        let ys: Vec<f64> = dataset.iter().map(|r| r.co2_ppm).collect();

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let split = train_test_split(&xs, &ys, TEST_SIZE, &mut rng);

        let Some(model) = LinearRegression::fit(&split.train_x, &split.train_y) else {
            return ctx.render_template(
                "pages/predictions",
                &json!({ "notice": "The training split holds a single year; no trend can be fitted." }),
            );
        };

        let predicted = model.predict_all(&split.test_x);
        let mse = mean_squared_error(&split.test_y, &predicted);
        let r2 = model.score(&split.test_x, &split.test_y);

        let forecast: Vec<(f64, f64)> = FORECAST_YEARS
            .map(|year| (year as f64, model.predict(year as f64)))
            .collect();
        let chart = line_chart(
            &[Series::new("Predictions", palette::SUCCESS, forecast.clone())],
            &ChartOptions::titled("CO₂ forecast", "Year", "ppm"),
        )
        .map_err(chart_error)?;

        let rows: Vec<_> = forecast
            .iter()
            .map(|(year, value)| json!({ "year": *year as i32, "co2": format!("{:.1}", value) }))
            .collect();

        ctx.render_template(
            "pages/predictions",
            &json!({
                "mse": fmt_metric(mse),
                "r2": fmt_metric(r2),
                "slope": format!("{:.3}", model.slope),
                "intercept": format!("{:.1}", model.intercept),
                "train_size": split.train_x.len(),
                "test_size": split.test_x.len(),
                "chart": chart,
                "forecast": rows,
            }),
        )
    }
}

fn fmt_metric(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "n/a".to_string(),
    }
}
