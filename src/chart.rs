use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;

/// Dashboard colour theme
pub mod palette {
    use plotters::style::RGBColor;

    pub const PRIMARY: RGBColor = RGBColor(0x29, 0x80, 0xb9); // deep blue
    pub const SUCCESS: RGBColor = RGBColor(0x27, 0xae, 0x60); // green
    pub const WARNING: RGBColor = RGBColor(0xf3, 0x9c, 0x12); // orange
    pub const DANGER: RGBColor = RGBColor(0xc0, 0x39, 0x2b); // red
    pub const DARK: RGBColor = RGBColor(0x2c, 0x3e, 0x50); // navy
    pub const LIGHT: RGBColor = RGBColor(0xec, 0xf0, 0xf1); // light gray
    pub const ACCENT: RGBColor = RGBColor(0x8e, 0x44, 0xad); // purple
}

pub type ChartResult = Result<String, Box<dyn Error>>;

/// Configuration options for chart generation
#[derive(Clone, Debug)]
pub struct ChartOptions {
    /// Title displayed at the top of the chart
    pub title: String,

    /// Label for the X-axis
    pub x_label: String,

    /// Label for the Y-axis
    pub y_label: String,

    /// Width of the chart in pixels
    pub width: u32,

    /// Height of the chart in pixels
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            x_label: String::new(),
            y_label: String::new(),
            width: 640,
            height: 320,
        }
    }
}

impl ChartOptions {
    pub fn titled(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            ..Self::default()
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// One named polyline on a line chart
#[derive(Clone, Debug)]
pub struct Series {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
    /// Draw a dot at every point
    pub markers: bool,
}

impl Series {
    pub fn new(label: impl Into<String>, color: RGBColor, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: label.into(),
            color,
            points,
            markers: false,
        }
    }

    pub fn with_markers(mut self) -> Self {
        self.markers = true;
        self
    }
}

/// Axis range covering `values` with a little headroom
///
/// A single distinct value gets a unit-wide range so plotters never sees an
/// empty interval.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> (f64, f64) {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

fn year_label(x: &f64) -> String {
    format!("{:.0}", x)
}

/// Renders one or more series as lines sharing a year axis
///
/// # Returns
/// * The SVG document as a string, ready to inline into a page
pub fn line_chart(series: &[Series], options: &ChartOptions) -> ChartResult {
    let (x_min, x_max) = padded_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let (y_min, y_max) = padded_range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_label_formatter(&year_label)
            .draw()?;

        for s in series {
            let color = s.color;
            chart
                .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
                .label(s.label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            if s.markers {
                chart.draw_series(s.points.iter().map(|&p| Circle::new(p, 3, color.filled())))?;
            }
        }

        if series.len() > 1 {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
        }

        root.present()?;
    }

    Ok(svg)
}

/// Renders a single series with the area below the line filled in
pub fn area_chart(points: &[(f64, f64)], color: RGBColor, options: &ChartOptions) -> ChartResult {
    let (x_min, x_max) = padded_range(points.iter().map(|p| p.0));
    let (y_min, y_max) = padded_range(points.iter().map(|p| p.1));

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .x_label_formatter(&year_label)
            .draw()?;

        chart.draw_series(
            AreaSeries::new(points.iter().copied(), y_min, &color.mix(0.3)).border_style(&color),
        )?;

        root.present()?;
    }

    Ok(svg)
}

/// Renders one bar per category, in the given order
pub fn bar_chart(bars: &[(String, f64)], color: RGBColor, options: &ChartOptions) -> ChartResult {
    let n = bars.len().max(1);
    let (_, y_max) = padded_range(bars.iter().map(|b| b.1).chain(std::iter::once(0.0)));
    let y_min = bars.iter().map(|b| b.1).fold(0.0_f64, f64::min);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_min..y_max)?;

        let category = |x: &f64| -> String {
            let idx = x.round();
            if (x - idx).abs() > 0.01 || idx < 0.0 {
                return String::new();
            }
            bars.get(idx as usize).map(|b| b.0.clone()).unwrap_or_default()
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&category)
            .x_desc(&options.x_label)
            .y_desc(&options.y_label)
            .draw()?;

        chart.draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
            let x = i as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *value)], color.filled())
        }))?;

        root.present()?;
    }

    Ok(svg)
}

/// Maps a correlation in [-1, 1] onto a blue-white-red scale
pub fn diverging_color(value: f64) -> RGBColor {
    let cold = (59.0, 76.0, 192.0);
    let mid = (221.0, 221.0, 221.0);
    let warm = (180.0, 4.0, 38.0);

    let v = value.clamp(-1.0, 1.0);
    let (from, to, t) = if v < 0.0 { (mid, cold, -v) } else { (mid, warm, v) };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;

    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// Renders a square matrix as coloured cells annotated with their value
///
/// Missing values are drawn in light gray and labelled `n/a`.
pub fn heatmap(labels: &[String], values: &[Vec<Option<f64>>], options: &ChartOptions) -> ChartResult {
    let n = labels.len().max(1);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20).into_font())
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(110)
            .build_cartesian_2d(0.0..n as f64, 0.0..n as f64)?;

        // Row 0 is drawn at the top, like a table
        let label_at = |x: &f64, flip: bool| -> String {
            let pos = x.floor();
            if (x - pos - 0.5).abs() > 0.01 || pos < 0.0 {
                return String::new();
            }
            let idx = if flip { n - 1 - pos as usize } else { pos as usize };
            labels.get(idx).cloned().unwrap_or_default()
        };
        let x_label = |x: &f64| label_at(x, false);
        let y_label = |y: &f64| label_at(y, true);

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(2 * n + 1)
            .y_labels(2 * n + 1)
            .x_label_formatter(&x_label)
            .y_label_formatter(&y_label)
            .draw()?;

        let cells: Vec<(usize, usize, Option<f64>)> = values
            .iter()
            .enumerate()
            .flat_map(|(i, row)| row.iter().enumerate().map(move |(j, v)| (i, j, *v)))
            .collect();

        chart.draw_series(cells.iter().map(|&(i, j, v)| {
            let top = (n - i) as f64;
            let left = j as f64;
            let fill = v.map(diverging_color).unwrap_or(palette::LIGHT);
            Rectangle::new([(left, top - 1.0), (left + 1.0, top)], fill.filled())
        }))?;

        let style = TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(cells.iter().map(|&(i, j, v)| {
            let text = v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string());
            Text::new(text, (j as f64 + 0.5, (n - i) as f64 - 0.5), style.clone())
        }))?;

        root.present()?;
    }

    Ok(svg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_range_never_collapses() {
        assert_eq!(padded_range(vec![5.0]), (4.0, 6.0));
        assert_eq!(padded_range(Vec::<f64>::new()), (0.0, 1.0));
        let (lo, hi) = padded_range(vec![0.0, 10.0]);
        assert!(lo < 0.0 && hi > 10.0);
    }

    #[test]
    fn diverging_scale_endpoints() {
        assert_eq!(diverging_color(0.0), RGBColor(221, 221, 221));
        assert_eq!(diverging_color(1.0), RGBColor(180, 4, 38));
        assert_eq!(diverging_color(-2.0), RGBColor(59, 76, 192));
    }

    #[test]
    fn line_chart_produces_svg() {
        let series = vec![Series::new("CO2", palette::PRIMARY, vec![(2000.0, 400.0), (2001.0, 410.0)]).with_markers()];
        let svg = line_chart(&series, &ChartOptions::titled("CO2", "Year", "ppm")).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("circle"));
    }
}
