//! Summary statistics shown on the dashboard pages.

use crate::dataset::{Anomaly, ClimateRecord, Dataset, Region};
use serde::Serialize;
use std::collections::BTreeMap;

/// CO2 level above which the dashboard raises an alert (ppm)
pub const CO2_ALERT_PPM: f64 = 420.0;

/// Temperature above which the dashboard raises an alert (°C)
pub const TEMPERATURE_ALERT_C: f64 = 1.2;

/// Numeric columns of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NumericColumn {
    Year,
    Co2,
    Temperature,
    Rainfall,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 4] = [
        NumericColumn::Year,
        NumericColumn::Co2,
        NumericColumn::Temperature,
        NumericColumn::Rainfall,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NumericColumn::Year => "Year",
            NumericColumn::Co2 => "CO2(ppm)",
            NumericColumn::Temperature => "Temperature(C)",
            NumericColumn::Rainfall => "Rainfall(mm)",
        }
    }

    pub fn value(&self, record: &ClimateRecord) -> f64 {
        match self {
            NumericColumn::Year => record.year as f64,
            NumericColumn::Co2 => record.co2_ppm,
            NumericColumn::Temperature => record.temperature_c,
            NumericColumn::Rainfall => record.rainfall_mm,
        }
    }
}

/// Pairwise Pearson correlations between the numeric columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<NumericColumn>,
    /// `values[i][j]` is `None` when either column has zero variance
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    let columns = NumericColumn::ALL.to_vec();
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|c| dataset.iter().map(|r| c.value(r)).collect())
        .collect();

    let values = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix { columns, values }
}

/// Pearson correlation coefficient of two equally long series
pub fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.len() < 2 {
        return None;
    }
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return None;
    }
    Some(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Occurrences of each anomaly, most frequent first
///
/// Ties keep the order in which the anomaly first appears in the file.
pub fn anomaly_counts(dataset: &Dataset) -> Vec<(Anomaly, usize)> {
    let mut counts: Vec<(Anomaly, usize)> = Vec::new();
    for record in dataset {
        match counts.iter_mut().find(|(a, _)| *a == record.anomaly) {
            Some((_, n)) => *n += 1,
            None => counts.push((record.anomaly, 1)),
        }
    }
    // stable sort keeps first-appearance order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Temperature distribution for one anomaly label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureSummary {
    pub anomaly: Anomaly,
    pub count: usize,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

pub fn temperature_by_anomaly(dataset: &Dataset) -> Vec<TemperatureSummary> {
    let mut groups: BTreeMap<Anomaly, Vec<f64>> = BTreeMap::new();
    for record in dataset {
        groups.entry(record.anomaly).or_default().push(record.temperature_c);
    }

    groups
        .into_iter()
        .map(|(anomaly, temps)| {
            let count = temps.len();
            let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
            let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = temps.iter().sum::<f64>() / count as f64;
            TemperatureSummary {
                anomaly,
                count,
                min,
                mean,
                max,
            }
        })
        .collect()
}

/// Total rainfall per region, regions sorted by name
pub fn rainfall_by_region(dataset: &Dataset) -> Vec<(Region, f64)> {
    let mut totals: BTreeMap<&'static str, (Region, f64)> = BTreeMap::new();
    for record in dataset {
        totals
            .entry(record.region.name())
            .or_insert((record.region, 0.0))
            .1 += record.rainfall_mm;
    }
    totals.into_values().collect()
}

/// `(year, temperature)` points for one region in file order
pub fn regional_temperatures(dataset: &Dataset, region: Region) -> Vec<(i32, f64)> {
    dataset
        .iter()
        .filter(|r| r.region == region)
        .map(|r| (r.year, r.temperature_c))
        .collect()
}

/// Status of one monitored metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClimateAlert {
    pub metric: &'static str,
    pub value: f64,
    pub unit: &'static str,
    pub triggered: bool,
    pub message: &'static str,
}

/// Threshold checks on the most recent record
pub fn climate_alerts(latest: &ClimateRecord) -> Vec<ClimateAlert> {
    let co2_high = latest.co2_ppm > CO2_ALERT_PPM;
    let temp_high = latest.temperature_c > TEMPERATURE_ALERT_C;

    vec![
        ClimateAlert {
            metric: "CO₂",
            value: latest.co2_ppm,
            unit: "ppm",
            triggered: co2_high,
            message: if co2_high { "High CO₂ Level" } else { "CO₂ Normal" },
        },
        ClimateAlert {
            metric: "Temperature",
            value: latest.temperature_c,
            unit: "°C",
            triggered: temp_high,
            message: if temp_high {
                "High Temperature"
            } else {
                "Temperature Normal"
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, co2: f64, temp: f64, rain: f64, region: Region, anomaly: Anomaly) -> ClimateRecord {
        ClimateRecord {
            year,
            co2_ppm: co2,
            temperature_c: temp,
            rainfall_mm: rain,
            region,
            anomaly,
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            record(2000, 400.0, 0.9, 100.0, Region::North, Anomaly::Flood),
            record(2001, 410.0, 1.0, 200.0, Region::South, Anomaly::Flood),
            record(2002, 420.0, 1.1, 300.0, Region::North, Anomaly::Drought),
            record(2003, 425.0, 1.3, 50.0, Region::Central, Anomaly::Heatwave),
        ])
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_one() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        let r = pearson(&a, &b).unwrap();
        assert!((r - 1.0).abs() < 1e-12);

        let c = [3.0, 2.0, 1.0];
        assert!((pearson(&a, &c).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_has_no_correlation() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }

    #[test]
    fn matrix_diagonal_is_one() {
        let m = correlation_matrix(&sample());
        assert_eq!(m.columns.len(), 4);
        for i in 0..4 {
            assert!((m.values[i][i].unwrap() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn anomaly_counts_are_sorted_descending() {
        let counts = anomaly_counts(&sample());
        assert_eq!(counts[0], (Anomaly::Flood, 2));
        assert_eq!(counts[1], (Anomaly::Drought, 1));
        assert_eq!(counts[2], (Anomaly::Heatwave, 1));
    }

    #[test]
    fn rainfall_totals_are_sorted_by_region_name() {
        let totals = rainfall_by_region(&sample());
        let names: Vec<&str> = totals.iter().map(|(r, _)| r.name()).collect();
        assert_eq!(names, vec!["Central", "North", "South"]);
        assert_eq!(totals[1].1, 400.0);
    }

    #[test]
    fn temperature_summary_per_anomaly() {
        let summary = temperature_by_anomaly(&sample());
        let flood = summary.iter().find(|s| s.anomaly == Anomaly::Flood).unwrap();
        assert_eq!(flood.count, 2);
        assert_eq!(flood.min, 0.9);
        assert_eq!(flood.max, 1.0);
        assert!((flood.mean - 0.95).abs() < 1e-12);
    }

    #[test]
    fn alerts_fire_above_thresholds() {
        let data = sample();
        let alerts = climate_alerts(data.latest().unwrap());
        assert!(alerts.iter().all(|a| a.triggered));

        let calm = record(2000, 420.0, 1.2, 0.0, Region::North, Anomaly::Normal);
        let alerts = climate_alerts(&calm);
        assert!(alerts.iter().all(|a| !a.triggered));
        assert_eq!(alerts[0].message, "CO₂ Normal");
    }

    #[test]
    fn regional_temperatures_follow_file_order() {
        let points = regional_temperatures(&sample(), Region::North);
        assert_eq!(points, vec![(2000, 0.9), (2002, 1.1)]);
    }
}
