use crate::dataset::{ClimateRecord, Dataset};
use serde::Serialize;
use std::collections::BTreeMap;

/// Mean of the numeric columns for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearAverage {
    pub year: i32,
    pub co2_ppm: f64,
    pub temperature_c: f64,
    pub rainfall_mm: f64,
    pub rows: usize,
}

/// One reveal step of the live feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedFrame {
    /// 1-based step number
    pub step: usize,
    /// Total number of steps in this run
    pub total: usize,
    /// Year revealed by this step
    pub year: i32,
    /// Rows accumulated so far
    pub rows_seen: usize,
    /// Running averages grouped by year, ascending
    pub averages: Vec<YearAverage>,
}

impl FeedFrame {
    pub fn is_last(&self) -> bool {
        self.step == self.total
    }
}

#[derive(Default)]
struct Accumulator {
    co2: f64,
    temperature: f64,
    rainfall: f64,
    rows: usize,
}

impl Accumulator {
    fn add(&mut self, record: &ClimateRecord) {
        self.co2 += record.co2_ppm;
        self.temperature += record.temperature_c;
        self.rainfall += record.rainfall_mm;
        self.rows += 1;
    }

    fn average(&self, year: i32) -> YearAverage {
        let n = self.rows as f64;
        YearAverage {
            year,
            co2_ppm: self.co2 / n,
            temperature_c: self.temperature / n,
            rainfall_mm: self.rainfall / n,
            rows: self.rows,
        }
    }
}

/// Replays a dataset one distinct year at a time
///
/// Each call to `next` reveals every row of the next year (in file order of
/// first appearance) and yields the running per-year averages. The iterator
/// does not sleep: pacing and early cancellation belong to the caller, who
/// simply stops polling. A fresh `LiveFeed` always starts from the first year.
pub struct LiveFeed {
    dataset: Dataset,
    years: Vec<i32>,
    position: usize,
    rows_seen: usize,
    groups: BTreeMap<i32, Accumulator>,
}

impl LiveFeed {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            years: dataset.years(),
            dataset,
            position: 0,
            rows_seen: 0,
            groups: BTreeMap::new(),
        }
    }

    /// Number of frames a full run produces
    pub fn total_steps(&self) -> usize {
        self.years.len()
    }

    pub fn remaining(&self) -> usize {
        self.years.len() - self.position
    }
}

impl Iterator for LiveFeed {
    type Item = FeedFrame;

    fn next(&mut self) -> Option<FeedFrame> {
        let year = *self.years.get(self.position)?;
        self.position += 1;

        let group = self.groups.entry(year).or_default();
        for record in self.dataset.iter().filter(|r| r.year == year) {
            group.add(record);
            self.rows_seen += 1;
        }

        Some(FeedFrame {
            step: self.position,
            total: self.years.len(),
            year,
            rows_seen: self.rows_seen,
            averages: self.groups.iter().map(|(y, acc)| acc.average(*y)).collect(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LiveFeed {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Anomaly, Region};

    fn record(year: i32, co2_ppm: f64) -> ClimateRecord {
        ClimateRecord {
            year,
            co2_ppm,
            temperature_c: 1.0,
            rainfall_mm: 1000.0,
            region: Region::North,
            anomaly: Anomaly::Normal,
        }
    }

    #[test]
    fn repeated_years_are_averaged_together() {
        let dataset = Dataset::new(vec![record(2000, 400.0), record(2001, 405.0), record(2000, 410.0)]);
        let frames: Vec<FeedFrame> = LiveFeed::new(dataset).collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].year, 2000);
        assert_eq!(frames[0].rows_seen, 2);
        assert_eq!(frames[0].averages[0].co2_ppm, 405.0);
        assert_eq!(frames[0].averages[0].rows, 2);
        assert!(frames[1].is_last());
        assert_eq!(frames[1].rows_seen, 3);
    }

    #[test]
    fn frame_k_covers_the_first_k_years() {
        let dataset = Dataset::new((0..4).map(|i| record(2003 - i, 400.0 + i as f64)).collect());
        let frames: Vec<FeedFrame> = LiveFeed::new(dataset).collect();

        // file order, not numeric order
        let revealed: Vec<i32> = frames.iter().map(|f| f.year).collect();
        assert_eq!(revealed, vec![2003, 2002, 2001, 2000]);

        for (k, frame) in frames.iter().enumerate() {
            assert_eq!(frame.step, k + 1);
            assert_eq!(frame.averages.len(), k + 1);
            let years: Vec<i32> = frame.averages.iter().map(|a| a.year).collect();
            let mut expected = revealed[..=k].to_vec();
            expected.sort();
            assert_eq!(years, expected);
        }
    }

    #[test]
    fn size_hint_tracks_progress() {
        let dataset = Dataset::new(vec![record(2000, 400.0), record(2001, 401.0)]);
        let mut feed = LiveFeed::new(dataset);
        assert_eq!(feed.len(), 2);
        feed.next();
        assert_eq!(feed.remaining(), 1);
        feed.next();
        assert_eq!(feed.next(), None);
        assert_eq!(feed.len(), 0);
    }

    #[test]
    fn empty_dataset_yields_nothing() {
        let mut feed = LiveFeed::new(Dataset::default());
        assert_eq!(feed.total_steps(), 0);
        assert!(feed.next().is_none());
    }
}
