//! Ordinary least squares on a single feature, plus the train/test helpers
//! the predictions page needs.

use rand::Rng;
use rand::seq::SliceRandom;

/// Fraction of samples held out for scoring
pub const TEST_SIZE: f64 = 0.2;

/// `y = intercept + slope * x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearRegression {
    /// Fit a line through the points by least squares
    ///
    /// Returns `None` with fewer than two points or when every `x` is equal.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() || xs.len() < 2 {
            return None;
        }
        let n = xs.len() as f64;
        let x_mean = xs.iter().sum::<f64>() / n;
        let y_mean = ys.iter().sum::<f64>() / n;

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (x, y) in xs.iter().zip(ys) {
            let x_diff = x - x_mean;
            numerator += x_diff * (y - y_mean);
            denominator += x_diff * x_diff;
        }
        if denominator == 0.0 {
            return None;
        }

        let slope = numerator / denominator;
        Some(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn predict_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }

    /// Coefficient of determination on the given samples
    ///
    /// `None` when `ys` has zero variance (R² is undefined).
    pub fn score(&self, xs: &[f64], ys: &[f64]) -> Option<f64> {
        if xs.len() != ys.len() || ys.is_empty() {
            return None;
        }
        let y_mean = ys.iter().sum::<f64>() / ys.len() as f64;
        let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();
        if ss_tot == 0.0 {
            return None;
        }
        let ss_res: f64 = xs
            .iter()
            .zip(ys)
            .map(|(&x, y)| (y - self.predict(x)).powi(2))
            .sum();
        Some(1.0 - ss_res / ss_tot)
    }
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.len() != predicted.len() || actual.is_empty() {
        return None;
    }
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(sum / actual.len() as f64)
}

/// Samples partitioned into a training and a test set
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train_x: Vec<f64>,
    pub train_y: Vec<f64>,
    pub test_x: Vec<f64>,
    pub test_y: Vec<f64>,
}

/// Number of test samples for `n` samples: `ceil(n * test_size)`
pub fn test_count(n: usize, test_size: f64) -> usize {
    ((n as f64) * test_size).ceil() as usize
}

/// Shuffle the samples and hold out `ceil(n * test_size)` of them
pub fn train_test_split<R: Rng + ?Sized>(xs: &[f64], ys: &[f64], test_size: f64, rng: &mut R) -> Split {
    let mut indices: Vec<usize> = (0..xs.len().min(ys.len())).collect();
    indices.shuffle(rng);

    let n_test = test_count(indices.len(), test_size).min(indices.len());
    let (test, train) = indices.split_at(n_test);

    Split {
        train_x: train.iter().map(|&i| xs[i]).collect(),
        train_y: train.iter().map(|&i| ys[i]).collect(),
        test_x: test.iter().map(|&i| xs[i]).collect(),
        test_y: test.iter().map(|&i| ys[i]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn fits_exact_line() {
        let xs = [2000.0, 2001.0, 2002.0, 2003.0];
        let ys = [400.0, 402.0, 404.0, 406.0];
        let model = LinearRegression::fit(&xs, &ys).unwrap();
        assert!((model.slope - 2.0).abs() < 1e-9);
        assert!((model.predict(2010.0) - 420.0).abs() < 1e-6);
        assert!((model.score(&xs, &ys).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn degenerate_inputs_do_not_fit() {
        assert_eq!(LinearRegression::fit(&[1.0], &[1.0]), None);
        assert_eq!(LinearRegression::fit(&[1.0, 1.0], &[1.0, 2.0]), None);
    }

    #[test]
    fn mse_of_known_errors() {
        assert_eq!(mean_squared_error(&[1.0, 2.0], &[2.0, 4.0]), Some(2.5));
        assert_eq!(mean_squared_error(&[], &[]), None);
    }

    #[test]
    fn split_holds_out_a_fifth_rounded_up() {
        let xs: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let ys = xs.clone();
        let mut rng = StdRng::seed_from_u64(7);
        let split = train_test_split(&xs, &ys, TEST_SIZE, &mut rng);
        assert_eq!(split.test_x.len(), 3);
        assert_eq!(split.train_x.len(), 8);
        // pairs stay aligned
        assert_eq!(split.train_x, split.train_y);

        let mut all: Vec<f64> = split.train_x.iter().chain(&split.test_x).copied().collect();
        all.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(all, xs);
    }
}
