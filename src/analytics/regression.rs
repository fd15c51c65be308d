//! Trend line and first-to-last variation of a chart series (linfa)

use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::Serialize;

/// Minimum points needed for a fitted line
const MIN_DATA_POINTS: usize = 2;

/// Least-squares line of value against point index
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    /// Change per point
    pub slope: f64,
    pub intercept: f64,
    /// Fit quality, 0 when unavailable
    pub r2: f64,
    pub data_points: usize,
}

impl TrendLine {
    /// Fit a line through `values` at x = 0, 1, 2, ...
    ///
    /// With fewer than two points, or when the regression fails, the line is
    /// flat at the mean (0 for no points).
    pub fn fit(values: &[f64]) -> Self {
        Self::regress(values).unwrap_or_else(|| Self::flat(values))
    }

    fn flat(values: &[f64]) -> Self {
        let intercept = if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        };
        Self {
            slope: 0.0,
            intercept,
            r2: 0.0,
            data_points: values.len(),
        }
    }

    fn regress(values: &[f64]) -> Option<Self> {
        let n_samples = values.len();
        if n_samples < MIN_DATA_POINTS {
            return None;
        }

        let x_data: Vec<f64> = (0..n_samples).map(|i| i as f64).collect();
        let records = Array2::from_shape_vec((n_samples, 1), x_data).ok()?;
        let targets = Array1::from_vec(values.to_vec());
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;

        let slope = model.params()[0];
        let intercept = model.intercept();
        if !slope.is_finite() || !intercept.is_finite() {
            return None;
        }

        let predictions = model.predict(&dataset);
        let r2 = predictions
            .r2(&dataset)
            .ok()
            .filter(|r| r.is_finite())
            .unwrap_or(0.0);

        Some(Self {
            slope,
            intercept,
            r2,
            data_points: n_samples,
        })
    }

    /// Value of the line at point `index`
    pub fn value_at(&self, index: usize) -> f64 {
        self.slope * index as f64 + self.intercept
    }

    /// Line values at every fitted point, for overlaying on the chart
    pub fn points(&self) -> Vec<f64> {
        (0..self.data_points).map(|i| self.value_at(i)).collect()
    }
}

/// Change between the first and last value of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Variation {
    pub first: f64,
    pub last: f64,
    /// `None` when the change is unbounded (growth from zero)
    pub percent_change: Option<f64>,
}

impl Variation {
    /// `None` for an empty series
    pub fn of(values: &[f64]) -> Option<Self> {
        let first = *values.first()?;
        let last = *values.last()?;

        let percent_change = if first == 0.0 {
            if last > 0.0 { None } else { Some(0.0) }
        } else {
            Some((last - first) / first.abs() * 100.0)
        };

        Some(Self {
            first,
            last,
            percent_change,
        })
    }

    pub fn absolute_change(&self) -> f64 {
        self.last - self.first
    }
}
