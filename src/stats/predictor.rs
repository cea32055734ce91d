//! Estimated 1RM trend using linear regression (linfa)

use chrono::{DateTime, Utc};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use super::ProgressPoint;

/// Minimum workouts needed before a trend is fitted
const MIN_DATA_POINTS: usize = 3;

/// Fitted trend: estimated 1RM against days since the first point
pub struct ProgressPredictor {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    data_points: usize,
    first_date: DateTime<Utc>,
}

/// Trend summary for display
#[derive(Debug, Clone)]
pub struct Trend {
    pub per_week: f64,
    pub current: f64,
    pub in_four_weeks: f64,
    pub r2_score: f64,
    pub data_points: usize,
}

impl ProgressPredictor {
    /// Fit a line through the progression; `None` below three points
    pub fn train(points: &[ProgressPoint]) -> Option<Self> {
        if points.len() < MIN_DATA_POINTS {
            return None;
        }
        let first_date = points.iter().map(|p| p.date).min()?;

        let x: Vec<f64> = points
            .iter()
            .map(|p| (p.date - first_date).num_seconds() as f64 / 86_400.0)
            .collect();
        let y: Vec<f64> = points.iter().map(|p| p.estimated_1rm).collect();
        let n_samples = x.len();

        let records = Array2::from_shape_vec((n_samples, 1), x).ok()?;
        let targets = Array1::from_vec(y);
        let dataset = Dataset::new(records, targets);

        // all points on one day leave nothing to fit
        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();
        if !slope.is_finite() || !intercept.is_finite() {
            return None;
        }

        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);

        Some(Self {
            slope,
            intercept,
            r2_score,
            data_points: n_samples,
            first_date,
        })
    }

    /// Estimated 1RM `days_ahead` days from now
    pub fn predict(&self, days_ahead: i64) -> f64 {
        let days = (Utc::now() - self.first_date).num_seconds() as f64 / 86_400.0;
        self.slope * (days + days_ahead as f64) + self.intercept
    }

    /// Change in estimated 1RM per day
    pub fn daily_progress(&self) -> f64 {
        self.slope
    }

    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.data_points
    }

    pub fn trend(&self) -> Trend {
        Trend {
            per_week: self.slope * 7.0,
            current: self.predict(0),
            in_four_weeks: self.predict(28),
            r2_score: self.r2_score,
            data_points: self.data_points,
        }
    }
}
