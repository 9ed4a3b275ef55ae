use crate::error::{LidarFilterError, Result};
use lidar_data::LineModel;

/// Estimator of `y` from a single independent variable `x`.
pub trait Regressor {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<()>;

    /// Current model, `None` before the first successful fit.
    fn model(&self) -> Option<LineModel>;

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        let model = self.model().ok_or(LidarFilterError::NotFitted)?;
        Ok(x.iter().map(|&x| model.predict(x)).collect())
    }

    /// Coefficient of determination of the current model on `(x, y)`.
    fn score(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        let y_pred = self.predict(x)?;
        r2_score(y, &y_pred)
    }
}

/// Ordinary least squares line fit.
#[derive(Clone, Debug, Default)]
pub struct LinearRegression {
    model: Option<LineModel>,
}

impl LinearRegression {
    pub fn new() -> LinearRegression {
        LinearRegression { model: None }
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<()> {
        check_lengths(x, y)?;
        if x.is_empty() {
            return Err(LidarFilterError::EmptyPointSet);
        }
        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;

        let (sxy, sxx) = x
            .iter()
            .zip(y.iter())
            .fold((0., 0.), |(sxy, sxx), (&xi, &yi)| {
                let dx = xi - x_mean;
                (sxy + dx * (yi - y_mean), sxx + dx * dx)
            });

        // Without spread in x the minimum-norm solution is a flat line.
        let slope = if sxx > 0. { sxy / sxx } else { 0. };
        self.model = Some(LineModel::new(slope, y_mean - slope * x_mean));
        Ok(())
    }

    fn model(&self) -> Option<LineModel> {
        self.model
    }
}

/// R² of `y_pred` against `y_true`.
///
/// When `y_true` has no variance the score is 1.0 for an exact prediction
/// and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    if y_true.is_empty() {
        return Err(LidarFilterError::EmptyPointSet);
    }
    let mean = y_true.iter().sum::<f64>() / (y_true.len() as f64);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();

    if ss_tot == 0. {
        return Ok(if ss_res == 0. { 1. } else { 0. });
    }
    Ok(1. - ss_res / ss_tot)
}

pub(crate) fn check_lengths(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(LidarFilterError::LengthMismatch(x.len(), y.len()));
    }
    Ok(())
}
