//! Robust line fitting by random sample consensus.
//!
//! Each trial fits the base [`Regressor`] on `min_samples` randomly drawn
//! points and counts the points whose absolute residual is within
//! `residual_threshold`. The candidate with the largest consensus wins, ties
//! go to the higher R² on the consensus set, and the final model is re-fitted
//! on all of its inliers.

use crate::constants::{MAX_TRIALS, MIN_SAMPLES, RANDOM_SEED, RESIDUAL_THRESHOLD, STOP_PROBABILITY};
use crate::error::{LidarFilterError, Result};
use crate::regression::{check_lengths, LinearRegression, Regressor};
use lidar_data::{FitResult, LineModel, Point2};
use log::trace;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Parameters of [`RansacRegressor`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    /// Largest absolute residual of an inlier.
    pub residual_threshold: f64,
    /// Points drawn per trial.
    pub min_samples: usize,
    /// Upper bound on the number of trials.
    pub max_trials: usize,
    /// Confidence that at least one trial drew only inliers.
    pub stop_probability: f64,
    /// Stop once this many inliers were found.
    pub stop_n_inliers: Option<usize>,
    /// Stop once the consensus R² reaches this value.
    pub stop_score: Option<f64>,
    /// Seed of the sampling generator.
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            residual_threshold: RESIDUAL_THRESHOLD,
            min_samples: MIN_SAMPLES,
            max_trials: MAX_TRIALS,
            stop_probability: STOP_PROBABILITY,
            stop_n_inliers: None,
            stop_score: None,
            seed: RANDOM_SEED,
        }
    }
}

impl RansacConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.residual_threshold >= 0.) {
            return Err(LidarFilterError::InvalidConfig(format!(
                "residual_threshold must be non-negative, got {}",
                self.residual_threshold
            )));
        }
        if self.min_samples == 0 {
            return Err(LidarFilterError::InvalidConfig(
                "min_samples must be positive".to_string(),
            ));
        }
        if self.max_trials == 0 {
            return Err(LidarFilterError::InvalidConfig(
                "max_trials must be positive".to_string(),
            ));
        }
        if !(0. ..=1.).contains(&self.stop_probability) {
            return Err(LidarFilterError::InvalidConfig(format!(
                "stop_probability must be in [0, 1], got {}",
                self.stop_probability
            )));
        }
        Ok(())
    }
}

/// RANSAC wrapper around a base regressor, re-fitted on every call to
/// [`RansacRegressor::fit`].
pub struct RansacRegressor<R: Regressor = LinearRegression> {
    config: RansacConfig,
    estimator: R,
    fitted: Option<LineModel>,
}

impl RansacRegressor<LinearRegression> {
    pub fn new(config: RansacConfig) -> Result<Self> {
        Self::with_estimator(config, LinearRegression::new())
    }
}

impl<R: Regressor + Clone> RansacRegressor<R> {
    pub fn with_estimator(config: RansacConfig, estimator: R) -> Result<Self> {
        config.validate()?;
        Ok(RansacRegressor {
            config,
            estimator,
            fitted: None,
        })
    }

    /// Final estimator of the last successful fit. A failed fit leaves it
    /// untouched.
    pub fn estimator(&self) -> Option<LineModel> {
        self.fitted
    }

    pub fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        let model = self.estimator().ok_or(LidarFilterError::NotFitted)?;
        Ok(x.iter().map(|&x| model.predict(x)).collect())
    }

    /// Fits a line to `(x, y)` and classifies every point as inlier or outlier.
    ///
    /// Sampling is seeded from the configuration on each call, so identical
    /// input always yields the identical partition.
    pub fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<FitResult> {
        check_lengths(x, y)?;
        let n_samples = x.len();
        if n_samples == 0 {
            return Err(LidarFilterError::EmptyPointSet);
        }
        let min_samples = self.config.min_samples;
        if n_samples < min_samples {
            return Err(LidarFilterError::TooFewPoints {
                required: min_samples,
                found: n_samples,
            });
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let threshold = self.config.residual_threshold;
        let stop_n_inliers = self.config.stop_n_inliers.unwrap_or(usize::MAX);
        let stop_score = self.config.stop_score.unwrap_or(f64::INFINITY);

        let mut best: Option<(usize, f64, Vec<bool>)> = None;
        let mut max_trials = self.config.max_trials;
        let mut n_trials = 0;
        let mut sample_x = vec![0.; min_samples];
        let mut sample_y = vec![0.; min_samples];

        while n_trials < max_trials {
            n_trials += 1;

            let subset = rand::seq::index::sample(&mut rng, n_samples, min_samples);
            for (k, idx) in subset.iter().enumerate() {
                sample_x[k] = x[idx];
                sample_y[k] = y[idx];
            }

            let mut candidate = self.estimator.clone();
            if candidate.fit(&sample_x, &sample_y).is_err() {
                continue;
            }
            let Some(model) = candidate.model() else {
                continue;
            };

            let mask: Vec<bool> = x
                .iter()
                .zip(y.iter())
                .map(|(&xi, &yi)| model.residual(&Point2::new(xi, yi)) <= threshold)
                .collect();
            let n_inliers = mask.iter().filter(|&&m| m).count();
            if n_inliers == 0 {
                continue;
            }

            let n_inliers_best = best.as_ref().map_or(0, |b| b.0);
            if n_inliers < n_inliers_best {
                continue;
            }

            let (inlier_x, inlier_y) = select(x, y, &mask);
            let score = candidate.score(&inlier_x, &inlier_y)?;
            if let Some((n_best, score_best, _)) = &best {
                if n_inliers == *n_best && score < *score_best {
                    continue;
                }
            }

            trace!(
                "trial {n_trials}: {n_inliers} inliers, score {score:.4}, line y = {:.4} x + {:.4}",
                model.slope,
                model.intercept
            );
            best = Some((n_inliers, score, mask));
            max_trials = max_trials.min(dynamic_max_trials(
                n_inliers,
                n_samples,
                min_samples,
                self.config.stop_probability,
            ));
            if n_inliers >= stop_n_inliers || score >= stop_score {
                break;
            }
        }

        let (_, _, inlier_mask) = best.ok_or(LidarFilterError::NoConsensus(n_trials))?;

        let (inlier_x, inlier_y) = select(x, y, &inlier_mask);
        let mut estimator = self.estimator.clone();
        estimator.fit(&inlier_x, &inlier_y)?;
        let model = estimator.model().ok_or(LidarFilterError::NotFitted)?;
        let score = estimator.score(&inlier_x, &inlier_y)?;

        self.fitted = Some(model);
        Ok(FitResult {
            model,
            inlier_mask,
            n_trials,
            score,
        })
    }
}

fn select(x: &[f64], y: &[f64], mask: &[bool]) -> (Vec<f64>, Vec<f64>) {
    x.iter()
        .zip(y.iter())
        .zip(mask.iter())
        .filter_map(|((&xi, &yi), &m)| m.then_some((xi, yi)))
        .unzip()
}

/// Number of trials needed to draw an all-inlier sample with `probability`,
/// given that `n_inliers` of `n_samples` points are inliers.
pub(crate) fn dynamic_max_trials(
    n_inliers: usize,
    n_samples: usize,
    min_samples: usize,
    probability: f64,
) -> usize {
    let inlier_ratio = n_inliers as f64 / n_samples as f64;
    let nom = f64::max(f64::EPSILON, 1. - probability);
    let denom = f64::max(f64::EPSILON, 1. - inlier_ratio.powi(min_samples as i32));
    if nom == 1. {
        return 0;
    }
    if denom == 1. {
        return usize::MAX;
    }
    (nom.ln() / denom.ln()).ceil().abs() as usize
}
