use crate::point::Point2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Line `y = slope * x + intercept`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineModel {
    pub slope: f64,
    pub intercept: f64,
}

impl LineModel {
    pub fn new(slope: f64, intercept: f64) -> LineModel {
        LineModel { slope, intercept }
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Vertical distance between `point` and the line.
    pub fn residual(&self, point: &Point2) -> f64 {
        (point.y - self.predict(point.x)).abs()
    }
}

/// Outcome of one robust line fit over a point set.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitResult {
    /// Line re-fitted on the consensus set.
    pub model: LineModel,
    /// `true` for points that agree with `model`, in input order.
    pub inlier_mask: Vec<bool>,
    /// Number of sampling trials that were run.
    pub n_trials: usize,
    /// Coefficient of determination of `model` on the inliers.
    pub score: f64,
}

impl FitResult {
    pub fn n_inliers(&self) -> usize {
        self.inlier_mask.iter().filter(|&&m| m).count()
    }

    pub fn n_outliers(&self) -> usize {
        self.inlier_mask.len() - self.n_inliers()
    }

    pub fn outlier_mask(&self) -> Vec<bool> {
        self.inlier_mask.iter().map(|m| !m).collect()
    }

    /// Points selected by the inlier mask.
    pub fn inliers<'a>(&'a self, points: &'a [Point2]) -> impl Iterator<Item = &'a Point2> {
        points
            .iter()
            .zip(self.inlier_mask.iter())
            .filter_map(|(p, &m)| m.then_some(p))
    }

    /// Points rejected by the inlier mask.
    pub fn outliers<'a>(&'a self, points: &'a [Point2]) -> impl Iterator<Item = &'a Point2> {
        points
            .iter()
            .zip(self.inlier_mask.iter())
            .filter_map(|(p, &m)| (!m).then_some(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual() {
        let line = LineModel::new(2.0, 1.0);
        assert_eq!(line.predict(3.0), 7.0);
        assert_eq!(line.residual(&Point2::new(3.0, 4.0)), 3.0);
        assert_eq!(line.residual(&Point2::new(3.0, 10.0)), 3.0);
    }

    #[test]
    fn test_partition() {
        let points = vec![
            Point2::new(0., 0.),
            Point2::new(1., 5.),
            Point2::new(2., 2.),
        ];
        let result = FitResult {
            model: LineModel::new(1.0, 0.0),
            inlier_mask: vec![true, false, true],
            n_trials: 1,
            score: 1.0,
        };
        assert_eq!(result.n_inliers(), 2);
        assert_eq!(result.n_outliers(), 1);
        assert_eq!(result.outlier_mask(), vec![false, true, false]);
        let inliers: Vec<_> = result.inliers(&points).copied().collect();
        assert_eq!(inliers, vec![Point2::new(0., 0.), Point2::new(2., 2.)]);
        let outliers: Vec<_> = result.outliers(&points).copied().collect();
        assert_eq!(outliers, vec![Point2::new(1., 5.)]);
    }
}
