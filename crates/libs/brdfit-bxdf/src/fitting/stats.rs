use base::{
    error::FitError,
    math::{mean, sqr},
};
use serde::{Deserialize, Serialize};

/// Goodness-of-fit of predicted against observed reflectance.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    /// Coefficient of determination 1 − SS_res/SS_tot.
    pub r2: f64,
    /// Mean of predicted − observed.
    pub bias: f64,
    /// Root mean squared difference.
    pub rmse: f64,
}

impl GoodnessOfFit {
    /// Computes the statistics.
    ///
    /// When the observations have no variance, R² is 1 for an exact fit and 0
    /// otherwise.
    pub fn compute(observed: &[f64], predicted: &[f64]) -> Result<Self, FitError> {
        FitError::check_len("predicted values", observed.len(), predicted.len())?;
        if observed.is_empty() {
            return Err(FitError::Underdetermined {
                observations: 0,
                params: 1,
            });
        }
        let observed_mean = mean(observed);
        let diffs: Vec<f64> = predicted.iter().zip(observed).map(|(p, y)| p - y).collect();
        let ss_res: f64 = diffs.iter().map(|d| sqr(*d)).sum();
        let ss_tot: f64 = observed.iter().map(|y| sqr(y - observed_mean)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };
        let stats = Self {
            r2,
            bias: mean(&diffs),
            rmse: (ss_res / observed.len() as f64).sqrt(),
        };
        if stats.r2.is_finite() && stats.bias.is_finite() && stats.rmse.is_finite() {
            Ok(stats)
        } else {
            Err(FitError::NonFinite {
                what: "goodness-of-fit statistics",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_fit() {
        let y = [0.1, 0.2, 0.3];
        let s = GoodnessOfFit::compute(&y, &y).unwrap();
        assert_eq!(s.r2, 1.0);
        assert_eq!(s.bias, 0.0);
        assert_eq!(s.rmse, 0.0);
    }

    #[test]
    fn known_values() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let p = [1.5, 2.0, 2.5, 4.0];
        let s = GoodnessOfFit::compute(&y, &p).unwrap();
        // SS_res = 0.5, SS_tot = 5.
        assert_relative_eq!(s.r2, 0.9);
        assert_relative_eq!(s.bias, 0.0);
        assert_relative_eq!(s.rmse, (0.5f64 / 4.0).sqrt());

        let s = GoodnessOfFit::compute(&y, &[2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_relative_eq!(s.bias, 1.0);
        assert_relative_eq!(s.rmse, 1.0);
    }

    #[test]
    fn constant_observations() {
        let y = [0.25; 4];
        assert_eq!(GoodnessOfFit::compute(&y, &y).unwrap().r2, 1.0);
        assert_eq!(GoodnessOfFit::compute(&y, &[0.5; 4]).unwrap().r2, 0.0);
    }

    #[test]
    fn rejects_misaligned_and_non_finite() {
        assert!(matches!(
            GoodnessOfFit::compute(&[1.0, 2.0], &[1.0]),
            Err(FitError::Shape { .. })
        ));
        assert!(matches!(
            GoodnessOfFit::compute(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(FitError::NonFinite { .. })
        ));
    }
}
