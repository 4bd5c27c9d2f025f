use base::error::FitError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Coefficients of a linear kernel model `f_iso + f_vol·K_vol + f_geo·K_geo`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    /// Intercept f_iso.
    pub intercept: f64,
    /// Kernel coefficients [f_vol, f_geo].
    pub coefficients: [f64; 2],
}

impl LinearFit {
    /// Coefficients in model parameter order [f_iso, f_vol, f_geo].
    pub fn params(&self) -> [f64; 3] {
        [self.intercept, self.coefficients[0], self.coefficients[1]]
    }
}

/// Solves the ordinary least-squares problem `design · β ≈ y` for a design
/// matrix with columns [1, K_vol, K_geo].
///
/// The solve goes through the SVD of the design matrix. Singular values
/// below `σ_max · max(n, 3) · ε` count as zero; a numerical rank below 3 is
/// reported as [`FitError::SingularDesignMatrix`].
pub fn ols_fit(design: &DMatrix<f64>, y: &[f64]) -> Result<LinearFit, FitError> {
    let (n, cols) = design.shape();
    FitError::check_len("design matrix columns", 3, cols)?;
    FitError::check_len("observations", n, y.len())?;
    if n < cols {
        return Err(FitError::Underdetermined {
            observations: n,
            params: cols,
        });
    }
    if design.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite {
            what: "kernel design matrix",
        });
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite {
            what: "observed reflectance",
        });
    }

    let svd = design.clone().svd(true, true);
    let eps = svd.singular_values.max() * n.max(cols) as f64 * f64::EPSILON;
    let rank = svd.rank(eps);
    if rank < cols {
        return Err(FitError::SingularDesignMatrix {
            rank,
            required: cols,
        });
    }
    let beta = svd
        .solve(&DVector::from_column_slice(y), eps)
        .map_err(|reason| FitError::Convergence {
            reason: reason.to_string(),
        })?;
    log::trace!("OLS coefficients: {:?}", beta.as_slice());
    Ok(LinearFit {
        intercept: beta[0],
        coefficients: [beta[1], beta[2]],
    })
}
