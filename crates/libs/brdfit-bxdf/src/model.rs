//! Reflectance models.
//!
//! Every model predicts the reflectance of an observation from its
//! geometry. Three of them are nonlinear in their parameters and are fitted
//! with Levenberg-Marquardt; the two kernel-driven ones are linear in their
//! coefficients and are fitted by ordinary least squares.

mod jiao;
mod linear;
mod rpv;

pub use jiao::Jiao2016;
pub use linear::{design_matrix, kernels_at};
pub use rpv::{Hotspot, Rpv};

use crate::kernel::{KernelParams, Trig, VolumetricKernel};
use base::{
    error::FitError,
    geometry::{AngleTuple, Geometry},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// The fitted models, in reporting order.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BrdfModel {
    /// RPV with exponential hotspot sharpening (ρ, k, Θ, C1, C2).
    #[serde(rename = "Improved_RPV")]
    #[cfg_attr(feature = "cli", clap(name = "Improved_RPV"))]
    ImprovedRpv,
    /// Original RPV (ρ, k, Θ).
    #[serde(rename = "Original_RPV")]
    #[cfg_attr(feature = "cli", clap(name = "Original_RPV"))]
    OriginalRpv,
    /// Ross-Thick + Li-Sparse-Reciprocal linear kernel model.
    #[serde(rename = "RTLSR")]
    #[cfg_attr(feature = "cli", clap(name = "RTLSR"))]
    Rtlsr,
    /// Jiao-2016 hotspot-corrected kernel model (f0, f1, f2, C1, C2).
    #[serde(rename = "Jiao2016")]
    #[cfg_attr(feature = "cli", clap(name = "Jiao2016"))]
    Jiao2016,
    /// Maignan-2004 + Li-Sparse-Reciprocal linear kernel model.
    #[serde(rename = "Maignan2004")]
    #[cfg_attr(feature = "cli", clap(name = "Maignan2004"))]
    Maignan2004,
}

/// How a model's parameters are estimated.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FittingStrategy {
    /// Nonlinear least squares over `n_params` parameters.
    Nonlinear {
        /// Number of free parameters.
        n_params: usize,
    },
    /// Ordinary least squares with intercept over [K_vol, K_geo].
    Linear {
        /// Volumetric kernel of the design matrix.
        kernel: VolumetricKernel,
    },
}

impl BrdfModel {
    /// All models in reporting order.
    pub const ALL: [BrdfModel; 5] = [
        BrdfModel::ImprovedRpv,
        BrdfModel::OriginalRpv,
        BrdfModel::Rtlsr,
        BrdfModel::Jiao2016,
        BrdfModel::Maignan2004,
    ];

    /// Name of the model as printed in reports.
    pub const fn name(&self) -> &'static str {
        match self {
            BrdfModel::ImprovedRpv => "Improved_RPV",
            BrdfModel::OriginalRpv => "Original_RPV",
            BrdfModel::Rtlsr => "RTLSR",
            BrdfModel::Jiao2016 => "Jiao2016",
            BrdfModel::Maignan2004 => "Maignan2004",
        }
    }

    /// Fitting strategy of the model.
    pub const fn strategy(&self) -> FittingStrategy {
        match self {
            BrdfModel::ImprovedRpv | BrdfModel::Jiao2016 => {
                FittingStrategy::Nonlinear { n_params: 5 }
            },
            BrdfModel::OriginalRpv => FittingStrategy::Nonlinear { n_params: 3 },
            BrdfModel::Rtlsr => FittingStrategy::Linear {
                kernel: VolumetricKernel::RossThick,
            },
            BrdfModel::Maignan2004 => FittingStrategy::Linear {
                kernel: VolumetricKernel::Maignan,
            },
        }
    }

    /// Whether the model is fitted by nonlinear least squares.
    pub const fn is_nonlinear(&self) -> bool {
        matches!(self.strategy(), FittingStrategy::Nonlinear { .. })
    }

    /// Number of parameters, including the intercept of linear models.
    pub const fn n_params(&self) -> usize {
        match self.strategy() {
            FittingStrategy::Nonlinear { n_params } => n_params,
            FittingStrategy::Linear { .. } => 3,
        }
    }

    /// Volumetric kernel of a linear model.
    pub const fn volumetric_kernel(&self) -> Option<VolumetricKernel> {
        match self.strategy() {
            FittingStrategy::Linear { kernel } => Some(kernel),
            FittingStrategy::Nonlinear { .. } => None,
        }
    }

    /// Names of the parameters in the order they are stored.
    pub const fn param_names(&self) -> &'static [&'static str] {
        match self {
            BrdfModel::ImprovedRpv => &["rho", "k", "theta", "c1", "c2"],
            BrdfModel::OriginalRpv => &["rho", "k", "theta"],
            BrdfModel::Jiao2016 => &["f0", "f1", "f2", "c1", "c2"],
            BrdfModel::Rtlsr | BrdfModel::Maignan2004 => &["f_iso", "f_vol", "f_geo"],
        }
    }

    /// Evaluates the model for one observation.
    ///
    /// `params` must hold [`n_params`](Self::n_params) values; linear models
    /// take `[f_iso, f_vol, f_geo]`.
    pub fn eval(&self, params: &[f64], row: &AngleTuple, kernel: &KernelParams) -> f64 {
        debug_assert_eq!(params.len(), self.n_params());
        match self {
            BrdfModel::ImprovedRpv | BrdfModel::OriginalRpv => {
                Rpv::from_params(params).eval(&Trig::new(row))
            },
            BrdfModel::Jiao2016 => Jiao2016::from_params(params).eval(row, kernel),
            BrdfModel::Rtlsr => linear_eval(VolumetricKernel::RossThick, params, row, kernel),
            BrdfModel::Maignan2004 => linear_eval(VolumetricKernel::Maignan, params, row, kernel),
        }
    }

    /// Writes the partial derivatives of the model with respect to each
    /// parameter at one observation into `out`.
    pub fn pd(&self, params: &[f64], row: &AngleTuple, kernel: &KernelParams, out: &mut [f64]) {
        debug_assert_eq!(params.len(), self.n_params());
        debug_assert_eq!(out.len(), self.n_params());
        match self {
            BrdfModel::ImprovedRpv | BrdfModel::OriginalRpv => {
                Rpv::from_params(params).pd(&Trig::new(row), out)
            },
            BrdfModel::Jiao2016 => Jiao2016::from_params(params).pd(row, kernel, out),
            BrdfModel::Rtlsr => linear_pd(VolumetricKernel::RossThick, row, kernel, out),
            BrdfModel::Maignan2004 => linear_pd(VolumetricKernel::Maignan, row, kernel, out),
        }
    }

    /// Predicts the reflectance of every observation of the geometry.
    pub fn predict(
        &self,
        params: &[f64],
        geometry: &Geometry,
        kernel: &KernelParams,
    ) -> Result<Box<[f64]>, FitError> {
        FitError::check_len("model parameters", self.n_params(), params.len())?;
        Ok(geometry
            .iter()
            .map(|row| self.eval(params, &row, kernel))
            .collect())
    }
}

fn linear_eval(kernel: VolumetricKernel, params: &[f64], row: &AngleTuple, kp: &KernelParams) -> f64 {
    let (k_vol, k_geo) = kernels_at(kernel, row, kp);
    params[0] + params[1] * k_vol + params[2] * k_geo
}

fn linear_pd(kernel: VolumetricKernel, row: &AngleTuple, kp: &KernelParams, out: &mut [f64]) {
    let (k_vol, k_geo) = kernels_at(kernel, row, kp);
    out[0] = 1.0;
    out[1] = k_vol;
    out[2] = k_geo;
}

impl Display for BrdfModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

impl FromStr for BrdfModel {
    type Err = String;

    /// Parses a model name, ignoring case, `-` and `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalise = |s: &str| {
            s.chars()
                .filter(|c| !matches!(c, '_' | '-'))
                .flat_map(char::to_lowercase)
                .collect::<String>()
        };
        let wanted = normalise(s);
        BrdfModel::ALL
            .into_iter()
            .find(|m| normalise(m.name()) == wanted)
            .ok_or_else(|| format!("unknown BRDF model '{s}'"))
    }
}
