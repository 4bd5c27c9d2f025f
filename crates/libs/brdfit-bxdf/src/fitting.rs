//! Fitting of the reflectance models to observed reflectance.
//!
//! Every (band, model) pair is fitted independently: nonlinear models go
//! through Levenberg-Marquardt ([`nllsq_fit`]), linear kernel models through
//! ordinary least squares on the kernel design matrix ([`ols_fit`]). A pair
//! either yields a [`FitResult`] or a [`FitFailure`]; a failure never
//! affects the other pairs.

mod nllsq;
mod ols;
mod stats;

pub use nllsq::{nllsq_fit, MinimisationReport, NllsqConfig, NllsqFittingProxy, NonlinearFit};
pub use ols::{ols_fit, LinearFit};
pub use stats::GoodnessOfFit;

use crate::{
    kernel::KernelParams,
    model::{design_matrix, BrdfModel, FittingStrategy},
};
use base::{error::FitError, geometry::Dataset, Band};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default evaluation budget of the nonlinear solver.
pub const DEFAULT_MAX_EVALUATIONS: usize = 5000;

/// Solver settings overriding the defaults for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelOptions {
    /// Initial parameter values.
    pub initial: Option<Vec<f64>>,
    /// Closed box [lower, upper] per parameter.
    pub bounds: Option<Vec<[f64; 2]>>,
    /// Evaluation budget of this model.
    pub max_evaluations: Option<usize>,
}

/// Options of a fitting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Evaluation budget of the nonlinear solver.
    pub max_evaluations: usize,
    /// Fit the (band, model) pairs in parallel.
    pub parallel: bool,
    /// Kernel constants.
    pub kernel: KernelParams,
    /// Per-model overrides keyed by model name.
    pub models: BTreeMap<String, ModelOptions>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
            parallel: false,
            kernel: KernelParams::default(),
            models: BTreeMap::new(),
        }
    }
}

impl FitOptions {
    /// Checks the kernel constants and that every per-model entry names a
    /// known model.
    pub fn validate(&self) -> Result<(), FitError> {
        self.kernel.validate()?;
        for name in self.models.keys() {
            name.parse::<BrdfModel>().map_err(FitError::InvalidConfig)?;
        }
        Ok(())
    }

    /// Returns the overrides of the given model, if any.
    pub fn model_options(&self, model: BrdfModel) -> Option<&ModelOptions> {
        self.models
            .iter()
            .find(|(name, _)| name.parse::<BrdfModel>().is_ok_and(|m| m == model))
            .map(|(_, opts)| opts)
    }

    /// Solver settings of a nonlinear model.
    pub fn nllsq_config(&self, model: BrdfModel) -> NllsqConfig {
        let mut config = NllsqConfig::new(model, self.max_evaluations);
        if let Some(opts) = self.model_options(model) {
            if let Some(initial) = &opts.initial {
                config.initial = initial.clone();
            }
            config.bounds = opts.bounds.clone();
            if let Some(max_evaluations) = opts.max_evaluations {
                config.max_evaluations = max_evaluations;
            }
        }
        config
    }
}

/// Fitted parameters of a model.
#[derive(Debug, PartialEq)]
pub enum FittedParams {
    /// Parameters found by nonlinear least squares.
    Nonlinear(NonlinearFit),
    /// Intercept and kernel coefficients found by ordinary least squares.
    Linear(LinearFit),
}

impl FittedParams {
    /// Parameters in [`BrdfModel::param_names`] order.
    pub fn values(&self) -> Vec<f64> {
        match self {
            FittedParams::Nonlinear(fit) => fit.params.to_vec(),
            FittedParams::Linear(fit) => fit.params().to_vec(),
        }
    }
}

/// Outcome of a successful fit of one (band, model) pair.
#[derive(Debug, PartialEq)]
pub struct FitResult {
    /// Fitted band.
    pub band: Band,
    /// Fitted model.
    pub model: BrdfModel,
    /// Goodness-of-fit.
    pub stats: GoodnessOfFit,
    /// Fitted parameters or coefficients.
    pub params: FittedParams,
    /// Model prediction for every observation.
    pub fitted: Box<[f64]>,
}

/// A (band, model) pair that could not be fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FitFailure {
    /// Band of the pair.
    pub band: Band,
    /// Model of the pair.
    pub model: BrdfModel,
    /// What went wrong.
    pub error: FitError,
}

/// Fits one model to one band of the dataset.
pub fn fit_pair(
    band: Band,
    model: BrdfModel,
    dataset: &Dataset,
    options: &FitOptions,
) -> Result<FitResult, FitError> {
    let geometry = dataset.geometry();
    let measured = dataset.band(band);
    let kernel = &options.kernel;
    kernel.validate()?;
    let params = match model.strategy() {
        FittingStrategy::Nonlinear { .. } => FittedParams::Nonlinear(nllsq_fit(
            model,
            geometry,
            measured,
            kernel,
            &options.nllsq_config(model),
        )?),
        FittingStrategy::Linear { kernel: volumetric } => {
            FittedParams::Linear(ols_fit(&design_matrix(volumetric, geometry, kernel), measured)?)
        },
    };
    let fitted = model.predict(&params.values(), geometry, kernel)?;
    if fitted.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite {
            what: "fitted reflectance",
        });
    }
    let stats = GoodnessOfFit::compute(measured, &fitted)?;
    Ok(FitResult {
        band,
        model,
        stats,
        params,
        fitted,
    })
}

/// Results of fitting a set of models to a set of bands.
#[derive(Debug, Default, PartialEq)]
pub struct FittingReport {
    entries: BTreeMap<Band, BTreeMap<BrdfModel, Result<FitResult, FitFailure>>>,
}

impl FittingReport {
    /// Records the outcome of a pair.
    pub fn insert(&mut self, band: Band, model: BrdfModel, outcome: Result<FitResult, FitError>) {
        let outcome = outcome.map_err(|error| FitFailure { band, model, error });
        self.entries.entry(band).or_default().insert(model, outcome);
    }

    /// Outcome of a pair.
    pub fn get(&self, band: Band, model: BrdfModel) -> Option<&Result<FitResult, FitFailure>> {
        self.entries.get(&band).and_then(|models| models.get(&model))
    }

    /// Failure of a pair, if it failed.
    pub fn failure(&self, band: Band, model: BrdfModel) -> Option<&FitFailure> {
        self.get(band, model).and_then(|r| r.as_ref().err())
    }

    /// All outcomes, ordered by band then model.
    pub fn iter(&self) -> impl Iterator<Item = &Result<FitResult, FitFailure>> {
        self.entries.values().flat_map(|models| models.values())
    }

    /// Successful fits.
    pub fn results(&self) -> impl Iterator<Item = &FitResult> {
        self.iter().filter_map(|r| r.as_ref().ok())
    }

    /// Failed fits.
    pub fn failures(&self) -> impl Iterator<Item = &FitFailure> {
        self.iter().filter_map(|r| r.as_ref().err())
    }

    /// Number of recorded pairs.
    pub fn len(&self) -> usize { self.entries.values().map(|m| m.len()).sum() }

    /// Whether no pair has been recorded.
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Fits every model to every band of the dataset.
pub fn fit_dataset(
    dataset: &Dataset,
    bands: &[Band],
    models: &[BrdfModel],
    options: &FitOptions,
) -> FittingReport {
    let pairs = bands
        .iter()
        .flat_map(|band| models.iter().map(move |model| (*band, *model)))
        .collect::<Vec<_>>();
    let fit = |(band, model): (Band, BrdfModel)| {
        let outcome = fit_pair(band, model, dataset, options);
        match &outcome {
            Ok(result) => log::debug!(
                "{} on {}: R² = {}, RMSE = {}",
                model,
                band,
                result.stats.r2,
                result.stats.rmse
            ),
            Err(err) => log::warn!("Model {} fitting failed for {}: {}", model, band, err),
        }
        (band, model, outcome)
    };
    let outcomes: Vec<_> = if options.parallel {
        pairs.into_par_iter().map(fit).collect()
    } else {
        pairs.into_iter().map(fit).collect()
    };

    let mut report = FittingReport::default();
    for (band, model, outcome) in outcomes {
        report.insert(band, model, outcome);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{li_sparse_reciprocal, ross_thick};
    use approx::assert_relative_eq;
    use base::geometry::{AngleTuple, Geometry};

    fn scenario() -> Dataset {
        let geometry = Geometry::new(
            vec![30.0, 35.0, 20.0, 40.0, 25.0],
            vec![10.0, 15.0, 5.0, 20.0, 12.0],
            vec![100.0, 110.0, 90.0, 120.0, 95.0],
            vec![150.0, 160.0, 140.0, 170.0, 145.0],
        )
        .unwrap();
        Dataset::new(
            geometry,
            vec![0.05, 0.06, 0.04, 0.07, 0.045],
            vec![0.3, 0.32, 0.28, 0.35, 0.29],
        )
        .unwrap()
    }

    #[test]
    fn end_to_end_scenario() {
        let report = fit_dataset(&scenario(), &Band::ALL, &BrdfModel::ALL, &FitOptions::default());
        assert_eq!(report.len(), 10);
        for band in Band::ALL {
            for model in BrdfModel::ALL {
                match report.get(band, model).unwrap() {
                    Ok(result) => {
                        assert_eq!((result.band, result.model), (band, model));
                        assert!(result.stats.r2.is_finite());
                        assert!(result.stats.bias.is_finite());
                        assert!(result.stats.rmse.is_finite() && result.stats.rmse >= 0.0);
                        assert_eq!(result.fitted.len(), 5);
                        assert_eq!(result.params.values().len(), model.n_params());
                    },
                    Err(failure) => assert_eq!((failure.band, failure.model), (band, model)),
                }
            }
            // Five distinct geometries give a full-rank kernel design.
            assert!(report.get(band, BrdfModel::Rtlsr).unwrap().is_ok());
            assert!(report.get(band, BrdfModel::Maignan2004).unwrap().is_ok());
        }
        assert_eq!(report.results().count() + report.failures().count(), 10);
    }

    #[test]
    fn nan_observation_fails_only_its_band() {
        let clean = fit_dataset(&scenario(), &Band::ALL, &BrdfModel::ALL, &FitOptions::default());
        let mut dataset = scenario();
        dataset
            .set_band(Band::Red, vec![0.05, 0.06, f64::NAN, 0.07, 0.045])
            .unwrap();
        let report = fit_dataset(&dataset, &Band::ALL, &BrdfModel::ALL, &FitOptions::default());
        assert_eq!(report.len(), 10);
        for model in BrdfModel::ALL {
            let failure = report.failure(Band::Red, model).unwrap();
            assert!(matches!(failure.error, FitError::NonFinite { .. }));
            assert_eq!(report.get(Band::Nir, model), clean.get(Band::Nir, model));
        }
    }

    #[test]
    fn invalid_model_options_fail_only_that_model() {
        let clean = fit_dataset(&scenario(), &Band::ALL, &BrdfModel::ALL, &FitOptions::default());
        let mut options = FitOptions::default();
        options.models.insert(String::from("Original_RPV"), ModelOptions {
            initial: Some(vec![1.0, 1.0]),
            ..Default::default()
        });
        let report = fit_dataset(&scenario(), &Band::ALL, &BrdfModel::ALL, &options);
        for band in Band::ALL {
            for model in BrdfModel::ALL {
                if model == BrdfModel::OriginalRpv {
                    let failure = report.failure(band, model).unwrap();
                    assert!(matches!(failure.error, FitError::InvalidConfig(_)));
                } else {
                    assert_eq!(report.get(band, model), clean.get(band, model));
                }
            }
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let sequential = fit_dataset(&scenario(), &Band::ALL, &BrdfModel::ALL, &FitOptions::default());
        let options = FitOptions {
            parallel: true,
            ..FitOptions::default()
        };
        let parallel = fit_dataset(&scenario(), &Band::ALL, &BrdfModel::ALL, &options);
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn rtlsr_recovers_generating_coefficients() {
        let mut rows = Vec::new();
        for sza in [15.0, 30.0, 45.0, 60.0] {
            for vza in [0.0, 20.0, 40.0] {
                for vaa in [30.0, 90.0, 150.0] {
                    rows.push(AngleTuple::new(sza, vza, 10.0, vaa));
                }
            }
        }
        let geometry = Geometry::from_rows(&rows);
        let kernel = KernelParams::default();
        let (a, b, c) = (0.08, 0.05, 0.012);
        let k_vol = ross_thick(&geometry);
        let k_geo = li_sparse_reciprocal(&geometry, &kernel);
        let nir: Vec<f64> = (0..geometry.len())
            .map(|i| a + b * k_vol[i] + c * k_geo[i])
            .collect();
        let dataset = Dataset::new(geometry, vec![0.1; rows.len()], nir).unwrap();

        let result = fit_pair(Band::Nir, BrdfModel::Rtlsr, &dataset, &FitOptions::default()).unwrap();
        let FittedParams::Linear(fit) = result.params else {
            panic!("RTLSR is fitted by linear regression");
        };
        assert_relative_eq!(fit.intercept, a, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[0], b, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], c, epsilon = 1e-10);
        assert_relative_eq!(result.stats.r2, 1.0, epsilon = 1e-10);
        assert!(result.stats.rmse < 1e-12);
    }

    #[test]
    fn options_from_toml() {
        let options: FitOptions = toml::from_str(
            r#"
            max_evaluations = 800
            parallel = true

            [kernel]
            hotspot_width = "2 deg"

            [models.Original_RPV]
            initial = [0.1, 0.8, -0.1]
            bounds = [[0.0, 1.0], [0.0, 2.0], [-1.0, 1.0]]

            [models.Jiao2016]
            max_evaluations = 10000
            "#,
        )
        .unwrap();
        options.validate().unwrap();
        assert_eq!(options.max_evaluations, 800);
        assert!(options.parallel);
        assert_eq!(options.kernel.b2h, 1.0);

        let config = options.nllsq_config(BrdfModel::OriginalRpv);
        assert_eq!(config.initial, vec![0.1, 0.8, -0.1]);
        assert_eq!(config.bounds.as_ref().map(|b| b.len()), Some(3));
        assert_eq!(config.max_evaluations, 800);

        let config = options.nllsq_config(BrdfModel::Jiao2016);
        assert_eq!(config.initial, vec![1.0; 5]);
        assert_eq!(config.max_evaluations, 10000);
    }

    #[test]
    fn zero_hotspot_width_is_invalid_config() {
        let options: FitOptions = toml::from_str("[kernel]\nhotspot_width = \"0 deg\"").unwrap();
        assert!(matches!(options.validate(), Err(FitError::InvalidConfig(_))));
        let report = fit_dataset(&scenario(), &[Band::Nir], &[BrdfModel::Maignan2004], &options);
        let failure = report.failure(Band::Nir, BrdfModel::Maignan2004).unwrap();
        assert!(matches!(failure.error, FitError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_model_in_options() {
        let mut options = FitOptions::default();
        options.models.insert(String::from("Walthall"), ModelOptions::default());
        assert!(matches!(options.validate(), Err(FitError::InvalidConfig(_))));
    }
}
