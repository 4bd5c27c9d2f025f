use crate::{kernel::KernelParams, model::BrdfModel};
use base::{error::FitError, geometry::Geometry};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, MinimizationReport, TerminationReason};
use nalgebra::{DMatrix, DVector, Dyn, Matrix, Owned, VecStorage, Vector, U1};

/// Report of a minimisation process.
#[derive(Debug, PartialEq)]
pub struct MinimisationReport {
    /// The number of data points used in the fitting process.
    pub n_data_points: usize,
    /// Half of the sum of the squared residuals at the solution.
    pub objective_fn: f64,
    /// The number of residual evaluations performed.
    pub n_evaluations: usize,
    /// The reason for termination.
    pub termination: TerminationReason,
}

impl MinimisationReport {
    /// Creates a new minimisation report from the results of the levenberg
    /// marquardt minimisation process.
    pub fn from_lm_nllsq(report: MinimizationReport<f64>, n_data_points: usize) -> Self {
        MinimisationReport {
            n_data_points,
            objective_fn: report.objective_function,
            n_evaluations: report.number_of_evaluations,
            termination: report.termination,
        }
    }
}

/// Solver settings of one nonlinear fit.
#[derive(Debug, Clone, PartialEq)]
pub struct NllsqConfig {
    /// Initial parameter values.
    pub initial: Vec<f64>,
    /// Closed box [lower, upper] per parameter.
    pub bounds: Option<Vec<[f64; 2]>>,
    /// Maximum number of residual evaluations.
    pub max_evaluations: usize,
}

impl NllsqConfig {
    /// Default settings: every parameter starts at 1, no bounds.
    pub fn new(model: BrdfModel, max_evaluations: usize) -> Self {
        Self {
            initial: vec![1.0; model.n_params()],
            bounds: None,
            max_evaluations,
        }
    }

    /// Checks the settings against the parameters of the model.
    pub fn validate(&self, model: BrdfModel) -> Result<(), FitError> {
        let n = model.n_params();
        if self.initial.len() != n {
            return Err(FitError::InvalidConfig(format!(
                "{} takes {} parameters, the initial guess has {}",
                model,
                n,
                self.initial.len()
            )));
        }
        if self.initial.iter().any(|p| !p.is_finite()) {
            return Err(FitError::InvalidConfig(format!(
                "initial guess of {model} is not finite"
            )));
        }
        if let Some(bounds) = &self.bounds {
            if bounds.len() != n {
                return Err(FitError::InvalidConfig(format!(
                    "{} takes {} parameters, {} bounds given",
                    model,
                    n,
                    bounds.len()
                )));
            }
            if let Some((i, _)) = bounds.iter().enumerate().find(|(_, [lo, hi])| !(lo <= hi)) {
                return Err(FitError::InvalidConfig(format!(
                    "empty bounds for parameter '{}' of {}",
                    model.param_names()[i],
                    model
                )));
            }
        }
        if self.max_evaluations == 0 {
            return Err(FitError::InvalidConfig(String::from(
                "the evaluation budget must be positive",
            )));
        }
        Ok(())
    }
}

/// Outcome of a successful nonlinear fit.
#[derive(Debug, PartialEq)]
pub struct NonlinearFit {
    /// Fitted parameters in [`BrdfModel::param_names`] order.
    pub params: Box<[f64]>,
    /// Solver report.
    pub report: MinimisationReport,
}

/// A proxy for fitting a nonlinear reflectance model using the NLLSQ
/// algorithm.
///
/// Residuals are `model − measured`; the Jacobian holds the analytic partial
/// derivatives of the model.
pub struct NllsqFittingProxy<'a> {
    /// The model being fitted.
    model: BrdfModel,
    /// Observation geometry.
    geometry: &'a Geometry,
    /// Measured reflectance, aligned with the geometry.
    measured: &'a [f64],
    /// Kernel constants used by kernel-based models.
    kernel: &'a KernelParams,
    /// Optional box constraints.
    bounds: Option<&'a [[f64; 2]]>,
    /// Current parameters.
    params: DVector<f64>,
}

impl<'a> NllsqFittingProxy<'a> {
    /// Creates a new proxy starting at `initial`.
    pub fn new(
        model: BrdfModel,
        geometry: &'a Geometry,
        measured: &'a [f64],
        kernel: &'a KernelParams,
        initial: &[f64],
        bounds: Option<&'a [[f64; 2]]>,
    ) -> Self {
        let mut proxy = Self {
            model,
            geometry,
            measured,
            kernel,
            bounds,
            params: DVector::from_column_slice(initial),
        };
        proxy.project();
        proxy
    }

    /// Clamps the parameters into the bounds, if any.
    fn project(&mut self) {
        if let Some(bounds) = self.bounds {
            for (p, [lo, hi]) in self.params.iter_mut().zip(bounds) {
                *p = p.clamp(*lo, *hi);
            }
        }
    }

    fn eval_residuals(&self) -> DVector<f64> {
        let params = self.params.as_slice();
        DVector::from_iterator(
            self.measured.len(),
            self.geometry
                .iter()
                .zip(self.measured)
                .map(|(row, y)| self.model.eval(params, &row, self.kernel) - y),
        )
    }

    fn eval_jacobian(&self) -> DMatrix<f64> {
        let n = self.model.n_params();
        let params = self.params.as_slice();
        let mut jacobian = DMatrix::zeros(self.measured.len(), n);
        let mut pd = vec![0.0; n];
        for (i, row) in self.geometry.iter().enumerate() {
            self.model.pd(params, &row, self.kernel, &mut pd);
            for (j, d) in pd.iter().enumerate() {
                jacobian[(i, j)] = *d;
            }
        }
        jacobian
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for NllsqFittingProxy<'_> {
    type ResidualStorage = VecStorage<f64, Dyn, U1>;

    type JacobianStorage = Owned<f64, Dyn, Dyn>;

    type ParameterStorage = Owned<f64, Dyn, U1>;

    fn set_params(&mut self, x: &Vector<f64, Dyn, Self::ParameterStorage>) {
        self.params.copy_from(x);
        self.project();
    }

    fn params(&self) -> Vector<f64, Dyn, Self::ParameterStorage> { self.params.clone() }

    fn residuals(&self) -> Option<Vector<f64, Dyn, Self::ResidualStorage>> {
        let residuals = self.eval_residuals();
        residuals.iter().all(|r| r.is_finite()).then_some(residuals)
    }

    fn jacobian(&self) -> Option<Matrix<f64, Dyn, Dyn, Self::JacobianStorage>> {
        let jacobian = self.eval_jacobian();
        jacobian.iter().all(|d| d.is_finite()).then_some(jacobian)
    }
}

/// Fits a nonlinear model to the measured reflectance with
/// Levenberg-Marquardt.
///
/// The fit succeeds only if the solver reports convergence and every fitted
/// parameter is finite.
pub fn nllsq_fit(
    model: BrdfModel,
    geometry: &Geometry,
    measured: &[f64],
    kernel: &KernelParams,
    config: &NllsqConfig,
) -> Result<NonlinearFit, FitError> {
    FitError::check_len("observed reflectance", geometry.len(), measured.len())?;
    config.validate(model)?;
    let n_params = model.n_params();
    if measured.len() < n_params {
        return Err(FitError::Underdetermined {
            observations: measured.len(),
            params: n_params,
        });
    }
    if !geometry.is_finite() {
        return Err(FitError::NonFinite {
            what: "observation geometry",
        });
    }
    if measured.iter().any(|y| !y.is_finite()) {
        return Err(FitError::NonFinite {
            what: "observed reflectance",
        });
    }

    let proxy = NllsqFittingProxy::new(
        model,
        geometry,
        measured,
        kernel,
        &config.initial,
        config.bounds.as_deref(),
    );
    let patience = (config.max_evaluations / (n_params + 1)).max(1);
    let solver = LevenbergMarquardt::new().with_patience(patience);
    let (result, report) = solver.minimize(proxy);
    let report = MinimisationReport::from_lm_nllsq(report, measured.len());
    log::debug!(
        "{} stopped after {} evaluations: {:?}, objective {}",
        model,
        report.n_evaluations,
        report.termination,
        report.objective_fn
    );
    if !report.termination.was_successful() {
        return Err(FitError::Convergence {
            reason: format!("{:?}", report.termination),
        });
    }
    let params: Box<[f64]> = result.params.as_slice().into();
    if params.iter().any(|p| !p.is_finite()) {
        return Err(FitError::NonFinite {
            what: "fitted parameters",
        });
    }
    Ok(NonlinearFit { params, report })
}
