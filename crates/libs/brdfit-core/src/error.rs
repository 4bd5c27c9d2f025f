//! Error types for brdfit.

use std::{
    error::Error,
    fmt::{Debug, Display, Formatter},
};

/// Errors raised while evaluating or fitting a BRDF model.
///
/// Every fit of a (band, model) pair either yields a result or exactly one of
/// these errors; the fitting driver records it and moves on to the next pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// Parallel angle/reflectance arrays have different lengths.
    #[error("shape mismatch for {what}: expected {expected} elements, got {actual}")]
    Shape {
        /// The array that does not match.
        what: &'static str,
        /// Expected number of elements.
        expected: usize,
        /// Actual number of elements.
        actual: usize,
    },
    /// The nonlinear solver stopped without converging.
    #[error("solver did not converge: {reason}")]
    Convergence {
        /// Reason reported by the solver.
        reason: String,
    },
    /// The kernel design matrix of a linear model is rank deficient.
    #[error("singular design matrix: rank {rank} < {required}")]
    SingularDesignMatrix {
        /// Numerical rank of the design matrix.
        rank: usize,
        /// Number of columns of the design matrix.
        required: usize,
    },
    /// Fewer observations than free parameters.
    #[error("{observations} observations cannot determine {params} parameters")]
    Underdetermined {
        /// Number of observations.
        observations: usize,
        /// Number of free parameters.
        params: usize,
    },
    /// NaN or infinity found in the data or produced by the fit.
    #[error("non-finite values in {what}")]
    NonFinite {
        /// Where the value was found.
        what: &'static str,
    },
    /// The fitting options are inconsistent with the model.
    #[error("invalid fitting configuration: {0}")]
    InvalidConfig(String),
}

impl FitError {
    /// Checks that an array has the expected number of elements.
    pub fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(FitError::Shape {
                what,
                expected,
                actual,
            })
        }
    }
}

/// Errors raised while reading an observation table.
#[cfg(feature = "io")]
#[derive(Debug, thiserror::Error)]
pub enum ReadDatasetError {
    /// I/O error while opening or reading the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// A required column is not present in the header.
    #[error("required column '{0}' not found in the header")]
    MissingColumn(String),
    /// A cell could not be parsed as a number.
    #[error("row {row}, column '{column}': cannot parse '{value}' as a number")]
    Parse {
        /// Data row index (0-based, header excluded).
        row: usize,
        /// Column name.
        column: String,
        /// Raw cell content.
        value: String,
    },
    /// The table contains no data rows.
    #[error("the table contains no observations")]
    Empty,
    /// The columns could not be assembled into aligned arrays.
    #[error("inconsistent table: {0}")]
    Inconsistent(#[from] FitError),
}

/// Application level error carrying a message and its cause.
#[derive(Debug)]
pub struct BrdfitError {
    message: String,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl Display for BrdfitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(cause) => write!(f, "{}, caused by: {}", self.message, cause),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Error for BrdfitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl BrdfitError {
    /// Creates a new error.
    pub fn new<S>(message: S, source: Option<Box<dyn Error + Send + Sync>>) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            source,
        }
    }

    /// Creates a new error from a std::io::Error.
    pub fn from_io_error<S>(err: std::io::Error, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(message, Some(Box::new(err)))
    }

    /// Creates a new error from a [`ReadDatasetError`].
    #[cfg(feature = "io")]
    pub fn from_read_dataset_error<S>(err: ReadDatasetError, message: S) -> Self
    where
        S: Into<String>,
    {
        Self::new(message, Some(Box::new(err)))
    }

    /// Returns the error message without its cause.
    pub fn message(&self) -> &str { &self.message }
}
