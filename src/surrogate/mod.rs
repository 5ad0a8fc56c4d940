//! Probabilistic surrogate models.
//!
//! The proposal engine treats the surrogate as a regression oracle: fit it
//! on the history, then ask for a predictive mean and standard deviation at
//! arbitrary query points. [`Surrogate`] and [`Predictor`] are that contract;
//! any backend with calibrated uncertainty (Gaussian process, Bayesian
//! ridge, an ensemble) can implement them.
//!
//! [`GaussianProcess`] is the built-in backend.

mod gp;
mod kernel;
mod lbfgs;
mod scaler;

pub use gp::{FittedGp, GaussianProcess, GaussianProcessBuilder, Hyperparameter, KernelParams};
pub use kernel::Smoothness;
pub use scaler::InputScaler;

use crate::error::{Error, Result};

/// Smallest predictive standard deviation a [`Predictor`] may report.
///
/// Degenerate posteriors (exact interpolation, near-singular kernels) are
/// floored here instead of yielding zero or NaN.
pub const MIN_STD: f64 = 1e-12;

/// Fits a [`Predictor`] from scratch on input rows and outcomes.
///
/// Fitting never mutates `self`; each call produces an independent model.
pub trait Surrogate: Send + Sync {
    /// The fitted model type.
    type Model: Predictor;

    /// Fit on `inputs` (one row per observation) and `outputs`.
    ///
    /// # Errors
    ///
    /// Implementations return [`Error::InsufficientData`] when there are too
    /// few observations, and [`Error::InvalidDimension`] when `inputs` and
    /// `outputs` disagree in length or row width.
    fn fit(&self, inputs: &[Vec<f64>], outputs: &[f64]) -> Result<Self::Model>;
}

/// A fitted model answering predictive queries.
pub trait Predictor {
    /// Predictive mean and standard deviation, one entry per query row.
    ///
    /// Every returned `std` is finite and at least [`MIN_STD`].
    fn predict(&self, queries: &[Vec<f64>]) -> Prediction;
}

/// Predictive moments for a batch of query points.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prediction {
    /// Predictive means.
    pub mean: Vec<f64>,
    /// Predictive standard deviations, each at least [`MIN_STD`].
    pub std: Vec<f64>,
}

impl Prediction {
    /// Number of predicted points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether the prediction is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

/// Shared training-set checks: matching lengths, `min_rows` rows, uniform
/// width `dims`, finite values.
pub(crate) fn validate_training_data(
    inputs: &[Vec<f64>],
    outputs: &[f64],
    dims: usize,
    min_rows: usize,
) -> Result<()> {
    if inputs.len() != outputs.len() {
        return Err(Error::InvalidDimension {
            expected: inputs.len(),
            got: outputs.len(),
        });
    }
    if inputs.len() < min_rows {
        return Err(Error::InsufficientData {
            required: min_rows,
            got: inputs.len(),
        });
    }
    if let Some(row) = inputs.iter().find(|row| row.len() != dims) {
        return Err(Error::InvalidDimension {
            expected: dims,
            got: row.len(),
        });
    }
    if inputs.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::InvalidData("inputs contain non-finite values"));
    }
    if outputs.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidData("outputs contain non-finite values"));
    }
    Ok(())
}

/// Turn a raw posterior variance into a floored standard deviation.
#[inline]
pub(crate) fn floor_std(variance: f64, scale: f64) -> f64 {
    // f64::max drops a NaN operand.
    let std = variance.max(MIN_STD * MIN_STD).sqrt() * scale;
    std.max(MIN_STD)
}
