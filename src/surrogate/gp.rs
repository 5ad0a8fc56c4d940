//! Gaussian process surrogate with a Matérn kernel and white noise.
//!
//! The kernel is
//!
//! ```text
//! k(x, x') = σ² · Matérn_ν(x, x'; l₁ … l_d) + σₙ² · δ(x, x')
//! ```
//!
//! with one length scale per input dimension (ARD). Outputs are standardized
//! to zero mean and unit variance before fitting and de-standardized on
//! prediction. Inputs are standardized per dimension unless disabled.
//!
//! # Hyperparameter search
//!
//! The amplitude `σ²`, the length scales and the noise level `σₙ²` are
//! chosen by maximizing the log marginal likelihood in log space with a
//! box-constrained L-BFGS and analytic gradients. The first run starts from
//! the configured initial values; each of the `restarts` additional runs
//! starts from a log-uniform draw inside the bounds, using its own RNG
//! derived from `seed` and the run index. The run with the highest
//! likelihood wins (lowest index on ties), so the fitted model does not
//! depend on whether runs execute sequentially or, with the **`parallel`**
//! feature, on a `rayon` pool.
//!
//! The likelihood surface is non-convex; more restarts improve the odds of
//! finding the global optimum but never guarantee it.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `smoothness` | 2.5 | Matérn order ν (0.5, 1.5, 2.5 or ∞) |
//! | `length_scale` | 1.0 in \[1e-2, 1e2\] | Initial ARD length scale and its bounds |
//! | `noise_level` | 1e-5 in \[1e-10, 1e-1\] | White-noise variance (standardized units) |
//! | `amplitude` | 1.0 in \[1e-3, 1e3\] | Signal variance σ² |
//! | `restarts` | 12 | Random restarts after the initial run |
//! | `normalize_inputs` | `true` | Standardize inputs before fitting |
//! | `max_iterations` | 200 | L-BFGS iteration cap per run |
//! | `seed` | 0 | Seed for restart initializations |
//!
//! # Examples
//!
//! ```
//! use nextpoint::surrogate::{GaussianProcess, Predictor, Surrogate};
//!
//! let gp = GaussianProcess::builder(1)
//!     .smoothness(2.5)
//!     .restarts(4)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let x = vec![vec![0.0], vec![0.5], vec![1.0]];
//! let y = vec![0.0, 1.0, 0.0];
//! let model = gp.fit(&x, &y).unwrap();
//! let prediction = model.predict(&[vec![0.25]]);
//! assert!(prediction.std[0] > 0.0);
//! ```

use core::f64::consts::PI;

use nalgebra::{DMatrix, DVector, Dyn, linalg::Cholesky};

use super::kernel::{Smoothness, scaled_sq_dist};
use super::lbfgs::{self, Minimum, Settings};
use super::scaler::InputScaler;
use super::{Prediction, Predictor, Surrogate, floor_std, validate_training_data};
use crate::error::{Error, Result};
use crate::rng_util;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Default initial ARD length scale and its bounds.
const DEFAULT_LENGTH_SCALE: Hyperparameter = Hyperparameter::new(1.0, 1e-2, 1e2);
/// Default initial white-noise variance and its bounds.
const DEFAULT_NOISE: Hyperparameter = Hyperparameter::new(1e-5, 1e-10, 1e-1);
/// Default initial signal variance and its bounds.
const DEFAULT_AMPLITUDE: Hyperparameter = Hyperparameter::new(1.0, 1e-3, 1e3);
/// Default number of random restarts.
const DEFAULT_RESTARTS: usize = 12;
/// Default L-BFGS iteration cap per run.
const DEFAULT_MAX_ITERATIONS: usize = 200;
/// Regression needs at least two observations.
const MIN_OBSERVATIONS: usize = 2;
/// Diagonal term always added to the kernel matrix.
const BASE_JITTER: f64 = 1e-10;
/// Extra diagonal terms tried when the Cholesky factorization fails.
const JITTER_LADDER: [f64; 4] = [0.0, 1e-8, 1e-6, 1e-4];

/// A positive hyperparameter: its initial value and inclusive bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hyperparameter {
    /// Starting value of the first optimization run.
    pub init: f64,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl Hyperparameter {
    /// Creates a hyperparameter. Checked when the GP is built.
    #[must_use]
    pub const fn new(init: f64, min: f64, max: f64) -> Self {
        Self { init, min, max }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let finite = self.init.is_finite() && self.min.is_finite() && self.max.is_finite();
        if finite && 0.0 < self.min && self.min <= self.init && self.init <= self.max {
            Ok(())
        } else {
            Err(Error::InvalidHyperparameters(format!(
                "{name} requires 0 < min <= init <= max, got init {} in [{}, {}]",
                self.init, self.min, self.max
            )))
        }
    }

    fn log_bounds(&self) -> (f64, f64) {
        (self.min.ln(), self.max.ln())
    }
}

/// Gaussian process regression backend.
///
/// Construct it with [`GaussianProcess::builder`]. The value is an unfit
/// configuration; [`Surrogate::fit`] returns an independent [`FittedGp`].
#[derive(Clone, Debug)]
pub struct GaussianProcess {
    dims: usize,
    smoothness: Smoothness,
    amplitude: Hyperparameter,
    length_scale: Hyperparameter,
    noise: Hyperparameter,
    restarts: usize,
    seed: u64,
    normalize_inputs: bool,
    max_iterations: usize,
}

impl GaussianProcess {
    /// Creates a builder for a GP over `dims` input dimensions.
    #[must_use]
    pub fn builder(dims: usize) -> GaussianProcessBuilder {
        GaussianProcessBuilder::new(dims)
    }

    /// All defaults; `dims` must be at least 1.
    pub(crate) fn with_defaults(dims: usize) -> Self {
        Self {
            dims,
            smoothness: Smoothness::default(),
            amplitude: DEFAULT_AMPLITUDE,
            length_scale: DEFAULT_LENGTH_SCALE,
            noise: DEFAULT_NOISE,
            restarts: DEFAULT_RESTARTS,
            seed: 0,
            normalize_inputs: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Number of input dimensions.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Matérn smoothness of the kernel.
    #[must_use]
    pub fn smoothness(&self) -> Smoothness {
        self.smoothness
    }

    /// Number of random restarts after the initial run.
    #[must_use]
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Seed for the restart starting points.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Log-space bounds in parameter order: amplitude, length scales, noise.
    fn log_bounds(&self) -> Vec<(f64, f64)> {
        let mut bounds = Vec::with_capacity(self.dims + 2);
        bounds.push(self.amplitude.log_bounds());
        bounds.extend(core::iter::repeat_n(self.length_scale.log_bounds(), self.dims));
        bounds.push(self.noise.log_bounds());
        bounds
    }

    /// Log-space start for the first run.
    fn initial_theta(&self) -> Vec<f64> {
        let mut theta = Vec::with_capacity(self.dims + 2);
        theta.push(self.amplitude.init.ln());
        theta.extend(core::iter::repeat_n(self.length_scale.init.ln(), self.dims));
        theta.push(self.noise.init.ln());
        theta
    }

    /// Start points for every run: the initial values, then `restarts` random draws.
    fn start_points(&self, bounds: &[(f64, f64)]) -> Vec<Vec<f64>> {
        let mut starts = Vec::with_capacity(self.restarts + 1);
        starts.push(self.initial_theta());
        for run in 1..=self.restarts as u64 {
            let mut rng = fastrand::Rng::with_seed(rng_util::stream_seed(self.seed, run));
            starts.push(
                bounds
                    .iter()
                    .map(|&(lo, hi)| rng_util::f64_range(&mut rng, lo, hi))
                    .collect(),
            );
        }
        starts
    }
}

/// Builder for configuring a [`GaussianProcess`].
///
/// See the [module documentation](self) for defaults.
#[derive(Clone, Debug)]
pub struct GaussianProcessBuilder {
    dims: usize,
    smoothness: f64,
    amplitude: Hyperparameter,
    length_scale: Hyperparameter,
    noise: Hyperparameter,
    restarts: usize,
    seed: u64,
    normalize_inputs: bool,
    max_iterations: usize,
}

impl GaussianProcessBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            smoothness: Smoothness::default().nu(),
            amplitude: DEFAULT_AMPLITUDE,
            length_scale: DEFAULT_LENGTH_SCALE,
            noise: DEFAULT_NOISE,
            restarts: DEFAULT_RESTARTS,
            seed: 0,
            normalize_inputs: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the Matérn order ν.
    #[must_use]
    pub fn smoothness(mut self, nu: f64) -> Self {
        self.smoothness = nu;
        self
    }

    /// Sets the initial length scale shared by every dimension.
    #[must_use]
    pub fn length_scale(mut self, init: f64) -> Self {
        self.length_scale.init = init;
        self
    }

    /// Sets the length scale bounds.
    #[must_use]
    pub fn length_scale_bounds(mut self, min: f64, max: f64) -> Self {
        self.length_scale.min = min;
        self.length_scale.max = max;
        self
    }

    /// Sets the initial white-noise variance.
    #[must_use]
    pub fn noise_level(mut self, init: f64) -> Self {
        self.noise.init = init;
        self
    }

    /// Sets the noise variance bounds.
    #[must_use]
    pub fn noise_bounds(mut self, min: f64, max: f64) -> Self {
        self.noise.min = min;
        self.noise.max = max;
        self
    }

    /// Sets the initial signal variance.
    #[must_use]
    pub fn amplitude(mut self, init: f64) -> Self {
        self.amplitude.init = init;
        self
    }

    /// Sets the signal variance bounds.
    #[must_use]
    pub fn amplitude_bounds(mut self, min: f64, max: f64) -> Self {
        self.amplitude.min = min;
        self.amplitude.max = max;
        self
    }

    /// Sets the number of random restarts after the initial run.
    ///
    /// This is also the knob for bounding fit time.
    #[must_use]
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Sets the seed for restart initializations.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Whether to standardize inputs before fitting. Default: `true`.
    #[must_use]
    pub fn normalize_inputs(mut self, normalize: bool) -> Self {
        self.normalize_inputs = normalize;
        self
    }

    /// Sets the L-BFGS iteration cap per run.
    #[must_use]
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Builds the configured [`GaussianProcess`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHyperparameters`] if `dims == 0`, the
    /// smoothness is not a supported Matérn order, `max_iterations == 0`, or
    /// any hyperparameter violates `0 < min <= init <= max`.
    pub fn build(self) -> Result<GaussianProcess> {
        if self.dims == 0 {
            return Err(Error::InvalidHyperparameters(
                "dims must be at least 1".to_string(),
            ));
        }
        let smoothness = Smoothness::from_nu(self.smoothness)?;
        self.amplitude.validate("amplitude")?;
        self.length_scale.validate("length scale")?;
        self.noise.validate("noise level")?;
        if self.max_iterations == 0 {
            return Err(Error::InvalidHyperparameters(
                "max_iterations must be at least 1".to_string(),
            ));
        }

        Ok(GaussianProcess {
            dims: self.dims,
            smoothness,
            amplitude: self.amplitude,
            length_scale: self.length_scale,
            noise: self.noise,
            restarts: self.restarts,
            seed: self.seed,
            normalize_inputs: self.normalize_inputs,
            max_iterations: self.max_iterations,
        })
    }
}

// ---------------------------------------------------------------------------
// Fitted model
// ---------------------------------------------------------------------------

/// Kernel hyperparameters selected by the likelihood search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KernelParams {
    /// Signal variance σ² (standardized output units).
    pub amplitude: f64,
    /// ARD length scales (standardized input units when inputs are normalized).
    pub length_scales: Vec<f64>,
    /// White-noise variance σₙ² (standardized output units).
    pub noise: f64,
    /// Log marginal likelihood at these values.
    pub log_marginal_likelihood: f64,
}

/// A Gaussian process fitted to one training set.
pub struct FittedGp {
    smoothness: Smoothness,
    params: KernelParams,
    scaler: Option<InputScaler>,
    /// Training inputs after the optional input transform.
    x_train: Vec<Vec<f64>>,
    /// Cholesky factor of `K + (σₙ² + jitter) I`.
    cholesky: Cholesky<f64, Dyn>,
    /// `(K + σₙ² I)⁻¹ y` for standardized `y`.
    alpha: DVector<f64>,
    y_mean: f64,
    y_std: f64,
    best_run: usize,
    iterations: usize,
}

impl FittedGp {
    /// The selected kernel hyperparameters.
    #[must_use]
    pub fn hyperparameters(&self) -> &KernelParams {
        &self.params
    }

    /// The input standardization, if inputs were normalized.
    #[must_use]
    pub fn transform(&self) -> Option<&InputScaler> {
        self.scaler.as_ref()
    }

    /// Index of the winning run (0 is the run from the initial values).
    #[must_use]
    pub fn best_run(&self) -> usize {
        self.best_run
    }

    /// L-BFGS iterations used by the winning run.
    #[must_use]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of training rows.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.x_train.len()
    }
}

impl Predictor for FittedGp {
    /// Predictive mean and standard deviation of a noisy observation.
    ///
    /// The standard deviation includes the fitted noise level. Query rows are
    /// in the original input space and must have the training width.
    fn predict(&self, queries: &[Vec<f64>]) -> Prediction {
        let amplitude = self.params.amplitude;
        let noise = self.params.noise;
        let length_scales = &self.params.length_scales;
        let n = self.x_train.len();
        let mut mean = Vec::with_capacity(queries.len());
        let mut std = Vec::with_capacity(queries.len());

        for query in queries {
            debug_assert_eq!(query.len(), length_scales.len());
            let z = match &self.scaler {
                Some(scaler) => scaler.transform(query),
                None => query.clone(),
            };
            let k_star = DVector::from_fn(n, |i, _| {
                amplitude
                    * self
                        .smoothness
                        .correlation(scaled_sq_dist(&z, &self.x_train[i], length_scales))
            });
            mean.push(k_star.dot(&self.alpha) * self.y_std + self.y_mean);

            let v = self.cholesky.solve(&k_star);
            let var = amplitude + noise - k_star.dot(&v);
            std.push(floor_std(var, self.y_std));
        }

        Prediction { mean, std }
    }
}

// ---------------------------------------------------------------------------
// Likelihood
// ---------------------------------------------------------------------------

/// Standardized training data plus the kernel family.
struct Likelihood<'a> {
    x: &'a [Vec<f64>],
    y: &'a DVector<f64>,
    smoothness: Smoothness,
}

impl Likelihood<'_> {
    fn unpack(theta: &[f64]) -> (f64, Vec<f64>, f64) {
        let d = theta.len() - 2;
        let amplitude = theta[0].exp();
        let length_scales = theta[1..=d].iter().map(|t| t.exp()).collect();
        let noise = theta[d + 1].exp();
        (amplitude, length_scales, noise)
    }

    /// Factor `K + (noise + jitter) I`, escalating the jitter on failure.
    fn factor(
        &self,
        amplitude: f64,
        length_scales: &[f64],
        noise: f64,
    ) -> Option<Cholesky<f64, Dyn>> {
        let n = self.x.len();
        let base = DMatrix::from_fn(n, n, |i, j| {
            let r_sq = scaled_sq_dist(&self.x[i], &self.x[j], length_scales);
            amplitude * self.smoothness.correlation(r_sq)
        });
        JITTER_LADDER.iter().find_map(|&extra| {
            let mut k = base.clone();
            let diag = noise + BASE_JITTER + extra * amplitude;
            for i in 0..n {
                k[(i, i)] += diag;
            }
            Cholesky::new(k)
        })
    }

    /// Negative log marginal likelihood and its gradient in log space.
    #[allow(clippy::cast_precision_loss)]
    fn objective(&self, theta: &[f64]) -> Option<(f64, Vec<f64>)> {
        let (amplitude, length_scales, noise) = Self::unpack(theta);
        let d = length_scales.len();
        let n = self.x.len();
        let chol = self.factor(amplitude, &length_scales, noise)?;

        let alpha = chol.solve(self.y);
        let half_log_det: f64 = chol.l_dirty().diagonal().iter().map(|v| v.ln()).sum();
        let lml = -0.5 * self.y.dot(&alpha) - half_log_det - 0.5 * n as f64 * (2.0 * PI).ln();

        // ∂lml/∂θ = ½ tr((ααᵀ - K⁻¹) ∂K/∂θ)
        let k_inv = chol.inverse();
        let mut grad = vec![0.0; d + 2];
        for i in 0..n {
            for j in 0..n {
                let w = alpha[i] * alpha[j] - k_inv[(i, j)];
                let r_sq = scaled_sq_dist(&self.x[i], &self.x[j], &length_scales);
                grad[0] += w * amplitude * self.smoothness.correlation(r_sq);
                if i != j {
                    let g = w * amplitude * self.smoothness.length_scale_factor(r_sq);
                    for (m, l) in length_scales.iter().enumerate() {
                        let dm = (self.x[i][m] - self.x[j][m]) / l;
                        grad[1 + m] += g * dm * dm;
                    }
                }
            }
            grad[d + 1] += (alpha[i] * alpha[i] - k_inv[(i, i)]) * noise;
        }

        if !lml.is_finite() {
            return None;
        }
        Some((-lml, grad.iter().map(|g| -0.5 * g).collect()))
    }
}

#[cfg(feature = "parallel")]
fn run_all(
    likelihood: &Likelihood<'_>,
    starts: &[Vec<f64>],
    bounds: &[(f64, f64)],
    settings: Settings,
) -> Vec<Option<Minimum>> {
    use rayon::prelude::*;

    starts
        .par_iter()
        .map(|x0| lbfgs::minimize(|t| likelihood.objective(t), x0, bounds, settings))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn run_all(
    likelihood: &Likelihood<'_>,
    starts: &[Vec<f64>],
    bounds: &[(f64, f64)],
    settings: Settings,
) -> Vec<Option<Minimum>> {
    starts
        .iter()
        .map(|x0| lbfgs::minimize(|t| likelihood.objective(t), x0, bounds, settings))
        .collect()
}

impl Surrogate for GaussianProcess {
    type Model = FittedGp;

    /// Fit the GP on `inputs` and `outputs`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimension`] if lengths or row widths disagree.
    /// - [`Error::InsufficientData`] with fewer than two observations.
    /// - [`Error::InvalidData`] if any value is not finite.
    /// - [`Error::IllConditioned`] if no run produced a usable kernel matrix.
    #[allow(clippy::cast_precision_loss)]
    fn fit(&self, inputs: &[Vec<f64>], outputs: &[f64]) -> Result<FittedGp> {
        validate_training_data(inputs, outputs, self.dims, MIN_OBSERVATIONS)?;

        let scaler = self.normalize_inputs.then(|| InputScaler::fit(inputs));
        let x_train: Vec<Vec<f64>> = match &scaler {
            Some(s) => inputs.iter().map(|row| s.transform(row)).collect(),
            None => inputs.to_vec(),
        };

        let n = outputs.len() as f64;
        let y_mean = outputs.iter().sum::<f64>() / n;
        let y_var = outputs.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>() / n;
        let y_std = if y_var.sqrt() > f64::EPSILON * y_mean.abs().max(1.0) {
            y_var.sqrt()
        } else {
            1.0
        };
        let y = DVector::from_iterator(outputs.len(), outputs.iter().map(|v| (v - y_mean) / y_std));

        let likelihood = Likelihood {
            x: &x_train,
            y: &y,
            smoothness: self.smoothness,
        };
        let bounds = self.log_bounds();
        let starts = self.start_points(&bounds);
        let settings = Settings {
            max_iterations: self.max_iterations,
            ..Settings::default()
        };

        let runs = run_all(&likelihood, &starts, &bounds, settings);
        let failed = runs.iter().filter(|r| r.is_none()).count();
        if failed > 0 {
            trace_debug!(failed, total = runs.len(), "likelihood runs skipped");
        }

        let (best_run, best) = runs
            .into_iter()
            .enumerate()
            .filter_map(|(i, r)| r.map(|m| (i, m)))
            .reduce(|a, b| if b.1.value < a.1.value { b } else { a })
            .ok_or(Error::IllConditioned {
                attempts: starts.len(),
            })?;

        let (amplitude, length_scales, noise) = Likelihood::unpack(&best.x);
        let cholesky = likelihood
            .factor(amplitude, &length_scales, noise)
            .ok_or(Error::IllConditioned {
                attempts: starts.len(),
            })?;
        let alpha = cholesky.solve(&y);

        trace_info!(
            n_train = x_train.len(),
            best_run,
            log_marginal_likelihood = -best.value,
            "surrogate fitted"
        );

        Ok(FittedGp {
            smoothness: self.smoothness,
            params: KernelParams {
                amplitude,
                length_scales,
                noise,
                log_marginal_likelihood: -best.value,
            },
            scaler,
            x_train,
            cholesky,
            alpha,
            y_mean,
            y_std,
            best_run,
            iterations: best.iterations,
        })
    }
}
