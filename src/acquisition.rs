//! Acquisition functions: turn a predictive mean and standard deviation into
//! a desirability score. Higher is better.
//!
//! | Function | Score | Explores via |
//! |----------|-------|--------------|
//! | [`ExpectedImprovement`] | `imp·Φ(z) + σ·φ(z)` | `xi` margin |
//! | [`UpperConfidenceBound`] | `μ + κσ` | `kappa` weight |
//! | [`MaxVariance`] | `σ` | pure exploration |
//!
//! Every score is non-decreasing in `σ` for a fixed `μ`.
//!
//! [`Strategy`] is the configuration-side name for one of these; it is
//! parsed from `"ei"`, `"ucb"` or `"max_variance"` and bound to the current
//! best outcome when a proposal is made.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};
use crate::surrogate::{MIN_STD, Prediction};

/// Default EI improvement margin.
pub const DEFAULT_XI: f64 = 0.01;
/// Default UCB exploration weight.
pub const DEFAULT_KAPPA: f64 = 1.6;

const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal PDF.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF, `Φ(x) = erfc(-x/√2) / 2`.
///
/// Relative error below 1.2e-7 over the whole line, including the far
/// lower tail.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * core::f64::consts::FRAC_1_SQRT_2)
}

/// Complementary error function (Chebyshev fit, Numerical Recipes `erfcc`).
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -z * z - 1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));
    let r = t * poly.exp();
    if x >= 0.0 { r } else { 2.0 - r }
}

/// Scores a candidate from its predictive moments.
pub trait AcquisitionFunction: Send + Sync {
    /// Score one candidate with predictive mean `mean` and standard deviation `std`.
    fn score(&self, mean: f64, std: f64) -> f64;

    /// Score every entry of a prediction, in order.
    fn score_all(&self, prediction: &Prediction) -> Vec<f64> {
        prediction
            .mean
            .iter()
            .zip(&prediction.std)
            .map(|(&mu, &sigma)| self.score(mu, sigma))
            .collect()
    }
}

/// Expected improvement over `y_best` by more than `xi`.
///
/// ```
/// use nextpoint::acquisition::{AcquisitionFunction, ExpectedImprovement};
///
/// let ei = ExpectedImprovement::new(2.0);
/// assert!(ei.score(2.5, 0.1) > 0.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExpectedImprovement {
    /// Best outcome observed so far.
    pub y_best: f64,
    /// Exploration margin subtracted from the improvement.
    pub xi: f64,
}

impl ExpectedImprovement {
    /// EI against `y_best` with the default margin `xi = 0.01`.
    #[must_use]
    pub fn new(y_best: f64) -> Self {
        Self {
            y_best,
            xi: DEFAULT_XI,
        }
    }

    /// Sets the exploration margin.
    #[must_use]
    pub fn xi(mut self, xi: f64) -> Self {
        self.xi = xi;
        self
    }
}

impl AcquisitionFunction for ExpectedImprovement {
    fn score(&self, mean: f64, std: f64) -> f64 {
        let sigma = std.max(MIN_STD);
        let imp = mean - self.y_best - self.xi;
        let z = imp / sigma;
        (imp * norm_cdf(z) + sigma * norm_pdf(z)).max(0.0)
    }
}

/// Optimistic bound `μ + κσ`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpperConfidenceBound {
    /// Weight on the standard deviation.
    pub kappa: f64,
}

impl Default for UpperConfidenceBound {
    fn default() -> Self {
        Self {
            kappa: DEFAULT_KAPPA,
        }
    }
}

impl AcquisitionFunction for UpperConfidenceBound {
    fn score(&self, mean: f64, std: f64) -> f64 {
        mean + self.kappa * std
    }
}

/// Pure exploration: the predictive standard deviation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaxVariance;

impl AcquisitionFunction for MaxVariance {
    fn score(&self, _mean: f64, std: f64) -> f64 {
        std
    }
}

/// Acquisition strategy chosen by configuration.
///
/// ```
/// use nextpoint::acquisition::Strategy;
///
/// let s: Strategy = "ucb".parse().unwrap();
/// assert_eq!(s, Strategy::UpperConfidenceBound { kappa: 1.6 });
/// assert!("thompson".parse::<Strategy>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Strategy {
    /// [`ExpectedImprovement`] with margin `xi`.
    ExpectedImprovement { xi: f64 },
    /// [`UpperConfidenceBound`] with weight `kappa`.
    UpperConfidenceBound { kappa: f64 },
    /// [`MaxVariance`].
    MaxVariance,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::ExpectedImprovement { xi: DEFAULT_XI }
    }
}

impl Strategy {
    /// The short configuration name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ExpectedImprovement { .. } => "ei",
            Self::UpperConfidenceBound { .. } => "ucb",
            Self::MaxVariance => "max_variance",
        }
    }

    /// Bind the strategy to the current best observed outcome.
    #[must_use]
    pub fn acquisition(&self, y_best: f64) -> Box<dyn AcquisitionFunction> {
        match *self {
            Self::ExpectedImprovement { xi } => Box::new(ExpectedImprovement { y_best, xi }),
            Self::UpperConfidenceBound { kappa } => Box::new(UpperConfidenceBound { kappa }),
            Self::MaxVariance => Box::new(MaxVariance),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    /// Parse a strategy name with its default parameters.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ei" | "expected_improvement" => Ok(Self::ExpectedImprovement { xi: DEFAULT_XI }),
            "ucb" | "upper_confidence_bound" => Ok(Self::UpperConfidenceBound {
                kappa: DEFAULT_KAPPA,
            }),
            "max_variance" => Ok(Self::MaxVariance),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}
