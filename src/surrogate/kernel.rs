//! Matérn correlation functions with ARD length scales.

use crate::error::{Error, Result};

/// Precomputed √3 constant.
const SQRT_3: f64 = 1.732_050_807_568_877_2;
/// Precomputed √5 constant.
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Smoothness order `ν` of the Matérn kernel.
///
/// Only the orders with closed forms are supported. Larger `ν` gives
/// smoother sample paths; `ν → ∞` is the squared-exponential kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Smoothness {
    /// `ν = 1/2`: `k(r) = exp(-r)`.
    Exponential,
    /// `ν = 3/2`: `k(r) = (1 + √3 r) exp(-√3 r)`.
    Matern32,
    /// `ν = 5/2`: `k(r) = (1 + √5 r + 5/3 r²) exp(-√5 r)`.
    #[default]
    Matern52,
    /// `ν = ∞`: `k(r) = exp(-r² / 2)`.
    SquaredExponential,
}

impl Smoothness {
    /// Map a numeric `ν` onto a supported order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHyperparameters`] if `nu <= 0`, NaN, or not one
    /// of 0.5, 1.5, 2.5, `+inf`.
    pub fn from_nu(nu: f64) -> Result<Self> {
        if !(nu > 0.0) {
            return Err(Error::InvalidHyperparameters(format!(
                "smoothness must be positive, got {nu}"
            )));
        }
        if nu.is_infinite() {
            return Ok(Self::SquaredExponential);
        }
        [
            (0.5, Self::Exponential),
            (1.5, Self::Matern32),
            (2.5, Self::Matern52),
        ]
        .into_iter()
        .find(|(v, _)| (nu - v).abs() < 1e-12)
        .map(|(_, s)| s)
        .ok_or_else(|| {
            Error::InvalidHyperparameters(format!(
                "unsupported smoothness {nu}: expected 0.5, 1.5, 2.5 or infinity"
            ))
        })
    }

    /// The numeric order `ν`.
    #[must_use]
    pub fn nu(self) -> f64 {
        match self {
            Self::Exponential => 0.5,
            Self::Matern32 => 1.5,
            Self::Matern52 => 2.5,
            Self::SquaredExponential => f64::INFINITY,
        }
    }

    /// Unit-amplitude correlation at squared scaled distance `r_sq`.
    pub(crate) fn correlation(self, r_sq: f64) -> f64 {
        match self {
            Self::Exponential => (-r_sq.sqrt()).exp(),
            Self::Matern32 => {
                let s = SQRT_3 * r_sq.sqrt();
                (1.0 + s) * (-s).exp()
            }
            Self::Matern52 => {
                let s = SQRT_5 * r_sq.sqrt();
                (1.0 + s + 5.0 / 3.0 * r_sq) * (-s).exp()
            }
            Self::SquaredExponential => (-0.5 * r_sq).exp(),
        }
    }

    /// Factor `g(r)` with `∂k/∂log lᵢ = g(r) · (dᵢ / lᵢ)²` for unit amplitude.
    pub(crate) fn length_scale_factor(self, r_sq: f64) -> f64 {
        match self {
            Self::Exponential => {
                let r = r_sq.sqrt();
                if r > 0.0 { (-r).exp() / r } else { 0.0 }
            }
            Self::Matern32 => 3.0 * (-SQRT_3 * r_sq.sqrt()).exp(),
            Self::Matern52 => {
                let s = SQRT_5 * r_sq.sqrt();
                5.0 / 3.0 * (1.0 + s) * (-s).exp()
            }
            Self::SquaredExponential => (-0.5 * r_sq).exp(),
        }
    }
}

/// Squared ARD distance `Σ ((aᵢ - bᵢ) / lᵢ)²`.
#[inline]
pub(crate) fn scaled_sq_dist(a: &[f64], b: &[f64], length_scales: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .zip(length_scales)
        .map(|((x, y), l)| {
            let d = (x - y) / l;
            d * d
        })
        .sum()
}
