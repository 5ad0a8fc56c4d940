//! Space-filling candidate designs and candidate filters.
//!
//! A [`Design`] turns `(dims, count, seed)` into `count` points of the unit
//! cube; the trait's provided methods scale those into a validated box
//! ([`Design::generate`]) or into a possibly degenerate trust region
//! ([`Design::generate_in_box`]). Filtering is kept out of the designs: the
//! geometric predicates [`filter_interior`] and [`filter_novel`] are applied
//! afterwards, so any design can be combined with any filtering policy.
//!
//! | Design | Construction | Feature flag |
//! |--------|--------------|--------------|
//! | [`LatinHypercube`] | One point per stratum in every dimension | — |
//! | [`SobolDesign`](sobol::SobolDesign) | Owen-scrambled Sobol sequence | `sobol` |
//! | [`UniformDesign`] | Independent uniform draws | — |
//!
//! All designs are pure functions of their seed: equal seeds give equal points.

mod filter;
mod lhs;
mod random;
#[cfg(feature = "sobol")]
pub mod sobol;

pub use filter::{chebyshev_distance, filter_interior, filter_novel};
pub use lhs::LatinHypercube;
pub use random::UniformDesign;

use crate::bounds;
use crate::error::Result;
use crate::trust_region::TrustRegionBox;

/// A seeded space-filling design over the unit cube.
///
/// Implementors only provide [`unit_points`](Design::unit_points); scaling
/// and validation come from the provided methods.
pub trait Design: Send + Sync {
    /// `count` points in `[0, 1]^dims`, fully determined by `seed`.
    fn unit_points(&self, dims: usize, count: usize, seed: u64) -> Vec<Vec<f64>>;

    /// `count` points inside `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`](crate::Error::InvalidDimension) if
    /// `lower` and `upper` differ in length or are empty, and
    /// [`Error::InvalidBounds`](crate::Error::InvalidBounds) if any
    /// `lower[i] >= upper[i]`.
    fn generate(
        &self,
        lower: &[f64],
        upper: &[f64],
        count: usize,
        seed: u64,
    ) -> Result<Vec<Vec<f64>>> {
        bounds::validate(lower, upper)?;
        Ok(self
            .unit_points(lower.len(), count, seed)
            .iter()
            .map(|u| scale(u, lower, upper))
            .collect())
    }

    /// `count` points inside a trust region box, which may have zero-width sides.
    fn generate_in_box(&self, region: &TrustRegionBox, count: usize, seed: u64) -> Vec<Vec<f64>> {
        self.unit_points(region.dims(), count, seed)
            .iter()
            .map(|u| region.from_unit(u))
            .collect()
    }
}

/// Generate `count` Latin hypercube points inside `[lower, upper]`.
///
/// # Errors
///
/// See [`Design::generate`].
///
/// # Examples
///
/// ```
/// let points = nextpoint::sampler::generate(&[0.0, 0.0], &[1.0, 2.0], 8, 42).unwrap();
/// assert_eq!(points.len(), 8);
/// assert!(points.iter().all(|p| p[1] >= 0.0 && p[1] <= 2.0));
/// ```
pub fn generate(lower: &[f64], upper: &[f64], count: usize, seed: u64) -> Result<Vec<Vec<f64>>> {
    LatinHypercube::new().generate(lower, upper, count, seed)
}

/// Affine map from the unit cube into `[lower, upper]`, clamped against rounding.
fn scale(unit: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    unit.iter()
        .zip(lower.iter().zip(upper))
        .map(|(u, (&lo, &hi))| (lo + u * (hi - lo)).clamp(lo, hi))
        .collect()
}
