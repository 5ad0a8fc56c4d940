//! Axis-aligned search space bounds.

use crate::error::{Error, Result};

/// A validated hyper-rectangle `[lower, upper]` in `d >= 1` dimensions.
///
/// Every component is finite and satisfies `lower[i] < upper[i]`. The conventional
/// search space is the unit cube, see [`Bounds::unit`].
///
/// # Examples
///
/// ```
/// use nextpoint::Bounds;
///
/// let bounds = Bounds::new(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap();
/// assert_eq!(bounds.dims(), 2);
/// assert!(bounds.contains(&[0.5, 0.0]));
/// assert!(Bounds::new(vec![1.0], vec![0.0]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawBounds", into = "RawBounds")
)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    /// Creates bounds from per-dimension lower and upper limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if the vectors differ in length or
    /// are empty, and [`Error::InvalidBounds`] if any `lower[i] >= upper[i]`
    /// or either limit is not finite.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        validate(&lower, &upper)?;
        Ok(Self { lower, upper })
    }

    /// The unit cube `[0, 1]^dims`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if `dims == 0`.
    pub fn unit(dims: usize) -> Result<Self> {
        Self::new(vec![0.0; dims], vec![1.0; dims])
    }

    /// Number of dimensions.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.lower.len()
    }

    /// Per-dimension lower limits.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Per-dimension upper limits.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Per-dimension widths `upper - lower`.
    #[must_use]
    pub fn widths(&self) -> Vec<f64> {
        self.lower
            .iter()
            .zip(&self.upper)
            .map(|(lo, hi)| hi - lo)
            .collect()
    }

    /// Whether `point` lies in the closed box. Points of the wrong width are never contained.
    #[must_use]
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dims()
            && point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(x, (lo, hi))| (*lo..=*hi).contains(x))
    }

    /// Map a point into unit coordinates relative to these bounds.
    #[must_use]
    pub fn normalize(&self, point: &[f64]) -> Vec<f64> {
        point
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(x, (lo, hi))| (x - lo) / (hi - lo))
            .collect()
    }

    /// Inverse of [`normalize`](Self::normalize).
    #[must_use]
    pub fn denormalize(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(u, (lo, hi))| lo + u * (hi - lo))
            .collect()
    }
}

/// Check that `lower` and `upper` describe a non-empty, non-degenerate box.
pub(crate) fn validate(lower: &[f64], upper: &[f64]) -> Result<()> {
    if lower.len() != upper.len() {
        return Err(Error::InvalidDimension {
            expected: lower.len(),
            got: upper.len(),
        });
    }
    if lower.is_empty() {
        return Err(Error::InvalidDimension {
            expected: 1,
            got: 0,
        });
    }
    for (dim, (&lo, &hi)) in lower.iter().zip(upper).enumerate() {
        // Negated so NaN fails too.
        if !(lo < hi) || !lo.is_finite() || !hi.is_finite() {
            return Err(Error::InvalidBounds {
                dim,
                lower: lo,
                upper: hi,
            });
        }
    }
    Ok(())
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawBounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBounds> for Bounds {
    type Error = Error;

    fn try_from(raw: RawBounds) -> Result<Self> {
        Self::new(raw.lower, raw.upper)
    }
}

#[cfg(feature = "serde")]
impl From<Bounds> for RawBounds {
    fn from(bounds: Bounds) -> Self {
        Self {
            lower: bounds.lower,
            upper: bounds.upper,
        }
    }
}
