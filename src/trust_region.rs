//! Trust region construction and length adaptation.
//!
//! A trust region is a sub-box of the global [`Bounds`] centred on an anchor
//! (usually the best input observed so far). Its half-width in dimension `i`
//! is `0.5 * L * (upper[i] - lower[i])`: one shared length factor `L` scales
//! every dimension by the width of the global box, so all dimensions shrink
//! and grow together.
//!
//! [`compute_box`] is the deterministic part. How `L` evolves between
//! proposals is decided separately by a [`LengthSchedule`], which halves `L`
//! after a run of failures and doubles it (up to a cap) after a run of
//! successes. Because the engine keeps no state between invocations,
//! [`LengthSchedule::replay`] rebuilds the current `L` from the history.
//!
//! # Examples
//!
//! ```
//! use nextpoint::Bounds;
//! use nextpoint::trust_region::compute_box;
//!
//! let bounds = Bounds::unit(2).unwrap();
//! let region = compute_box(&[0.7, 0.8], &bounds, 0.5).unwrap();
//! assert!((region.lower()[0] - 0.45).abs() < 1e-12);
//! assert!((region.upper()[1] - 1.0).abs() < 1e-12);
//! ```

use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::history::History;

/// A sub-box of the global bounds. Unlike [`Bounds`], a side may have zero width.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawBox", into = "RawBox")
)]
pub struct TrustRegionBox {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl TrustRegionBox {
    /// Per-dimension lower edges.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Per-dimension upper edges.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Number of dimensions.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.lower.len()
    }

    /// Whether `point` lies in the closed box.
    #[must_use]
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dims()
            && point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(x, (lo, hi))| (*lo..=*hi).contains(x))
    }

    /// Whether at least one side has collapsed to zero width.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.lower.iter().zip(&self.upper).any(|(lo, hi)| lo >= hi)
    }

    /// Map a point of the unit cube affinely into the box.
    pub(crate) fn from_unit(&self, unit: &[f64]) -> Vec<f64> {
        unit.iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(u, (&lo, &hi))| (lo + u * (hi - lo)).clamp(lo, hi))
            .collect()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawBox {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawBox> for TrustRegionBox {
    type Error = Error;

    fn try_from(raw: RawBox) -> Result<Self> {
        if raw.lower.len() != raw.upper.len() || raw.lower.is_empty() {
            return Err(Error::InvalidDimension {
                expected: raw.lower.len().max(1),
                got: raw.upper.len(),
            });
        }
        for (dim, (&lo, &hi)) in raw.lower.iter().zip(&raw.upper).enumerate() {
            // Zero width is allowed, inverted or non-finite sides are not.
            if !(lo <= hi) || !lo.is_finite() || !hi.is_finite() {
                return Err(Error::InvalidBounds {
                    dim,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self {
            lower: raw.lower,
            upper: raw.upper,
        })
    }
}

#[cfg(feature = "serde")]
impl From<TrustRegionBox> for RawBox {
    fn from(region: TrustRegionBox) -> Self {
        Self {
            lower: region.lower,
            upper: region.upper,
        }
    }
}

/// Build the trust region box around `anchor` with length factor `length`.
///
/// For each dimension `i`, with `w = upper[i] - lower[i]`:
///
/// ```text
/// box_lower[i] = clip(anchor[i] - 0.5 * L * w, lower[i], upper[i])
/// box_upper[i] = clip(anchor[i] + 0.5 * L * w, lower[i], upper[i])
/// ```
///
/// `L = 0` collapses the box to `{anchor}`; `L = +inf` yields the full bounds.
///
/// # Errors
///
/// - [`Error::InvalidDimension`] if `anchor` has the wrong width.
/// - [`Error::InvalidLength`] if `length` is negative or NaN.
/// - [`Error::AnchorOutOfBounds`] if any anchor coordinate is outside the bounds.
pub fn compute_box(anchor: &[f64], bounds: &Bounds, length: f64) -> Result<TrustRegionBox> {
    if anchor.len() != bounds.dims() {
        return Err(Error::InvalidDimension {
            expected: bounds.dims(),
            got: anchor.len(),
        });
    }
    if !(length >= 0.0) {
        return Err(Error::InvalidLength(length));
    }

    let dims = bounds.dims();
    let mut lower = Vec::with_capacity(dims);
    let mut upper = Vec::with_capacity(dims);
    for (dim, (&a, (&lo, &hi))) in anchor
        .iter()
        .zip(bounds.lower().iter().zip(bounds.upper()))
        .enumerate()
    {
        if !(lo..=hi).contains(&a) {
            return Err(Error::AnchorOutOfBounds {
                dim,
                value: a,
                lower: lo,
                upper: hi,
            });
        }
        // Bounds are finite, so only `length = inf` makes this infinite.
        let half = 0.5 * length * (hi - lo);
        lower.push((a - half).clamp(lo, hi));
        upper.push((a + half).clamp(lo, hi));
    }

    Ok(TrustRegionBox { lower, upper })
}

// ---------------------------------------------------------------------------
// Length adaptation
// ---------------------------------------------------------------------------

/// Default initial length factor.
const DEFAULT_INIT: f64 = 0.8;
/// Default minimum length factor; below it the region is considered collapsed.
const DEFAULT_MIN: f64 = 0.007_812_5;
/// Default maximum length factor.
const DEFAULT_MAX: f64 = 1.6;
/// Default consecutive successes before expanding.
const DEFAULT_SUCCESS_TOLERANCE: usize = 3;
/// Default consecutive failures before shrinking.
const DEFAULT_FAILURE_TOLERANCE: usize = 4;

/// Success/failure policy for the trust region length factor.
///
/// | Field | Default |
/// |-------|---------|
/// | `init` | 0.8 |
/// | `min` | 0.5⁷ |
/// | `max` | 1.6 |
/// | `success_tolerance` | 3 |
/// | `failure_tolerance` | 4 (see [`for_dims`](Self::for_dims)) |
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LengthSchedule {
    /// Length factor at the start of a campaign and after a restart.
    pub init: f64,
    /// Below this length the region has collapsed and should restart.
    pub min: f64,
    /// Upper cap for expansions.
    pub max: f64,
    /// Consecutive successes that double the length.
    pub success_tolerance: usize,
    /// Consecutive failures that halve the length.
    pub failure_tolerance: usize,
}

impl Default for LengthSchedule {
    fn default() -> Self {
        Self {
            init: DEFAULT_INIT,
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            success_tolerance: DEFAULT_SUCCESS_TOLERANCE,
            failure_tolerance: DEFAULT_FAILURE_TOLERANCE,
        }
    }
}

impl LengthSchedule {
    /// Defaults with the failure tolerance scaled to the problem:
    /// `ceil(max(4, dims) / batch_size)`.
    #[must_use]
    pub fn for_dims(dims: usize, batch_size: usize) -> Self {
        let batch = batch_size.max(1);
        Self {
            failure_tolerance: DEFAULT_FAILURE_TOLERANCE.max(dims).div_ceil(batch),
            ..Self::default()
        }
    }

    /// Check that `0 < min <= init <= max` and both tolerances are positive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first violated condition.
    pub fn validate(&self) -> Result<()> {
        if !(self.min > 0.0 && self.min <= self.init && self.init <= self.max) {
            return Err(Error::InvalidConfig(
                "length schedule requires 0 < min <= init <= max",
            ));
        }
        if self.success_tolerance == 0 || self.failure_tolerance == 0 {
            return Err(Error::InvalidConfig(
                "length schedule tolerances must be positive",
            ));
        }
        Ok(())
    }

    /// A fresh state at the initial length.
    #[must_use]
    pub fn start(&self) -> LengthState {
        LengthState {
            length: self.init,
            successes: 0,
            failures: 0,
            restarts: 0,
        }
    }

    /// Rebuild the length state by replaying a history.
    ///
    /// The first `n_initial` observations form the initial design and only
    /// set the incumbent. The rest are grouped into batches of `batch_size`;
    /// a batch succeeds when its best value beats the incumbent by more than
    /// `tolerance * |incumbent|` (and by a positive amount). When the length
    /// falls below `min`, the state restarts at `init`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the schedule is invalid or
    /// `batch_size == 0`.
    pub fn replay(
        &self,
        history: &History,
        n_initial: usize,
        batch_size: usize,
        tolerance: f64,
    ) -> Result<LengthState> {
        self.validate()?;
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be positive"));
        }

        let values = history.outputs();
        let split = n_initial.min(values.len());
        let mut incumbent = max_value(&values[..split]);
        let mut state = self.start();

        for batch in values[split..].chunks(batch_size) {
            let batch_best = max_value(batch);
            let Some(best) = incumbent else {
                incumbent = batch_best;
                continue;
            };
            let next = batch_best.unwrap_or(best);
            let improvement = next - best;
            state.record(self, improvement > 0.0 && improvement > tolerance * best.abs());
            incumbent = Some(best.max(next));

            if state.needs_restart(self) {
                trace_info!(length = state.length, "trust region collapsed, restarting");
                state = LengthState {
                    restarts: state.restarts + 1,
                    ..self.start()
                };
            }
        }

        Ok(state)
    }
}

fn max_value(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Outcome of recording a proposal result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthChange {
    /// The length doubled (possibly capped at `max`).
    Expanded,
    /// The length halved.
    Shrunk,
    /// No tolerance was reached yet.
    Unchanged,
}

/// Current length factor and the consecutive success/failure counters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LengthState {
    length: f64,
    successes: usize,
    failures: usize,
    restarts: usize,
}

impl LengthState {
    /// The length factor `L` to pass to [`compute_box`].
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Consecutive successes since the last change.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.successes
    }

    /// Consecutive failures since the last change.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Number of collapses seen during [`LengthSchedule::replay`].
    #[must_use]
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Record whether the last proposal improved on the incumbent.
    pub fn record(&mut self, schedule: &LengthSchedule, success: bool) -> LengthChange {
        if success {
            self.successes += 1;
            self.failures = 0;
        } else {
            self.failures += 1;
            self.successes = 0;
        }

        if self.successes >= schedule.success_tolerance {
            self.length = (2.0 * self.length).min(schedule.max);
            self.successes = 0;
            trace_debug!(length = self.length, "trust region expanded");
            LengthChange::Expanded
        } else if self.failures >= schedule.failure_tolerance {
            self.length *= 0.5;
            self.failures = 0;
            trace_debug!(length = self.length, "trust region shrunk");
            LengthChange::Shrunk
        } else {
            LengthChange::Unchanged
        }
    }

    /// Whether the length has fallen below the schedule's minimum.
    #[must_use]
    pub fn needs_restart(&self, schedule: &LengthSchedule) -> bool {
        self.length < schedule.min
    }
}
