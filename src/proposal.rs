//! The proposal step: given a history, produce the next point(s) to evaluate.
//!
//! A [`Proposer`] composes the other modules into one pure decision:
//!
//! 1. anchor the trust region on the best observed input ([`compute_box`]),
//! 2. fill the region with a space-filling [`Design`],
//! 3. drop candidates near the global boundary or too close to history,
//! 4. fit the [`Surrogate`] on the full history and score the survivors,
//! 5. return the top `batch_size` candidates, mutually separated.
//!
//! Nothing is cached between calls: every proposal is a function of the
//! history snapshot, the bounds, the length factor `L` and the seed.
//!
//! # Examples
//!
//! ```
//! use nextpoint::prelude::*;
//!
//! let bounds = Bounds::unit(2).unwrap();
//! let history = History::from_parts(
//!     vec![vec![0.2, 0.3], vec![0.8, 0.6], vec![0.5, 0.9], vec![0.4, 0.1]],
//!     vec![0.1, 0.9, 0.4, 0.2],
//! )
//! .unwrap();
//!
//! let proposer = Proposer::builder(bounds)
//!     .strategy(Strategy::UpperConfidenceBound { kappa: 1.6 })
//!     .n_candidates(64)
//!     .seed(3)
//!     .build()
//!     .unwrap();
//!
//! let proposal = proposer.propose(&history, 0.8).unwrap();
//! let next = proposal.best().unwrap();
//! assert!(proposal.trust_region.contains(&next.input));
//! ```
//!
//! [`Design`]: crate::sampler::Design

use std::sync::Arc;

use crate::acquisition::Strategy;
use crate::bounds::Bounds;
use crate::error::{Error, Result};
use crate::history::{History, HistoryProvider};
use crate::sampler::{Design, LatinHypercube, filter_interior, filter_novel};
use crate::surrogate::{GaussianProcess, Predictor, Surrogate};
use crate::trust_region::{TrustRegionBox, compute_box};

const DEFAULT_N_CANDIDATES: usize = 512;
const DEFAULT_EDGE_MARGIN: f64 = 1e-3;
const DEFAULT_MIN_SEPARATION: f64 = 0.02;

/// One proposed input with the quantities it was ranked by.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoredPoint {
    /// The proposed input, inside the trust region.
    pub input: Vec<f64>,
    /// Acquisition score; higher is better.
    pub score: f64,
    /// Surrogate predictive mean.
    pub mean: f64,
    /// Surrogate predictive standard deviation.
    pub std: f64,
}

/// Ranked proposals (best first) and the trust region they were drawn from.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Proposal {
    /// Selected points, highest score first.
    pub points: Vec<ScoredPoint>,
    /// The box the candidates were drawn from.
    pub trust_region: TrustRegionBox,
}

impl Proposal {
    /// The highest-scoring point.
    #[must_use]
    pub fn best(&self) -> Option<&ScoredPoint> {
        self.points.first()
    }

    /// The proposed inputs, best first.
    #[must_use]
    pub fn inputs(&self) -> Vec<Vec<f64>> {
        self.points.iter().map(|p| p.input.clone()).collect()
    }

    /// Number of proposed points, at most the batch size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing was proposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Proposes the next experiments from a history.
///
/// Built with [`Proposer::builder`]. The surrogate type defaults to
/// [`GaussianProcess`]; any [`Surrogate`] can be plugged in with
/// [`ProposerBuilder::surrogate`].
#[derive(Clone)]
pub struct Proposer<S = GaussianProcess> {
    bounds: Bounds,
    strategy: Strategy,
    surrogate: S,
    design: Arc<dyn Design>,
    n_candidates: usize,
    batch_size: usize,
    edge_margin: Option<f64>,
    min_separation: Option<f64>,
    seed: u64,
}

impl Proposer {
    /// Start configuring a proposer over `bounds`.
    #[must_use]
    pub fn builder(bounds: Bounds) -> ProposerBuilder {
        ProposerBuilder::new(bounds)
    }
}

impl<S: Surrogate> Proposer<S> {
    /// The global search space.
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// The acquisition strategy used for ranking.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The surrogate refit on every call.
    #[must_use]
    pub fn surrogate(&self) -> &S {
        &self.surrogate
    }

    /// Maximum number of points per proposal.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Propose up to `batch_size` points inside the trust region of length `length`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimension`] if the history width differs from the bounds.
    /// - [`Error::InsufficientData`] if the history is empty, or too short for
    ///   the surrogate.
    /// - [`Error::InvalidLength`] if `length` is negative or NaN.
    /// - [`Error::AnchorOutOfBounds`] if the best observed input lies outside
    ///   the bounds.
    /// - [`Error::DegenerateCandidateSet`] if filtering removes every candidate.
    /// - Any error from [`Surrogate::fit`].
    pub fn propose(&self, history: &History, length: f64) -> Result<Proposal> {
        if let Some(dims) = history.dims()
            && dims != self.bounds.dims()
        {
            return Err(Error::InvalidDimension {
                expected: self.bounds.dims(),
                got: dims,
            });
        }
        let best = history.best().ok_or(Error::InsufficientData {
            required: 1,
            got: 0,
        })?;

        let region = compute_box(&best.input, &self.bounds, length)?;
        let candidates = self.candidates(&region, history)?;

        let inputs: Vec<Vec<f64>> = history.inputs().map(<[f64]>::to_vec).collect();
        let model = self.surrogate.fit(&inputs, &history.outputs())?;
        let prediction = model.predict(&candidates);
        let scores = self.strategy.acquisition(best.value).score_all(&prediction);

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        let mut points: Vec<ScoredPoint> = Vec::with_capacity(self.batch_size);
        for idx in order {
            if points.len() == self.batch_size {
                break;
            }
            if let Some(sep) = self.min_separation
                && !filter_novel(
                    &candidates[idx],
                    points.iter().map(|p| p.input.as_slice()),
                    sep,
                )
            {
                continue;
            }
            points.push(ScoredPoint {
                input: candidates[idx].clone(),
                score: scores[idx],
                mean: prediction.mean[idx],
                std: prediction.std[idx],
            });
        }

        trace_info!(
            selected = points.len(),
            requested = self.batch_size,
            length,
            strategy = %self.strategy,
            "proposal ready"
        );

        Ok(Proposal {
            points,
            trust_region: region,
        })
    }

    /// Snapshot `provider` and propose from it.
    ///
    /// # Errors
    ///
    /// See [`propose`](Self::propose).
    pub fn propose_from(&self, provider: &dyn HistoryProvider, length: f64) -> Result<Proposal> {
        self.propose(&provider.snapshot(), length)
    }

    /// Generate candidates in `region` and apply the edge and novelty filters.
    fn candidates(&self, region: &TrustRegionBox, history: &History) -> Result<Vec<Vec<f64>>> {
        let mut candidates = self
            .design
            .generate_in_box(region, self.n_candidates, self.seed);
        let generated = candidates.len();

        if let Some(margin) = self.edge_margin {
            let keep = filter_interior(&candidates, &self.bounds, margin);
            let mut flags = keep.iter();
            candidates.retain(|_| flags.next().copied().unwrap_or(false));
        }
        let after_edge = candidates.len();

        if let Some(sep) = self.min_separation {
            candidates.retain(|c| filter_novel(c, history.inputs(), sep));
        }
        let after_novelty = candidates.len();

        trace_debug!(generated, after_edge, after_novelty, "candidates filtered");

        if candidates.is_empty() {
            return Err(Error::DegenerateCandidateSet {
                generated,
                after_edge,
                after_novelty,
            });
        }
        Ok(candidates)
    }
}

/// Builder for [`Proposer`].
///
/// | Option | Default |
/// |--------|---------|
/// | `strategy` | EI with `xi = 0.01` |
/// | `surrogate` | [`GaussianProcess`] with its defaults |
/// | `design` | [`LatinHypercube`] |
/// | `n_candidates` | 512 |
/// | `batch_size` | 1 |
/// | `edge_margin` | `Some(1e-3)` |
/// | `min_separation` | `Some(0.02)` |
/// | `seed` | 0 |
#[derive(Clone)]
pub struct ProposerBuilder<S = GaussianProcess> {
    bounds: Bounds,
    strategy: Strategy,
    surrogate: S,
    design: Arc<dyn Design>,
    n_candidates: usize,
    batch_size: usize,
    edge_margin: Option<f64>,
    min_separation: Option<f64>,
    seed: u64,
}

impl ProposerBuilder {
    /// Creates a builder with default settings.
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        let surrogate = GaussianProcess::with_defaults(bounds.dims());
        Self {
            bounds,
            strategy: Strategy::default(),
            surrogate,
            design: Arc::new(LatinHypercube::new()),
            n_candidates: DEFAULT_N_CANDIDATES,
            batch_size: 1,
            edge_margin: Some(DEFAULT_EDGE_MARGIN),
            min_separation: Some(DEFAULT_MIN_SEPARATION),
            seed: 0,
        }
    }
}

impl<S: Surrogate> ProposerBuilder<S> {
    /// Sets the acquisition strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the surrogate backend.
    #[must_use]
    pub fn surrogate<T: Surrogate>(self, surrogate: T) -> ProposerBuilder<T> {
        ProposerBuilder {
            bounds: self.bounds,
            strategy: self.strategy,
            surrogate,
            design: self.design,
            n_candidates: self.n_candidates,
            batch_size: self.batch_size,
            edge_margin: self.edge_margin,
            min_separation: self.min_separation,
            seed: self.seed,
        }
    }

    /// Sets the candidate design.
    #[must_use]
    pub fn design(mut self, design: impl Design + 'static) -> Self {
        self.design = Arc::new(design);
        self
    }

    /// Candidates generated per proposal, before filtering.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n;
        self
    }

    /// Maximum number of points returned per proposal.
    #[must_use]
    pub fn batch_size(mut self, n: usize) -> Self {
        self.batch_size = n;
        self
    }

    /// Fraction of each global side to keep clear of the boundary.
    /// `None` disables the filter.
    #[must_use]
    pub fn edge_margin(mut self, margin: Option<f64>) -> Self {
        self.edge_margin = margin;
        self
    }

    /// Minimum Chebyshev distance to history and between batch members.
    /// `None` disables both checks.
    #[must_use]
    pub fn min_separation(mut self, separation: Option<f64>) -> Self {
        self.min_separation = separation;
        self
    }

    /// Seed for the candidate design.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builds the configured [`Proposer`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `n_candidates` or `batch_size` is
    /// zero, the edge margin is outside `[0, 0.5)`, the separation is negative
    /// or not finite, or the strategy parameters are not finite (or `kappa < 0`).
    pub fn build(self) -> Result<Proposer<S>> {
        if self.n_candidates == 0 {
            return Err(Error::InvalidConfig("n_candidates must be positive"));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive"));
        }
        if let Some(margin) = self.edge_margin
            && !(0.0..0.5).contains(&margin)
        {
            return Err(Error::InvalidConfig("edge_margin must lie in [0, 0.5)"));
        }
        if let Some(sep) = self.min_separation
            && !(sep >= 0.0 && sep.is_finite())
        {
            return Err(Error::InvalidConfig(
                "min_separation must be finite and non-negative",
            ));
        }
        match self.strategy {
            Strategy::ExpectedImprovement { xi } if !xi.is_finite() => {
                return Err(Error::InvalidConfig("xi must be finite"));
            }
            Strategy::UpperConfidenceBound { kappa } if !(kappa >= 0.0 && kappa.is_finite()) => {
                return Err(Error::InvalidConfig("kappa must be finite and non-negative"));
            }
            _ => {}
        }

        Ok(Proposer {
            bounds: self.bounds,
            strategy: self.strategy,
            surrogate: self.surrogate,
            design: self.design,
            n_candidates: self.n_candidates,
            batch_size: self.batch_size,
            edge_margin: self.edge_margin,
            min_separation: self.min_separation,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds::unit(2).unwrap()
    }

    #[test]
    fn builder_rejects_bad_settings() {
        assert!(matches!(
            Proposer::builder(bounds()).n_candidates(0).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Proposer::builder(bounds()).batch_size(0).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Proposer::builder(bounds()).edge_margin(Some(0.5)).build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Proposer::builder(bounds())
                .min_separation(Some(f64::NAN))
                .build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            Proposer::builder(bounds())
                .strategy(Strategy::UpperConfidenceBound { kappa: -1.0 })
                .build(),
            Err(Error::InvalidConfig(_))
        ));
        assert!(Proposer::builder(bounds()).build().is_ok());
    }

    #[test]
    fn empty_history_is_insufficient() {
        let proposer = Proposer::builder(bounds()).build().unwrap();
        assert!(matches!(
            proposer.propose(&History::new(), 0.5),
            Err(Error::InsufficientData { required: 1, got: 0 })
        ));
    }

    #[test]
    fn history_width_must_match_bounds() {
        let proposer = Proposer::builder(bounds()).build().unwrap();
        let history = History::from_parts(vec![vec![0.5], vec![0.2]], vec![1.0, 0.0]).unwrap();
        assert!(matches!(
            proposer.propose(&history, 0.5),
            Err(Error::InvalidDimension {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn filters_report_counts() {
        // A zero-length region collapses onto the best input, which is never novel.
        let proposer = Proposer::builder(bounds())
            .n_candidates(16)
            .build()
            .unwrap();
        let history =
            History::from_parts(vec![vec![0.5, 0.5], vec![0.2, 0.8]], vec![1.0, 0.0]).unwrap();
        match proposer.propose(&history, 0.0) {
            Err(Error::DegenerateCandidateSet {
                generated,
                after_edge,
                after_novelty,
            }) => {
                assert_eq!(generated, 16);
                assert_eq!(after_edge, 16);
                assert_eq!(after_novelty, 0);
            }
            other => panic!("expected DegenerateCandidateSet, got {other:?}"),
        }
    }
}
