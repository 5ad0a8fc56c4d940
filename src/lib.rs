#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Trust-region Bayesian optimization for expensive experiments. Given a
//! small history of `(input, outcome)` pairs in a bounded continuous space,
//! `nextpoint` fits a Gaussian process surrogate and proposes the next
//! input(s) to evaluate, searching only a box around the best point seen so
//! far. Outcomes are maximized.
//!
//! # Getting Started
//!
//! ```
//! use nextpoint::prelude::*;
//!
//! let bounds = Bounds::new(vec![0.0, -1.0], vec![1.0, 1.0]).unwrap();
//! let mut history = History::new();
//! for x in nextpoint::sampler::generate(bounds.lower(), bounds.upper(), 6, 1).unwrap() {
//!     let y = -(x[0] - 0.3).powi(2) - x[1].powi(2);
//!     history.push(x, y).unwrap();
//! }
//!
//! let proposer = Proposer::builder(bounds).n_candidates(128).build().unwrap();
//! let length = LengthSchedule::for_dims(2, 1).replay(&history, 6, 1, 1e-3).unwrap();
//! let proposal = proposer.propose(&history, length.length()).unwrap();
//! println!("next: {:?}", proposal.best().unwrap().input);
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Bounds`] | Validated global search box. |
//! | [`History`](history::History) | Append-only log of observations; the only state a proposal reads. |
//! | [`Proposer`](proposal::Proposer) | One decision step: trust region, candidates, surrogate, acquisition, ranking. |
//! | [`Design`](sampler::Design) | Space-filling candidate generator (Latin hypercube by default). |
//! | [`Surrogate`](surrogate::Surrogate) | Regression model with calibrated uncertainty (Gaussian process by default). |
//! | [`Strategy`](acquisition::Strategy) | Acquisition function: EI, UCB or max variance. |
//! | [`LengthSchedule`](trust_region::LengthSchedule) | Success/failure policy for the trust region length. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on bounds, history, strategies, schedules and proposals | off |
//! | `sobol` | [`SobolDesign`](sampler::sobol::SobolDesign), scrambled low-discrepancy candidates | off |
//! | `parallel` | Likelihood restarts on a `rayon` pool (results are unchanged) | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at fit and proposal points | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
mod bounds;
mod error;
pub mod history;
pub mod proposal;
mod rng_util;
pub mod sampler;
pub mod surrogate;
pub mod trust_region;

pub use bounds::Bounds;
pub use error::{Error, Result};
pub use history::{History, Observation};
pub use proposal::{Proposal, Proposer};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use nextpoint::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::{
        AcquisitionFunction, ExpectedImprovement, MaxVariance, Strategy, UpperConfidenceBound,
    };
    pub use crate::bounds::Bounds;
    pub use crate::error::{Error, Result};
    pub use crate::history::{History, HistoryProvider, MemoryHistory, Observation};
    pub use crate::proposal::{Proposal, Proposer, ProposerBuilder, ScoredPoint};
    #[cfg(feature = "sobol")]
    pub use crate::sampler::sobol::SobolDesign;
    pub use crate::sampler::{Design, LatinHypercube, UniformDesign};
    pub use crate::surrogate::{GaussianProcess, Predictor, Surrogate};
    pub use crate::trust_region::{LengthSchedule, LengthState, TrustRegionBox, compute_box};
}
