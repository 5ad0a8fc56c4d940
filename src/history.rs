//! Observation history.
//!
//! The engine never owns the campaign's history: it reads a point-in-time
//! [`History`] snapshot handed to it by the caller, or taken from a
//! [`HistoryProvider`]. The history is append-only; observations are never
//! edited or removed.
//!
//! # Implementing a custom provider
//!
//! Implement [`HistoryProvider`] to back the history with a database or a
//! file maintained elsewhere. [`MemoryHistory`] is the in-process default.
//!
//! ```
//! use nextpoint::history::{HistoryProvider, MemoryHistory, Observation};
//!
//! let provider = MemoryHistory::new();
//! provider.append(vec![Observation::new(vec![0.2, 0.3], 1.0)]).unwrap();
//! let snapshot = provider.snapshot();
//! assert_eq!(snapshot.len(), 1);
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};

/// One evaluated experiment: an input vector and its scalar outcome.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// The evaluated input.
    pub input: Vec<f64>,
    /// The observed outcome (larger is better).
    pub value: f64,
}

impl Observation {
    /// Pairs an input with its outcome.
    #[must_use]
    pub fn new(input: Vec<f64>, value: f64) -> Self {
        Self { input, value }
    }
}

/// An owned, append-only sequence of finite observations sharing one input width.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawHistory", into = "RawHistory")
)]
pub struct History {
    observations: Vec<Observation>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from parallel input rows and outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if `inputs` and `outputs` differ in
    /// length, or if the input rows differ in width, and [`Error::InvalidData`]
    /// if any coordinate or outcome is not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use nextpoint::History;
    ///
    /// let history =
    ///     History::from_parts(vec![vec![0.2, 0.3], vec![0.7, 0.8]], vec![1.0, 2.0]).unwrap();
    /// assert_eq!(history.best().unwrap().value, 2.0);
    /// ```
    pub fn from_parts(inputs: Vec<Vec<f64>>, outputs: Vec<f64>) -> Result<Self> {
        if inputs.len() != outputs.len() {
            return Err(Error::InvalidDimension {
                expected: inputs.len(),
                got: outputs.len(),
            });
        }
        let mut history = Self {
            observations: Vec::with_capacity(inputs.len()),
        };
        for (input, value) in inputs.into_iter().zip(outputs) {
            history.push(input, value)?;
        }
        Ok(history)
    }

    /// Append one observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if `input` is empty or its width
    /// differs from the observations already recorded, and
    /// [`Error::InvalidData`] if `value` or any coordinate is NaN or infinite.
    pub fn push(&mut self, input: Vec<f64>, value: f64) -> Result<()> {
        self.append(Observation::new(input, value))
    }

    /// Append one observation.
    ///
    /// # Errors
    ///
    /// See [`push`](Self::push).
    pub fn append(&mut self, observation: Observation) -> Result<()> {
        check(&observation, self.dims())?;
        self.observations.push(observation);
        Ok(())
    }

    /// Append several observations, stopping at the first invalid one.
    ///
    /// # Errors
    ///
    /// See [`push`](Self::push). Observations before the invalid one are kept.
    pub fn extend<I: IntoIterator<Item = Observation>>(&mut self, observations: I) -> Result<()> {
        observations.into_iter().try_for_each(|o| self.append(o))
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the history holds no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Input width, or `None` for an empty history.
    #[must_use]
    pub fn dims(&self) -> Option<usize> {
        self.observations.first().map(|o| o.input.len())
    }

    /// All observations in insertion order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Iterate over input rows in insertion order.
    pub fn inputs(&self) -> impl Iterator<Item = &[f64]> {
        self.observations.iter().map(|o| o.input.as_slice())
    }

    /// Outcomes in insertion order.
    #[must_use]
    pub fn outputs(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.value).collect()
    }

    /// The observation with the largest outcome; the earliest wins ties.
    #[must_use]
    pub fn best(&self) -> Option<&Observation> {
        self.observations.iter().reduce(|best, o| {
            if o.value > best.value { o } else { best }
        })
    }
}

/// Validate one observation against the expected width, returning its width.
fn check(observation: &Observation, expected: Option<usize>) -> Result<usize> {
    let width = observation.input.len();
    let want = expected.unwrap_or(width.max(1));
    if width != want {
        return Err(Error::InvalidDimension {
            expected: want,
            got: width,
        });
    }
    if !observation.value.is_finite() {
        return Err(Error::InvalidData("observed value is not finite"));
    }
    if !observation.input.iter().all(|x| x.is_finite()) {
        return Err(Error::InvalidData("observed input is not finite"));
    }
    Ok(width)
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawHistory {
    observations: Vec<Observation>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawHistory> for History {
    type Error = Error;

    fn try_from(raw: RawHistory) -> Result<Self> {
        let mut history = Self::new();
        history.extend(raw.observations)?;
        Ok(history)
    }
}

#[cfg(feature = "serde")]
impl From<History> for RawHistory {
    fn from(history: History) -> Self {
        Self {
            observations: history.observations,
        }
    }
}

/// A source of history snapshots.
///
/// Implementations must be `Send + Sync` so one provider can serve
/// concurrent proposal steps.
pub trait HistoryProvider: Send + Sync {
    /// Append newly evaluated observations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if an observation does not match
    /// the width of the stored inputs, and [`Error::InvalidData`] if it holds
    /// a non-finite number.
    fn append(&self, observations: Vec<Observation>) -> Result<()>;

    /// A point-in-time copy of the history.
    fn snapshot(&self) -> History;

    /// Number of stored observations.
    fn len(&self) -> usize;

    /// Whether no observations are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory history provider.
///
/// A thin wrapper around `Arc<RwLock<History>>`; clones share the same log.
#[derive(Clone, Default)]
pub struct MemoryHistory {
    inner: Arc<RwLock<History>>,
}

impl MemoryHistory {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider pre-populated with `history`.
    #[must_use]
    pub fn with_history(history: History) -> Self {
        Self {
            inner: Arc::new(RwLock::new(history)),
        }
    }
}

impl HistoryProvider for MemoryHistory {
    fn append(&self, observations: Vec<Observation>) -> Result<()> {
        let mut guard = self.inner.write();
        // Validate first so a bad batch leaves the log untouched.
        let mut expected = guard.dims();
        for o in &observations {
            expected = Some(check(o, expected)?);
        }
        guard.observations.extend(observations);
        Ok(())
    }

    fn snapshot(&self) -> History {
        self.inner.read().clone()
    }

    fn len(&self) -> usize {
        self.inner.read().len()
    }
}
