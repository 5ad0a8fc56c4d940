use super::Design;
use crate::rng_util;

/// Independent uniform draws over the unit cube.
///
/// The simplest baseline design: no coverage guarantee, but no coupling
/// between `count` and the geometry of the points either.
#[derive(Clone, Copy, Debug, Default)]
pub struct UniformDesign;

impl UniformDesign {
    /// Creates an independent uniform design.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Design for UniformDesign {
    fn unit_points(&self, dims: usize, count: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = fastrand::Rng::with_seed(seed);
        (0..count)
            .map(|_| {
                (0..dims)
                    .map(|_| rng_util::f64_range(&mut rng, 0.0, 1.0))
                    .collect()
            })
            .collect()
    }
}
