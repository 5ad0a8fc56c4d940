use super::Design;

/// Latin hypercube design.
///
/// The unit interval of every dimension is cut into `count` equal strata and
/// each stratum receives exactly one point; the pairing of strata across
/// dimensions is a seeded random permutation per dimension. By default each
/// point is jittered uniformly inside its stratum; [`centered`](Self::centered)
/// places it at the stratum midpoint instead.
///
/// # Examples
///
/// ```
/// use nextpoint::sampler::{Design, LatinHypercube};
///
/// let points = LatinHypercube::new().unit_points(3, 10, 7);
/// assert_eq!(points.len(), 10);
/// assert!(points.iter().flatten().all(|&u| (0.0..1.0).contains(&u)));
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct LatinHypercube {
    centered: bool,
}

impl LatinHypercube {
    /// Creates a jittered Latin hypercube design.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place points at stratum midpoints instead of jittering them.
    #[must_use]
    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }
}

impl Design for LatinHypercube {
    #[allow(clippy::cast_precision_loss)]
    fn unit_points(&self, dims: usize, count: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut points = vec![Vec::with_capacity(dims); count];
        let mut strata: Vec<usize> = (0..count).collect();
        let n = count as f64;

        for _ in 0..dims {
            rng.shuffle(&mut strata);
            for (point, &stratum) in points.iter_mut().zip(&strata) {
                let offset = if self.centered { 0.5 } else { rng.f64() };
                point.push((stratum as f64 + offset) / n);
            }
        }

        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn one_point_per_stratum() {
        let count = 16;
        let points = LatinHypercube::new().unit_points(3, count, 11);
        for dim in 0..3 {
            let mut seen = vec![false; count];
            for p in &points {
                let stratum = ((p[dim] * count as f64).floor() as usize).min(count - 1);
                assert!(!seen[stratum], "stratum {stratum} hit twice in dim {dim}");
                seen[stratum] = true;
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn same_seed_same_points() {
        let design = LatinHypercube::new();
        assert_eq!(design.unit_points(2, 5, 3), design.unit_points(2, 5, 3));
        assert_ne!(design.unit_points(2, 5, 3), design.unit_points(2, 5, 4));
    }

    #[test]
    fn centered_points_sit_on_midpoints() {
        let points = LatinHypercube::new().centered(true).unit_points(1, 4, 0);
        let mut xs: Vec<f64> = points.iter().map(|p| p[0]).collect();
        xs.sort_by(f64::total_cmp);
        assert_eq!(xs, vec![0.125, 0.375, 0.625, 0.875]);
    }
}
