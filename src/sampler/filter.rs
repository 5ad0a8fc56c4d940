use crate::bounds::Bounds;

/// Mark points that stay away from the edges of the global bounds.
///
/// Entry `i` is `true` iff every coordinate of `points[i]`, normalized to
/// `bounds`, lies strictly inside `(edge_margin, 1 - edge_margin)`. The
/// surrogate extrapolates worst at the boundary, so candidates pinned there
/// are dropped. Points of the wrong width are marked `false`.
///
/// # Examples
///
/// ```
/// use nextpoint::Bounds;
/// use nextpoint::sampler::filter_interior;
///
/// let bounds = Bounds::unit(2).unwrap();
/// let mask = filter_interior(&[vec![0.5, 0.5], vec![0.0005, 0.5]], &bounds, 1e-3);
/// assert_eq!(mask, vec![true, false]);
/// ```
#[must_use]
pub fn filter_interior(points: &[Vec<f64>], bounds: &Bounds, edge_margin: f64) -> Vec<bool> {
    let upper = 1.0 - edge_margin;
    points
        .iter()
        .map(|p| {
            p.len() == bounds.dims()
                && bounds
                    .normalize(p)
                    .iter()
                    .all(|&u| u > edge_margin && u < upper)
        })
        .collect()
}

/// Whether `point` is at least `min_separation` away from every existing point.
///
/// Distance is Chebyshev (largest coordinate difference). An empty
/// `existing` set makes every point novel.
///
/// # Examples
///
/// ```
/// use nextpoint::sampler::filter_novel;
///
/// let existing = vec![vec![0.2, 0.3], vec![0.7, 0.8]];
/// assert!(!filter_novel(&[0.2, 0.3], &existing, 0.02));
/// assert!(filter_novel(&[0.5, 0.5], &existing, 0.02));
/// ```
pub fn filter_novel<I, P>(point: &[f64], existing: I, min_separation: f64) -> bool
where
    I: IntoIterator<Item = P>,
    P: AsRef<[f64]>,
{
    existing
        .into_iter()
        .all(|e| chebyshev_distance(point, e.as_ref()) >= min_separation)
}

/// Largest absolute coordinate difference between two points.
#[must_use]
pub fn chebyshev_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_uses_global_bounds() {
        let bounds = Bounds::new(vec![0.0, 10.0], vec![2.0, 20.0]).unwrap();
        let points = vec![
            vec![1.0, 15.0],
            vec![1.0, 10.0],
            vec![2.0, 15.0],
            vec![0.01, 15.0],
        ];
        assert_eq!(
            filter_interior(&points, &bounds, 0.01),
            vec![true, false, false, false]
        );
    }

    #[test]
    fn zero_margin_still_excludes_the_boundary() {
        let bounds = Bounds::unit(1).unwrap();
        let points = vec![vec![0.0], vec![1.0], vec![0.5]];
        assert_eq!(filter_interior(&points, &bounds, 0.0), vec![false, false, true]);
    }

    #[test]
    fn novel_threshold_is_inclusive() {
        let existing = vec![vec![0.0, 0.0]];
        assert!(filter_novel(&[0.5, 0.0], &existing, 0.5));
        assert!(!filter_novel(&[0.49, 0.1], &existing, 0.5));
    }

    #[test]
    fn empty_existing_is_novel() {
        let existing: Vec<Vec<f64>> = Vec::new();
        assert!(filter_novel(&[0.1], &existing, 1.0));
    }

    #[test]
    fn chebyshev_takes_max_coordinate() {
        assert!((chebyshev_distance(&[0.0, 0.0], &[0.3, -0.4]) - 0.4).abs() < 1e-12);
    }
}
