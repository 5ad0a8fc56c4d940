/// Per-dimension standardization of input rows (zero mean, unit variance).
///
/// Uses the population standard deviation. Constant dimensions keep a scale
/// of 1 so they map to zero instead of dividing by zero. A fitted model
/// re-applies the same transform to every query.
#[derive(Clone, Debug, PartialEq)]
pub struct InputScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl InputScaler {
    /// Fit on `rows`, which must be non-empty and of uniform width.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn fit(rows: &[Vec<f64>]) -> Self {
        let dims = rows.first().map_or(0, Vec::len);
        let n = rows.len() as f64;
        let mut mean = vec![0.0; dims];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let scale = (0..dims)
            .map(|j| {
                let var = rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std > f64::EPSILON * mean[j].abs().max(1.0) {
                    std
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, scale }
    }

    /// Per-dimension training means.
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-dimension divisors; 1 for constant dimensions.
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize one row.
    #[must_use]
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }

    /// Undo [`transform`](Self::transform).
    #[must_use]
    pub fn inverse_transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(z, (m, s))| z * s + m)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardizes_columns() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = InputScaler::fit(&rows);
        assert_eq!(scaler.mean(), &[2.0, 5.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0]);
        assert_eq!(scaler.transform(&[1.0, 5.0]), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform(&[3.0, 7.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn inverse_round_trips() {
        let rows = vec![vec![0.2, 10.0], vec![0.9, -4.0], vec![0.4, 3.0]];
        let scaler = InputScaler::fit(&rows);
        for row in &rows {
            let back = scaler.inverse_transform(&scaler.transform(row));
            for (a, b) in back.iter().zip(row) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }
}
