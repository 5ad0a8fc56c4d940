//! Box-constrained L-BFGS used for marginal-likelihood maximization.
//!
//! Variables outside the box are projected back after every step, and
//! search directions are masked on coordinates pinned at an active bound.
//! The objective may decline a point (return `None`), which the line search
//! treats like an infinite value.

/// Result of a minimization run.
#[derive(Clone, Debug)]
pub(crate) struct Minimum {
    pub(crate) x: Vec<f64>,
    pub(crate) value: f64,
    pub(crate) iterations: usize,
}

/// Stopping and memory settings.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Settings {
    pub(crate) max_iterations: usize,
    /// History pairs kept for the inverse-Hessian approximation.
    pub(crate) memory: usize,
    /// Projected-gradient infinity norm below which the run stops.
    pub(crate) gradient_tolerance: f64,
    /// Relative decrease below which the run stops.
    pub(crate) value_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            memory: 10,
            gradient_tolerance: 1e-5,
            value_tolerance: 1e-10,
        }
    }
}

/// Armijo sufficient-decrease constant.
const ARMIJO: f64 = 1e-4;
/// Maximum step halvings per line search.
const MAX_BACKTRACKS: usize = 40;

/// Minimize `objective` over the box `bounds` starting at `x0`.
///
/// `objective` returns the value and gradient, or `None` if the point is
/// unusable. Returns `None` only if `x0` itself is unusable.
pub(crate) fn minimize<F>(
    mut objective: F,
    x0: &[f64],
    bounds: &[(f64, f64)],
    settings: Settings,
) -> Option<Minimum>
where
    F: FnMut(&[f64]) -> Option<(f64, Vec<f64>)>,
{
    let n = x0.len();
    let mut x = project(x0, bounds);
    let (mut fx, mut grad) = objective(&x)?;
    if !fx.is_finite() || grad.iter().any(|g| !g.is_finite()) {
        return None;
    }

    let mut s_hist: Vec<Vec<f64>> = Vec::with_capacity(settings.memory);
    let mut y_hist: Vec<Vec<f64>> = Vec::with_capacity(settings.memory);
    let mut iterations = 0;

    while iterations < settings.max_iterations {
        if projected_gradient_norm(&x, &grad, bounds) < settings.gradient_tolerance {
            break;
        }

        let mut direction = two_loop(&grad, &s_hist, &y_hist);
        mask_active(&mut direction, &x, bounds);
        let mut slope = dot(&grad, &direction);
        if slope >= 0.0 {
            // Curvature pairs went stale; fall back to steepest descent.
            s_hist.clear();
            y_hist.clear();
            direction = grad.iter().map(|g| -g).collect();
            mask_active(&mut direction, &x, bounds);
            slope = dot(&grad, &direction);
            if slope >= 0.0 {
                break;
            }
        }

        let Some((x_new, f_new, g_new)) = line_search(&mut objective, &x, fx, &grad, &direction, bounds)
        else {
            break;
        };
        iterations += 1;

        let s: Vec<f64> = (0..n).map(|i| x_new[i] - x[i]).collect();
        let y: Vec<f64> = (0..n).map(|i| g_new[i] - grad[i]).collect();
        if dot(&s, &y) > 1e-10 {
            if s_hist.len() == settings.memory {
                s_hist.remove(0);
                y_hist.remove(0);
            }
            s_hist.push(s);
            y_hist.push(y);
        }

        let decrease = fx - f_new;
        x = x_new;
        grad = g_new;
        let scale = fx.abs().max(f_new.abs()).max(1.0);
        fx = f_new;
        if decrease <= settings.value_tolerance * scale {
            break;
        }
    }

    Some(Minimum {
        x,
        value: fx,
        iterations,
    })
}

/// Backtracking projected line search with the Armijo condition.
fn line_search<F>(
    objective: &mut F,
    x: &[f64],
    fx: f64,
    grad: &[f64],
    direction: &[f64],
    bounds: &[(f64, f64)],
) -> Option<(Vec<f64>, f64, Vec<f64>)>
where
    F: FnMut(&[f64]) -> Option<(f64, Vec<f64>)>,
{
    let mut step = 1.0;
    for _ in 0..MAX_BACKTRACKS {
        let trial: Vec<f64> = x
            .iter()
            .zip(direction)
            .map(|(xi, di)| xi + step * di)
            .collect();
        let trial = project(&trial, bounds);
        let moved: Vec<f64> = trial.iter().zip(x).map(|(t, xi)| t - xi).collect();

        if let Some((f, g)) = objective(&trial)
            && f.is_finite()
            && g.iter().all(|v| v.is_finite())
            && f <= fx + ARMIJO * dot(grad, &moved)
        {
            return Some((trial, f, g));
        }
        step *= 0.5;
    }
    None
}

/// L-BFGS two-loop recursion, returning a descent direction.
fn two_loop(grad: &[f64], s_hist: &[Vec<f64>], y_hist: &[Vec<f64>]) -> Vec<f64> {
    let k = s_hist.len();
    let mut q = grad.to_vec();
    if k == 0 {
        return q.iter().map(|g| -g).collect();
    }

    let rho: Vec<f64> = (0..k).map(|i| 1.0 / dot(&s_hist[i], &y_hist[i])).collect();
    let mut alpha = vec![0.0; k];
    for i in (0..k).rev() {
        alpha[i] = rho[i] * dot(&s_hist[i], &q);
        for (qj, yj) in q.iter_mut().zip(&y_hist[i]) {
            *qj -= alpha[i] * yj;
        }
    }

    let last = k - 1;
    let yy = dot(&y_hist[last], &y_hist[last]);
    let gamma = if yy > 1e-30 {
        dot(&s_hist[last], &y_hist[last]) / yy
    } else {
        1.0
    };
    let mut r: Vec<f64> = q.iter().map(|v| gamma * v).collect();

    for i in 0..k {
        let beta = rho[i] * dot(&y_hist[i], &r);
        for (rj, sj) in r.iter_mut().zip(&s_hist[i]) {
            *rj += (alpha[i] - beta) * sj;
        }
    }

    r.iter().map(|v| -v).collect()
}

/// Zero direction components that push against an active bound.
fn mask_active(direction: &mut [f64], x: &[f64], bounds: &[(f64, f64)]) {
    for ((d, &xi), &(lo, hi)) in direction.iter_mut().zip(x).zip(bounds) {
        if (xi <= lo && *d < 0.0) || (xi >= hi && *d > 0.0) {
            *d = 0.0;
        }
    }
}

fn projected_gradient_norm(x: &[f64], grad: &[f64], bounds: &[(f64, f64)]) -> f64 {
    x.iter()
        .zip(grad)
        .zip(bounds)
        .map(|((&xi, &g), &(lo, hi))| {
            if (xi <= lo && g > 0.0) || (xi >= hi && g < 0.0) {
                0.0
            } else {
                g.abs()
            }
        })
        .fold(0.0, f64::max)
}

fn project(x: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    x.iter()
        .zip(bounds)
        .map(|(&v, &(lo, hi))| v.clamp(lo, hi))
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
