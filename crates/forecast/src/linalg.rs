use crate::FitError;

/// Solve the dense `n × n` system `a · x = b` (row-major `a`) by Gaussian
/// elimination with partial pivoting.
///
/// Pivots smaller than `n · ε` relative to the largest entry of `a` are
/// treated as singular.
pub(crate) fn solve(mut a: Vec<f64>, mut b: Vec<f64>, n: usize) -> Result<Vec<f64>, FitError> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(b.len(), n);

    if a.iter().chain(&b).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }
    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if scale == 0.0 {
        return Err(FitError::Singular);
    }
    let tolerance = scale * n as f64 * f64::EPSILON;

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&x, &y| a[x * n + col].abs().total_cmp(&a[y * n + col].abs()))
            .unwrap_or(col);
        if a[pivot_row * n + col].abs() <= tolerance {
            return Err(FitError::Singular);
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap(col * n + k, pivot_row * n + k);
            }
            b.swap(col, pivot_row);
        }

        let pivot = a[col * n + col];
        for row in col + 1..n {
            let factor = a[row * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row * n + k] -= factor * a[col * n + k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row * n + k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row * n + row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(FitError::NonFinite)
    }
}
