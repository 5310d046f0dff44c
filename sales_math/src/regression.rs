//! Ridge regression via the normal equations
//!
//! Solves `(Xc'Xc + lambda * I) w = Xc'yc` where `Xc` and `yc` are the
//! mean-centered design matrix and targets. The intercept is recovered from
//! the means and is never penalized. The system is symmetric positive
//! definite for any `lambda > 0`, so it is solved with a Cholesky
//! factorization.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Fitted ridge coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeFit {
    /// One weight per input column, in input order
    pub weights: Vec<f64>,
    /// Unpenalized intercept
    pub intercept: f64,
}

impl RidgeFit {
    /// Predict a single observation
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(row.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }
}

/// Fit ridge regression on column-major features.
///
/// `columns[j][i]` is feature `j` of observation `i`.
pub fn solve_ridge(columns: &[&[f64]], targets: &[f64], lambda: f64) -> Result<RidgeFit> {
    if !(lambda > 0.0) || !lambda.is_finite() {
        return Err(MathError::InvalidInput(format!(
            "Ridge penalty must be positive and finite, got {}",
            lambda
        )));
    }

    let n = targets.len();
    if n == 0 {
        return Err(MathError::InsufficientData(
            "Cannot fit regression without observations".to_string(),
        ));
    }
    if let Some(bad) = columns.iter().position(|c| c.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Column {} has {} values, expected {}",
            bad,
            columns[bad].len(),
            n
        )));
    }

    let p = columns.len();
    let y_mean = targets.iter().sum::<f64>() / n as f64;
    let x_means: Vec<f64> = columns
        .iter()
        .map(|c| c.iter().sum::<f64>() / n as f64)
        .collect();

    // Centered Gram matrix (lower triangle is mirrored afterwards)
    let mut gram = vec![0.0; p * p];
    let mut rhs = vec![0.0; p];
    for j in 0..p {
        let cj = columns[j];
        let mj = x_means[j];
        for k in 0..=j {
            let ck = columns[k];
            let mk = x_means[k];
            let dot: f64 = cj
                .iter()
                .zip(ck.iter())
                .map(|(a, b)| (a - mj) * (b - mk))
                .sum();
            gram[j * p + k] = dot;
            gram[k * p + j] = dot;
        }
        gram[j * p + j] += lambda;
        rhs[j] = cj
            .iter()
            .zip(targets.iter())
            .map(|(a, y)| (a - mj) * (y - y_mean))
            .sum();
    }

    let weights = cholesky_solve(&mut gram, &rhs, p)?;
    let intercept = y_mean
        - weights
            .iter()
            .zip(x_means.iter())
            .map(|(w, m)| w * m)
            .sum::<f64>();

    Ok(RidgeFit { weights, intercept })
}

/// Solve `A x = b` for symmetric positive definite `A` (row-major, p x p).
///
/// `a` is overwritten with its Cholesky factor.
fn cholesky_solve(a: &mut [f64], b: &[f64], p: usize) -> Result<Vec<f64>> {
    // Factor A = L L'
    for j in 0..p {
        let mut diag = a[j * p + j];
        for k in 0..j {
            diag -= a[j * p + k] * a[j * p + k];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(MathError::CalculationError(format!(
                "Normal equations are not positive definite at column {}",
                j
            )));
        }
        let l_jj = diag.sqrt();
        a[j * p + j] = l_jj;

        for i in (j + 1)..p {
            let mut value = a[i * p + j];
            for k in 0..j {
                value -= a[i * p + k] * a[j * p + k];
            }
            a[i * p + j] = value / l_jj;
        }
    }

    // Forward substitution: L z = b
    let mut z = vec![0.0; p];
    for i in 0..p {
        let mut value = b[i];
        for k in 0..i {
            value -= a[i * p + k] * z[k];
        }
        z[i] = value / a[i * p + i];
    }

    // Back substitution: L' x = z
    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let mut value = z[i];
        for k in (i + 1)..p {
            value -= a[k * p + i] * x[k];
        }
        x[i] = value / a[i * p + i];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_recovers_linear_relationship() {
        let x1: Vec<f64> = (0..50).map(|i| i as f64 / 10.0).collect();
        let x2: Vec<f64> = (0..50).map(|i| ((i * 7) % 11) as f64).collect();
        let y: Vec<f64> = x1
            .iter()
            .zip(x2.iter())
            .map(|(a, b)| 1.5 + 2.0 * a - 0.5 * b)
            .collect();

        let fit = solve_ridge(&[&x1, &x2], &y, 1e-9).unwrap();

        assert_abs_diff_eq!(fit.weights[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.weights[1], -0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.intercept, 1.5, epsilon = 1e-6);
        assert_abs_diff_eq!(fit.predict_row(&[1.0, 2.0]), 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_constant_feature_gets_zero_weight() {
        let x = vec![4.0; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();

        let fit = solve_ridge(&[&x], &y, 1.0).unwrap();

        assert_abs_diff_eq!(fit.weights[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.intercept, 4.5, epsilon = 1e-12);
    }

    #[test]
    fn test_more_features_than_rows() {
        let a = [1.0, 2.0];
        let b = [0.0, 5.0];
        let c = [3.0, 3.0];
        let fit = solve_ridge(&[&a, &b, &c], &[1.0, 2.0], 0.1).unwrap();
        assert_eq!(fit.weights.len(), 3);
        assert!(fit.intercept.is_finite());
    }

    #[test]
    fn test_invalid_inputs() {
        let x = [1.0, 2.0];
        assert!(solve_ridge(&[&x], &[1.0, 2.0], 0.0).is_err());
        assert!(solve_ridge(&[&x], &[], 1.0).is_err());
        assert!(solve_ridge(&[&x], &[1.0, 2.0, 3.0], 1.0).is_err());
    }
}
