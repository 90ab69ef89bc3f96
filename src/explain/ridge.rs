//! Weighted ridge regression used as the local surrogate model.

use crate::error::{Result, TxcatError};

/// Coefficients of a fitted linear surrogate.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    /// One coefficient per selected column, in the order requested.
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// Fit `y ≈ intercept + X[:, columns] · coef` minimizing the weighted squared
/// error plus `alpha * |coef|²`. The intercept is not penalized.
pub fn weighted_ridge(
    rows: &[Vec<f64>],
    targets: &[f64],
    weights: &[f64],
    alpha: f64,
    columns: &[usize],
) -> Result<RidgeFit> {
    if rows.len() != targets.len() || rows.len() != weights.len() {
        return Err(TxcatError::explanation(format!(
            "surrogate inputs disagree in length: {} rows, {} targets, {} weights",
            rows.len(),
            targets.len(),
            weights.len()
        )));
    }
    let total: f64 = weights.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return Err(TxcatError::explanation("sample weights sum to zero"));
    }

    let p = columns.len();
    let mut x_mean = vec![0.0; p];
    let mut y_mean = 0.0;
    for ((row, &y), &w) in rows.iter().zip(targets).zip(weights) {
        for (m, &col) in x_mean.iter_mut().zip(columns) {
            *m += w * row[col];
        }
        y_mean += w * y;
    }
    x_mean.iter_mut().for_each(|m| *m /= total);
    y_mean /= total;

    // Normal equations on weighted-centered data.
    let mut gram = vec![vec![0.0; p]; p];
    let mut rhs = vec![0.0; p];
    let mut centered = vec![0.0; p];
    for ((row, &y), &w) in rows.iter().zip(targets).zip(weights) {
        for (j, &col) in columns.iter().enumerate() {
            centered[j] = row[col] - x_mean[j];
        }
        let dy = y - y_mean;
        for j in 0..p {
            rhs[j] += w * centered[j] * dy;
            for k in j..p {
                gram[j][k] += w * centered[j] * centered[k];
            }
        }
    }
    for j in 0..p {
        gram[j][j] += alpha;
        for k in 0..j {
            gram[j][k] = gram[k][j];
        }
    }

    let coef = solve(gram, rhs)?;
    let intercept = y_mean - coef.iter().zip(&x_mean).map(|(c, m)| c * m).sum::<f64>();
    Ok(RidgeFit { coef, intercept })
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return Err(TxcatError::explanation("surrogate system is singular"));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_linear_relation_with_small_alpha() {
        // y = 1 + 2a - b
        let rows = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![2.0, 1.0],
        ];
        let targets: Vec<f64> = rows.iter().map(|r| 1.0 + 2.0 * r[0] - r[1]).collect();
        let weights = vec![1.0; rows.len()];

        let fit = weighted_ridge(&rows, &targets, &weights, 1e-9, &[0, 1]).unwrap();
        assert!((fit.coef[0] - 2.0).abs() < 1e-6);
        assert!((fit.coef[1] + 1.0).abs() < 1e-6);
        assert!((fit.intercept - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let rows = vec![vec![0.0], vec![1.0], vec![0.0], vec![1.0]];
        let targets = vec![0.0, 1.0, 0.0, 1.0];
        let weights = vec![1.0; 4];

        let loose = weighted_ridge(&rows, &targets, &weights, 1e-9, &[0]).unwrap();
        let tight = weighted_ridge(&rows, &targets, &weights, 1.0, &[0]).unwrap();
        assert!((loose.coef[0] - 1.0).abs() < 1e-6);
        // centered gram is 1.0, so alpha = 1 halves the slope
        assert!((tight.coef[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_rejected() {
        let rows = vec![vec![1.0]];
        assert!(weighted_ridge(&rows, &[1.0], &[0.0], 1.0, &[0]).is_err());
        assert!(weighted_ridge(&rows, &[1.0, 2.0], &[1.0], 1.0, &[0]).is_err());
    }

    #[test]
    fn test_singular_system_without_penalty() {
        // constant column has zero centered variance
        let rows = vec![vec![1.0], vec![1.0]];
        assert!(weighted_ridge(&rows, &[0.0, 1.0], &[1.0, 1.0], 0.0, &[0]).is_err());
    }
}
