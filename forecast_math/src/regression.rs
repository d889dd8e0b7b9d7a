//! Ridge-regularized ordinary least squares
//!
//! Columns are centered and scaled before fitting so that calendar fields
//! such as the year (large, nearly constant) do not wreck the conditioning
//! of the normal equations. Constant columns get a zero coefficient.

use crate::stats::mean;
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

const PIVOT_EPSILON: f64 = 1e-12;

/// Fitted multivariate linear regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeastSquares {
    intercept: f64,
    coefficients: Vec<f64>,
    column_means: Vec<f64>,
    column_scales: Vec<f64>,
}

impl LeastSquares {
    /// Fit `targets ≈ intercept + Σ coefficient_j · row_j` with an L2 penalty
    /// of `lambda` on the standardized coefficients.
    pub fn fit(rows: &[Vec<f64>], targets: &[f64], lambda: f64) -> Result<Self> {
        if rows.is_empty() {
            return Err(MathError::InsufficientData(
                "Need at least one row to fit a regression".to_string(),
            ));
        }
        if rows.len() != targets.len() {
            return Err(MathError::InvalidInput(format!(
                "Row count ({}) doesn't match target count ({})",
                rows.len(),
                targets.len()
            )));
        }
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(MathError::InvalidInput(format!(
                "Ridge penalty must be a non-negative finite number, got {}",
                lambda
            )));
        }

        let width = rows[0].len();
        if let Some(bad) = rows.iter().position(|row| row.len() != width) {
            return Err(MathError::InvalidInput(format!(
                "Row {} has {} columns, expected {}",
                bad,
                rows[bad].len(),
                width
            )));
        }
        if rows.iter().flatten().chain(targets).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Rows and targets must be finite".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let target_mean = mean(targets).unwrap_or(0.0);

        let mut column_means = Vec::with_capacity(width);
        let mut column_scales = Vec::with_capacity(width);
        for j in 0..width {
            let column: Vec<f64> = rows.iter().map(|row| row[j]).collect();
            let m = mean(&column).unwrap_or(0.0);
            let variance = column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            column_means.push(m);
            column_scales.push(variance.sqrt());
        }

        // Only columns that actually vary take part in the solve.
        let active: Vec<usize> = (0..width)
            .filter(|&j| column_scales[j] > PIVOT_EPSILON)
            .collect();
        let k = active.len();

        let standardized = |row: &[f64], j: usize| (row[j] - column_means[j]) / column_scales[j];

        let mut gram = vec![vec![0.0; k]; k];
        let mut moment = vec![0.0; k];
        for (row, &target) in rows.iter().zip(targets) {
            let centered_target = target - target_mean;
            for (a, &ja) in active.iter().enumerate() {
                let za = standardized(row, ja);
                moment[a] += za * centered_target;
                for (b, &jb) in active.iter().enumerate().skip(a) {
                    gram[a][b] += za * standardized(row, jb);
                }
            }
        }
        for a in 0..k {
            for b in 0..a {
                gram[a][b] = gram[b][a];
            }
            gram[a][a] += lambda * n;
        }

        let solution = solve(gram, moment)?;

        let mut coefficients = vec![0.0; width];
        for (a, &j) in active.iter().enumerate() {
            coefficients[j] = solution[a];
        }

        Ok(Self {
            intercept: target_mean,
            coefficients,
            column_means,
            column_scales,
        })
    }

    /// Predict the target for one row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Row has {} columns, model expects {}",
                row.len(),
                self.coefficients.len()
            )));
        }

        let mut value = self.intercept;
        for (j, &x) in row.iter().enumerate() {
            if self.coefficients[j] != 0.0 {
                value += self.coefficients[j] * (x - self.column_means[j]) / self.column_scales[j];
            }
        }
        Ok(value)
    }

    /// Number of input columns
    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    /// Intercept in target units (the training target mean)
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coefficients on the standardized columns
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))
            .unwrap_or(col);
        if matrix[pivot_row][col].abs() < PIVOT_EPSILON {
            return Err(MathError::CalculationError(
                "Normal equations are singular; add a ridge penalty or drop collinear features"
                    .to_string(),
            ));
        }
        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                matrix[row][c] -= factor * matrix[col][c];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|c| matrix[row][c] * solution[c]).sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Ok(solution)
}
