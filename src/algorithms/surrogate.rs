// src/algorithms/surrogate.rs

use crate::core::{
    ClassLabel, ExplainError, ExplainerConfig, PerturbationPopulation, ProbabilityVector, Result,
};
use ndarray::{Array1, Array2, Axis};

/// Smallest pivot magnitude accepted while solving the normal equations.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Coefficients of a fitted local linear surrogate, one per original token.
#[derive(Debug, Clone, PartialEq)]
pub struct SurrogateWeights {
    pub tokens: Vec<String>,
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    /// Weighted R² of the surrogate on the population it was fit on.
    pub score: f64,
    /// Surrogate output for the unperturbed text (every token present).
    pub local_prediction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    NoSamples,
    /// Every perturbation carries the same mask; nothing varies to regress on.
    IdenticalMasks,
    ZeroKernelWeight,
    /// The normal equations have no unique solution.
    Singular,
    NonFinite,
}

/// Either usable weights or the explicit all-zero fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum SurrogateFit {
    Fitted(SurrogateWeights),
    Degenerate {
        tokens: Vec<String>,
        reason: DegenerateReason,
    },
}

impl SurrogateFit {
    pub fn tokens(&self) -> &[String] {
        match self {
            SurrogateFit::Fitted(w) => &w.tokens,
            SurrogateFit::Degenerate { tokens, .. } => tokens,
        }
    }

    /// Per-token weights; all zero for a degenerate fit.
    pub fn coefficients(&self) -> Array1<f64> {
        match self {
            SurrogateFit::Fitted(w) => w.coefficients.clone(),
            SurrogateFit::Degenerate { tokens, .. } => Array1::zeros(tokens.len()),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, SurrogateFit::Degenerate { .. })
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            SurrogateFit::Fitted(w) => Some(w.score),
            SurrogateFit::Degenerate { .. } => None,
        }
    }
}

/// Weighted ridge regression of a class probability on perturbation masks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSurrogate {
    pub kernel_width: f64,
    pub ridge_alpha: f64,
}

impl Default for LocalSurrogate {
    fn default() -> Self {
        Self::from_config(&ExplainerConfig::default())
    }
}

impl LocalSurrogate {
    pub fn from_config(config: &ExplainerConfig) -> Self {
        LocalSurrogate {
            kernel_width: config.kernel_width,
            ridge_alpha: config.ridge_alpha,
        }
    }

    /// Proximity of a mask to the original text.
    ///
    /// Distance is `100 * (1 - cos(mask, ones))`, which for a binary mask with
    /// `retained` of `total` tokens reduces to `100 * (1 - sqrt(retained / total))`.
    /// An all-removed mask sits at distance 100.
    pub fn kernel_weight(&self, retained: usize, total: usize) -> f64 {
        let similarity = if retained == 0 || total == 0 {
            0.0
        } else {
            (retained as f64 / total as f64).sqrt()
        };
        let distance = (1.0 - similarity) * 100.0;
        (-(distance * distance) / (self.kernel_width * self.kernel_width))
            .exp()
            .sqrt()
    }

    /// Fits the surrogate for `target` over `population`.
    ///
    /// `oracle_outputs[i]` must be the classifier output for perturbation `i`.
    /// Numerical trouble never becomes an error: it yields [`SurrogateFit::Degenerate`].
    pub fn fit(
        &self,
        population: &PerturbationPopulation,
        oracle_outputs: &[ProbabilityVector],
        target: &ClassLabel,
    ) -> Result<SurrogateFit> {
        let n_samples = population.len();
        if oracle_outputs.len() != n_samples {
            return Err(ExplainError::ShapeMismatch {
                context: "surrogate responses",
                expected: n_samples,
                found: oracle_outputs.len(),
            });
        }
        let tokens = population.original.tokens().to_vec();
        let n_features = tokens.len();

        let response: Vec<f64> = oracle_outputs
            .iter()
            .map(|p| {
                p.get(target.index).ok_or(ExplainError::ShapeMismatch {
                    context: "probability vector",
                    expected: target.index + 1,
                    found: p.len(),
                })
            })
            .collect::<Result<_>>()?;
        let y = Array1::from_vec(response);
        let x = population.mask_matrix()?;

        let degenerate = |reason: DegenerateReason| -> Result<SurrogateFit> {
            log::warn!(
                "surrogate fit for '{}' is degenerate ({:?}); using zero weights",
                target.name,
                reason
            );
            Ok(SurrogateFit::Degenerate {
                tokens: tokens.clone(),
                reason,
            })
        };

        if n_samples == 0 {
            return degenerate(DegenerateReason::NoSamples);
        }
        let first = x.row(0);
        if x.outer_iter().all(|row| row == first) {
            return degenerate(DegenerateReason::IdenticalMasks);
        }

        let weights: Array1<f64> = population
            .perturbations
            .iter()
            .map(|p| self.kernel_weight(p.retained(), n_features))
            .collect();
        let total_weight = weights.sum();
        if !(total_weight > f64::EPSILON) {
            return degenerate(DegenerateReason::ZeroKernelWeight);
        }

        // Center on the weighted means so the intercept stays unpenalized.
        let x_mean = x.t().dot(&weights) / total_weight;
        let y_mean = y.dot(&weights) / total_weight;
        let sqrt_w = weights.mapv(f64::sqrt);
        let x_w = (&x - &x_mean) * &sqrt_w.view().insert_axis(Axis(1));
        let y_w = (&y - y_mean) * &sqrt_w;

        let coefficients = match solve_ridge(&x_w, &y_w, self.ridge_alpha) {
            Some(c) => c,
            None => return degenerate(DegenerateReason::Singular),
        };
        let intercept = y_mean - x_mean.dot(&coefficients);
        if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
            return degenerate(DegenerateReason::NonFinite);
        }

        let predicted = x.dot(&coefficients) + intercept;
        let ss_res = (&y - &predicted).mapv(|r| r * r).dot(&weights);
        let ss_tot = (&y - y_mean).mapv(|r| r * r).dot(&weights);
        let score = if ss_tot > f64::EPSILON {
            1.0 - ss_res / ss_tot
        } else if ss_res > f64::EPSILON {
            0.0
        } else {
            1.0
        };
        let local_prediction = intercept + coefficients.sum();

        log::debug!(
            "surrogate for '{}': {} samples, {} features, intercept {:.4}, score {:.4}",
            target.name,
            n_samples,
            n_features,
            intercept,
            score
        );

        Ok(SurrogateFit::Fitted(SurrogateWeights {
            tokens,
            coefficients,
            intercept,
            score,
            local_prediction,
        }))
    }
}

/// Solves `min |y_w - x_w b|² + alpha |b|²` on pre-weighted, centered data.
#[cfg(not(feature = "linalg"))]
fn solve_ridge(x_w: &Array2<f64>, y_w: &Array1<f64>, alpha: f64) -> Option<Array1<f64>> {
    let n_features = x_w.ncols();
    let gram = x_w.t().dot(x_w) + Array2::<f64>::eye(n_features) * alpha;
    let rhs = x_w.t().dot(y_w);
    gaussian_solve(gram, rhs)
}

#[cfg(feature = "linalg")]
fn solve_ridge(x_w: &Array2<f64>, y_w: &Array1<f64>, alpha: f64) -> Option<Array1<f64>> {
    // Using SVD based least squares for more robustness; the penalty enters as
    // extra rows sqrt(alpha) * I with zero targets.
    use ndarray_linalg::LeastSquaresSvd;

    let n_features = x_w.ncols();
    let penalty = Array2::<f64>::eye(n_features) * alpha.sqrt();
    let design = ndarray::concatenate(Axis(0), &[x_w.view(), penalty.view()]).ok()?;
    let target = ndarray::concatenate(Axis(0), &[y_w.view(), Array1::zeros(n_features).view()]).ok()?;
    let result = design.least_squares(&target).ok()?;
    if result.rank < n_features as i32 {
        return None;
    }
    Some(result.solution)
}

/// Gaussian elimination with partial pivoting. `None` when a pivot vanishes.
#[cfg_attr(feature = "linalg", allow(dead_code))]
fn gaussian_solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if a[[row, col]].abs() > a[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }
        if !(a[[pivot_row, col]].abs() >= PIVOT_TOLERANCE) {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                a.swap([col, k], [pivot_row, k]);
            }
            b.swap(col, pivot_row);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[[col, k]];
                a[[row, k]] -= delta;
            }
            let delta = factor * b[col];
            b[row] -= delta;
        }
    }

    let mut solution = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            acc -= a[[row, k]] * solution[k];
        }
        solution[row] = acc / a[[row, row]];
    }
    Some(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Perturbation, Text};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn population(text: &str, masks: &[Vec<bool>]) -> PerturbationPopulation {
        let original = Text::new(text).unwrap();
        let perturbations = masks
            .iter()
            .map(|m| Perturbation {
                mask: m.clone(),
                text: original.masked(m),
            })
            .collect();
        PerturbationPopulation {
            original,
            perturbations,
        }
    }

    fn all_masks(width: usize) -> Vec<Vec<bool>> {
        (0..1usize << width)
            .map(|bits| (0..width).map(|j| (bits >> j) & 1 == 1).collect())
            .collect()
    }

    /// Two-class outputs where class 1 follows `intercept + coefs · mask`.
    fn linear_outputs(masks: &[Vec<bool>], intercept: f64, coefs: &[f64]) -> Vec<ProbabilityVector> {
        masks
            .iter()
            .map(|m| {
                let p: f64 = intercept
                    + m.iter()
                        .zip(coefs)
                        .map(|(&keep, c)| if keep { *c } else { 0.0 })
                        .sum::<f64>();
                ProbabilityVector::new(vec![1.0 - p, p])
            })
            .collect()
    }

    fn label(index: usize) -> ClassLabel {
        ClassLabel {
            index,
            name: format!("class{}", index),
        }
    }

    #[test]
    fn recovers_exact_linear_response_without_penalty() -> Result<()> {
        let masks = all_masks(3);
        let pop = population("not very good", &masks);
        let outputs = linear_outputs(&masks, 0.2, &[-0.15, 0.2, 0.6]);
        let surrogate = LocalSurrogate { kernel_width: 25.0, ridge_alpha: 0.0 };

        let fit = surrogate.fit(&pop, &outputs, &label(1))?;
        let weights = match fit {
            SurrogateFit::Fitted(w) => w,
            other => panic!("expected a fitted surrogate, got {:?}", other),
        };
        for (got, want) in weights.coefficients.iter().zip([-0.15, 0.2, 0.6]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(weights.intercept, 0.2, epsilon = 1e-9);
        assert_abs_diff_eq!(weights.score, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(weights.local_prediction, 0.85, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn ridge_shrinks_but_keeps_signs() -> Result<()> {
        let masks = all_masks(3);
        let pop = population("not very good", &masks);
        let outputs = linear_outputs(&masks, 0.2, &[-0.15, 0.2, 0.6]);

        let fit = LocalSurrogate::default().fit(&pop, &outputs, &label(1))?;
        let coefs = fit.coefficients();
        assert!(!fit.is_degenerate());
        assert!(coefs[0] < 0.0 && coefs[0] > -0.15);
        assert!(coefs[1] > 0.0 && coefs[1] < 0.2);
        assert!(coefs[2] > 0.0 && coefs[2] < 0.6);
        assert!(coefs[2].abs() > coefs[0].abs());
        Ok(())
    }

    #[test]
    fn identical_masks_fall_back_to_zero() -> Result<()> {
        let masks = vec![vec![true, false, true]; 4];
        let pop = population("a b c", &masks);
        let outputs = linear_outputs(&masks, 0.1, &[0.3, 0.3, 0.3]);

        let fit = LocalSurrogate::default().fit(&pop, &outputs, &label(1))?;
        assert_eq!(
            fit,
            SurrogateFit::Degenerate {
                tokens: vec!["a".into(), "b".into(), "c".into()],
                reason: DegenerateReason::IdenticalMasks,
            }
        );
        assert_eq!(fit.coefficients(), Array1::<f64>::zeros(3));
        assert_eq!(fit.score(), None);
        Ok(())
    }

    #[test]
    fn single_sample_is_degenerate() -> Result<()> {
        let masks = vec![vec![true, true]];
        let pop = population("so good", &masks);
        let outputs = linear_outputs(&masks, 0.0, &[0.5, 0.5]);
        let fit = LocalSurrogate::default().fit(&pop, &outputs, &label(1))?;
        assert!(fit.is_degenerate());
        Ok(())
    }

    #[test]
    fn constant_column_without_penalty_is_singular() -> Result<()> {
        // Token "b" is present in every row.
        let masks = vec![
            vec![true, true, false],
            vec![false, true, true],
            vec![true, true, true],
            vec![false, true, false],
        ];
        let pop = population("a b c", &masks);
        let outputs = linear_outputs(&masks, 0.1, &[0.2, 0.2, 0.2]);
        let surrogate = LocalSurrogate { kernel_width: 25.0, ridge_alpha: 0.0 };
        let fit = surrogate.fit(&pop, &outputs, &label(1))?;
        assert!(matches!(
            fit,
            SurrogateFit::Degenerate { reason: DegenerateReason::Singular, .. }
        ));
        Ok(())
    }

    #[test]
    fn output_count_must_match_population() {
        let masks = all_masks(2);
        let pop = population("a b", &masks);
        let outputs = linear_outputs(&masks[..2], 0.0, &[0.1, 0.1]);
        let err = LocalSurrogate::default().fit(&pop, &outputs, &label(1)).unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch { expected: 4, found: 2, .. }));
    }

    #[test]
    fn target_index_outside_vector_is_shape_mismatch() {
        let masks = all_masks(2);
        let pop = population("a b", &masks);
        let outputs = linear_outputs(&masks, 0.0, &[0.1, 0.1]);
        let err = LocalSurrogate::default().fit(&pop, &outputs, &label(4)).unwrap_err();
        assert!(matches!(err, ExplainError::ShapeMismatch { .. }));
    }

    #[test]
    fn kernel_prefers_masks_close_to_original() {
        let surrogate = LocalSurrogate::default();
        assert_abs_diff_eq!(surrogate.kernel_weight(4, 4), 1.0);
        assert_abs_diff_eq!(surrogate.kernel_weight(0, 4), (-8.0f64).exp(), epsilon = 1e-12);
        assert!(surrogate.kernel_weight(3, 4) > surrogate.kernel_weight(1, 4));
    }

    #[test]
    fn gaussian_solve_handles_row_swaps() {
        let a = array![[0.0, 2.0], [3.0, 1.0]];
        let b = array![4.0, 5.0];
        let x = gaussian_solve(a, b).unwrap();
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], 2.0, epsilon = 1e-12);
        assert!(gaussian_solve(array![[1.0, 2.0], [2.0, 4.0]], array![1.0, 2.0]).is_none());
    }
}
