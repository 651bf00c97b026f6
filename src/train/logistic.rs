//! L2-regularised logistic regression via linfa

use linfa::prelude::*;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, Array2};

use crate::config::HyperParameters;
use crate::{Error, Result};

/// Fitted weights and bias, oriented so that the score is `P(churn)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFit {
    /// One weight per input column
    pub coefficients: Array1<f64>,
    /// Bias term
    pub intercept: f64,
}

/// Fit a binary logistic regression on `x` against `y`.
///
/// # Errors
///
/// Returns [`Error::Training`] if the shapes disagree, a class is missing, or
/// the optimizer fails.
pub fn fit_logistic(x: &Array2<f64>, y: &[bool], params: &HyperParameters) -> Result<LogisticFit> {
    if x.nrows() != y.len() {
        return Err(Error::Training(format!(
            "Feature/label mismatch: {} rows, {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::Training("Features cannot be empty".to_string()));
    }

    let dataset = Dataset::new(x.clone(), Array1::from(y.to_vec()));
    let fitted = LogisticRegression::new()
        .alpha(params.alpha)
        .max_iterations(params.max_iterations)
        .fit(&dataset)
        .map_err(|e| Error::Training(format!("Logistic regression training failed: {e}")))?;

    let mut coefficients = fitted.params().clone();
    let mut intercept = fitted.intercept();

    // linfa picks its own positive class; flip so the sigmoid scores `true`.
    let labels: Array1<bool> = fitted.predict(x);
    let probabilities = fitted.predict_probabilities(x);
    if labels[0] != (probabilities[0] >= 0.5) {
        coefficients.mapv_inplace(|w| -w);
        intercept = -intercept;
    }

    Ok(LogisticFit {
        coefficients,
        intercept,
    })
}
