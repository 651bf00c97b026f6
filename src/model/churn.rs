//! Churn classifier artifact

use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::{DictVectorizer, Model, MODEL_FILE};
use crate::data::FeatureRecord;
use crate::{Error, Result};

/// Per-column standardisation learned at fit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl Standardizer {
    /// Learn column means and population standard deviations.
    ///
    /// Constant columns get a scale of `1.0`.
    #[must_use]
    pub fn fit(x: &Array2<f64>) -> Self {
        let means: Vec<f64> = x
            .mean_axis(Axis(0))
            .map_or_else(|| vec![0.0; x.ncols()], |m| m.to_vec());
        let scales = x
            .std_axis(Axis(0), 0.0)
            .iter()
            .map(|&s| if s > f64::EPSILON { s } else { 1.0 })
            .collect();
        Self { means, scales }
    }

    /// Apply the learned transform.
    #[must_use]
    pub fn transform(&self, x: &Array2<f64>) -> Array2<f64> {
        let means = Array1::from(self.means.clone());
        let scales = Array1::from(self.scales.clone());
        (x - &means) / &scales
    }
}

/// Logistic model over vectorised, standardised features.
///
/// Serialised as JSON to `<artifacts>/model/model.json`. Deserialisation
/// goes through [`ChurnModel::new`], so a loaded artifact has the same
/// shape guarantees as a freshly fitted one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelParts")]
pub struct ChurnModel {
    vectorizer: DictVectorizer,
    standardizer: Standardizer,
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Unchecked on-disk form of [`ChurnModel`].
#[derive(Deserialize)]
struct ModelParts {
    vectorizer: DictVectorizer,
    standardizer: Standardizer,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl TryFrom<ModelParts> for ChurnModel {
    type Error = Error;

    fn try_from(parts: ModelParts) -> Result<Self> {
        Self::new(
            parts.vectorizer,
            parts.standardizer,
            parts.coefficients,
            parts.intercept,
        )
    }
}

impl ChurnModel {
    /// Assemble a model from fitted parts.
    ///
    /// # Errors
    ///
    /// Returns error if the coefficient count or the standardizer width does
    /// not match the feature space.
    pub fn new(
        vectorizer: DictVectorizer,
        standardizer: Standardizer,
        coefficients: Vec<f64>,
        intercept: f64,
    ) -> Result<Self> {
        let width = vectorizer.len();
        if coefficients.len() != width {
            return Err(Error::Model(format!(
                "Expected {width} coefficients, got {}",
                coefficients.len()
            )));
        }
        if standardizer.means.len() != width || standardizer.scales.len() != width {
            return Err(Error::Model(format!(
                "Expected standardizer over {width} columns, got {} means and {} scales",
                standardizer.means.len(),
                standardizer.scales.len()
            )));
        }
        Ok(Self {
            vectorizer,
            standardizer,
            coefficients,
            intercept,
        })
    }

    /// Feature vectorizer.
    #[must_use]
    pub const fn vectorizer(&self) -> &DictVectorizer {
        &self.vectorizer
    }

    /// Learned weights, aligned with the vectorizer's feature names.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Learned bias.
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Churn probability per record.
    #[must_use]
    pub fn predict_proba(&self, records: &[FeatureRecord]) -> Vec<f64> {
        let x = self
            .standardizer
            .transform(&self.vectorizer.transform(records));
        let w = Array1::from(self.coefficients.clone());
        x.dot(&w)
            .iter()
            .map(|&z| 1.0 / (1.0 + (-(z + self.intercept)).exp()))
            .collect()
    }

    /// Write `model.json` into `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub fn save(&self, dir: &Path) -> Result<()> {
        crate::experiment::write_json(&dir.join(MODEL_FILE), self)
    }

    /// Read `model.json` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns error if the artifact is missing or malformed.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MODEL_FILE);
        let bytes = std::fs::read(&path)
            .map_err(|e| Error::Model(format!("Cannot read {}: {e}", path.display())))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Model(format!("Malformed model artifact {}: {e}", path.display())))
    }
}

impl Model for ChurnModel {
    fn predict(&self, features: &[FeatureRecord]) -> Result<Vec<f64>> {
        Ok(self.predict_proba(features))
    }
}
