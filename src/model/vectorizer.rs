//! Dictionary vectorizer: feature records to dense rows

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::data::{FeatureRecord, FeatureValue};

/// Maps feature records onto a fixed, sorted column space.
///
/// Numeric values keep their column name; text values become one-hot
/// columns named `name=value`. Columns unseen at fit time are ignored,
/// and missing columns encode as `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictVectorizer {
    feature_names: Vec<String>,
}

fn column_key(name: &str, value: &FeatureValue) -> String {
    match value {
        FeatureValue::Number(_) => name.to_string(),
        FeatureValue::Text(text) => format!("{name}={text}"),
    }
}

impl DictVectorizer {
    /// Learn the column space from `records`.
    #[must_use]
    pub fn fit(records: &[FeatureRecord]) -> Self {
        let names: BTreeSet<String> = records
            .iter()
            .flat_map(|r| r.iter().map(|(name, value)| column_key(name, value)))
            .collect();
        Self {
            feature_names: names.into_iter().collect(),
        }
    }

    /// Column names in output order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of output columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.feature_names.len()
    }

    /// Check if no columns were learned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feature_names.is_empty()
    }

    /// Encode records into a `rows x len()` matrix.
    #[must_use]
    pub fn transform(&self, records: &[FeatureRecord]) -> Array2<f64> {
        let mut out = Array2::zeros((records.len(), self.feature_names.len()));
        for (row, record) in records.iter().enumerate() {
            for (name, value) in record {
                let key = column_key(name, value);
                if let Ok(col) = self.feature_names.binary_search(&key) {
                    out[[row, col]] = match value {
                        FeatureValue::Number(x) => *x,
                        FeatureValue::Text(_) => 1.0,
                    };
                }
            }
        }
        out
    }
}
