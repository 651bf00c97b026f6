//! Promotion decision

use serde::Serialize;

use crate::data::LabeledData;
use crate::metrics::ModelMetrics;
use crate::model::Model;
use crate::Result;

/// Metrics of both models and whether the challenger wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PromotionVerdict {
    /// Incumbent metrics
    pub production: ModelMetrics,
    /// Candidate metrics
    pub challenger: ModelMetrics,
    /// Challenger strictly better on both F1 and ROC AUC
    #[serde(skip)]
    pub promote: bool,
}

impl PromotionVerdict {
    /// Apply the gate to two metric sets.
    #[must_use]
    pub fn decide(production: ModelMetrics, challenger: ModelMetrics) -> Self {
        Self {
            production,
            challenger,
            promote: challenger.dominates(&production),
        }
    }
}

/// Score both models on the same validation data and apply the gate.
///
/// # Errors
///
/// Returns error if either model fails to predict or the validation labels
/// contain a single class.
pub fn compare_models(
    production: &dyn Model,
    challenger: &dyn Model,
    validation: &LabeledData,
) -> Result<PromotionVerdict> {
    let production_scores = production.predict(&validation.features)?;
    let challenger_scores = challenger.predict(&validation.features)?;

    let verdict = PromotionVerdict::decide(
        ModelMetrics::evaluate(&validation.labels, &production_scores)?,
        ModelMetrics::evaluate(&validation.labels, &challenger_scores)?,
    );

    tracing::info!(
        production_f1 = verdict.production.f1,
        production_roc_auc = verdict.production.roc_auc,
        challenger_f1 = verdict.challenger.f1,
        challenger_roc_auc = verdict.challenger.roc_auc,
        promote = verdict.promote,
        "Compared models"
    );
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureRecord;

    /// Returns fixed scores regardless of input.
    struct Fixed(Vec<f64>);

    impl Model for Fixed {
        fn predict(&self, _features: &[FeatureRecord]) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    fn validation() -> LabeledData {
        LabeledData {
            features: vec![FeatureRecord::new(); 4],
            labels: vec![false, false, true, true],
        }
    }

    #[test]
    fn test_gate_requires_both_metrics() {
        let prod = ModelMetrics { f1: 0.70, roc_auc: 0.80 };
        let challenger = ModelMetrics { f1: 0.75, roc_auc: 0.78 };
        assert!(!PromotionVerdict::decide(prod, challenger).promote);
    }

    #[test]
    fn test_better_challenger_promoted() {
        let production = Fixed(vec![0.6, 0.4, 0.3, 0.7]);
        let challenger = Fixed(vec![0.1, 0.2, 0.8, 0.9]);
        let verdict = compare_models(&production, &challenger, &validation()).unwrap();
        assert!(verdict.promote);
        assert!((verdict.challenger.roc_auc - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_models_not_promoted() {
        let model = Fixed(vec![0.1, 0.2, 0.8, 0.9]);
        let verdict = compare_models(&model, &model, &validation()).unwrap();
        assert!(!verdict.promote);
    }

    #[test]
    fn test_single_class_validation_errors() {
        let model = Fixed(vec![0.1, 0.9]);
        let data = LabeledData {
            features: vec![FeatureRecord::new(); 2],
            labels: vec![true, true],
        };
        assert!(compare_models(&model, &model, &data).is_err());
    }

    #[test]
    fn test_verdict_serializes_metric_sets() {
        let verdict = PromotionVerdict::decide(
            ModelMetrics { f1: 0.80, roc_auc: 0.79 },
            ModelMetrics { f1: 0.85, roc_auc: 0.82 },
        );
        let json = serde_json::to_value(verdict).unwrap();
        assert_eq!(json["production"]["f1"], 0.80);
        assert_eq!(json["challenger"]["roc_auc"], 0.82);
        assert!(json.get("promote").is_none());
    }
}
