//! Completeness-based confidence scoring.

use crate::model::ConfigurableField;
use indexmap::IndexMap;
use serde_json::Value;

/// Tuning for the discovery penalty.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    /// Discovered fields up to this count are never penalised.
    pub min_discovery_limit: usize,
    /// Allowance of discovered fields per requested field.
    pub discovery_per_field: usize,
    /// Lower bound of the discovery weight.
    pub min_discovery_weight: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        ScoringPolicy {
            min_discovery_limit: 20,
            discovery_per_field: 4,
            min_discovery_weight: 0.5,
        }
    }
}

impl ScoringPolicy {
    /// Multiplier in `[min_discovery_weight, 1.0]` for `discovered` extra fields.
    pub fn discovery_weight(&self, requested: usize, discovered: usize) -> f64 {
        let limit = self
            .min_discovery_limit
            .max(self.discovery_per_field.saturating_mul(requested));
        if discovered <= limit {
            return 1.0;
        }
        let floor = self.min_discovery_weight.clamp(0.0, 1.0);
        (limit as f64 / discovered as f64).clamp(floor, 1.0)
    }
}

/// Share of required fields with a non-null value.
///
/// With no required fields every requested field counts; with no fields at
/// all the result is 1.0.
pub fn completeness(fields: &[ConfigurableField], values: &IndexMap<String, Value>) -> f64 {
    let present = |f: &&ConfigurableField| values.get(&f.name).is_some_and(|v| !v.is_null());

    let required: Vec<&ConfigurableField> = fields.iter().filter(|f| f.required).collect();
    let (total, found) = if required.is_empty() {
        (fields.len(), fields.iter().filter(present).count())
    } else {
        (required.len(), required.iter().copied().filter(present).count())
    };

    if total == 0 {
        1.0
    } else {
        found as f64 / total as f64
    }
}

/// Overall confidence score in `[0, 1]`.
pub fn confidence_score(
    fields: &[ConfigurableField],
    values: &IndexMap<String, Value>,
    discovered: usize,
    policy: &ScoringPolicy,
) -> f64 {
    let score = completeness(fields, values) * policy.discovery_weight(fields.len(), discovered);
    score.clamp(0.0, 1.0)
}
