//! Mapping engine implementation.

use std::fmt;
use std::sync::Arc;

use esg_model::{FieldMapping, MapRequest, MappingResult, MappingSuggestion};

use crate::dictionary::AliasDictionary;
use crate::resolver::{FieldResolver, ResolveRequest};
use crate::score::{PatternScore, score_detailed};
use crate::utils::normalize_text;

/// Tolerance for threshold comparisons.
const THRESHOLD_EPSILON: f64 = 1e-9;

/// Confidence level categories for mapping quality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    /// At or above the suggestion threshold, below the mapping threshold.
    /// Presented to a person for confirmation.
    Medium,
    /// At or above the mapping threshold. Accepted without review.
    High,
}

impl ConfidenceLevel {
    /// Returns a human-readable description of the confidence level.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::High => "high confidence - mapped",
            Self::Medium => "medium confidence - needs review",
        }
    }
}

/// Thresholds for classifying a header's best score.
///
/// Both bounds are inclusive:
/// - `score >= high`: [`ConfidenceLevel::High`], goes to `mappings`
/// - `medium <= score < high`: [`ConfidenceLevel::Medium`], goes to
///   `suggestions` and `unmapped`
/// - below `medium`: `unmapped` only
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceThresholds {
    /// Minimum confidence for an accepted mapping (default: 0.80).
    pub high: f64,
    /// Minimum confidence for a suggestion (default: 0.70).
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.80,
            medium: 0.70,
        }
    }
}

impl ConfidenceThresholds {
    /// Creates thresholds, keeping `medium <= high`.
    ///
    /// Values are clamped into `[0, 1]`; a non-finite value falls back to
    /// its default.
    #[must_use]
    pub fn new(high: f64, medium: f64) -> Self {
        let defaults = Self::default();
        let high = finite_or(high, defaults.high).clamp(0.0, 1.0);
        Self {
            high,
            medium: finite_or(medium, defaults.medium).clamp(0.0, high),
        }
    }

    /// Categorizes a confidence score.
    ///
    /// Returns `None` if the score is below the medium threshold.
    #[must_use]
    pub fn categorize(&self, confidence: f64) -> Option<ConfidenceLevel> {
        if confidence + THRESHOLD_EPSILON >= self.high {
            Some(ConfidenceLevel::High)
        } else if confidence + THRESHOLD_EPSILON >= self.medium {
            Some(ConfidenceLevel::Medium)
        } else {
            None
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Best target field for one header.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMatch {
    pub field: String,
    pub score: PatternScore,
}

impl FieldMatch {
    pub fn confidence(&self) -> f64 {
        self.score.confidence
    }
}

/// Engine for mapping spreadsheet headers to entity fields.
///
/// The heuristic pass ([`MappingEngine::heuristic_map`]) is synchronous and
/// deterministic. [`MappingEngine::auto_map`] adds a single batched call to
/// the configured [`FieldResolver`] for whatever stayed unmapped.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use esg_map::{AliasDictionary, MappingEngine};
///
/// let engine = MappingEngine::new(Arc::new(AliasDictionary::builtin()?));
/// let result = engine.heuristic_map(&["Quantidade (kg)".to_string()], "waste_logs");
/// ```
#[derive(Clone)]
pub struct MappingEngine {
    dictionary: Arc<AliasDictionary>,
    thresholds: ConfidenceThresholds,
    resolver: Option<Arc<dyn FieldResolver>>,
}

impl fmt::Debug for MappingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingEngine")
            .field("entities", &self.dictionary.len())
            .field("thresholds", &self.thresholds)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl MappingEngine {
    /// Creates an engine over a dictionary with default thresholds and no
    /// fallback resolver.
    pub fn new(dictionary: Arc<AliasDictionary>) -> Self {
        Self {
            dictionary,
            thresholds: ConfidenceThresholds::default(),
            resolver: None,
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn FieldResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Returns a copy of this engine over another dictionary.
    ///
    /// Thresholds and resolver are shared.
    #[must_use]
    pub fn with_dictionary(&self, dictionary: Arc<AliasDictionary>) -> Self {
        Self {
            dictionary,
            thresholds: self.thresholds,
            resolver: self.resolver.clone(),
        }
    }

    pub fn dictionary(&self) -> &AliasDictionary {
        &self.dictionary
    }

    pub fn thresholds(&self) -> ConfidenceThresholds {
        self.thresholds
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Finds the best field of `entity` for a raw header.
    ///
    /// Ties keep the first field in dictionary order. Returns `None` when the
    /// entity is unknown or nothing scored above zero.
    pub fn best_match(&self, header: &str, entity: &str) -> Option<FieldMatch> {
        let fields = self.dictionary.entity(entity)?;
        let normalized = normalize_text(header);
        let mut best: Option<FieldMatch> = None;
        for (field, aliases) in fields {
            let Some(score) = score_detailed(&normalized, aliases) else {
                continue;
            };
            if score.confidence > best.as_ref().map_or(0.0, FieldMatch::confidence) {
                let exact = score.confidence >= 1.0;
                best = Some(FieldMatch {
                    field: field.clone(),
                    score,
                });
                if exact {
                    break;
                }
            }
        }
        best
    }

    /// Classifies every header using the alias heuristics only.
    ///
    /// Unknown entities are not an error: every header ends up unmapped.
    pub fn heuristic_map(&self, headers: &[String], entity: &str) -> MappingResult {
        let mut result = MappingResult::default();
        for header in headers {
            let best = self.best_match(header, entity);
            let level = best
                .as_ref()
                .and_then(|m| self.thresholds.categorize(m.confidence()));
            match (best, level) {
                (Some(found), Some(ConfidenceLevel::High)) => {
                    tracing::trace!(header = %header, field = %found.field, reason = %found.score.explain(), "mapped");
                    result.mappings.push(FieldMapping {
                        source_field: header.clone(),
                        target_field: found.field,
                        confidence: found.score.confidence,
                    });
                }
                (Some(found), Some(ConfidenceLevel::Medium)) => {
                    tracing::trace!(header = %header, field = %found.field, reason = %found.score.explain(), "suggested");
                    result.suggestions.push(MappingSuggestion::single(
                        header.clone(),
                        found.field,
                        found.score.confidence,
                    ));
                    result.unmapped.push(header.clone());
                }
                _ => {
                    tracing::trace!(header = %header, "unmapped");
                    result.unmapped.push(header.clone());
                }
            }
        }
        tracing::debug!(
            entity,
            headers = headers.len(),
            mapped = result.mappings.len(),
            suggested = result.suggestions.len(),
            unmapped = result.unmapped.len(),
            "heuristic mapping finished"
        );
        result
    }

    /// Maps headers with the heuristics, then asks the resolver about the
    /// headers that stayed unmapped.
    ///
    /// Resolver failures are logged and otherwise ignored; the affected
    /// headers stay unmapped. `company_id` is only passed to the resolver.
    pub async fn auto_map(
        &self,
        headers: &[String],
        entity: &str,
        company_id: &str,
    ) -> MappingResult {
        let mut result = self.heuristic_map(headers, entity);
        let Some(resolver) = &self.resolver else {
            return result;
        };
        let target_fields = self.dictionary.field_names(entity);
        if result.unmapped.is_empty() || target_fields.is_empty() {
            return result;
        }

        let unmapped = result.unmapped.clone();
        let request = ResolveRequest {
            unmapped: &unmapped,
            target_fields: &target_fields,
            entity_type: entity,
            company_id,
        };
        match resolver.resolve_unmapped(&request).await {
            Ok(resolved) => {
                let mut added = 0usize;
                for field in resolved {
                    if result.add_candidate(&field.source_field, &field.target_field, field.confidence)
                    {
                        added += 1;
                    }
                }
                tracing::debug!(entity, asked = unmapped.len(), added, "resolver suggestions merged");
            }
            Err(error) => {
                tracing::warn!(entity, unmapped = unmapped.len(), %error, "field resolver failed");
            }
        }
        result
    }

    /// Runs [`MappingEngine::auto_map`] for a request.
    pub async fn map_request(&self, request: &MapRequest) -> MappingResult {
        self.auto_map(
            &request.source_headers,
            &request.target_entity,
            &request.company_id,
        )
        .await
    }
}
