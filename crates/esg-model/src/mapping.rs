//! Header mapping types exchanged with the import flow.
//!
//! Field names serialize in camelCase because the import screen consumes
//! these values as JSON directly.

use serde::{Deserialize, Serialize};

/// An accepted mapping from a spreadsheet header to a target field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    /// Header text exactly as supplied by the caller.
    pub source_field: String,
    /// Canonical field of the target entity.
    pub target_field: String,
    /// Confidence score (0.0 to 1.0).
    pub confidence: f64,
}

/// One candidate target for a suggested header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossibleTarget {
    pub field: String,
    pub confidence: f64,
}

/// A header with candidate targets that need human confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingSuggestion {
    pub source_field: String,
    pub possible_targets: Vec<PossibleTarget>,
}

impl MappingSuggestion {
    /// Creates a suggestion with a single candidate.
    pub fn single(source_field: impl Into<String>, field: impl Into<String>, confidence: f64) -> Self {
        Self {
            source_field: source_field.into(),
            possible_targets: vec![PossibleTarget {
                field: field.into(),
                confidence,
            }],
        }
    }

    /// Returns the highest-confidence candidate, if any.
    #[must_use]
    pub fn best(&self) -> Option<&PossibleTarget> {
        self.possible_targets
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

/// Result of mapping a list of headers onto a target entity.
///
/// Every input header lands in exactly one of `mappings` or `unmapped`.
/// Headers listed in `suggestions` are also listed in `unmapped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub mappings: Vec<FieldMapping>,
    pub unmapped: Vec<String>,
    pub suggestions: Vec<MappingSuggestion>,
}

impl MappingResult {
    /// Returns the accepted mapping for a header.
    pub fn mapping_for(&self, source_field: &str) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.source_field == source_field)
    }

    /// Returns the suggestion entry for a header.
    pub fn suggestion_for(&self, source_field: &str) -> Option<&MappingSuggestion> {
        self.suggestions
            .iter()
            .find(|s| s.source_field == source_field)
    }

    /// Returns true if the header is in the unmapped list.
    pub fn is_unmapped(&self, source_field: &str) -> bool {
        self.unmapped.iter().any(|u| u == source_field)
    }

    /// Adds a candidate for an unmapped header.
    ///
    /// The candidate is appended to the header's existing suggestion, or a new
    /// suggestion is created. A field already listed for the header is kept
    /// as is. Returns false when the header is not unmapped or the field was
    /// already present.
    pub fn add_candidate(&mut self, source_field: &str, field: &str, confidence: f64) -> bool {
        if !self.is_unmapped(source_field) {
            return false;
        }
        if let Some(existing) = self
            .suggestions
            .iter_mut()
            .find(|s| s.source_field == source_field)
        {
            if existing.possible_targets.iter().any(|t| t.field == field) {
                return false;
            }
            existing.possible_targets.push(PossibleTarget {
                field: field.to_string(),
                confidence,
            });
            return true;
        }
        self.suggestions
            .push(MappingSuggestion::single(source_field, field, confidence));
        true
    }

    /// Number of headers covered by this result.
    #[must_use]
    pub fn header_count(&self) -> usize {
        self.mappings.len() + self.unmapped.len()
    }

    /// Returns true if the result holds no headers at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unmapped_result() -> MappingResult {
        MappingResult {
            mappings: vec![FieldMapping {
                source_field: "Quantidade".to_string(),
                target_field: "quantity".to_string(),
                confidence: 1.0,
            }],
            unmapped: vec!["Obs".to_string()],
            suggestions: vec![],
        }
    }

    #[test]
    fn add_candidate_creates_and_extends_suggestion() {
        let mut result = unmapped_result();
        assert!(result.add_candidate("Obs", "notes", 0.6));
        assert!(result.add_candidate("Obs", "description", 0.5));
        assert!(!result.add_candidate("Obs", "notes", 0.9));

        let suggestion = result.suggestion_for("Obs").expect("suggestion");
        assert_eq!(suggestion.possible_targets.len(), 2);
        assert_eq!(suggestion.best().map(|t| t.field.as_str()), Some("notes"));
    }

    #[test]
    fn add_candidate_ignores_mapped_headers() {
        let mut result = unmapped_result();
        assert!(!result.add_candidate("Quantidade", "unit", 0.9));
        assert!(result.suggestions.is_empty());
    }

    #[test]
    fn serializes_camel_case() {
        let mut result = unmapped_result();
        result.add_candidate("Obs", "notes", 0.75);
        let json = serde_json::to_value(&result).expect("serialize");
        assert_eq!(json["mappings"][0]["sourceField"], "Quantidade");
        assert_eq!(json["mappings"][0]["targetField"], "quantity");
        assert_eq!(json["suggestions"][0]["possibleTargets"][0]["field"], "notes");
        assert_eq!(json["unmapped"][0], "Obs");
    }
}
