//! Language-model fallback for headers the heuristics could not place.
//!
//! The engine only talks to the [`FieldResolver`] trait. Production wiring
//! injects [`ChatCompletionResolver`]; tests inject deterministic stubs.

mod chat;
mod config;

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ResolveError;

pub use chat::ChatCompletionResolver;
pub use config::{API_KEY_VAR, ResolverConfig};

/// Input for one batched fallback call.
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Headers left unmapped by the heuristics, as supplied by the caller.
    pub unmapped: &'a [String],
    /// Candidate fields of the target entity.
    pub target_fields: &'a [String],
    /// Target entity name.
    pub entity_type: &'a str,
    /// Tenant the import belongs to; prompt context only.
    pub company_id: &'a str,
}

/// A header → field pairing proposed by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub source_field: String,
    pub target_field: String,
    pub confidence: f64,
    pub transformation: Option<String>,
}

/// Port for resolving unmapped headers.
#[async_trait]
pub trait FieldResolver: Send + Sync {
    /// Proposes target fields for unmapped headers in a single request.
    async fn resolve_unmapped(
        &self,
        request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedField>, ResolveError>;
}

pub(crate) const SYSTEM_PROMPT: &str = "You map spreadsheet column headers to database fields \
for an ESG data import. Answer with strict JSON only, no prose.";

/// Builds the user prompt for a fallback request.
pub fn build_prompt(request: &ResolveRequest<'_>) -> String {
    let headers = request
        .unmapped
        .iter()
        .map(|h| format!("- \"{h}\""))
        .collect::<Vec<_>>()
        .join("\n");
    let fields = request
        .target_fields
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Company {company} is importing a spreadsheet into the "{entity}" table.
The following column headers could not be matched automatically:
{headers}

Candidate target fields:
{fields}

For every header, pick the single best target field or null when none fits.
Headers may be in Portuguese or English and may carry units in parentheses.
Return JSON in exactly this format:
{{
  "mappings": [
    {{"sourceField": "<header>", "targetField": "<field or null>", "confidence": 0.0, "transformation": "<optional>"}}
  ]
}}"#,
        company = request.company_id,
        entity = request.entity_type,
    )
}

/// Removes a surrounding markdown code fence, if present.
///
/// Text before the opening fence and after the closing fence is dropped, as
/// is the info string (`json`) after the opening fence, whether or not the
/// fenced body starts on a new line.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[start + 3..];
    let info_len = after_open
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '+')))
        .unwrap_or(after_open.len());
    let body = &after_open[info_len..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    mappings: Vec<CompletionEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionEntry {
    source_field: String,
    target_field: Option<String>,
    confidence: f64,
    #[serde(default)]
    transformation: Option<String>,
}

/// Parses completion text into validated pairings.
///
/// The whole reply is rejected if it does not match the expected shape.
/// Individual entries are dropped when the target is null, the target is not
/// a candidate field, or the header was not part of the request. Confidence
/// is clamped into `[0, 1]`.
pub fn parse_completion(
    text: &str,
    request: &ResolveRequest<'_>,
) -> Result<Vec<ResolvedField>, ResolveError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(ResolveError::EmptyCompletion);
    }
    let payload: CompletionPayload = serde_json::from_str(body)?;

    let headers: BTreeSet<&str> = request.unmapped.iter().map(String::as_str).collect();
    let fields: BTreeSet<&str> = request.target_fields.iter().map(String::as_str).collect();

    let mut resolved = Vec::new();
    for entry in payload.mappings {
        let Some(target_field) = entry.target_field else {
            continue;
        };
        if !headers.contains(entry.source_field.as_str()) {
            tracing::debug!(source = %entry.source_field, "dropping resolver entry for unknown header");
            continue;
        }
        if !fields.contains(target_field.as_str()) {
            tracing::debug!(target = %target_field, "dropping resolver entry for unknown field");
            continue;
        }
        resolved.push(ResolvedField {
            source_field: entry.source_field,
            target_field,
            confidence: entry.confidence.clamp(0.0, 1.0),
            transformation: entry.transformation.filter(|t| !t.trim().is_empty()),
        });
    }
    Ok(resolved)
}
