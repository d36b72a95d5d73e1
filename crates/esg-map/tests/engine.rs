use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use esg_map::{
    AliasDictionary, ConfidenceThresholds, FieldResolver, MappingEngine, ResolveError,
    ResolveRequest, ResolvedField,
};
use esg_model::{MapRequest, MappingResult};
use proptest::prelude::*;

fn builtin_engine() -> MappingEngine {
    MappingEngine::new(Arc::new(AliasDictionary::builtin().expect("builtin aliases")))
}

fn synthetic_engine() -> MappingEngine {
    let dictionary = AliasDictionary::from_json(
        r#"{
            "synthetic": {"code": ["abcde"]},
            "long_only": {"label": ["abcdefghij"]}
        }"#,
    )
    .expect("dictionary");
    MappingEngine::new(Arc::new(dictionary))
}

fn headers(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn assert_coverage(input: &[String], result: &MappingResult) {
    assert_eq!(result.mappings.len() + result.unmapped.len(), input.len());
    for header in input {
        let mapped = result.mappings.iter().filter(|m| &m.source_field == header).count();
        let unmapped = result.unmapped.iter().filter(|u| *u == header).count();
        let expected = input.iter().filter(|h| *h == header).count();
        assert_eq!(mapped + unmapped, expected, "header {header:?}");
    }
    for suggestion in &result.suggestions {
        assert!(result.is_unmapped(&suggestion.source_field));
    }
}

struct StubResolver {
    reply: Vec<ResolvedField>,
    calls: AtomicUsize,
}

impl StubResolver {
    fn new(reply: Vec<ResolvedField>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl FieldResolver for StubResolver {
    async fn resolve_unmapped(
        &self,
        _request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedField>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

struct FailingResolver;

#[async_trait]
impl FieldResolver for FailingResolver {
    async fn resolve_unmapped(
        &self,
        _request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedField>, ResolveError> {
        Err(ResolveError::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

fn resolved(source: &str, target: &str, confidence: f64) -> ResolvedField {
    ResolvedField {
        source_field: source.to_string(),
        target_field: target.to_string(),
        confidence,
        transformation: None,
    }
}

#[test]
fn waste_log_scenario() {
    let engine = builtin_engine();
    let input = headers(&["Tipo de Resíduo", "Quantidade (kg)", "Data Coleta", "XYZ123"]);
    let result = engine.heuristic_map(&input, "waste_logs");

    for (header, field) in [
        ("Tipo de Resíduo", "waste_description"),
        ("Quantidade (kg)", "quantity"),
        ("Data Coleta", "collection_date"),
    ] {
        let mapping = result.mapping_for(header).expect("mapped header");
        assert_eq!(mapping.target_field, field);
        assert!(mapping.confidence >= 0.8);
    }
    assert_eq!(result.unmapped, vec!["XYZ123".to_string()]);
    assert!(result.suggestions.is_empty());
    assert_coverage(&input, &result);
}

#[test]
fn supplier_headers_map() {
    let engine = builtin_engine();
    let input = headers(&["Razão Social", "CNPJ", "E-mail", "UF"]);
    let result = engine.heuristic_map(&input, "suppliers");
    let targets: Vec<&str> = result
        .mappings
        .iter()
        .map(|m| m.target_field.as_str())
        .collect();
    assert_eq!(targets, vec!["name", "cnpj", "email", "state"]);
    assert!(result.unmapped.is_empty());
}

#[test]
fn mappings_keep_input_order_and_text() {
    let engine = builtin_engine();
    let input = headers(&["  Data Coleta ", "Quantidade"]);
    let result = engine.heuristic_map(&input, "waste_logs");
    assert_eq!(result.mappings[0].source_field, "  Data Coleta ");
    assert_eq!(result.mappings[1].source_field, "Quantidade");
}

#[test]
fn mapping_is_idempotent() {
    let engine = builtin_engine();
    let input = headers(&["Tipo de Resíduo", "Obs", "Transportadora", "Valor R$", "abc"]);
    let first = engine.heuristic_map(&input, "waste_logs");
    let second = engine.heuristic_map(&input, "waste_logs");
    assert_eq!(first, second);
}

#[test]
fn unknown_entity_degrades_to_unmapped() {
    let engine = builtin_engine();
    let input = headers(&["foo", "bar"]);
    let result = engine.heuristic_map(&input, "nonexistent_entity");
    assert_eq!(
        result,
        MappingResult {
            mappings: vec![],
            unmapped: headers(&["foo", "bar"]),
            suggestions: vec![],
        }
    );
}

#[test]
fn threshold_boundaries_are_inclusive() {
    let engine = synthetic_engine();

    // 4/5 substring ratio
    let result = engine.heuristic_map(&headers(&["abcd"]), "synthetic");
    assert_eq!(result.mappings.len(), 1);
    assert_eq!(result.mappings[0].confidence, 0.8);

    // 7/10 substring ratio
    let result = engine.heuristic_map(&headers(&["abcdefg"]), "long_only");
    assert!(result.mappings.is_empty());
    assert_eq!(result.unmapped, headers(&["abcdefg"]));
    let suggestion = result.suggestion_for("abcdefg").expect("suggestion");
    assert_eq!(suggestion.possible_targets[0].field, "label");
    assert_eq!(suggestion.possible_targets[0].confidence, 0.7);

    // 6/10 substring ratio
    let result = engine.heuristic_map(&headers(&["abcdef"]), "long_only");
    assert!(result.suggestions.is_empty());
    assert_eq!(result.unmapped, headers(&["abcdef"]));
}

#[test]
fn custom_thresholds_apply() {
    let engine = synthetic_engine().with_thresholds(ConfidenceThresholds::new(0.9, 0.5));
    let result = engine.heuristic_map(&headers(&["abcd", "abc"]), "synthetic");
    assert!(result.mappings.is_empty());
    assert_eq!(result.suggestions.len(), 2);
    assert_eq!(result.unmapped.len(), 2);
}

#[tokio::test]
async fn auto_map_without_resolver_matches_heuristics() {
    let engine = builtin_engine();
    let input = headers(&["Tipo de Resíduo", "XYZ123"]);
    let heuristic = engine.heuristic_map(&input, "waste_logs");
    let auto = engine.auto_map(&input, "waste_logs", "c1").await;
    assert_eq!(heuristic, auto);
}

#[tokio::test]
async fn resolver_suggestions_are_merged() {
    let stub = Arc::new(StubResolver::new(vec![
        resolved("XYZ123", "mtr_number", 0.65),
        resolved("Obs.", "notes", 0.9),
    ]));
    let engine = builtin_engine().with_resolver(stub.clone());
    let input = headers(&["Quantidade", "XYZ123", "Obs."]);
    let result = engine.auto_map(&input, "waste_logs", "c1").await;

    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert!(result.mapping_for("Quantidade").is_some());
    // "Obs." normalizes to an exact alias of notes, so it never reaches the resolver.
    assert!(result.mapping_for("Obs.").is_some());
    let suggestion = result.suggestion_for("XYZ123").expect("suggestion");
    assert_eq!(suggestion.possible_targets[0].field, "mtr_number");
    assert!(result.is_unmapped("XYZ123"));
    // A resolver entry for an already mapped header is ignored.
    assert!(result.suggestion_for("Obs.").is_none());
    assert_coverage(&input, &result);
}

#[tokio::test]
async fn resolver_candidates_extend_existing_suggestion() {
    let dictionary = AliasDictionary::from_json(
        r#"{"long_only": {"label": ["abcdefghij"], "other": ["zzz"]}}"#,
    )
    .expect("dictionary");
    let stub = Arc::new(StubResolver::new(vec![
        resolved("abcdefg", "label", 0.9),
        resolved("abcdefg", "other", 0.4),
    ]));
    let engine = MappingEngine::new(Arc::new(dictionary)).with_resolver(stub);
    let result = engine.auto_map(&headers(&["abcdefg"]), "long_only", "c1").await;

    let suggestion = result.suggestion_for("abcdefg").expect("suggestion");
    let fields: Vec<&str> = suggestion
        .possible_targets
        .iter()
        .map(|t| t.field.as_str())
        .collect();
    assert_eq!(fields, vec!["label", "other"]);
    assert_eq!(suggestion.possible_targets[0].confidence, 0.7);
}

#[tokio::test]
async fn resolver_failure_keeps_heuristic_result() {
    let engine = builtin_engine().with_resolver(Arc::new(FailingResolver));
    let input = headers(&["Data Coleta", "XYZ123"]);
    let result = engine.auto_map(&input, "waste_logs", "c1").await;
    assert_eq!(result, engine.heuristic_map(&input, "waste_logs"));
}

#[tokio::test]
async fn resolver_skipped_when_nothing_to_ask() {
    let stub = Arc::new(StubResolver::new(vec![]));
    let engine = builtin_engine().with_resolver(stub.clone());

    engine
        .auto_map(&headers(&["Quantidade"]), "waste_logs", "c1")
        .await;
    engine
        .auto_map(&headers(&["foo", "bar"]), "nonexistent_entity", "c1")
        .await;
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn map_request_uses_request_fields() {
    let engine = builtin_engine();
    let request = MapRequest::new(headers(&["Escopo", "tCO2e"]), "emissions", "c1");
    let result = engine.map_request(&request).await;
    assert_eq!(
        result.mapping_for("Escopo").map(|m| m.target_field.as_str()),
        Some("scope")
    );
    assert_eq!(
        result.mapping_for("tCO2e").map(|m| m.target_field.as_str()),
        Some("co2e")
    );
}

fn entity_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("waste_logs".to_string()),
        Just("suppliers".to_string()),
        Just("employees".to_string()),
        Just("nonexistent_entity".to_string()),
    ]
}

proptest! {
    #[test]
    fn every_header_is_covered_once(
        input in prop::collection::vec("[A-Za-zÀ-ú0-9 ()_-]{0,20}", 0..8),
        entity in entity_strategy(),
    ) {
        let engine = builtin_engine();
        let result = engine.heuristic_map(&input, &entity);
        assert_coverage(&input, &result);
        for mapping in &result.mappings {
            prop_assert!(mapping.confidence + 1e-9 >= 0.8 && mapping.confidence <= 1.0);
        }
        prop_assert_eq!(result, engine.heuristic_map(&input, &entity));
    }
}
