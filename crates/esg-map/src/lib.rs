//! Spreadsheet header to entity field mapping.
//!
//! Headers are normalized, scored against an [`AliasDictionary`] and sorted
//! into accepted mappings, suggestions and unmapped headers. An optional
//! [`FieldResolver`] is consulted once per call for what stays unmapped.

#![deny(unsafe_code)]

pub mod dictionary;
pub mod engine;
pub mod error;
pub mod repository;
pub mod resolver;
pub mod score;
pub mod utils;

pub use dictionary::{AliasDictionary, BUILTIN_ALIASES, EntityAliases};
pub use engine::{ConfidenceLevel, ConfidenceThresholds, FieldMatch, MappingEngine};
pub use error::{DictionaryError, ResolveError};
pub use repository::{AliasRepository, OverrideMetadata, StoredOverrides};
pub use resolver::{
    ChatCompletionResolver, FieldResolver, ResolveRequest, ResolvedField, ResolverConfig,
};
pub use score::{MatchMethod, PatternScore, score, score_detailed};
pub use utils::normalize_text;
