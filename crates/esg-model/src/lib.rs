pub mod error;
pub mod mapping;
pub mod request;

pub use error::{ModelError, Result};
pub use mapping::{FieldMapping, MappingResult, MappingSuggestion, PossibleTarget};
pub use request::{ErrorResponse, MapRequest};
