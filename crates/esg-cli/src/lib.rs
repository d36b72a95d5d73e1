//! CLI and HTTP components for the ESG field mapper.

pub mod headers;
pub mod logging;
pub mod server;
pub mod summary;
