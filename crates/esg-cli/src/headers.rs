//! Header sources for the `map` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Reads the header row of a CSV file.
///
/// Only the first record is read. A UTF-8 BOM on the first header is dropped.
pub fn read_csv_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let record = reader
        .headers()
        .with_context(|| format!("read header row of {}", path.display()))?;
    let headers: Vec<String> = record
        .iter()
        .enumerate()
        .map(|(index, value)| {
            if index == 0 {
                value.trim_start_matches('\u{feff}').to_string()
            } else {
                value.to_string()
            }
        })
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        bail!("{} has no header row", path.display());
    }
    Ok(headers)
}

/// Splits a comma-separated header list given on the command line.
///
/// Empty entries are dropped; the remaining text is kept as written.
pub fn parse_header_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter(|h| !h.trim().is_empty())
        .map(str::to_string)
        .collect()
}
