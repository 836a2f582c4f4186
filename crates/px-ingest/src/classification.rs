//! Classification rows from CSV.
//!
//! The file has a `valuecode` and a `valuetext` column; every other column
//! is an aggregation whose cells hold the group label of each code.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use px_classification::{Classification, ClassificationRow};

use crate::error::{IngestError, Result};

const VALUECODE: &str = "valuecode";
const VALUETEXT: &str = "valuetext";

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read classification rows from a CSV file.
///
/// Blank group labels are kept as blank so that
/// [`Classification::build`] can report them.
pub fn read_classification_rows(path: &Path) -> Result<Vec<ClassificationRow>> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(normalize_header)
        .collect();

    let position = |name: &str| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .ok_or_else(|| IngestError::MissingColumn {
                column: name.to_string(),
                table: path.display().to_string(),
            })
    };
    let code_idx = position(VALUECODE)?;
    let text_idx = position(VALUETEXT)?;
    let aggregations: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != code_idx && *idx != text_idx)
        .map(|(idx, name)| (idx, name.as_str()))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| csv_error(path, source))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let cell = |idx: usize| record.get(idx).unwrap_or_default().trim();
        let mut row = ClassificationRow::new(cell(code_idx), cell(text_idx));
        for (idx, aggregation) in &aggregations {
            row = row.group(*aggregation, cell(*idx));
        }
        rows.push(row);
    }
    debug!(
        path = %path.display(),
        rows = rows.len(),
        aggregations = aggregations.len(),
        "read classification rows"
    );
    Ok(rows)
}

/// Read and build a classification in one step.
pub fn load_classification(
    path: &Path,
    name: &str,
    presentation_text: &str,
    domain: &str,
) -> Result<Classification> {
    let rows = read_classification_rows(path)?;
    Ok(Classification::build(name, presentation_text, domain, rows)?)
}

fn csv_error(path: &Path, source: csv::Error) -> IngestError {
    IngestError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
