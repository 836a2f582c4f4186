//! Document assembly for the `build` command.

use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, TimeZone};
use polars::prelude::DataFrame;
use tracing::info;

use px_classification::{Classification, ClassificationStore};
use px_core::{MicrodataOptions, from_microdata, from_table};
use px_ingest::load_classification;
use px_model::{Document, Keyword};

use crate::config::BuildConfig;

/// `CREATION-DATE` layout used by PX-web.
pub const CREATION_DATE_FORMAT: &str = "%Y%m%d %H:%M";

pub fn creation_stamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format(CREATION_DATE_FORMAT).to_string()
}

/// Load a classification named after its file; name and domain are the stem.
pub fn load_named_classification(path: &Path) -> Result<Classification> {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        bail!("classification path {} has no file name", path.display());
    };
    load_classification(path, stem, stem, stem)
        .with_context(|| format!("load classification {}", path.display()))
}

/// Classifications listed in the build configuration.
pub fn load_classifications(config: &BuildConfig) -> Result<ClassificationStore> {
    let mut store = ClassificationStore::new();
    for entry in &config.classifications {
        let path = config.resolve(&entry.rows);
        let classification =
            load_classification(&path, &entry.name, &entry.presentation_text, &entry.domain)
                .with_context(|| format!("load classification '{}'", entry.name))?;
        store.insert(classification);
    }
    Ok(store)
}

/// Build the document described by `config` from `input`.
///
/// Domains present in `store` are bound eagerly; others are bound by name
/// and checked when the document is serialized.
pub fn build_document(
    config: &BuildConfig,
    input: &DataFrame,
    store: &ClassificationStore,
    creation_date: Option<&str>,
) -> Result<Document> {
    let primary = config.primary();
    let keys: Vec<&str> = config.keys.iter().map(String::as_str).collect();
    let mut options = MicrodataOptions::new(primary)
        .with_heading(config.heading.iter().cloned())
        .with_totals(config.totals.iter().cloned());
    if let Some(code) = &config.total_code {
        options.total_code = code.clone();
    }

    let mut doc = match &config.value_column {
        Some(column) => from_table(input, &keys, column, &options),
        None => from_microdata(input, &keys, &options),
    }
    .context("build cube")?;
    doc.set_languages(&config.languages, primary)
        .context("set languages")?;

    for (keyword, text) in config.keyword_fields()? {
        doc.set_field(keyword, text)
            .with_context(|| format!("set {keyword}"))?;
    }
    if let Some(stamp) = creation_date {
        doc.set_field(Keyword::CreationDate, stamp)
            .context("set CREATION-DATE")?;
    }

    for (name, variable) in &config.variables {
        if let Some(label) = &variable.label {
            doc.set_variable_label(name, label.clone())
                .with_context(|| format!("label of '{name}'"))?;
        }
        for (code, text) in &variable.values {
            doc.set_value_text(name, code, text.clone())
                .with_context(|| format!("text of '{name}' value '{code}'"))?;
        }
        if let Some(code) = &variable.elimination {
            doc.set_elimination(name, Some(code.as_str()))
                .with_context(|| format!("elimination of '{name}'"))?;
        }
        if let Some(domain) = &variable.domain {
            if store.get(domain).is_some() {
                store.bind_variable(&mut doc, name, domain)
            } else {
                doc.bind_domain(name, domain)
            }
            .with_context(|| format!("bind '{name}' to domain '{domain}'"))?;
        }
    }

    let pending = doc.pending_translations().len();
    if pending > 0 {
        info!(pending, "texts still need translation");
    }
    Ok(doc)
}
