use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, SerWriter};
use tracing::{info, info_span};

use px_cli::build::{
    build_document, creation_stamp, load_classifications, load_named_classification,
};
use px_cli::checks::{CheckOutcome, run_plan};
use px_cli::config::{BuildConfig, ValidationPlan};
use px_classification::{
    Classification, ClassificationStore, ExportedArtifacts, export_classification,
};
use px_core::{attach_data, export_for_translation, import_from_translation};
use px_file::{read_px, write_px};
use px_ingest::{CsvTableProvider, read_classification_rows, read_table};
use px_model::{Document, write_atomic};

use crate::cli::{BuildArgs, ClassifyArgs, TranslateExportArgs, TranslateImportArgs, ValidateArgs};

/// What `build` and `translate import` produced.
pub struct BuildSummary {
    pub output: PathBuf,
    pub document: Document,
    pub artifacts: Vec<ExportedArtifacts>,
}

pub fn run_build(args: &BuildArgs) -> Result<BuildSummary> {
    let span = info_span!("build", output = %args.output.display());
    let _guard = span.enter();

    let config = BuildConfig::load(&args.config)?;
    let store = load_classifications(&config)?;
    let input = read_table(&args.input)
        .with_context(|| format!("read input {}", args.input.display()))?;
    let stamp = args
        .stamp
        .then(|| creation_stamp(&chrono::Local::now()));
    let document = build_document(&config, &input, &store, stamp.as_deref())?;

    write_px(&args.output, &document, &store)
        .with_context(|| format!("write {}", args.output.display()))?;
    let artifacts = export_store(&store, &args.output)?;
    Ok(BuildSummary {
        output: args.output.clone(),
        document,
        artifacts,
    })
}

/// Write every classification of `store` next to `px_path`.
fn export_store(store: &ClassificationStore, px_path: &Path) -> Result<Vec<ExportedArtifacts>> {
    let dir = px_path.parent().unwrap_or_else(|| Path::new("."));
    store
        .iter()
        .map(|classification| {
            export_classification(classification, dir)
                .with_context(|| format!("export classification '{}'", classification.name()))
        })
        .collect()
}

pub fn run_validate(args: &ValidateArgs) -> Result<Vec<CheckOutcome>> {
    let plan = ValidationPlan::load(&args.plan)?;
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| plan.base_dir.clone());
    let provider = CsvTableProvider::new(data_dir);
    let outcomes = run_plan(&provider, &plan)?;

    if let Some(dir) = &args.report_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create report directory {}", dir.display()))?;
        let names: Vec<&str> = outcomes.iter().map(|outcome| outcome.name.as_str()).collect();
        for (outcome, file) in outcomes.iter().zip(report_file_names(&names)) {
            write_report(&dir.join(file), outcome)?;
        }
    }
    Ok(outcomes)
}

fn write_report(path: &Path, outcome: &CheckOutcome) -> Result<()> {
    let mut frame = outcome
        .result
        .report_frame()
        .with_context(|| format!("report for '{}'", outcome.name))?;
    let mut bytes = Vec::new();
    CsvWriter::new(&mut bytes)
        .include_header(true)
        .finish(&mut frame)
        .with_context(|| format!("render {}", path.display()))?;
    write_atomic(path, &bytes).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote check report");
    Ok(())
}

/// One CSV file name per check; repeated slugs get a numeric suffix.
fn report_file_names(names: &[&str]) -> Vec<String> {
    let mut used = BTreeSet::new();
    names
        .iter()
        .map(|name| {
            let slug = report_slug(name);
            let mut candidate = slug.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{slug}-{n}");
                n += 1;
            }
            format!("{candidate}.csv")
        })
        .collect()
}

fn report_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "check".to_string()
    } else {
        slug.to_string()
    }
}

pub fn run_classify(args: &ClassifyArgs) -> Result<(Classification, ExportedArtifacts)> {
    let stem = args
        .rows
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("classification")
        .to_string();
    let name = args.name.clone().unwrap_or(stem);
    let presentation_text = args.presentation_text.clone().unwrap_or_else(|| name.clone());
    let domain = args.domain.clone().unwrap_or_else(|| name.clone());

    let rows = read_classification_rows(&args.rows)
        .with_context(|| format!("read {}", args.rows.display()))?;
    let classification = Classification::build(&name, &presentation_text, &domain, rows)
        .with_context(|| format!("classification '{name}'"))?;
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("create {}", args.output_dir.display()))?;
    let artifacts = export_classification(&classification, &args.output_dir)?;
    Ok((classification, artifacts))
}

pub fn run_translate_export(args: &TranslateExportArgs) -> Result<()> {
    let document = read_px(&args.px).with_context(|| format!("read {}", args.px.display()))?;
    let sheet = export_for_translation(&document, args.with_data)?;
    write_atomic(&args.output, &sheet)
        .with_context(|| format!("write {}", args.output.display()))?;
    info!(
        output = %args.output.display(),
        languages = document.languages().len(),
        "exported translation sheet"
    );
    Ok(())
}

pub fn run_translate_import(args: &TranslateImportArgs) -> Result<BuildSummary> {
    let sheet = std::fs::read(&args.sheet)
        .with_context(|| format!("read {}", args.sheet.display()))?;
    let mut document = import_from_translation(&sheet)
        .with_context(|| format!("import {}", args.sheet.display()))?;
    let data = read_table(&args.data)
        .with_context(|| format!("read data {}", args.data.display()))?;
    attach_data(&mut document, &data, &args.value_column)?;

    let mut store = ClassificationStore::new();
    for path in &args.classifications {
        store.insert(load_named_classification(path)?);
    }
    write_px(&args.output, &document, &store)
        .with_context(|| format!("write {}", args.output.display()))?;
    let artifacts = export_store(&store, &args.output)?;
    Ok(BuildSummary {
        output: args.output.clone(),
        document,
        artifacts,
    })
}
