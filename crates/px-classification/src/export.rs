//! PX-web aggregation artifacts.
//!
//! A classification is written as one `.vs` control file plus one `.agg`
//! file per aggregation column. The control file's `[Aggreg]` section lists
//! the aggregation files in column order; PX-web offers them in that order.

use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use px_model::{PxError, Result, write_atomic};

use crate::classification::Classification;

/// Paths written by [`export_classification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedArtifacts {
    /// The `.vs` control file.
    pub control: PathBuf,
    /// One `.agg` file per aggregation, in column order.
    pub aggregations: Vec<PathBuf>,
}

/// File names of the control artifact and each aggregation artifact.
pub fn artifact_names(classification: &Classification) -> (String, Vec<String>) {
    let name = classification.name();
    let slugs: Vec<String> = classification
        .aggregations()
        .iter()
        .map(|aggregation| slug(aggregation))
        .collect();
    let files = slugs
        .iter()
        .enumerate()
        .map(|(idx, slug)| {
            let collides = slugs.iter().filter(|other| *other == slug).count() > 1;
            if collides {
                format!("{name}_{slug}_{}.agg", idx + 1)
            } else {
                format!("{name}_{slug}.agg")
            }
        })
        .collect();
    (format!("{name}.vs"), files)
}

/// Render the `.vs` control artifact.
pub fn render_control(classification: &Classification) -> String {
    let (_, files) = artifact_names(classification);
    let mut out = String::new();
    out.push_str("[Descriptions]\n");
    let _ = writeln!(out, "ID={}", classification.name());
    let _ = writeln!(out, "Prestext={}", classification.presentation_text());
    out.push_str("[Domain]\n");
    let _ = writeln!(out, "1={}", classification.domain());
    out.push_str("[Aggreg]\n");
    for (idx, file) in files.iter().enumerate() {
        let _ = writeln!(out, "{}={file}", idx + 1);
    }
    out.push_str("[Valuecode]\n");
    for (idx, row) in classification.rows().iter().enumerate() {
        let _ = writeln!(out, "{}={}", idx + 1, row.valuecode);
    }
    out.push_str("[Valuetext]\n");
    for (idx, row) in classification.rows().iter().enumerate() {
        let _ = writeln!(out, "{}={}", idx + 1, row.valuetext);
    }
    out
}

/// Render the `.agg` artifact of one aggregation.
pub fn render_aggregation(classification: &Classification, aggregation: &str) -> String {
    let groups = classification.groups(aggregation);
    let mut out = String::new();
    out.push_str("[Aggreg]\n");
    let _ = writeln!(out, "Name={aggregation}");
    let _ = writeln!(out, "Valueset={}", classification.name());
    out.push_str("[Aggtext]\n");
    for (idx, (label, _)) in groups.iter().enumerate() {
        let _ = writeln!(out, "{}={label}", idx + 1);
    }
    for (label, members) in &groups {
        let _ = writeln!(out, "[{label}]");
        for (idx, code) in members.iter().enumerate() {
            let _ = writeln!(out, "{}={code}", idx + 1);
        }
    }
    out
}

/// Write the control and aggregation artifacts into `destination`.
///
/// Output depends only on the classification, so repeated exports produce
/// identical bytes. Each file is replaced atomically.
pub fn export_classification(
    classification: &Classification,
    destination: &Path,
) -> Result<ExportedArtifacts> {
    let (control_name, files) = artifact_names(classification);
    let control = destination.join(control_name);
    let previous = listed_aggregations(&control)?;

    let rendered: Vec<(PathBuf, String)> = classification
        .aggregations()
        .iter()
        .zip(&files)
        .map(|(aggregation, file)| {
            (
                destination.join(file),
                render_aggregation(classification, aggregation),
            )
        })
        .collect();

    for (path, content) in &rendered {
        write_atomic(path, content.as_bytes())?;
    }
    write_atomic(&control, render_control(classification).as_bytes())?;

    for stale in previous.iter().filter(|file| !files.contains(file)) {
        let path = destination.join(stale);
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale aggregation file"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(PxError::io("remove", path, err)),
        }
    }

    info!(
        classification = classification.name(),
        aggregations = rendered.len(),
        "exported classification"
    );
    Ok(ExportedArtifacts {
        control,
        aggregations: rendered.into_iter().map(|(path, _)| path).collect(),
    })
}

/// Aggregation files named by an existing control file, if any.
///
/// Only bare file names are returned, so removal never leaves `destination`.
fn listed_aggregations(control: &Path) -> Result<Vec<String>> {
    let text = match std::fs::read_to_string(control) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(PxError::io("read", control, err)),
    };
    let mut in_aggreg = false;
    let mut files = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_aggreg = line == "[Aggreg]";
            continue;
        }
        if !in_aggreg {
            continue;
        }
        if let Some((_, file)) = line.split_once('=') {
            let file = file.trim();
            let bare = !file.contains(['/', '\\']) && file.ends_with(".agg");
            if bare {
                files.push(file.to_string());
            }
        }
    }
    Ok(files)
}

/// Lowercase ASCII alphanumerics; other runs collapse to a single `-`.
fn slug(text: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        out.push_str("agg");
    }
    out
}
