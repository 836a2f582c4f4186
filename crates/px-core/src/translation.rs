//! Translation interchange as CSV.
//!
//! The exported file has the header `kind,key,code,<languages>` with the
//! primary language first. Translators edit the language columns; importing
//! the file back gives a document with every metadata text but no data.
//!
//! | kind          | key           | code                     | language columns     |
//! |---------------|---------------|--------------------------|----------------------|
//! | `plain`       | keyword       |                          | value (primary only) |
//! | `field`       | keyword       |                          | text per language    |
//! | `stub`        | variable code |                          | label per language   |
//! | `heading`     | variable code |                          | label per language   |
//! | `value`       | variable code | value code               | text per language    |
//! | `elimination` | variable code | elimination value code   |                      |
//! | `domain`      | variable code | classification domain    |                      |
//! | `data`        |               | value codes joined by `;`| value (primary only) |

use std::collections::BTreeMap;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use px_ingest::format_numeric;
use px_model::{Document, FieldValue, Keyword, Placement, TextInput, TranslationTarget};

use crate::error::{CoreError, Result};

const FIXED_COLUMNS: [&str; 3] = ["kind", "key", "code"];

/// Export every translatable text of `doc` as CSV.
pub fn export_for_translation(doc: &Document, include_data: bool) -> Result<Vec<u8>> {
    let languages = ordered_languages(doc);
    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
    header.extend(languages.iter().map(String::as_str));
    writer.write_record(&header)?;

    let mut rows = 0usize;
    let mut write = |kind: &str, key: &str, code: &str, texts: Vec<String>| -> Result<()> {
        let mut record = vec![kind.to_string(), key.to_string(), code.to_string()];
        record.extend(texts);
        record.resize(FIXED_COLUMNS.len() + languages.len(), String::new());
        writer.write_record(&record)?;
        rows += 1;
        Ok(())
    };

    for (keyword, value) in doc.fields() {
        match value {
            FieldValue::Plain(text) => write("plain", keyword.name(), "", vec![text.clone()])?,
            FieldValue::Localized(text) => {
                let texts = languages
                    .iter()
                    .map(|lang| text.get(lang).unwrap_or_default().to_string())
                    .collect();
                write("field", keyword.name(), "", texts)?;
            }
        }
    }

    for variable in doc.variables() {
        let kind = match variable.placement() {
            Placement::Stub => "stub",
            Placement::Heading => "heading",
        };
        let labels = languages
            .iter()
            .map(|lang| variable.label().get(lang).unwrap_or_default().to_string())
            .collect();
        write(kind, variable.code(), "", labels)?;
        for code in variable.value_codes() {
            let texts = languages
                .iter()
                .map(|lang| {
                    variable
                        .value_text(code)
                        .and_then(|text| text.get(lang))
                        .unwrap_or_default()
                        .to_string()
                })
                .collect();
            write("value", variable.code(), code, texts)?;
        }
        if let Some(code) = variable.elimination() {
            write("elimination", variable.code(), code, Vec::new())?;
        }
        if let Some(domain) = variable.domain() {
            write("domain", variable.code(), domain, Vec::new())?;
        }
    }

    if include_data && let Some(cells) = doc.data() {
        for (idx, cell) in cells.iter().enumerate() {
            let codes = doc.cell_codes(idx).unwrap_or_default().join(";");
            let value = cell.map(format_numeric).unwrap_or_default();
            write("data", "", &codes, vec![value])?;
        }
    }

    let bytes = writer.into_inner().map_err(|err| CoreError::Translation {
        line: 0,
        message: err.to_string(),
    })?;
    info!(rows, languages = languages.len(), include_data, "exported translation sheet");
    Ok(bytes)
}

/// Rebuild a document without data from a translation sheet.
///
/// Empty cells in non-primary language columns fall back to the primary
/// text and are listed as pending translations. `data` rows are ignored; attach data with
/// [`attach_data`](crate::attach_data) afterwards.
pub fn import_from_translation(bytes: &[u8]) -> Result<Document> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let header = reader.headers()?.clone();
    let languages: Vec<String> = header
        .iter()
        .skip(FIXED_COLUMNS.len())
        .map(|lang| lang.trim().to_string())
        .collect();
    let fixed_ok = header
        .iter()
        .take(FIXED_COLUMNS.len())
        .map(str::trim)
        .eq(FIXED_COLUMNS);
    if !fixed_ok || languages.is_empty() {
        return Err(CoreError::Translation {
            line: 1,
            message: format!(
                "header must be {} followed by language columns",
                FIXED_COLUMNS.join(",")
            ),
        });
    }
    let primary = languages[0].clone();
    let mut doc = Document::new(&primary)?;
    if languages.len() > 1 {
        doc.set_languages(&languages, &primary)?;
    }

    let mut variables: Vec<PendingVariable> = Vec::new();
    let mut rows = 0usize;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |pos| pos.line());
        let row = Row::new(&record, &languages, line);
        rows += 1;
        match row.kind.as_str() {
            "plain" => {
                let keyword = row.keyword()?;
                doc.set_field(keyword, row.primary_text())?;
            }
            "field" => {
                let keyword = row.keyword()?;
                doc.set_field(keyword, row.localized())?;
                for language in row.blank_languages() {
                    doc.mark_untranslated(TranslationTarget::Field(keyword), language)?;
                }
            }
            "stub" | "heading" => {
                if variables.iter().any(|v| v.code == row.key) {
                    return Err(row.error(format!("variable '{}' is listed twice", row.key)));
                }
                variables.push(PendingVariable {
                    code: row.key.clone(),
                    placement: if row.kind == "stub" {
                        Placement::Stub
                    } else {
                        Placement::Heading
                    },
                    label: row.localized(),
                    blank_label: row.blank_languages().map(str::to_string).collect(),
                    values: Vec::new(),
                    elimination: None,
                    domain: None,
                });
            }
            "value" | "elimination" | "domain" => {
                let variable = variables
                    .iter_mut()
                    .find(|v| v.code == row.key)
                    .ok_or_else(|| row.error(format!("variable '{}' is not declared", row.key)))?;
                match row.kind.as_str() {
                    "value" => variable.values.push(PendingValue {
                        code: row.code.clone(),
                        text: row.localized(),
                        blank: row.blank_languages().map(str::to_string).collect(),
                    }),
                    "elimination" => variable.elimination = Some(row.code.clone()),
                    _ => variable.domain = Some(row.code.clone()),
                }
            }
            "data" => {}
            other => return Err(row.error(format!("unknown row kind '{other}'"))),
        }
    }

    for variable in variables {
        let codes = variable.values.iter().map(|value| value.code.clone()).collect();
        doc.add_variable(&variable.code, variable.placement, codes)?;
        doc.set_variable_label(&variable.code, variable.label)?;
        for language in &variable.blank_label {
            let target = TranslationTarget::VariableLabel {
                variable: variable.code.clone(),
            };
            doc.mark_untranslated(target, language)?;
        }
        for value in variable.values {
            doc.set_value_text(&variable.code, &value.code, value.text)?;
            for language in &value.blank {
                let target = TranslationTarget::ValueText {
                    variable: variable.code.clone(),
                    code: value.code.clone(),
                };
                doc.mark_untranslated(target, language)?;
            }
        }
        if let Some(code) = variable.elimination {
            doc.set_elimination(&variable.code, Some(&code))?;
        }
        if let Some(domain) = variable.domain {
            doc.bind_domain(&variable.code, &domain)?;
        }
    }
    debug!(rows, variables = doc.variables().len(), "imported translation sheet");
    Ok(doc)
}

/// Primary language first, then the others in set order.
fn ordered_languages(doc: &Document) -> Vec<String> {
    let languages = doc.languages();
    std::iter::once(languages.primary())
        .chain(languages.secondary())
        .map(str::to_string)
        .collect()
}

struct PendingVariable {
    code: String,
    placement: Placement,
    label: TextInput,
    blank_label: Vec<String>,
    values: Vec<PendingValue>,
    elimination: Option<String>,
    domain: Option<String>,
}

struct PendingValue {
    code: String,
    text: TextInput,
    /// Languages left blank by the translator.
    blank: Vec<String>,
}

struct Row<'a> {
    kind: String,
    key: String,
    code: String,
    texts: Vec<&'a str>,
    languages: &'a [String],
    line: u64,
}

impl<'a> Row<'a> {
    fn new(record: &'a StringRecord, languages: &'a [String], line: u64) -> Self {
        let cell = |idx: usize| record.get(idx).unwrap_or_default().trim().to_string();
        Self {
            kind: cell(0),
            key: cell(1),
            code: cell(2),
            texts: (0..languages.len())
                .map(|idx| record.get(FIXED_COLUMNS.len() + idx).unwrap_or_default())
                .collect(),
            languages,
            line,
        }
    }

    fn keyword(&self) -> Result<Keyword> {
        Keyword::from_name(&self.key)
            .ok_or_else(|| self.error(format!("unknown keyword '{}'", self.key)))
    }

    fn primary_text(&self) -> &str {
        self.texts.first().copied().unwrap_or_default()
    }

    /// Secondary language columns the translator left empty.
    fn blank_languages(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .zip(&self.texts)
            .skip(1)
            .filter(|(_, text)| text.is_empty())
            .map(|(lang, _)| lang.as_str())
    }

    fn localized(&self) -> TextInput {
        let primary = self.primary_text();
        let texts: BTreeMap<String, String> = self
            .languages
            .iter()
            .zip(&self.texts)
            .enumerate()
            .map(|(idx, (lang, text))| {
                let text = if idx > 0 && text.is_empty() { primary } else { *text };
                (lang.clone(), text.to_string())
            })
            .collect();
        TextInput::Localized(texts)
    }

    fn error(&self, message: String) -> CoreError {
        CoreError::Translation {
            line: self.line,
            message,
        }
    }
}
