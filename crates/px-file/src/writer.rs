//! PX-file serialization.
//!
//! Records are written in a fixed order: prelude keywords, `LANGUAGE` and
//! `LANGUAGES`, the remaining metadata keywords in table order (scoped ones
//! once per language, primary unsuffixed), then the structural keywords and
//! finally `DATA`.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use px_model::{
    DomainResolver, Document, FieldValue, Keyword, PxError, Result, ValueKind, Variable,
    write_atomic,
};

/// Maximum length of an output line.
pub const MAX_LINE: usize = 256;

/// Maximum characters inside one quoted chunk.
const CHUNK: usize = 200;

/// Serialize a document to PX bytes.
///
/// Every check runs before any output is produced, so a failing document
/// yields no bytes at all.
pub fn serialize(doc: &Document, resolver: &dyn DomainResolver) -> Result<Vec<u8>> {
    check_serializable(doc, resolver)?;
    let data = doc.data().ok_or(PxError::MissingData)?;

    let mut writer = PxWriter::default();
    let languages = doc.languages();
    let primary = languages.primary();

    for keyword in Keyword::ALL.into_iter().filter(|k| k.spec().prelude) {
        if let Some(value) = doc.field(keyword) {
            writer.field(keyword, value, primary, None);
        }
    }
    writer.record("LANGUAGE", None, None, &[quoted(primary)]);
    if languages.len() > 1 {
        let codes: Vec<String> = languages.codes().iter().map(|c| quoted(c)).collect();
        writer.record("LANGUAGES", None, None, &codes);
    }

    for keyword in Keyword::ALL.into_iter().filter(|k| !k.spec().prelude) {
        let Some(value) = doc.field(keyword) else {
            continue;
        };
        match value {
            FieldValue::Plain(_) => writer.field(keyword, value, primary, None),
            FieldValue::Localized(_) => {
                for language in languages.codes() {
                    writer.field(keyword, value, language, suffix(language, primary));
                }
            }
        }
    }

    for language in languages.codes() {
        let suffix = suffix(language, primary);
        let stub: Vec<String> = doc.stub().map(|v| quoted(label(v, language))).collect();
        if !stub.is_empty() {
            writer.record("STUB", suffix, None, &stub);
        }
        let heading: Vec<String> = doc.heading().map(|v| quoted(label(v, language))).collect();
        if !heading.is_empty() {
            writer.record("HEADING", suffix, None, &heading);
        }
    }

    for variable in doc.variables() {
        for language in languages.codes() {
            let texts: Vec<String> = variable
                .value_codes()
                .iter()
                .map(|code| quoted(value_text(variable, code, language)))
                .collect();
            writer.record(
                "VALUES",
                suffix(language, primary),
                Some(label(variable, language)),
                &texts,
            );
        }
    }

    for variable in doc.variables() {
        let name = label(variable, primary);
        let codes: Vec<String> = variable.value_codes().iter().map(|c| quoted(c)).collect();
        writer.record("CODES", None, Some(name), &codes);
        writer.record("VARIABLECODE", None, Some(name), &[quoted(variable.code())]);
    }

    for variable in doc.variables() {
        let Some(code) = variable.elimination() else {
            continue;
        };
        for language in languages.codes() {
            writer.record(
                "ELIMINATION",
                suffix(language, primary),
                Some(label(variable, language)),
                &[quoted(value_text(variable, code, language))],
            );
        }
    }

    for variable in doc.variables() {
        let Some(domain) = variable.domain() else {
            continue;
        };
        for language in languages.codes() {
            writer.record(
                "DOMAIN",
                suffix(language, primary),
                Some(label(variable, language)),
                &[quoted(domain)],
            );
        }
    }

    let heading_rank = doc.heading().count();
    writer.data(data, doc.shape().row_width(heading_rank));

    debug!(
        variables = doc.variables().len(),
        cells = data.len(),
        bytes = writer.out.len(),
        "serialized document"
    );
    Ok(writer.out.into_bytes())
}

/// Serialize a document and write it atomically to `path`.
pub fn write_px(path: &Path, doc: &Document, resolver: &dyn DomainResolver) -> Result<()> {
    let bytes = serialize(doc, resolver)?;
    write_atomic(path, &bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote PX file");
    Ok(())
}

fn check_serializable(doc: &Document, resolver: &dyn DomainResolver) -> Result<()> {
    let languages = doc.languages();
    for keyword in Keyword::ALL.into_iter().filter(|k| k.is_mandatory()) {
        if doc.field(keyword).is_none() {
            return Err(PxError::MissingField {
                keyword: keyword.name().to_string(),
            });
        }
    }
    if doc.variables().is_empty() {
        return Err(PxError::MissingField {
            keyword: "STUB".to_string(),
        });
    }

    for language in languages.codes() {
        let mut seen = BTreeSet::new();
        for variable in doc.variables() {
            let name = label(variable, language);
            if !seen.insert(name) {
                return Err(PxError::DuplicateVariable {
                    variable: name.to_string(),
                });
            }
        }
    }

    // Elimination is written as value text, so that text must identify one code.
    for variable in doc.variables() {
        let Some(code) = variable.elimination() else {
            continue;
        };
        for language in languages.codes() {
            let text = value_text(variable, code, language);
            let matches = variable
                .value_codes()
                .iter()
                .filter(|other| value_text(variable, other, language) == text)
                .count();
            if matches > 1 {
                return Err(PxError::DuplicateCode {
                    code: text.to_string(),
                    context: format!("elimination text of variable '{}'", variable.code()),
                });
            }
        }
    }

    doc.check_bindings(resolver)?;
    if !doc.has_data() {
        return Err(PxError::MissingData);
    }
    Ok(())
}

#[derive(Default)]
struct PxWriter {
    out: String,
}

impl PxWriter {
    fn field(&mut self, keyword: Keyword, value: &FieldValue, language: &str, suffix: Option<&str>) {
        let text = value.text(language).unwrap_or_default();
        let item = match keyword.spec().kind {
            ValueKind::Integer => text.trim().to_string(),
            ValueKind::Text => quoted(text),
        };
        self.record(keyword.name(), suffix, None, &[item]);
    }

    /// Write one record, wrapping at list commas past [`MAX_LINE`].
    fn record(&mut self, keyword: &str, language: Option<&str>, arg: Option<&str>, items: &[String]) {
        let mut head = keyword.to_string();
        if let Some(language) = language {
            head.push('[');
            head.push_str(language);
            head.push(']');
        }
        if let Some(arg) = arg {
            head.push('(');
            head.push_str(&quoted(arg));
            head.push(')');
        }
        head.push('=');
        self.out.push_str(&head);

        let mut width = head.chars().count();
        if items.is_empty() {
            self.out.push_str(";\n");
            return;
        }
        for (idx, item) in items.iter().enumerate() {
            let terminator = if idx + 1 == items.len() { ';' } else { ',' };
            let first_line = item.split('\n').next().unwrap_or_default().chars().count() + 1;
            if width + first_line > MAX_LINE {
                self.out.push('\n');
                width = 0;
            }
            self.out.push_str(item);
            self.out.push(terminator);
            width = match item.rfind('\n') {
                Some(pos) => item[pos + 1..].chars().count() + 1,
                None => width + item.chars().count() + 1,
            };
        }
        self.out.push('\n');
    }

    /// Write the data block, one line per stub combination.
    fn data(&mut self, cells: &[Option<f64>], row_width: usize) {
        self.out.push_str("DATA=\n");
        let rows: Vec<&[Option<f64>]> = cells.chunks(row_width.max(1)).collect();
        for (row_idx, row) in rows.iter().enumerate() {
            let mut width = 0usize;
            for (idx, cell) in row.iter().enumerate() {
                let token = format_cell(*cell);
                if idx > 0 {
                    if width + 1 + token.len() > MAX_LINE {
                        self.out.push('\n');
                        width = 0;
                    } else {
                        self.out.push(' ');
                        width += 1;
                    }
                }
                width += token.len();
                self.out.push_str(&token);
            }
            if row_idx + 1 == rows.len() {
                self.out.push(';');
            }
            self.out.push('\n');
        }
    }
}

/// Cell token; missing cells use the `".."` symbol.
pub(crate) fn format_cell(cell: Option<f64>) -> String {
    match cell {
        Some(value) => format!("{value}"),
        None => "\"..\"".to_string(),
    }
}

/// Quote text, splitting it into adjacent chunks when it is long.
fn quoted(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= CHUNK {
        return format!("\"{text}\"");
    }
    chars
        .chunks(CHUNK)
        .map(|chunk| format!("\"{}\"", chunk.iter().collect::<String>()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn suffix<'a>(language: &'a str, primary: &str) -> Option<&'a str> {
    (language != primary).then_some(language)
}

fn label<'a>(variable: &'a Variable, language: &str) -> &'a str {
    variable.label().get(language).unwrap_or(variable.code())
}

fn value_text<'a>(variable: &'a Variable, code: &'a str, language: &str) -> &'a str {
    variable
        .value_text(code)
        .and_then(|text| text.get(language))
        .unwrap_or(code)
}
