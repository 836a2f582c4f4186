//! PX-file parsing.
//!
//! Parsing happens in two passes: the language declaration is read first so
//! that every `KEYWORD[lang]` suffix can be checked against it, then the
//! remaining records are grouped by keyword and replayed onto a fresh
//! [`Document`] through its validating setters.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::{debug, info};

use px_model::{
    Document, Keyword, Placement, PxError, Result, Scope, TextInput, TranslationTarget,
};

use crate::token::{Item, Record, data_tokens, parse_items, split_records};

/// Parse PX bytes into a document.
pub fn parse(bytes: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| PxError::malformed_header(format!("file is not valid UTF-8: {err}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let records = split_records(text)?;
    let header = Header::collect(&records)?;
    header.into_document()
}

/// Read and parse a PX file.
pub fn read_px(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).map_err(|err| PxError::io("read", path, err))?;
    let doc = parse(&bytes)?;
    info!(
        path = %path.display(),
        variables = doc.variables().len(),
        "read PX file"
    );
    Ok(doc)
}

/// Records grouped by keyword, with language suffixes resolved.
#[derive(Default)]
struct Header {
    primary: String,
    languages: Vec<String>,
    plain: BTreeMap<Keyword, String>,
    scoped: BTreeMap<Keyword, BTreeMap<String, String>>,
    stub: BTreeMap<String, Vec<String>>,
    heading: BTreeMap<String, Vec<String>>,
    /// Keyed by (language, variable label in that language).
    values: BTreeMap<(String, String), Vec<String>>,
    /// The remaining maps are keyed by primary variable label.
    codes: BTreeMap<String, Vec<String>>,
    variable_codes: BTreeMap<String, String>,
    elimination: BTreeMap<String, Item>,
    domain: BTreeMap<String, String>,
    data: Option<String>,
}

impl Header {
    fn collect(records: &[Record]) -> Result<Self> {
        let mut header = Header::default();

        let language = records
            .iter()
            .find(|r| r.keyword == "LANGUAGE")
            .ok_or_else(|| PxError::malformed_header("mandatory keyword LANGUAGE is missing"))?;
        header.primary = single_text(language)?;
        header.languages = match records.iter().find(|r| r.keyword == "LANGUAGES") {
            Some(record) => texts(record)?,
            None => vec![header.primary.clone()],
        };
        if !header.languages.contains(&header.primary) {
            return Err(PxError::malformed_header(format!(
                "LANGUAGES does not list the primary language '{}'",
                header.primary
            )));
        }

        for record in records {
            match record.keyword.as_str() {
                "LANGUAGE" | "LANGUAGES" => {}
                "STUB" => {
                    let language = header.language_of(record)?;
                    header.stub.insert(language, texts(record)?);
                }
                "HEADING" => {
                    let language = header.language_of(record)?;
                    header.heading.insert(language, texts(record)?);
                }
                "VALUES" => {
                    let language = header.language_of(record)?;
                    let variable = single_arg(record)?;
                    header.values.insert((language, variable), texts(record)?);
                }
                "CODES" => {
                    if header.is_primary(record)? {
                        header.codes.insert(single_arg(record)?, texts(record)?);
                    }
                }
                "VARIABLECODE" => {
                    if header.is_primary(record)? {
                        header
                            .variable_codes
                            .insert(single_arg(record)?, single_text(record)?);
                    }
                }
                "ELIMINATION" => {
                    if header.is_primary(record)? {
                        let item = single_item(record)?;
                        header.elimination.insert(single_arg(record)?, item);
                    }
                }
                "DOMAIN" => {
                    if header.is_primary(record)? {
                        header.domain.insert(single_arg(record)?, single_text(record)?);
                    }
                }
                "DATA" => header.data = Some(record.value.clone()),
                name => match Keyword::from_name(name) {
                    // Variable-level notes and the like are not table fields.
                    Some(_) if !record.args.is_empty() => debug!(
                        keyword = name,
                        line = record.line,
                        "skipping variable-level record"
                    ),
                    Some(keyword) => header.field(keyword, record)?,
                    None => debug!(keyword = name, line = record.line, "skipping unknown keyword"),
                },
            }
        }
        Ok(header)
    }

    fn field(&mut self, keyword: Keyword, record: &Record) -> Result<()> {
        let language = self.language_of(record)?;
        let text = single_text(record)?;
        match keyword.spec().scope {
            Scope::Plain => {
                if language != self.primary {
                    return Err(PxError::malformed_header(format!(
                        "line {}: {keyword} is language independent but has suffix [{language}]",
                        record.line
                    )));
                }
                self.plain.insert(keyword, text);
            }
            Scope::Language => {
                self.scoped.entry(keyword).or_default().insert(language, text);
            }
        }
        Ok(())
    }

    /// Language a record applies to; no suffix means the primary language.
    fn language_of(&self, record: &Record) -> Result<String> {
        match &record.language {
            None => Ok(self.primary.clone()),
            Some(language) if self.languages.contains(language) => Ok(language.clone()),
            Some(language) => Err(PxError::LanguageMismatch {
                keyword: record.keyword.clone(),
                language: language.clone(),
            }),
        }
    }

    fn is_primary(&self, record: &Record) -> Result<bool> {
        Ok(self.language_of(record)? == self.primary)
    }

    fn into_document(self) -> Result<Document> {
        let mut doc = Document::new(&self.primary)?;
        if self.languages.len() > 1 {
            doc.set_languages(&self.languages, &self.primary)?;
        }

        for keyword in Keyword::ALL {
            let present = self.plain.contains_key(&keyword) || self.scoped.contains_key(&keyword);
            if keyword.is_mandatory() && !present {
                return Err(PxError::malformed_header(format!(
                    "mandatory keyword {keyword} is missing"
                )));
            }
            if let Some(text) = self.plain.get(&keyword) {
                doc.set_field(keyword, text.as_str())?;
            } else if let Some(texts) = self.scoped.get(&keyword) {
                doc.set_field(keyword, TextInput::Localized(texts.clone()))?;
            }
        }

        let stub = self.stub.get(&self.primary).cloned().unwrap_or_default();
        let heading = self.heading.get(&self.primary).cloned().unwrap_or_default();
        if stub.is_empty() && heading.is_empty() {
            return Err(PxError::malformed_header("mandatory keyword STUB or HEADING is missing"));
        }
        let mut seen = BTreeSet::new();
        if let Some(duplicate) = stub.iter().chain(&heading).find(|name| !seen.insert(*name)) {
            return Err(PxError::malformed_header(format!(
                "variable '{duplicate}' is declared twice"
            )));
        }

        for (idx, name) in stub.iter().enumerate() {
            self.add_variable(&mut doc, Placement::Stub, &self.stub, idx, name)?;
        }
        for (idx, name) in heading.iter().enumerate() {
            self.add_variable(&mut doc, Placement::Heading, &self.heading, idx, name)?;
        }

        let raw = self
            .data
            .as_deref()
            .ok_or_else(|| PxError::malformed_header("mandatory keyword DATA is missing"))?;
        doc.set_data(parse_data(raw, doc.shape().cell_count())?)?;
        Ok(doc)
    }

    fn add_variable(
        &self,
        doc: &mut Document,
        placement: Placement,
        names: &BTreeMap<String, Vec<String>>,
        idx: usize,
        name: &str,
    ) -> Result<()> {
        let values = self
            .values
            .get(&(self.primary.clone(), name.to_string()))
            .ok_or_else(|| {
                PxError::malformed_header(format!("VALUES for variable '{name}' is missing"))
            })?;
        let codes = self.codes.get(name).unwrap_or(values);
        if codes.len() != values.len() {
            return Err(PxError::malformed_header(format!(
                "variable '{name}' has {} codes but {} values",
                codes.len(),
                values.len()
            )));
        }
        let code = self
            .variable_codes
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);
        doc.add_variable(code, placement, codes.clone())?;

        let primary_count = names.get(&self.primary).map_or(0, Vec::len);
        let mut labels = BTreeMap::new();
        let mut texts: Vec<BTreeMap<String, String>> = vec![BTreeMap::new(); codes.len()];
        let mut untranslated_labels = Vec::new();
        let mut untranslated_values = Vec::new();
        for language in &self.languages {
            let secondary = *language != self.primary;
            let label = match names.get(language) {
                Some(list) if list.len() != primary_count => {
                    return Err(PxError::malformed_header(format!(
                        "variable list in [{language}] does not match the primary language"
                    )));
                }
                Some(list) => list[idx].clone(),
                None => {
                    if secondary {
                        untranslated_labels.push(language.as_str());
                    }
                    name.to_string()
                }
            };
            let localized = match self.values.get(&(language.clone(), label.clone())) {
                Some(list) if list.len() != codes.len() => {
                    return Err(PxError::malformed_header(format!(
                        "VALUES[{language}] of '{label}' has {} entries, expected {}",
                        list.len(),
                        codes.len()
                    )));
                }
                Some(list) => list,
                None => {
                    if secondary {
                        untranslated_values.push(language.as_str());
                    }
                    values
                }
            };
            for (slot, text) in texts.iter_mut().zip(localized) {
                slot.insert(language.clone(), text.clone());
            }
            labels.insert(language.clone(), label);
        }
        doc.set_variable_label(code, TextInput::Localized(labels))?;
        for (value, text) in codes.iter().zip(texts) {
            doc.set_value_text(code, value, TextInput::Localized(text))?;
        }
        for language in untranslated_labels {
            let target = TranslationTarget::VariableLabel {
                variable: code.to_string(),
            };
            doc.mark_untranslated(target, language)?;
        }
        for language in untranslated_values {
            for value in codes {
                let target = TranslationTarget::ValueText {
                    variable: code.to_string(),
                    code: value.clone(),
                };
                doc.mark_untranslated(target, language)?;
            }
        }

        if let Some(Item::Quoted(text)) = self.elimination.get(name) {
            let position = values
                .iter()
                .position(|value| value == text)
                .or_else(|| codes.iter().position(|value| value == text))
                .ok_or_else(|| {
                    PxError::malformed_header(format!(
                        "ELIMINATION of '{name}' names unknown value '{text}'"
                    ))
                })?;
            doc.set_elimination(code, Some(&codes[position]))?;
        }
        if let Some(domain) = self.domain.get(name) {
            doc.bind_domain(code, domain)?;
        }
        Ok(())
    }
}

fn parse_data(raw: &str, expected: usize) -> Result<Vec<Option<f64>>> {
    let tokens = data_tokens(raw);
    if tokens.len() != expected {
        return Err(PxError::malformed_data(format!(
            "expected {expected} cells, found {}",
            tokens.len()
        )));
    }
    tokens
        .into_iter()
        .map(|token| match token {
            Item::Quoted(_) => Ok(None),
            Item::Bare(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(PxError::malformed_data(format!("invalid cell value '{text}'"))),
            },
        })
        .collect()
}

fn texts(record: &Record) -> Result<Vec<String>> {
    Ok(parse_items(&record.value)?
        .iter()
        .map(|item| item.text().to_string())
        .collect())
}

fn single_item(record: &Record) -> Result<Item> {
    let mut items = parse_items(&record.value)?;
    if items.len() != 1 {
        return Err(PxError::malformed_header(format!(
            "line {}: {} expects one value, found {}",
            record.line,
            record.keyword,
            items.len()
        )));
    }
    Ok(items.remove(0))
}

fn single_text(record: &Record) -> Result<String> {
    Ok(single_item(record)?.text().to_string())
}

fn single_arg(record: &Record) -> Result<String> {
    match record.args.as_slice() {
        [arg] => Ok(arg.clone()),
        _ => Err(PxError::malformed_header(format!(
            "line {}: {} expects one variable argument",
            record.line, record.keyword
        ))),
    }
}
