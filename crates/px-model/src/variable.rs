//! Table variables (dimensions) of a PX document.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{PxError, Result, check_text};
use crate::language::{LanguageSet, LocalizedText};

/// Where a variable is printed in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Stub,
    Heading,
}

/// A dimension of the data cube.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    code: String,
    placement: Placement,
    label: LocalizedText,
    values: Vec<String>,
    value_texts: BTreeMap<String, LocalizedText>,
    elimination: Option<String>,
    domain: Option<String>,
}

impl Variable {
    /// Create a variable whose label and value texts are seeded with codes.
    pub(crate) fn new(
        code: &str,
        placement: Placement,
        values: Vec<String>,
        languages: &LanguageSet,
    ) -> Result<Self> {
        check_text(code)?;
        if code.trim().is_empty() {
            return Err(PxError::InvalidText {
                text: code.to_string(),
            });
        }
        if values.is_empty() {
            return Err(PxError::malformed_data(format!(
                "variable '{code}' has no value codes"
            )));
        }
        let mut seen = BTreeSet::new();
        for value in &values {
            check_text(value)?;
            if !seen.insert(value.as_str()) {
                return Err(PxError::DuplicateCode {
                    code: value.clone(),
                    context: format!("variable '{code}'"),
                });
            }
        }
        let value_texts = values
            .iter()
            .map(|value| (value.clone(), LocalizedText::uniform(languages, value)))
            .collect();
        Ok(Self {
            code: code.to_string(),
            placement,
            label: LocalizedText::uniform(languages, code),
            values,
            value_texts,
            elimination: None,
            domain: None,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Localized variable name.
    pub fn label(&self) -> &LocalizedText {
        &self.label
    }

    /// Value codes in declaration order.
    pub fn value_codes(&self) -> &[String] {
        &self.values
    }

    /// Localized text of one value code.
    pub fn value_text(&self, code: &str) -> Option<&LocalizedText> {
        self.value_texts.get(code)
    }

    /// Value code used when the variable is eliminated from a view.
    pub fn elimination(&self) -> Option<&str> {
        self.elimination.as_deref()
    }

    /// Bound classification domain, if any.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Position of a value code.
    pub fn position_of(&self, code: &str) -> Option<usize> {
        self.values.iter().position(|value| value == code)
    }

    pub(crate) fn label_mut(&mut self) -> &mut LocalizedText {
        &mut self.label
    }

    pub(crate) fn set_label(&mut self, label: LocalizedText) {
        self.label = label;
    }

    pub(crate) fn set_value_text(&mut self, code: &str, text: LocalizedText) {
        self.value_texts.insert(code.to_string(), text);
    }

    pub(crate) fn value_texts_mut(&mut self) -> impl Iterator<Item = (&String, &mut LocalizedText)> {
        self.value_texts.iter_mut()
    }

    pub(crate) fn set_elimination(&mut self, code: Option<String>) {
        self.elimination = code;
    }

    pub(crate) fn set_domain(&mut self, domain: Option<String>) {
        self.domain = domain;
    }
}
