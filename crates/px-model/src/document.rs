//! The PX document: languages, metadata, variables and data.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::cube::CubeShape;
use crate::error::{PxError, Result, check_text};
use crate::keyword::{Keyword, ValueKind};
use crate::language::{LanguageSet, LocalizedText, MergedText, TextInput};
use crate::variable::{Placement, Variable};

/// Value of a metadata keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Plain(String),
    Localized(LocalizedText),
}

impl FieldValue {
    /// Text in `language`; plain values are the same in every language.
    pub fn text(&self, language: &str) -> Option<&str> {
        match self {
            FieldValue::Plain(text) => Some(text),
            FieldValue::Localized(text) => text.get(language),
        }
    }
}

/// Something a translator has to look at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TranslationTarget {
    Field(Keyword),
    VariableLabel { variable: String },
    ValueText { variable: String, code: String },
}

/// A target whose text in `language` is still a copy of the primary text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingTranslation {
    pub target: TranslationTarget,
    pub language: String,
}

/// Resolves classification domains to the value codes they classify.
pub trait DomainResolver {
    /// Value codes of the classification bound to `domain`.
    fn value_codes(&self, domain: &str) -> Option<Vec<String>>;
}

/// Resolver that knows no domains.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDomains;

impl DomainResolver for NoDomains {
    fn value_codes(&self, _domain: &str) -> Option<Vec<String>> {
        None
    }
}

/// A statistical table with multi-language metadata.
///
/// Mutation goes through `&mut self`; every setter validates its input
/// before touching the document.
#[derive(Debug, Clone)]
pub struct Document {
    languages: LanguageSet,
    fields: BTreeMap<Keyword, FieldValue>,
    variables: Vec<Variable>,
    data: Option<Vec<Option<f64>>>,
    pending: BTreeSet<PendingTranslation>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.languages == other.languages
            && self.fields == other.fields
            && self.variables == other.variables
            && self.data == other.data
    }
}

impl Document {
    /// Create an empty single-language document.
    pub fn new(primary_language: &str) -> Result<Self> {
        Ok(Self {
            languages: LanguageSet::new(primary_language)?,
            fields: BTreeMap::new(),
            variables: Vec::new(),
            data: None,
            pending: BTreeSet::new(),
        })
    }

    // ------------------------------------------------------------------
    // Languages
    // ------------------------------------------------------------------

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn primary_language(&self) -> &str {
        self.languages.primary()
    }

    /// Replace the language set with a superset of the current one.
    ///
    /// New languages are seeded from the primary text of every localized
    /// value. Returns the entries added to the pending-translation log.
    pub fn set_languages(&mut self, codes: &[String], primary: &str) -> Result<Vec<PendingTranslation>> {
        let transition = self.languages.transition(codes, primary)?;
        let source = self.languages.primary().to_string();
        let added = transition.added;

        let mut pending = Vec::new();
        if !added.is_empty() {
            for (keyword, value) in &mut self.fields {
                if let FieldValue::Localized(text) = value {
                    text.extend_from(&source, &added);
                    push_pending(&mut pending, TranslationTarget::Field(*keyword), &added);
                }
            }
            for variable in &mut self.variables {
                let code = variable.code().to_string();
                variable.label_mut().extend_from(&source, &added);
                push_pending(
                    &mut pending,
                    TranslationTarget::VariableLabel {
                        variable: code.clone(),
                    },
                    &added,
                );
                for (value, text) in variable.value_texts_mut() {
                    text.extend_from(&source, &added);
                    push_pending(
                        &mut pending,
                        TranslationTarget::ValueText {
                            variable: code.clone(),
                            code: value.clone(),
                        },
                        &added,
                    );
                }
            }
            info!(
                languages = %added.join(","),
                entries = pending.len(),
                "seeded new languages from primary text"
            );
            for entry in &pending {
                debug!(target = ?entry.target, language = %entry.language, "pending translation");
            }
            self.pending.extend(pending.iter().cloned());
        }
        self.languages = transition.next;
        Ok(pending)
    }

    /// Entries whose text is still a copy of the primary language.
    pub fn pending_translations(&self) -> &BTreeSet<PendingTranslation> {
        &self.pending
    }

    /// Record that `language` of `target` still holds a copy of other text.
    ///
    /// Used by loaders that fill absent translations themselves.
    pub fn mark_untranslated(&mut self, target: TranslationTarget, language: &str) -> Result<()> {
        if !self.languages.secondary().any(|code| code == language) {
            return Err(PxError::unknown_language(language));
        }
        match &target {
            TranslationTarget::Field(keyword) => {
                if !matches!(self.fields.get(keyword), Some(FieldValue::Localized(_))) {
                    return Err(PxError::MissingField {
                        keyword: keyword.name().to_string(),
                    });
                }
            }
            TranslationTarget::VariableLabel { variable } => {
                self.variable(variable)
                    .ok_or_else(|| PxError::unknown_variable(variable))?;
            }
            TranslationTarget::ValueText { variable, code } => {
                let var = self
                    .variable(variable)
                    .ok_or_else(|| PxError::unknown_variable(variable))?;
                if var.position_of(code).is_none() {
                    return Err(PxError::UnknownValueCode {
                        variable: variable.clone(),
                        code: code.clone(),
                    });
                }
            }
        }
        self.pending.insert(PendingTranslation {
            target,
            language: language.to_string(),
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metadata fields
    // ------------------------------------------------------------------

    pub fn field(&self, keyword: Keyword) -> Option<&FieldValue> {
        self.fields.get(&keyword)
    }

    /// Text of a field in one language.
    pub fn field_text(&self, keyword: Keyword, language: &str) -> Option<&str> {
        self.fields.get(&keyword).and_then(|value| value.text(language))
    }

    /// Set a metadata field.
    ///
    /// Language-scoped fields keep their previous text for languages the
    /// input leaves out.
    pub fn set_field(&mut self, keyword: Keyword, input: impl Into<TextInput>) -> Result<()> {
        let input = input.into();
        if keyword.is_language_scoped() {
            let previous = match self.fields.get(&keyword) {
                Some(FieldValue::Localized(text)) => Some(text),
                _ => None,
            };
            let merged = LocalizedText::merge(previous, &input, &self.languages, keyword.name())?;
            self.fields
                .insert(keyword, FieldValue::Localized(merged.text.clone()));
            self.track_merge(TranslationTarget::Field(keyword), &merged);
            return Ok(());
        }

        let TextInput::Plain(text) = input else {
            return Err(PxError::FieldScope {
                keyword: keyword.name().to_string(),
            });
        };
        check_text(&text)?;
        let text = match keyword.spec().kind {
            ValueKind::Integer => {
                let trimmed = text.trim();
                if trimmed.parse::<i64>().is_err() {
                    return Err(PxError::InvalidText { text });
                }
                trimmed.to_string()
            }
            ValueKind::Text => text,
        };
        self.fields.insert(keyword, FieldValue::Plain(text));
        Ok(())
    }

    /// Remove a metadata field.
    pub fn clear_field(&mut self, keyword: Keyword) -> Option<FieldValue> {
        self.pending
            .retain(|entry| entry.target != TranslationTarget::Field(keyword));
        self.fields.remove(&keyword)
    }

    /// Fields in keyword-table order.
    pub fn fields(&self) -> impl Iterator<Item = (Keyword, &FieldValue)> {
        self.fields.iter().map(|(keyword, value)| (*keyword, value))
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Add a variable.
    ///
    /// Stub variables are kept ahead of heading variables, so declaration
    /// order is stubs then headings.
    pub fn add_variable(
        &mut self,
        code: &str,
        placement: Placement,
        values: Vec<String>,
    ) -> Result<()> {
        if self.data.is_some() {
            return Err(PxError::DataAttached);
        }
        if self.variable(code).is_some() {
            return Err(PxError::DuplicateVariable {
                variable: code.to_string(),
            });
        }
        let variable = Variable::new(code, placement, values, &self.languages)?;
        let mut sizes: Vec<usize> = self.variables.iter().map(|v| v.value_codes().len()).collect();
        sizes.push(variable.value_codes().len());
        if CubeShape::new(sizes).checked_cell_count().is_none() {
            return Err(PxError::malformed_data(format!(
                "adding variable '{code}' makes the cube too large to address"
            )));
        }
        let secondary: Vec<String> = self.languages.secondary().map(str::to_string).collect();
        let mut pending = Vec::new();
        push_pending(
            &mut pending,
            TranslationTarget::VariableLabel {
                variable: code.to_string(),
            },
            &secondary,
        );
        for value in variable.value_codes() {
            push_pending(
                &mut pending,
                TranslationTarget::ValueText {
                    variable: code.to_string(),
                    code: value.clone(),
                },
                &secondary,
            );
        }
        self.pending.extend(pending);
        match placement {
            Placement::Heading => self.variables.push(variable),
            Placement::Stub => {
                let at = self
                    .variables
                    .iter()
                    .position(|v| v.placement() == Placement::Heading)
                    .unwrap_or(self.variables.len());
                self.variables.insert(at, variable);
            }
        }
        Ok(())
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, code: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.code() == code)
    }

    fn variable_mut(&mut self, code: &str) -> Result<&mut Variable> {
        self.variables
            .iter_mut()
            .find(|v| v.code() == code)
            .ok_or_else(|| PxError::unknown_variable(code))
    }

    /// Variables printed in the stub.
    pub fn stub(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .filter(|v| v.placement() == Placement::Stub)
    }

    /// Variables printed in the heading.
    pub fn heading(&self) -> impl Iterator<Item = &Variable> {
        self.variables
            .iter()
            .filter(|v| v.placement() == Placement::Heading)
    }

    pub fn set_variable_label(&mut self, variable: &str, input: impl Into<TextInput>) -> Result<()> {
        let input = input.into();
        let languages = self.languages.clone();
        let var = self.variable_mut(variable)?;
        let merged = LocalizedText::merge(Some(var.label()), &input, &languages, variable)?;
        var.set_label(merged.text.clone());
        self.track_merge(
            TranslationTarget::VariableLabel {
                variable: variable.to_string(),
            },
            &merged,
        );
        Ok(())
    }

    pub fn set_value_text(
        &mut self,
        variable: &str,
        code: &str,
        input: impl Into<TextInput>,
    ) -> Result<()> {
        let input = input.into();
        let languages = self.languages.clone();
        let var = self.variable_mut(variable)?;
        let previous = var.value_text(code).ok_or_else(|| PxError::UnknownValueCode {
            variable: variable.to_string(),
            code: code.to_string(),
        })?;
        let merged = LocalizedText::merge(Some(previous), &input, &languages, code)?;
        var.set_value_text(code, merged.text.clone());
        self.track_merge(
            TranslationTarget::ValueText {
                variable: variable.to_string(),
                code: code.to_string(),
            },
            &merged,
        );
        Ok(())
    }

    /// Set or clear the elimination value code of a variable.
    pub fn set_elimination(&mut self, variable: &str, code: Option<&str>) -> Result<()> {
        let var = self.variable_mut(variable)?;
        if let Some(code) = code
            && var.position_of(code).is_none()
        {
            return Err(PxError::UnknownValueCode {
                variable: variable.to_string(),
                code: code.to_string(),
            });
        }
        var.set_elimination(code.map(str::to_string));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Classification bindings
    // ------------------------------------------------------------------

    /// Bind a variable to a classification domain by name.
    ///
    /// The domain is resolved when the document is serialized.
    pub fn bind_domain(&mut self, variable: &str, domain: &str) -> Result<()> {
        check_text(domain)?;
        self.variable_mut(variable)?
            .set_domain(Some(domain.to_string()));
        debug!(variable, domain, "bound variable to domain");
        Ok(())
    }

    /// Remove a variable's domain binding.
    pub fn unbind_domain(&mut self, variable: &str) -> Result<()> {
        self.variable_mut(variable)?.set_domain(None);
        Ok(())
    }

    /// Resolve every binding against `resolver`.
    pub fn check_bindings(&self, resolver: &dyn DomainResolver) -> Result<()> {
        for variable in &self.variables {
            let Some(domain) = variable.domain() else {
                continue;
            };
            check_binding(variable, domain, resolver).map_err(|err| match err {
                PxError::UnknownDomain { domain } => PxError::UnresolvedDomain {
                    variable: variable.code().to_string(),
                    domain,
                },
                other => other,
            })?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Shape of the cube over all variables in declaration order.
    pub fn shape(&self) -> CubeShape {
        CubeShape::new(self.variables.iter().map(|v| v.value_codes().len()).collect())
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Cell values in cross-product order.
    pub fn data(&self) -> Option<&[Option<f64>]> {
        self.data.as_deref()
    }

    /// Replace all cells at once.
    pub fn set_data(&mut self, values: Vec<Option<f64>>) -> Result<()> {
        let expected = self
            .shape()
            .checked_cell_count()
            .ok_or_else(|| PxError::malformed_data("cube too large to address"))?;
        if values.len() != expected {
            return Err(PxError::malformed_data(format!(
                "expected {expected} cells, got {}",
                values.len()
            )));
        }
        if let Some(value) = values.iter().flatten().find(|v| !v.is_finite()) {
            return Err(PxError::NonFiniteValue { value: *value });
        }
        self.data = Some(values);
        Ok(())
    }

    /// Attach a cube of missing cells.
    pub fn init_data(&mut self) {
        self.data = Some(vec![None; self.shape().cell_count()]);
    }

    /// Drop the data cube, unfreezing the variable structure.
    pub fn detach_data(&mut self) -> Option<Vec<Option<f64>>> {
        self.data.take()
    }

    /// Flat index of the cell addressed by one value code per variable.
    pub fn cell_index(&self, codes: &[&str]) -> Result<usize> {
        if codes.len() != self.variables.len() {
            return Err(PxError::malformed_data(format!(
                "expected {} codes, got {}",
                self.variables.len(),
                codes.len()
            )));
        }
        let mut coordinate = Vec::with_capacity(codes.len());
        for (variable, code) in self.variables.iter().zip(codes) {
            let position = variable
                .position_of(code)
                .ok_or_else(|| PxError::UnknownValueCode {
                    variable: variable.code().to_string(),
                    code: (*code).to_string(),
                })?;
            coordinate.push(position);
        }
        self.shape()
            .index_of(&coordinate)
            .ok_or_else(|| PxError::malformed_data("coordinate out of range"))
    }

    /// Value codes addressing the cell at `index`.
    pub fn cell_codes(&self, index: usize) -> Option<Vec<&str>> {
        let coordinate = self.shape().coordinate_of(index)?;
        Some(
            self.variables
                .iter()
                .zip(coordinate)
                .map(|(variable, position)| variable.value_codes()[position].as_str())
                .collect(),
        )
    }

    pub fn cell(&self, codes: &[&str]) -> Result<Option<f64>> {
        let index = self.cell_index(codes)?;
        let data = self.data.as_ref().ok_or(PxError::MissingData)?;
        Ok(data[index])
    }

    /// Set one cell, attaching an empty cube first if needed.
    pub fn set_cell(&mut self, codes: &[&str], value: Option<f64>) -> Result<()> {
        if let Some(v) = value
            && !v.is_finite()
        {
            return Err(PxError::NonFiniteValue { value: v });
        }
        let index = self.cell_index(codes)?;
        if self.data.is_none() {
            self.init_data();
        }
        if let Some(data) = self.data.as_mut() {
            data[index] = value;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Supplied languages are translated; seeded ones now hold a copy.
    fn track_merge(&mut self, target: TranslationTarget, merged: &MergedText) {
        for language in &merged.supplied {
            self.pending.remove(&PendingTranslation {
                target: target.clone(),
                language: language.clone(),
            });
        }
        for language in &merged.seeded {
            debug!(target = ?target, language = %language, "pending translation");
            self.pending.insert(PendingTranslation {
                target: target.clone(),
                language: language.clone(),
            });
        }
    }
}

/// Check one variable against the classification bound to `domain`.
///
/// Fails with `UnknownDomain` when the resolver has no such domain.
pub fn check_binding(
    variable: &Variable,
    domain: &str,
    resolver: &dyn DomainResolver,
) -> Result<()> {
    let codes = resolver
        .value_codes(domain)
        .ok_or_else(|| PxError::UnknownDomain {
            domain: domain.to_string(),
        })?;
    let missing: Vec<String> = codes
        .into_iter()
        .filter(|code| variable.position_of(code).is_none())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PxError::InvalidBinding {
            variable: variable.code().to_string(),
            domain: domain.to_string(),
            missing,
        })
    }
}

fn push_pending(pending: &mut Vec<PendingTranslation>, target: TranslationTarget, added: &[String]) {
    for language in added {
        pending.push(PendingTranslation {
            target: target.clone(),
            language: language.clone(),
        });
    }
}
