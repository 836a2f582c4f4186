//! Active languages and language-scoped text.
//!
//! A [`LocalizedText`] always carries exactly one entry per language of the
//! owning document's [`LanguageSet`]. The set only ever grows; new languages
//! are seeded with the primary language's text so that translators always
//! have something to edit.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{PxError, Result, check_text};

/// Ordered set of active languages with one primary language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSet {
    codes: Vec<String>,
    primary: String,
}

/// Outcome of a validated language change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTransition {
    /// The language set after the change.
    pub next: LanguageSet,
    /// Languages that were not active before, in the new set's order.
    pub added: Vec<String>,
}

impl LanguageSet {
    /// Create a single-language set.
    pub fn new(primary: impl Into<String>) -> Result<Self> {
        let primary = primary.into();
        validate_tag(&primary)?;
        Ok(Self {
            codes: vec![primary.clone()],
            primary,
        })
    }

    /// Create a set from an ordered list of tags.
    pub fn from_codes(codes: &[String], primary: &str) -> Result<Self> {
        if codes.is_empty() {
            return Err(PxError::invalid_transition("language list is empty"));
        }
        let mut seen = BTreeSet::new();
        for code in codes {
            validate_tag(code)?;
            if !seen.insert(code.as_str()) {
                return Err(PxError::invalid_transition(format!(
                    "language '{code}' is listed twice"
                )));
            }
        }
        if !seen.contains(primary) {
            return Err(PxError::invalid_transition(format!(
                "primary language '{primary}' is not in the list"
            )));
        }
        Ok(Self {
            codes: codes.to_vec(),
            primary: primary.to_string(),
        })
    }

    /// Languages in declaration order.
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    /// The primary language tag.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Number of active languages.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Always false; a set holds at least its primary language.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Check whether a language is active.
    pub fn contains(&self, language: &str) -> bool {
        self.codes.iter().any(|code| code == language)
    }

    /// Active languages other than the primary one.
    pub fn secondary(&self) -> impl Iterator<Item = &str> {
        self.codes
            .iter()
            .map(String::as_str)
            .filter(move |code| *code != self.primary)
    }

    /// Validate a move to `codes` with `primary`.
    ///
    /// The new list must keep every current language.
    pub fn transition(&self, codes: &[String], primary: &str) -> Result<LanguageTransition> {
        let next = Self::from_codes(codes, primary)?;
        let removed: Vec<&str> = self
            .codes
            .iter()
            .filter(|code| !next.contains(code))
            .map(String::as_str)
            .collect();
        if !removed.is_empty() {
            return Err(PxError::invalid_transition(format!(
                "removing languages is not allowed: {}",
                removed.join(", ")
            )));
        }
        let added = next
            .codes
            .iter()
            .filter(|code| !self.contains(code))
            .cloned()
            .collect();
        Ok(LanguageTransition { next, added })
    }
}

fn validate_tag(tag: &str) -> Result<()> {
    let valid = !tag.is_empty()
        && tag
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(PxError::invalid_transition(format!(
            "'{tag}' is not a valid language tag"
        )))
    }
}

/// Text with one entry per active language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    /// Same text under every active language.
    pub fn uniform(languages: &LanguageSet, text: &str) -> Self {
        Self(
            languages
                .codes()
                .iter()
                .map(|code| (code.clone(), text.to_string()))
                .collect(),
        )
    }

    /// Text for one language.
    pub fn get(&self, language: &str) -> Option<&str> {
        self.0.get(language).map(String::as_str)
    }

    /// Text for the primary language of `languages`.
    pub fn primary<'a>(&'a self, languages: &LanguageSet) -> &'a str {
        self.get(languages.primary()).unwrap_or_default()
    }

    /// Iterate `(language, text)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Languages that have an entry.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, language: &str, text: &str) {
        self.0.insert(language.to_string(), text.to_string());
    }

    /// Copy the `primary` entry under every language in `added`.
    pub(crate) fn extend_from(&mut self, primary: &str, added: &[String]) {
        let seed = self.0.get(primary).cloned().unwrap_or_default();
        for language in added {
            self.0.insert(language.clone(), seed.clone());
        }
    }

    /// Build the value resulting from applying `input` on top of `previous`.
    ///
    /// Languages missing from both `input` and `previous` are filled with
    /// the input's primary text (or its first text in set order).
    pub fn merge(
        previous: Option<&LocalizedText>,
        input: &TextInput,
        languages: &LanguageSet,
        context: &str,
    ) -> Result<MergedText> {
        match input {
            TextInput::Plain(text) => {
                check_text(text)?;
                Ok(MergedText {
                    text: Self::uniform(languages, text),
                    supplied: languages.codes().to_vec(),
                    seeded: Vec::new(),
                })
            }
            TextInput::Localized(values) => {
                for (language, text) in values {
                    if !languages.contains(language) {
                        return Err(PxError::unknown_language(language));
                    }
                    check_text(text)?;
                }
                let seed = values
                    .get(languages.primary())
                    .or_else(|| {
                        languages
                            .codes()
                            .iter()
                            .find_map(|code| values.get(code))
                    })
                    .cloned();
                let mut merged = BTreeMap::new();
                let mut supplied = Vec::new();
                let mut seeded = Vec::new();
                for language in languages.codes() {
                    let text = if let Some(text) = values.get(language) {
                        supplied.push(language.clone());
                        text
                    } else if let Some(text) = previous.and_then(|p| p.0.get(language)) {
                        text
                    } else if let Some(text) = seed.as_ref() {
                        if language != languages.primary() {
                            seeded.push(language.clone());
                        }
                        text
                    } else {
                        return Err(PxError::MissingField {
                            keyword: context.to_string(),
                        });
                    };
                    merged.insert(language.clone(), text.clone());
                }
                Ok(MergedText {
                    text: Self(merged),
                    supplied,
                    seeded,
                })
            }
        }
    }
}

/// Outcome of [`LocalizedText::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedText {
    pub text: LocalizedText,
    /// Languages the input named explicitly.
    pub supplied: Vec<String>,
    /// Secondary languages that received a copy of another language's text.
    pub seeded: Vec<String>,
}

/// Caller-supplied text for a field, label or value text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextInput {
    /// One text for every language (or the value of a plain field).
    Plain(String),
    /// Text per language; omitted languages keep their previous value.
    Localized(BTreeMap<String, String>),
}

impl TextInput {
    /// Build a per-language input from `(language, text)` pairs.
    pub fn localized<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Localized(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<&str> for TextInput {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_string())
    }
}

impl From<String> for TextInput {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}
