//! Classifications keyed by domain.

use std::collections::BTreeMap;

use tracing::warn;

use px_model::{Document, DomainResolver, PxError, Result, check_binding};

use crate::classification::Classification;

/// Registry of classifications available to documents.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStore {
    by_domain: BTreeMap<String, Classification>,
}

impl ClassificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a classification, replacing any previous one for the same domain.
    pub fn insert(&mut self, classification: Classification) -> Option<Classification> {
        let replaced = self
            .by_domain
            .insert(classification.domain().to_string(), classification);
        if let Some(previous) = &replaced {
            warn!(
                domain = previous.domain(),
                name = previous.name(),
                "replaced classification"
            );
        }
        replaced
    }

    pub fn get(&self, domain: &str) -> Option<&Classification> {
        self.by_domain.get(domain)
    }

    /// Remove a classification. Documents bound to it keep their binding.
    pub fn remove(&mut self, domain: &str) -> Option<Classification> {
        self.by_domain.remove(domain)
    }

    pub fn len(&self) -> usize {
        self.by_domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_domain.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Classification> {
        self.by_domain.values()
    }

    /// Bind `variable` to `domain`, requiring the domain to exist now.
    ///
    /// The binding is checked again when the document is serialized.
    pub fn bind_variable(&self, document: &mut Document, variable: &str, domain: &str) -> Result<()> {
        let var = document
            .variable(variable)
            .ok_or_else(|| PxError::unknown_variable(variable))?;
        check_binding(var, domain, self)?;
        document.bind_domain(variable, domain)
    }
}

impl DomainResolver for ClassificationStore {
    fn value_codes(&self, domain: &str) -> Option<Vec<String>> {
        self.get(domain).map(Classification::value_codes)
    }
}
