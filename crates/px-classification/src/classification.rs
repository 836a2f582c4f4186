//! Classifications (selection lists) with alternative groupings.
//!
//! A classification lists the value codes of a variable together with one
//! or more aggregations. Each aggregation assigns every value code to a
//! group, which lets PX-web users re-aggregate the variable on the fly.
//!
//! ## Example: single ages
//!
//! ```text
//! valuecode  valuetext   5-year groups  adults
//! 0          0 years     0-4            0-17
//! 1          1 year      0-4            0-17
//! ...
//! 18         18 years    15-19          18+
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use px_model::{PxError, Result, check_text};

/// One value code with its text and group per aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRow {
    pub valuecode: String,
    pub valuetext: String,
    /// `(aggregation name, group label)` in column order.
    pub groups: Vec<(String, String)>,
}

impl ClassificationRow {
    pub fn new(valuecode: impl Into<String>, valuetext: impl Into<String>) -> Self {
        Self {
            valuecode: valuecode.into(),
            valuetext: valuetext.into(),
            groups: Vec::new(),
        }
    }

    /// Assign this code to `label` under `aggregation`.
    #[must_use]
    pub fn group(mut self, aggregation: impl Into<String>, label: impl Into<String>) -> Self {
        self.groups.push((aggregation.into(), label.into()));
        self
    }

    fn group_label(&self, aggregation: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(name, _)| name == aggregation)
            .map(|(_, label)| label.as_str())
            .filter(|label| !label.trim().is_empty())
    }
}

/// A validated classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    name: String,
    presentation_text: String,
    domain: String,
    aggregations: Vec<String>,
    rows: Vec<ClassificationRow>,
}

impl Classification {
    /// Validate rows and build a classification.
    ///
    /// Value codes must be unique and every aggregation column must assign
    /// a group to every code.
    pub fn build(
        name: &str,
        presentation_text: &str,
        domain: &str,
        rows: Vec<ClassificationRow>,
    ) -> Result<Self> {
        validate_name(name)?;
        check_text(presentation_text)?;
        check_text(domain)?;
        if domain.trim().is_empty() {
            return Err(PxError::InvalidText {
                text: domain.to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        let mut aggregations: Vec<String> = Vec::new();
        for row in &rows {
            check_text(&row.valuecode)?;
            check_text(&row.valuetext)?;
            if !seen.insert(row.valuecode.as_str()) {
                return Err(PxError::DuplicateCode {
                    code: row.valuecode.clone(),
                    context: format!("classification '{name}'"),
                });
            }
            for (aggregation, label) in &row.groups {
                check_text(aggregation)?;
                check_text(label)?;
                if !aggregations.contains(aggregation) {
                    aggregations.push(aggregation.clone());
                }
            }
        }

        for aggregation in &aggregations {
            let missing: Vec<String> = rows
                .iter()
                .filter(|row| row.group_label(aggregation).is_none())
                .map(|row| row.valuecode.clone())
                .collect();
            if !missing.is_empty() {
                return Err(PxError::IncompleteAggregation {
                    aggregation: aggregation.clone(),
                    codes: missing,
                });
            }
        }

        Ok(Self {
            name: name.to_string(),
            presentation_text: presentation_text.to_string(),
            domain: domain.to_string(),
            aggregations,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn presentation_text(&self) -> &str {
        &self.presentation_text
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Aggregation names in column order.
    pub fn aggregations(&self) -> &[String] {
        &self.aggregations
    }

    pub fn rows(&self) -> &[ClassificationRow] {
        &self.rows
    }

    /// Value codes in row order.
    pub fn value_codes(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.valuecode.clone()).collect()
    }

    /// Map from value code to group label for one aggregation.
    pub fn grouping(&self, aggregation: &str) -> Option<BTreeMap<String, String>> {
        if !self.aggregations.iter().any(|a| a == aggregation) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .filter_map(|row| {
                    row.group_label(aggregation)
                        .map(|label| (row.valuecode.clone(), label.to_string()))
                })
                .collect(),
        )
    }

    /// Groups of one aggregation in first-seen order with their members.
    pub fn groups(&self, aggregation: &str) -> Vec<(String, Vec<String>)> {
        let mut groups: Vec<(String, Vec<String>)> = Vec::new();
        for row in &self.rows {
            let Some(label) = row.group_label(aggregation) else {
                continue;
            };
            match groups.iter_mut().find(|(name, _)| name == label) {
                Some((_, members)) => members.push(row.valuecode.clone()),
                None => groups.push((label.to_string(), vec![row.valuecode.clone()])),
            }
        }
        groups
    }
}

/// Names become file names, so path separators are not allowed.
fn validate_name(name: &str) -> Result<()> {
    check_text(name)?;
    if name.trim().is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PxError::InvalidText {
            text: name.to_string(),
        });
    }
    Ok(())
}
