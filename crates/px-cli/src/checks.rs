//! Running a validation plan against a table provider.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info_span;

use px_core::regroup_by_classification;
use px_ingest::{Filters, TableProvider, apply_filters};
use px_validate::{ComparisonSpec, ValidationResult, validate};

use crate::build::load_named_classification;
use crate::config::{CheckConfig, ValidationPlan};

/// Result of one configured check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub left: String,
    pub right: String,
    pub fatal: bool,
    #[serde(flatten)]
    pub result: ValidationResult,
}

impl CheckOutcome {
    /// Failed and marked fatal.
    pub fn blocks(&self) -> bool {
        self.fatal && !self.result.passed()
    }
}

/// Run every check of `plan` in order.
pub fn run_plan(provider: &dyn TableProvider, plan: &ValidationPlan) -> Result<Vec<CheckOutcome>> {
    plan.checks
        .iter()
        .map(|check| run_check(provider, plan, check))
        .collect()
}

/// Fetch both sides, regroup the left side if asked, and compare.
pub fn run_check(
    provider: &dyn TableProvider,
    plan: &ValidationPlan,
    check: &CheckConfig,
) -> Result<CheckOutcome> {
    let span = info_span!("check", name = %check.name);
    let _guard = span.enter();

    let filters = check.filters();
    let right = provider
        .fetch(&check.right, &filters)
        .with_context(|| format!("fetch reference table '{}'", check.right))?;

    let left = match &check.regroup {
        None => provider
            .fetch(&check.left, &filters)
            .with_context(|| format!("fetch table '{}'", check.left))?,
        Some(regroup) => {
            // Filters on the regrouped column name coarse groups, so they
            // apply after summing.
            let (after, before): (Filters, Filters) = filters
                .into_iter()
                .partition(|(column, _)| *column == regroup.column);
            let fine = provider
                .fetch(&check.left, &before)
                .with_context(|| format!("fetch table '{}'", check.left))?;
            let classification =
                load_named_classification(&plan.resolve(&regroup.classification))?;
            let coarse = regroup_by_classification(
                &fine,
                &regroup.column,
                &classification,
                &regroup.aggregation,
                &[check.left_value.as_str()],
            )
            .with_context(|| format!("regroup '{}' by {}", regroup.column, regroup.aggregation))?;
            apply_filters(&coarse, &after, &check.left)?
        }
    };

    let spec = ComparisonSpec::new(check.keys.iter().cloned(), &check.left_value, check.threshold)
        .with_right_value(check.right_value());
    let result = validate(&left, &right, &spec)
        .with_context(|| format!("compare '{}' with '{}'", check.left, check.right))?;

    Ok(CheckOutcome {
        name: check.name.clone(),
        left: check.left.clone(),
        right: check.right.clone(),
        fatal: check.fatal,
        result,
    })
}
