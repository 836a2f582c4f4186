//! TOML configuration for `build` and `validate`.
//!
//! Relative paths inside a configuration file resolve against the file's
//! own directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use px_ingest::{Filters, Selection};
use px_model::{Keyword, TextInput};

/// Settings for building one PX-file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Active languages; the first is primary unless `primary` says otherwise.
    pub languages: Vec<String>,
    #[serde(default)]
    pub primary: Option<String>,
    /// Key columns in variable order.
    pub keys: Vec<String>,
    /// Key columns placed in the heading.
    #[serde(default)]
    pub heading: Vec<String>,
    #[serde(default)]
    pub totals: Vec<String>,
    #[serde(default)]
    pub total_code: Option<String>,
    /// Input holds one row per cell with this value column; without it the
    /// input is microdata and rows are counted.
    #[serde(default)]
    pub value_column: Option<String>,
    /// Metadata keyed by PX keyword name (`TITLE`, `SUBJECT-CODE`, ...).
    #[serde(default)]
    pub fields: BTreeMap<String, TextInput>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableConfig>,
    #[serde(default)]
    pub classifications: Vec<ClassificationConfig>,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Texts and binding of one variable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableConfig {
    #[serde(default)]
    pub label: Option<TextInput>,
    /// Value texts keyed by value code.
    #[serde(default)]
    pub values: BTreeMap<String, TextInput>,
    #[serde(default)]
    pub elimination: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// A classification loaded from CSV rows and exported next to the PX-file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationConfig {
    pub name: String,
    pub presentation_text: String,
    pub domain: String,
    pub rows: PathBuf,
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: Self = load_toml(path)?;
        config.base_dir = base_dir(path);
        if config.languages.is_empty() {
            bail!("{}: at least one language is required", path.display());
        }
        Ok(config)
    }

    pub fn primary(&self) -> &str {
        self.primary
            .as_deref()
            .or_else(|| self.languages.first().map(String::as_str))
            .unwrap_or_default()
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    /// Fields with their keywords resolved, in keyword order.
    pub fn keyword_fields(&self) -> Result<Vec<(Keyword, TextInput)>> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for (name, value) in &self.fields {
            let Some(keyword) = Keyword::from_name(name) else {
                bail!("unknown PX keyword '{name}' in fields");
            };
            fields.push((keyword, value.clone()));
        }
        fields.sort_by_key(|(keyword, _)| *keyword);
        Ok(fields)
    }
}

/// A list of cross-table checks.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationPlan {
    #[serde(rename = "check")]
    pub checks: Vec<CheckConfig>,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// One comparison of a produced table against a reference table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    pub name: String,
    /// Dataset path of the table under test.
    pub left: String,
    /// Dataset path of the reference table.
    pub right: String,
    pub keys: Vec<String>,
    pub left_value: String,
    /// Defaults to `left_value`.
    #[serde(default)]
    pub right_value: Option<String>,
    pub threshold: f64,
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
    #[serde(default = "default_fatal")]
    pub fatal: bool,
    #[serde(default)]
    pub regroup: Option<RegroupConfig>,
}

/// Sums the left table into a coarser classification grouping before joining.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegroupConfig {
    pub column: String,
    /// Classification rows CSV.
    pub classification: PathBuf,
    pub aggregation: String,
}

/// `"*"` keeps everything, a string or list keeps those codes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    pub fn to_selection(&self) -> Selection {
        match self {
            FilterValue::One(value) if value == "*" => Selection::All,
            FilterValue::One(value) => Selection::values([value.clone()]),
            FilterValue::Many(values) => Selection::values(values.iter().cloned()),
        }
    }
}

fn default_fatal() -> bool {
    true
}

impl CheckConfig {
    pub fn right_value(&self) -> &str {
        self.right_value.as_deref().unwrap_or(&self.left_value)
    }

    pub fn filters(&self) -> Filters {
        self.filters
            .iter()
            .map(|(column, value)| (column.clone(), value.to_selection()))
            .collect()
    }
}

impl ValidationPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let mut plan: Self = load_toml(path)?;
        plan.base_dir = base_dir(path);
        Ok(plan)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }
}

fn load_toml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

fn base_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
