//! Error types for PX document, classification and codec operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building, mutating, serializing or parsing PX data.
///
/// Every mutating operation that returns one of these leaves its target
/// untouched.
#[derive(Debug, Error)]
pub enum PxError {
    /// A value code appears more than once where codes must be unique.
    #[error("duplicate code '{code}' in {context}")]
    DuplicateCode { code: String, context: String },

    /// An aggregation column has no group for some value codes.
    #[error("aggregation '{aggregation}' has no group for codes: {}", .codes.join(", "))]
    IncompleteAggregation {
        aggregation: String,
        codes: Vec<String>,
    },

    /// No classification with this domain is known at bind time.
    #[error("unknown classification domain '{domain}'")]
    UnknownDomain { domain: String },

    /// A bound domain could not be resolved when the document was serialized.
    #[error("variable '{variable}' references unresolved domain '{domain}'")]
    UnresolvedDomain { variable: String, domain: String },

    /// The classification lists codes the bound variable does not carry.
    #[error(
        "variable '{variable}' does not cover domain '{domain}' codes: {}",
        .missing.join(", ")
    )]
    InvalidBinding {
        variable: String,
        domain: String,
        missing: Vec<String>,
    },

    /// A language tag outside the active set was supplied.
    #[error("language '{language}' is not active in this document")]
    UnknownLanguage { language: String },

    /// The requested language set cannot replace the current one.
    #[error("invalid language transition: {reason}")]
    InvalidLanguageTransition { reason: String },

    /// A mandatory keyword is absent or a header record is broken.
    #[error("malformed PX header: {message}")]
    MalformedHeader { message: String },

    /// The DATA block does not match the declared cube.
    #[error("malformed PX data: {message}")]
    MalformedData { message: String },

    /// A keyword carries a language suffix not declared in LANGUAGES.
    #[error("keyword {keyword} uses undeclared language '{language}'")]
    LanguageMismatch { keyword: String, language: String },

    /// A mandatory field has not been set before serialization.
    #[error("mandatory keyword {keyword} is not set")]
    MissingField { keyword: String },

    /// Serialization was requested before data was attached.
    #[error("no data attached to the document")]
    MissingData,

    /// A per-language value was supplied for a language-independent field.
    #[error("keyword {keyword} is language independent")]
    FieldScope { keyword: String },

    /// Text that cannot be represented inside a quoted PX string.
    #[error("text {text:?} contains a quote or line break")]
    InvalidText { text: String },

    /// No variable with this code exists.
    #[error("unknown variable '{variable}'")]
    UnknownVariable { variable: String },

    /// The variable has no such value code.
    #[error("variable '{variable}' has no value code '{code}'")]
    UnknownValueCode { variable: String, code: String },

    /// A variable with this code already exists.
    #[error("duplicate variable '{variable}'")]
    DuplicateVariable { variable: String },

    /// Two data rows address the same cell.
    #[error("cell {} is given more than once", .codes.join(";"))]
    DuplicateCell { codes: Vec<String> },

    /// The variable structure is frozen once data is attached.
    #[error("variables cannot change once data is attached")]
    DataAttached,

    /// Cells hold finite numbers or are missing.
    #[error("cell value {value} is not finite")]
    NonFiniteValue { value: f64 },

    /// File I/O error.
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temp file could not be renamed over the target.
    #[error("failed to replace {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for PX operations.
pub type Result<T> = std::result::Result<T, PxError>;

impl PxError {
    /// Create a MalformedHeader error.
    pub fn malformed_header(message: impl Into<String>) -> Self {
        Self::MalformedHeader {
            message: message.into(),
        }
    }

    /// Create a MalformedData error.
    pub fn malformed_data(message: impl Into<String>) -> Self {
        Self::MalformedData {
            message: message.into(),
        }
    }

    /// Create an InvalidLanguageTransition error.
    pub fn invalid_transition(reason: impl Into<String>) -> Self {
        Self::InvalidLanguageTransition {
            reason: reason.into(),
        }
    }

    /// Create an UnknownLanguage error.
    pub fn unknown_language(language: impl Into<String>) -> Self {
        Self::UnknownLanguage {
            language: language.into(),
        }
    }

    /// Create an UnknownVariable error.
    pub fn unknown_variable(variable: impl Into<String>) -> Self {
        Self::UnknownVariable {
            variable: variable.into(),
        }
    }

    /// Create an Io error for the given operation and path.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Reject text that cannot live inside a quoted PX string.
pub fn check_text(text: &str) -> Result<()> {
    if text.contains(['"', '\n', '\r']) {
        return Err(PxError::InvalidText {
            text: text.to_string(),
        });
    }
    Ok(())
}
