//! PX document model.
//!
//! A [`Document`] owns the active [`LanguageSet`], the metadata fields
//! declared in [`Keyword`], the [`Variable`]s spanning the data cube and the
//! cube itself. Language-scoped text is held as [`LocalizedText`], which
//! always has an entry for every active language.
//!
//! # Example
//!
//! ```
//! use px_model::{Document, Keyword, Placement, TextInput};
//!
//! let mut doc = Document::new("no").unwrap();
//! doc.set_field(Keyword::Title, "Folkemengde").unwrap();
//! doc.add_variable("region", Placement::Stub, vec!["0301".into(), "4601".into()])
//!     .unwrap();
//!
//! doc.set_languages(&["no".to_string(), "en".to_string()], "no").unwrap();
//! assert_eq!(doc.field_text(Keyword::Title, "en"), Some("Folkemengde"));
//! assert!(!doc.pending_translations().is_empty());
//!
//! doc.set_field(Keyword::Title, TextInput::localized([("en", "Population")]))
//!     .unwrap();
//! assert_eq!(doc.field_text(Keyword::Title, "no"), Some("Folkemengde"));
//! ```

pub mod cube;
mod document;
pub mod error;
pub mod io;
pub mod keyword;
pub mod language;
mod variable;

pub use cube::CubeShape;
pub use document::{
    DomainResolver, Document, FieldValue, NoDomains, PendingTranslation, TranslationTarget,
    check_binding,
};
pub use error::{PxError, Result, check_text};
pub use io::write_atomic;
pub use keyword::{Keyword, KeywordSpec, Scope, ValueKind};
pub use language::{LanguageSet, LanguageTransition, LocalizedText, MergedText, TextInput};
pub use variable::{Placement, Variable};
