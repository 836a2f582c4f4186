//! Declared PX metadata keywords.
//!
//! The codec walks [`Keyword::ALL`] in order, so a new metadata keyword only
//! needs a variant and a row in [`Keyword::spec`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether a keyword holds one value or one value per language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Plain,
    Language,
}

/// How a keyword's value is written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// Quoted string.
    Text,
    /// Bare integer.
    Integer,
}

/// Static properties of a metadata keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordSpec {
    pub name: &'static str,
    pub scope: Scope,
    pub kind: ValueKind,
    pub mandatory: bool,
    /// Written ahead of LANGUAGE.
    pub prelude: bool,
}

/// Metadata keywords settable on a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Keyword {
    Charset,
    AxisVersion,
    Codepage,
    CreationDate,
    Decimals,
    #[serde(rename = "SHOWDECIMALS")]
    ShowDecimals,
    Matrix,
    SubjectCode,
    SubjectArea,
    Contents,
    Title,
    Description,
    Units,
    Contact,
    Source,
    Note,
}

impl Keyword {
    /// Every keyword in output order.
    pub const ALL: [Keyword; 16] = [
        Keyword::Charset,
        Keyword::AxisVersion,
        Keyword::Codepage,
        Keyword::CreationDate,
        Keyword::Decimals,
        Keyword::ShowDecimals,
        Keyword::Matrix,
        Keyword::SubjectCode,
        Keyword::SubjectArea,
        Keyword::Contents,
        Keyword::Title,
        Keyword::Description,
        Keyword::Units,
        Keyword::Contact,
        Keyword::Source,
        Keyword::Note,
    ];

    pub const fn spec(self) -> KeywordSpec {
        use Scope::{Language, Plain};
        use ValueKind::{Integer, Text};
        let (name, scope, kind, mandatory, prelude) = match self {
            Keyword::Charset => ("CHARSET", Plain, Text, false, true),
            Keyword::AxisVersion => ("AXIS-VERSION", Plain, Text, false, true),
            Keyword::Codepage => ("CODEPAGE", Plain, Text, false, true),
            Keyword::CreationDate => ("CREATION-DATE", Plain, Text, false, false),
            Keyword::Decimals => ("DECIMALS", Plain, Integer, true, false),
            Keyword::ShowDecimals => ("SHOWDECIMALS", Plain, Integer, false, false),
            Keyword::Matrix => ("MATRIX", Plain, Text, true, false),
            Keyword::SubjectCode => ("SUBJECT-CODE", Plain, Text, true, false),
            Keyword::SubjectArea => ("SUBJECT-AREA", Language, Text, true, false),
            Keyword::Contents => ("CONTENTS", Language, Text, true, false),
            Keyword::Title => ("TITLE", Language, Text, true, false),
            Keyword::Description => ("DESCRIPTION", Language, Text, false, false),
            Keyword::Units => ("UNITS", Language, Text, true, false),
            Keyword::Contact => ("CONTACT", Language, Text, false, false),
            Keyword::Source => ("SOURCE", Language, Text, false, false),
            Keyword::Note => ("NOTE", Language, Text, false, false),
        };
        KeywordSpec {
            name,
            scope,
            kind,
            mandatory,
            prelude,
        }
    }

    /// Keyword as written in the file.
    pub const fn name(self) -> &'static str {
        self.spec().name
    }

    pub const fn is_language_scoped(self) -> bool {
        matches!(self.spec().scope, Scope::Language)
    }

    pub const fn is_mandatory(self) -> bool {
        self.spec().mandatory
    }

    /// Look a keyword up by its file name.
    pub fn from_name(name: &str) -> Option<Keyword> {
        Self::ALL.into_iter().find(|keyword| keyword.name() == name)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Keyword {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Keyword::from_name(&s.trim().to_ascii_uppercase())
            .ok_or_else(|| format!("unknown keyword: {s}"))
    }
}
