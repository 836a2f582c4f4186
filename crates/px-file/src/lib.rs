//! PX-file reader and writer.
//!
//! A PX file is a sequence of `KEYWORD[lang]("arg")=value;` records followed
//! by a `DATA` block. This crate turns a [`px_model::Document`] into that text
//! and back.
//!
//! # Features
//!
//! - Metadata written straight from the keyword table in [`px_model::Keyword`]
//! - Primary language unsuffixed, other languages as `KEYWORD[lang]`
//! - Classification domains checked through a [`px_model::DomainResolver`]
//! - Data in cross-product order, one line per stub combination, `".."` for
//!   missing cells
//! - Lines wrapped at 256 characters, long strings split into adjacent
//!   quoted chunks
//!
//! # Example
//!
//! ```
//! use px_file::{parse, serialize};
//! use px_model::{Document, Keyword, NoDomains, Placement};
//!
//! let mut doc = Document::new("en").unwrap();
//! for (keyword, text) in [
//!     (Keyword::Decimals, "0"),
//!     (Keyword::Matrix, "POP01"),
//!     (Keyword::SubjectCode, "BE"),
//!     (Keyword::SubjectArea, "Population"),
//!     (Keyword::Contents, "Population"),
//!     (Keyword::Title, "Population by sex"),
//!     (Keyword::Units, "persons"),
//! ] {
//!     doc.set_field(keyword, text).unwrap();
//! }
//! doc.add_variable("sex", Placement::Stub, vec!["1".into(), "2".into()]).unwrap();
//! doc.set_data(vec![Some(10.0), None]).unwrap();
//!
//! let bytes = serialize(&doc, &NoDomains).unwrap();
//! assert_eq!(parse(&bytes).unwrap(), doc);
//! ```

mod reader;
mod token;
mod writer;

pub use reader::{parse, read_px};
pub use writer::{MAX_LINE, serialize, write_px};
