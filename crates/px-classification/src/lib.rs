//! Classification store for PX variables.
//!
//! Classifications are built from validated rows, kept in a
//! [`ClassificationStore`] keyed by domain, referenced from documents by
//! domain name, and exported as PX-web `.vs`/`.agg` artifacts.

mod classification;
mod export;
mod store;

pub use classification::{Classification, ClassificationRow};
pub use export::{
    ExportedArtifacts, artifact_names, export_classification, render_aggregation, render_control,
};
pub use store::ClassificationStore;
