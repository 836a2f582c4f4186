//! Library side of the PX command line tool.

pub mod build;
pub mod checks;
pub mod config;
pub mod logging;
