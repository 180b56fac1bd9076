//! Command line front end of `swapquote-core`.
pub mod cli;
pub mod config;
pub mod errors;
pub mod report;
pub mod request;

pub use errors::CliError;
