//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All messages meant for the person running the CLI go through this
//! module so quiet mode is honored in one place. A graph written to stdout
//! is the only thing printed there; messages go to stderr.

pub mod output;
