//! Terminal display utilities for CLI output.
//!
//! Provides styled tables and themed status messages.

pub mod tables;
pub mod theme;

pub use tables::{TableBuilder, create_info_table, create_results_table};
pub use theme::{THEME, Theme};
