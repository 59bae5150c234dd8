//! Output management for CLI commands.
//!
//! Handles formatting and display for the text, JSON and prompt formats,
//! providing a unified interface for every command.

use crate::error::RetrievalError;
use crate::io::exit_code::ExitCode;
use crate::io::format::{JsonResponse, OutputFormat, ResponseMeta};
use crate::retrieve::{RetrievalResult, format_context};
use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};
use std::time::Duration;

/// Manages output formatting and display.
pub struct OutputManager {
    format: OutputFormat,
    stdout: Box<dyn Write>,
    stderr: Box<dyn Write>,
}

impl OutputManager {
    /// Create a new output manager with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
        }
    }

    /// Create an output manager with custom writers.
    pub fn new_with_writers(
        format: OutputFormat,
        stdout: Box<dyn Write>,
        stderr: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            stdout,
            stderr,
        }
    }

    /// Output a successful result.
    ///
    /// In JSON mode, wraps the data in a success response.
    /// Otherwise displays the data using its Display implementation.
    pub fn success<T>(&mut self, data: T) -> io::Result<ExitCode>
    where
        T: Serialize + Display,
    {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::success(&data);
                writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text | OutputFormat::Prompt => {
                writeln!(self.stdout, "{data}")?;
            }
        }
        Ok(ExitCode::Success)
    }

    /// Output retrieval results for `query`.
    ///
    /// An empty result set is reported as not found.
    pub fn results(
        &mut self,
        query: &str,
        results: &[RetrievalResult],
        elapsed: Duration,
    ) -> io::Result<ExitCode> {
        if results.is_empty() {
            return self.not_found(query);
        }

        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::success(results)
                    .with_meta(ResponseMeta::now(elapsed.as_millis() as u64));
                writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Prompt => {
                writeln!(self.stdout, "{}", format_context(results))?;
            }
            OutputFormat::Text => {
                for (i, result) in results.iter().enumerate() {
                    writeln!(self.stdout, "Result {}:", i + 1)?;
                    writeln!(self.stdout, "Sentence: {}", result.sentence)?;
                    writeln!(self.stdout, "Story Title: {}", result.story_title)?;
                    writeln!(self.stdout, "Distance: {}", result.distance)?;
                    writeln!(self.stdout)?;
                }
            }
        }
        Ok(ExitCode::Success)
    }

    /// Output a not found result.
    pub fn not_found(&mut self, query: &str) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::not_found(query);
                writeln!(self.stdout, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text | OutputFormat::Prompt => {
                writeln!(self.stderr, "No sentences found for '{query}'")?;
            }
        }
        Ok(ExitCode::NotFound)
    }

    /// Output an error with suggestions.
    pub fn error(&mut self, error: &RetrievalError) -> io::Result<ExitCode> {
        match self.format {
            OutputFormat::Json => {
                let response = JsonResponse::from_error(error);
                writeln!(self.stderr, "{}", serde_json::to_string_pretty(&response)?)?;
            }
            OutputFormat::Text | OutputFormat::Prompt => {
                writeln!(self.stderr, "Error: {error}")?;
                for suggestion in error.recovery_suggestions() {
                    writeln!(self.stderr, "  Suggestion: {suggestion}")?;
                }
            }
        }
        Ok(ExitCode::from_error(error))
    }
}
