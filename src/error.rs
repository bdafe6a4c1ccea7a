//! Error types for jmx-collect
//!
//! This module defines the error types used throughout the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::dialect::Dialect;

/// Collection file parsing errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// No registered dialect accepts the input
    #[error("No registered dialect accepts collection file '{source_name}'")]
    DialectNotFound { source_name: String },

    /// Structurally invalid document for the selected dialect
    #[error("Invalid {dialect} document: {source}")]
    Schema {
        dialect: Dialect,
        #[source]
        source: serde_yaml::Error,
    },

    /// Semantically invalid document
    #[error("Validation failed for {context}: {reason}")]
    Validation { context: String, reason: String },

    /// An attribute or exclude selector is not a valid pattern
    #[error("Invalid pattern '{selector}' for {context}: {source}")]
    PatternCompile {
        selector: String,
        context: String,
        #[source]
        source: regex::Error,
    },

    /// Collection files must be given as absolute paths
    #[error("Invalid collection file path '{}': collection files must be specified as absolute paths", .path.display())]
    RelativePath { path: PathBuf },

    /// The collection file could not be read
    #[error("Failed to read collection file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any of the above, tagged with the file that produced it
    #[error("Failed to parse collection file '{}': {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Build a validation error for the given context
    pub fn validation(context: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::Validation {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Attach file identity to an error
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // Already tagged
            err @ ParseError::InFile { .. } => err,
            err => ParseError::InFile {
                path: path.into(),
                source: Box::new(err),
            },
        }
    }

    /// The underlying error, with any file tagging removed
    pub fn root(&self) -> &ParseError {
        match self {
            ParseError::InFile { source, .. } => source.root(),
            err => err,
        }
    }

    /// Whether the error was caused by a selector failing to compile
    pub fn is_pattern_error(&self) -> bool {
        matches!(self.root(), ParseError::PatternCompile { .. })
    }

    /// Whether the error was a semantic validation failure
    pub fn is_validation_error(&self) -> bool {
        matches!(self.root(), ParseError::Validation { .. })
    }
}

/// Dialect registry construction errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// No dialects were registered
    #[error("At least one dialect must be registered")]
    Empty,

    /// A dialect that accepts every input was registered before another dialect
    #[error("Fallback dialect '{dialect}' is registered at position {position} but must be last")]
    FallbackNotLast { dialect: Dialect, position: usize },

    /// The same dialect was registered twice
    #[error("Dialect '{0}' is registered more than once")]
    Duplicate(Dialect),
}

/// Errors raised across the query engine boundary
#[derive(Error, Debug)]
pub enum CollectError {
    /// Opening the JMX connection failed
    #[error("Failed to open JMX connection to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    /// Querying beans failed
    #[error("JMX query '{query}' failed: {reason}")]
    Query { query: String, reason: String },
}

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;
