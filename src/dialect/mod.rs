//! Collection file dialects
//!
//! Two grammars describe what to collect: the native `collect:` schema and
//! the legacy agent `jmx:` schema. A [`DialectRegistry`] holds the known
//! dialects in detection order and hands raw input to the first one that
//! accepts it.
//!
//! # Example
//!
//! ```ignore
//! use jmx_collect::dialect::DialectRegistry;
//!
//! let registry = DialectRegistry::standard();
//! let parsed = registry.parse_file("/etc/jmx/jvm-metrics.yml")?;
//! println!("{} domains", parsed.domains.len());
//! ```

pub mod legacy;
pub mod native;

use std::path::Path;

use serde::Serialize;

use crate::error::{ParseError, ParseResult, RegistryError};
use crate::model::DomainDefinition;

/// A supported collection file grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Legacy agent `jmx:` files
    LegacyAgent,
    /// Native `collect:` files
    Native,
}

impl Dialect {
    /// All dialects in their standard detection order
    pub const STANDARD: [Dialect; 2] = [Dialect::LegacyAgent, Dialect::Native];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::LegacyAgent => "legacy_agent",
            Dialect::Native => "native",
        }
    }

    /// Whether detection accepts every input
    pub fn is_fallback(&self) -> bool {
        matches!(self, Dialect::Native)
    }

    /// Check whether `raw` looks like this dialect
    pub fn detect(&self, raw: &str) -> bool {
        match self {
            Dialect::LegacyAgent => legacy::detect(raw),
            Dialect::Native => true,
        }
    }

    /// Decode, validate and normalize `raw`
    pub fn parse(&self, raw: &str) -> ParseResult<ParsedFile> {
        let (domains, skipped) = match self {
            Dialect::LegacyAgent => (legacy::parse(raw)?, Vec::new()),
            Dialect::Native => native::parse(raw)?,
        };

        Ok(ParsedFile {
            dialect: *self,
            domains,
            skipped,
        })
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful parse
#[derive(Debug)]
pub struct ParsedFile {
    pub dialect: Dialect,
    pub domains: Vec<DomainDefinition>,
    /// Beans dropped for a recoverable error, the rest of the file still parsed
    pub skipped: Vec<ParseError>,
}

/// Ordered list of dialects used for first-match dispatch
///
/// Built once at startup and read-only afterwards, so a shared reference can
/// be used from any number of threads.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    dialects: Vec<Dialect>,
}

impl DialectRegistry {
    /// Start building a registry
    pub fn builder() -> DialectRegistryBuilder {
        DialectRegistryBuilder::new()
    }

    /// Registry containing every dialect in standard order
    pub fn standard() -> Self {
        Self {
            dialects: Dialect::STANDARD.to_vec(),
        }
    }

    /// Registered dialects in detection order
    pub fn dialects(&self) -> &[Dialect] {
        &self.dialects
    }

    /// Select the first dialect whose detection accepts `raw`
    ///
    /// # Errors
    ///
    /// Returns `ParseError::DialectNotFound` naming `source_name` when no
    /// dialect accepts the input.
    pub fn dispatch(&self, raw: &str, source_name: &str) -> ParseResult<Dialect> {
        self.dialects
            .iter()
            .copied()
            .find(|d| d.detect(raw))
            .ok_or_else(|| ParseError::DialectNotFound {
                source_name: source_name.to_string(),
            })
    }

    /// Dispatch and parse in-memory input
    pub fn parse(&self, raw: &str, source_name: &str) -> ParseResult<ParsedFile> {
        let dialect = self.dispatch(raw, source_name)?;
        tracing::debug!(source = source_name, dialect = %dialect, "Selected dialect");
        dialect.parse(raw)
    }

    /// Read, dispatch and parse a collection file
    ///
    /// The path must be absolute. Every error, including those of skipped
    /// beans, is tagged with the file path.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> ParseResult<ParsedFile> {
        let path = path.as_ref();

        if !path.is_absolute() {
            return Err(ParseError::RelativePath {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut parsed = self
            .parse(&raw, &path.display().to_string())
            .map_err(|e| e.in_file(path))?;
        parsed.skipped = parsed
            .skipped
            .into_iter()
            .map(|e| e.in_file(path))
            .collect();
        Ok(parsed)
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder enforcing the registry ordering contract
///
/// A dialect whose detection accepts every input must come last, otherwise
/// every dialect after it would be unreachable.
#[derive(Debug, Default)]
pub struct DialectRegistryBuilder {
    dialects: Vec<Dialect>,
}

impl DialectRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a dialect to the detection order
    pub fn register(mut self, dialect: Dialect) -> Self {
        self.dialects.push(dialect);
        self
    }

    /// Validate ordering and build the registry
    pub fn build(self) -> Result<DialectRegistry, RegistryError> {
        if self.dialects.is_empty() {
            return Err(RegistryError::Empty);
        }

        let last = self.dialects.len() - 1;
        for (position, dialect) in self.dialects.iter().enumerate() {
            if self.dialects[..position].contains(dialect) {
                return Err(RegistryError::Duplicate(*dialect));
            }
            if dialect.is_fallback() && position != last {
                return Err(RegistryError::FallbackNotLast {
                    dialect: *dialect,
                    position,
                });
            }
        }

        Ok(DialectRegistry {
            dialects: self.dialects,
        })
    }
}
