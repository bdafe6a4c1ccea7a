//! jmx-collect library
//!
//! This crate reads JMX collection files written in either the native
//! `collect:` dialect or the legacy agent `jmx:` dialect and normalizes them
//! into [`model::DomainDefinition`] requests for a JMX query engine.

pub mod cli;
pub mod collect;
pub mod config;
pub mod dialect;
pub mod error;
pub mod model;
pub mod naming;
pub mod pattern;
pub mod report;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use dialect::{Dialect, DialectRegistry, ParsedFile};
pub use error::{ParseError, ParseResult};
pub use model::{AttributeRequest, BeanRequest, DomainDefinition, MetricType};

/// Initialize the logging subsystem
///
/// # Arguments
/// * `level` - Log level string (trace, debug, info, warn, error)
///
/// # Errors
/// Returns an error if the logging system fails to initialize
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
