//! Rendering of parsed collection requests
//!
//! Produces the output of the `jmx-collect` binary in text, JSON or YAML.

use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::dialect::Dialect;
use crate::model::DomainDefinition;

/// Requests parsed from a single collection file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub domains: Vec<DomainDefinition>,
}

/// Render `reports` in the requested format
///
/// # Errors
/// Returns an error if JSON or YAML serialization fails
pub fn render(reports: &[FileReport], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(reports)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(reports)?),
    }
}

fn render_text(reports: &[FileReport]) -> String {
    let mut out = String::new();

    for report in reports {
        let _ = writeln!(out, "{} ({})", report.path.display(), report.dialect);

        for domain in &report.domains {
            let _ = writeln!(
                out,
                "  domain: {}  event_type: {}",
                domain.domain, domain.event_type
            );

            for bean in &domain.beans {
                let _ = writeln!(out, "    bean: {}", bean.bean_query);
                for exclude in &bean.exclude {
                    let _ = writeln!(out, "      exclude: {}", exclude.as_str());
                }
                for attr in &bean.attributes {
                    let name = if attr.metric_name.is_empty() {
                        "-"
                    } else {
                        attr.metric_name.as_str()
                    };
                    let metric_type = attr
                        .metric_type
                        .map(|t| t.as_str())
                        .unwrap_or("unspecified");
                    let _ = writeln!(
                        out,
                        "      attr: {}  name: {}  type: {}",
                        attr.pattern(),
                        name,
                        metric_type
                    );
                }
            }
        }
    }

    out
}
