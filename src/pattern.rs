//! Attribute and exclude pattern construction
//!
//! Attribute selectors are compiled into patterns that are matched against
//! the query engine's serialized attribute key, which always ends with
//! `attr=<attribute name>`. Every pattern is therefore anchored at the end
//! and prefixed with `attr=`.
//!
//! # Example
//!
//! ```ignore
//! use jmx_collect::pattern::attribute_regex;
//!
//! let r = attribute_regex("HeapMemoryUsage", true)?;
//! assert!(r.is_match("java.lang:type=Memory,attr=HeapMemoryUsage"));
//! ```

use regex::Regex;

use crate::error::{ParseError, ParseResult};

/// Pattern matching every attribute
pub const MATCH_ALL: &str = ".*";

/// Build the anchored attribute pattern for a selector
///
/// When `literal` is true every regex metacharacter in `selector` is
/// escaped first; otherwise the selector is used as a pattern fragment.
///
/// # Errors
///
/// Returns the compile error when the resulting pattern is not valid regex.
pub fn attribute_regex(selector: &str, literal: bool) -> Result<Regex, regex::Error> {
    let fragment = if literal {
        regex::escape(selector)
    } else {
        selector.to_string()
    };

    Regex::new(&format!("attr={}$", fragment))
}

/// How an attribute is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// Exact attribute name
    Literal(String),
    /// User supplied pattern fragment
    Pattern(String),
}

impl AttributeSelector {
    /// Selector matching every attribute of a bean
    pub fn all() -> Self {
        AttributeSelector::Pattern(MATCH_ALL.to_string())
    }

    /// Raw selector text
    pub fn as_str(&self) -> &str {
        match self {
            AttributeSelector::Literal(s) | AttributeSelector::Pattern(s) => s,
        }
    }

    /// Compile into an anchored attribute pattern
    ///
    /// `context` names the attribute or bean the selector came from and is
    /// carried into the error.
    pub fn compile(&self, context: &str) -> ParseResult<Regex> {
        let (selector, literal) = match self {
            AttributeSelector::Literal(s) => (s, true),
            AttributeSelector::Pattern(s) => (s, false),
        };

        attribute_regex(selector, literal).map_err(|source| ParseError::PatternCompile {
            selector: selector.clone(),
            context: context.to_string(),
            source,
        })
    }
}

/// Decoded shape of a bean's exclude patterns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExcludeSpec {
    /// No exclusions
    #[default]
    Absent,
    /// A single pattern
    Single(String),
    /// A list of patterns
    Many(Vec<String>),
}

/// Compile a bean exclude pattern as written, without anchoring
pub fn exclude_regex(pattern: &str, context: &str) -> ParseResult<Regex> {
    Regex::new(pattern).map_err(|source| ParseError::PatternCompile {
        selector: pattern.to_string(),
        context: context.to_string(),
        source,
    })
}
