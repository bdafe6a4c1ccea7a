//! Event type and metric name construction
//!
//! Names produced from legacy agent files pass through [`sanitize`] so they
//! are accepted downstream: spaces become `_` and `/` becomes `:`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Event type prefix used when a legacy file has no `name`
pub const DEFAULT_EVENT_TYPE: &str = "JMXSample";

/// Separator placed between name segments
pub const METRIC_SEP: char = ':';

const SPACE_SEP: char = '_';

// Token names are ASCII word characters only
static TEMPLATE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([0-9A-Za-z_]+)\}").expect("template token pattern is valid"));

/// Replace every space with `_` and every `/` with `:`
///
/// Idempotent: neither replacement introduces a character the other one
/// rewrites.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' => SPACE_SEP,
            '/' => METRIC_SEP,
            c => c,
        })
        .collect()
}

/// Compose a legacy event type from the file name and the bean domain
pub fn legacy_event_type(config_name: &str, domain: &str) -> String {
    let prefix = if config_name.is_empty() {
        DEFAULT_EVENT_TYPE
    } else {
        config_name
    };
    sanitize(&format!("{}{}{}", prefix, METRIC_SEP, domain))
}

/// Parse a bean query into its `key=value` properties
///
/// Keys and values are taken verbatim, without trimming. A value ends at the
/// next `=`, so `a=b=c` yields `a -> b`. Entries without `=` (such as a
/// trailing `*` wildcard) are ignored, and a repeated key keeps its last
/// value.
pub fn query_properties(query: &str) -> HashMap<&str, &str> {
    let mut properties = HashMap::new();
    for pair in query.split(',') {
        let mut parts = pair.split('=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            properties.insert(key, value);
        }
    }
    properties
}

/// Substitute `{key}` tokens in `template` with properties of `query`
///
/// Tokens that name no property are left untouched.
pub fn expand_template(template: &str, query: &str) -> String {
    if !TEMPLATE_TOKEN.is_match(template) {
        return template.to_string();
    }

    let properties = query_properties(query);
    TEMPLATE_TOKEN
        .replace_all(template, |caps: &regex::Captures<'_>| {
            match properties.get(&caps[1]) {
                Some(value) => (*value).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Build the metric name for a legacy attribute
///
/// With an empty root the attribute name is returned unchanged. Otherwise
/// the root is expanded against the bean query and joined to the attribute
/// with `:`, and the result is sanitized.
pub fn legacy_metric_name(attribute: &str, root_metric_name: &str, query: &str) -> String {
    if root_metric_name.is_empty() {
        return attribute.to_string();
    }

    let root = expand_template(root_metric_name, query);
    sanitize(&format!("{}{}{}", root, METRIC_SEP, attribute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        let cases = [
            ("abc", "abc"),
            ("a b c", "a_b_c"),
            ("a/b/c", "a:b:c"),
            ("a:b:c", "a:b:c"),
            ("a_b_c", "a_b_c"),
            ("a b/c", "a_b:c"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_sanitize_idempotent() {
        for input in ["a b/c", " / ", "JVM Threads/Daemon Count", "plain", "//  //"] {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_legacy_event_type() {
        let cases = [
            ("oldName", "domainName", "oldName:domainName"),
            ("old Name", "domainName", "old_Name:domainName"),
            ("oldName", "domain Name", "oldName:domain_Name"),
            ("old Name", "domain Name", "old_Name:domain_Name"),
            (
                "old Name/metric",
                "domain Name/metric",
                "old_Name:metric:domain_Name:metric",
            ),
            ("", "domainName", "JMXSample:domainName"),
            ("", "domain Name", "JMXSample:domain_Name"),
            ("", "domain/Name", "JMXSample:domain:Name"),
            ("", "domain Name/metric", "JMXSample:domain_Name:metric"),
            ("", "domain/Name metric", "JMXSample:domain:Name_metric"),
        ];
        for (name, domain, expected) in cases {
            assert_eq!(legacy_event_type(name, domain), expected);
        }
    }

    #[test]
    fn test_query_properties() {
        let props = query_properties("type=ORB,node=*,process=*,name=*,*");
        assert_eq!(props.get("type"), Some(&"ORB"));
        assert_eq!(props.get("node"), Some(&"*"));
        assert_eq!(props.len(), 4);
    }

    #[test]
    fn test_query_properties_edge_cases() {
        // Value stops at the next '='
        let props = query_properties("a=b=c");
        assert_eq!(props.get("a"), Some(&"b"));

        // No trimming
        let props = query_properties("type=X, name = main");
        assert_eq!(props.get(" name "), Some(&" main"));
        assert_eq!(props.get("name"), None);

        // Last occurrence wins
        let props = query_properties("name=first,name=second");
        assert_eq!(props.get("name"), Some(&"second"));

        // Empty key and empty value are kept
        let props = query_properties("=x,y=");
        assert_eq!(props.get(""), Some(&"x"));
        assert_eq!(props.get("y"), Some(&""));
    }

    #[test]
    fn test_template_tokens_are_ascii() {
        assert_eq!(expand_template("{nom_1}", "nom_1=v"), "v");
        assert_eq!(expand_template("{nöm}", "nöm=v"), "{nöm}");
    }

    #[test]
    fn test_expand_template() {
        assert_eq!(expand_template("Foo{bar}", "bar=5,baz=6"), "Foo5");
        assert_eq!(expand_template("{baz}/{bar}", "bar=5,baz=6"), "6/5");
        assert_eq!(expand_template("{bar}{bar}", "bar=5"), "55");
        assert_eq!(expand_template("Foo{qux}", "bar=5"), "Foo{qux}");
        assert_eq!(expand_template("NoTokens", "bar=5"), "NoTokens");
        assert_eq!(expand_template("{name}", "type=X,*"), "{name}");
    }

    #[test]
    fn test_legacy_metric_name() {
        assert_eq!(legacy_metric_name("X", "Foo{bar}", "bar=5,baz=6"), "Foo5:X");
        assert_eq!(legacy_metric_name("Count", "", "bar=5"), "Count");
        assert_eq!(
            legacy_metric_name("Active Count", "JMX/Pool {name}", "type=Pool,name=main"),
            "JMX:Pool_main:Active_Count"
        );
    }

    #[test]
    fn test_legacy_metric_name_empty_root_is_not_sanitized() {
        assert_eq!(legacy_metric_name("a b/c", "", "x=y"), "a b/c");
    }
}
