//! Query Template Preprocessing
//!
//! A query template is a YAML mapping of string fields with `{{variable}}`
//! placeholders, bound at invocation time by `key=value` arguments. The
//! substitution is strict: a placeholder with no binding is an error, never
//! silently replaced by an empty string.
//!
//! ```yaml
//! log_group_name: "/ecs/{{service}}"
//! log_stream_prefix: "{{service}}/"
//! aws_filter_pattern: "ERROR"
//! ```

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app::errors::Error;

static VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("template variable regex is valid")
});

/// The query fields a template yields, equivalent to what a manual query
/// would supply on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub log_group_name: String,
    pub log_stream_prefix: String,
    pub filter_pattern: Option<String>,
    pub output_format: Option<String>,
}

impl QueryTemplate {
    /// Reads, renders and validates a template file against `args`
    /// (`key=value` bindings).
    pub fn from_file(path: &Path, args: &[String]) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::TemplateRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&text, args)
    }

    fn parse(text: &str, args: &[String]) -> Result<Self, Error> {
        let bindings = parse_args(args)?;

        let fields: HashMap<String, String> = serde_yaml::from_str(text)?;

        let mut rendered = HashMap::with_capacity(fields.len());
        for (key, value) in fields {
            rendered.insert(key, substitute(&value, &bindings)?);
        }

        Ok(Self {
            log_group_name: take_required(&mut rendered, "log_group_name")?,
            log_stream_prefix: take_required(&mut rendered, "log_stream_prefix")?,
            filter_pattern: rendered.remove("aws_filter_pattern"),
            output_format: rendered.remove("output_format"),
        })
    }
}

fn parse_args(args: &[String]) -> Result<HashMap<String, String>, Error> {
    let mut bindings = HashMap::new();

    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| Error::InvalidQueryArgument(arg.clone()))?;
        if key.is_empty() {
            return Err(Error::InvalidQueryArgument(arg.clone()));
        }
        bindings.insert(key.to_string(), value.to_string());
    }

    Ok(bindings)
}

fn substitute(text: &str, bindings: &HashMap<String, String>) -> Result<String, Error> {
    let mut rendered = String::with_capacity(text.len());
    let mut tail_start = 0;

    for captures in VARIABLE_RE.captures_iter(text) {
        let placeholder = captures.get(0).expect("capture 0 is the whole match");
        let name = &captures[1];
        let value = bindings
            .get(name)
            .ok_or_else(|| Error::MissingTemplateArgument(name.to_string()))?;

        rendered.push_str(&text[tail_start..placeholder.start()]);
        rendered.push_str(value);
        tail_start = placeholder.end();
    }

    rendered.push_str(&text[tail_start..]);
    Ok(rendered)
}

fn take_required(fields: &mut HashMap<String, String>, name: &str) -> Result<String, Error> {
    fields
        .remove(name)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::InvalidQueryArgument(format!("{} required in template", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_substitute_replaces_bound_variables() {
        let mut bindings = HashMap::new();
        bindings.insert("service".to_string(), "checkout".to_string());

        assert_eq!(
            substitute("/ecs/{{service}}", &bindings).unwrap(),
            "/ecs/checkout"
        );
        assert_eq!(
            substitute("{{ service }}/web", &bindings).unwrap(),
            "checkout/web"
        );
    }

    #[test]
    fn test_substitute_rejects_unbound_variable() {
        let err = substitute("/ecs/{{service}}", &HashMap::new()).unwrap_err();
        assert!(matches!(err, Error::MissingTemplateArgument(name) if name == "service"));
    }

    #[test]
    fn test_parse_args_splits_on_first_equals() {
        let args = vec!["pattern=level=ERROR".to_string()];
        let bindings = parse_args(&args).unwrap();

        assert_eq!(bindings.get("pattern").map(String::as_str), Some("level=ERROR"));
    }

    #[test]
    fn test_parse_args_rejects_malformed_tokens() {
        assert!(matches!(
            parse_args(&["no-equals".to_string()]).unwrap_err(),
            Error::InvalidQueryArgument(arg) if arg == "no-equals"
        ));
        assert!(matches!(
            parse_args(&["=value".to_string()]).unwrap_err(),
            Error::InvalidQueryArgument(_)
        ));
    }

    #[test]
    fn test_parse_requires_group_and_prefix() {
        let err = QueryTemplate::parse("log_group_name: app\n", &[]).unwrap_err();
        assert!(
            matches!(err, Error::InvalidQueryArgument(msg) if msg.contains("log_stream_prefix"))
        );
    }
}
