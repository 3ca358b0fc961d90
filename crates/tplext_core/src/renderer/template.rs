//! Minimal line-oriented template renderer driven by the effective configuration.
//!
//! # Responsibility
//! - Turn one-construct-per-line sources into markup using configured patterns.
//! - Either execute code lines or emit them through patterns, per options.
//!
//! # Invariants
//! - Output depends only on `source` and the configuration passed in.
//! - Lines are siblings; indentation carries no nesting.

use crate::config::configuration::Configuration;
use crate::config::value::OptionValue;
use crate::extension::category::Category;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Top-level option toggling code execution.
pub const OPTION_EXECUTE_CODE: &str = "execute_code";
/// Pattern used for visible comments.
pub const PATTERN_HTML_COMMENT: &str = "html_comment";
/// Pattern used for code lines when code is not executed.
pub const PATTERN_HANDLE_CODE: &str = "handle_code";
/// Pattern used for displayed expressions when code is not executed.
pub const PATTERN_DISPLAY_CODE: &str = "display_code";

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^//(-)?\s*(.*)$").expect("valid comment regex"));
static CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-\s*(.+)$").expect("valid code regex"));
static ASSIGNMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\$([A-Za-z_]\w*)\s*=\s*(.+?)\s*;?$").expect("valid assignment regex")
});
static ELEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)(?:(=)\s*(.*)|\s+(.*))?$").expect("valid element regex")
});
static VARIABLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$([A-Za-z_]\w*)$").expect("valid variable regex"));
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").expect("valid integer regex"));
static STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(?:"([^"]*)"|'([^']*)')$"#).expect("valid string regex"));

pub type RenderResult<T> = Result<T, RenderError>;

/// Template rendering failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    UnsupportedLine { line: usize, content: String },
    UnsupportedExpression { line: usize, expression: String },
    UndefinedVariable { line: usize, name: String },
    MissingPattern(String),
    InvalidOption { name: String, expected: &'static str },
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLine { line, content } => {
                write!(f, "line {line}: unsupported syntax `{content}`")
            }
            Self::UnsupportedExpression { line, expression } => {
                write!(f, "line {line}: unsupported expression `{expression}`")
            }
            Self::UndefinedVariable { line, name } => {
                write!(f, "line {line}: undefined variable `${name}`")
            }
            Self::MissingPattern(name) => write!(f, "pattern is not configured: {name}"),
            Self::InvalidOption { name, expected } => {
                write!(f, "option `{name}` must be a {expected}")
            }
        }
    }
}

impl Error for RenderError {}

/// Renders `source` with `configuration`.
pub fn render(source: &str, configuration: &Configuration) -> RenderResult<String> {
    let execute = match configuration.option(OPTION_EXECUTE_CODE) {
        None => true,
        Some(value) => value.as_bool().ok_or_else(|| RenderError::InvalidOption {
            name: OPTION_EXECUTE_CODE.to_string(),
            expected: "bool",
        })?,
    };
    let mut context = RenderContext {
        configuration,
        execute,
        scope: BTreeMap::new(),
        output: String::new(),
    };

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        context.render_line(index + 1, line)?;
    }
    Ok(context.output)
}

struct RenderContext<'a> {
    configuration: &'a Configuration,
    execute: bool,
    scope: BTreeMap<String, String>,
    output: String,
}

impl RenderContext<'_> {
    fn render_line(&mut self, line_no: usize, line: &str) -> RenderResult<()> {
        if let Some(captures) = COMMENT_RE.captures(line) {
            if captures.get(1).is_none() {
                let text = captures.get(2).map_or("", |m| m.as_str()).trim_end();
                let comment = self.pattern(PATTERN_HTML_COMMENT, text)?;
                self.output.push_str(&comment);
            }
            return Ok(());
        }

        if let Some(captures) = CODE_RE.captures(line) {
            let code = captures.get(1).map_or("", |m| m.as_str()).trim_end();
            return self.render_code(line_no, code);
        }

        if let Some(rendered) = self.render_keyword(line) {
            self.output.push_str(&rendered);
            return Ok(());
        }

        if let Some(captures) = ELEMENT_RE.captures(line) {
            let tag = captures.get(1).map_or("", |m| m.as_str());
            let body = match (captures.get(2), captures.get(3), captures.get(4)) {
                (Some(_), Some(expression), _) => {
                    self.display(line_no, expression.as_str().trim())?
                }
                (_, _, Some(text)) => escape_html(text.as_str()),
                _ => String::new(),
            };
            self.output.push_str(&format!("<{tag}>{body}</{tag}>"));
            return Ok(());
        }

        Err(RenderError::UnsupportedLine {
            line: line_no,
            content: line.to_string(),
        })
    }

    fn render_code(&mut self, line_no: usize, code: &str) -> RenderResult<()> {
        if !self.execute {
            let handled = self.pattern(PATTERN_HANDLE_CODE, code)?;
            self.output.push_str(&handled);
            return Ok(());
        }

        let captures = ASSIGNMENT_RE
            .captures(code)
            .ok_or_else(|| RenderError::UnsupportedExpression {
                line: line_no,
                expression: code.to_string(),
            })?;
        let name = captures.get(1).map_or("", |m| m.as_str());
        let expression = captures.get(2).map_or("", |m| m.as_str());
        let value = self.evaluate(line_no, expression)?;
        self.scope.insert(name.to_string(), value);
        Ok(())
    }

    fn render_keyword(&self, line: &str) -> Option<String> {
        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (line, ""),
        };
        let pattern = self
            .configuration
            .category_entry(Category::Keywords, keyword)
            .and_then(OptionValue::as_str)?;
        Some(pattern.replacen("%s", rest, 1))
    }

    fn display(&self, line_no: usize, expression: &str) -> RenderResult<String> {
        if self.execute {
            return self
                .evaluate(line_no, expression)
                .map(|value| escape_html(&value));
        }
        self.pattern(PATTERN_DISPLAY_CODE, expression)
    }

    fn evaluate(&self, line_no: usize, expression: &str) -> RenderResult<String> {
        if let Some(captures) = VARIABLE_RE.captures(expression) {
            let name = captures.get(1).map_or("", |m| m.as_str());
            return self
                .scope
                .get(name)
                .cloned()
                .ok_or_else(|| RenderError::UndefinedVariable {
                    line: line_no,
                    name: name.to_string(),
                });
        }
        if INTEGER_RE.is_match(expression) {
            return Ok(expression.to_string());
        }
        if let Some(captures) = STRING_RE.captures(expression) {
            let literal = captures.get(1).or_else(|| captures.get(2));
            return Ok(literal.map_or("", |m| m.as_str()).to_string());
        }
        Err(RenderError::UnsupportedExpression {
            line: line_no,
            expression: expression.to_string(),
        })
    }

    fn pattern(&self, name: &str, value: &str) -> RenderResult<String> {
        let pattern = self
            .configuration
            .category_entry(Category::Patterns, name)
            .and_then(OptionValue::as_str)
            .ok_or_else(|| RenderError::MissingPattern(name.to_string()))?;
        Ok(pattern.replacen("%s", value, 1))
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{render, RenderError};
    use crate::config::configuration::Configuration;
    use crate::config::value::option_map;
    use crate::extension::category::Category;
    use crate::renderer::builtin_defaults;

    #[test]
    fn renders_elements_text_and_silent_comments() {
        let html = render("//- hidden\ndiv\nspan Hello <b>", &builtin_defaults()).expect("render");
        assert_eq!(html, "<div></div><span>Hello &lt;b&gt;</span>");
    }

    #[test]
    fn evaluates_string_literals_and_escapes_output() {
        let source = "- $title = \"a & b\"\nh1=$title\nem='x'";
        let html = render(source, &builtin_defaults()).expect("render");
        assert_eq!(html, "<h1>a &amp; b</h1><em>x</em>");
    }

    #[test]
    fn emits_code_through_patterns_when_not_executing() {
        let config = builtin_defaults().with_option("execute_code", false);
        let html = render("- $foo = 1\np=$foo", &config).expect("render");
        assert_eq!(html, "<?php $foo = 1 ?><p><?= $foo ?></p>");
    }

    #[test]
    fn keywords_render_their_pattern() {
        let mut config = builtin_defaults();
        config.extend_keyed(
            Category::Keywords,
            option_map([("shout", "<strong>%s!</strong>")]),
        );
        let html = render("shout hey", &config).expect("render");
        assert_eq!(html, "<strong>hey!</strong>");
    }

    #[test]
    fn reports_undefined_variables_with_line() {
        let err = render("\np=$missing", &builtin_defaults()).expect_err("must fail");
        assert_eq!(
            err,
            RenderError::UndefinedVariable {
                line: 2,
                name: "missing".to_string(),
            }
        );
    }

    #[test]
    fn reports_missing_pattern_and_bad_option() {
        let err = render("//note", &Configuration::new()).expect_err("no pattern");
        assert_eq!(err, RenderError::MissingPattern("html_comment".to_string()));

        let config = builtin_defaults().with_option("execute_code", "yes");
        assert!(matches!(
            render("p", &config),
            Err(RenderError::InvalidOption { .. })
        ));
    }

    #[test]
    fn rejects_unsupported_lines() {
        let err = render("#?!", &builtin_defaults()).expect_err("must fail");
        assert!(matches!(err, RenderError::UnsupportedLine { line: 1, .. }));
    }
}
