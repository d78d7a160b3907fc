//! Ant-style path patterns.
//!
//! | Syntax          | Matches                                              |
//! |-----------------|------------------------------------------------------|
//! | `?`             | one character except `/`                             |
//! | `*`             | zero or more characters within one segment          |
//! | `**`            | zero or more whole segments                          |
//! | `{name}`        | one non-empty segment                                |
//! | `{name:regex}`  | one segment matching `regex`                         |
//! | `{*name}`       | the non-empty rest of the path                       |
//!
//! A trailing `/**` also matches the bare prefix: `/public/**` matches `/public`.
//! Legacy axum `:name` segments are accepted and treated as `{name}`.

use std::fmt;

use regex::Regex;

use crate::error::CrustError;

/// A compiled path pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// `/**`
    Any,
    Regex(Regex),
}

impl PathPattern {
    /// Compile a pattern.
    ///
    /// # Errors
    /// Returns `CrustError::Configuration` if the pattern does not start with `/`,
    /// has an unbalanced `{`, or embeds an invalid regex.
    pub fn parse(pattern: &str) -> Result<Self, CrustError> {
        let pattern = pattern.trim();
        if !pattern.starts_with('/') {
            return Err(CrustError::config(format!(
                "path pattern '{pattern}' must start with '/'"
            )));
        }

        if pattern == "/**" {
            return Ok(Self::any());
        }

        let normalized = convert_axum_params(pattern);
        let mut expr = String::with_capacity(normalized.len() * 2);
        expr.push('^');
        for segment in normalized[1..].split('/') {
            if segment == "**" {
                expr.push_str("(?:/.*)?");
            } else {
                expr.push('/');
                compile_segment(segment, &mut expr).map_err(|reason| {
                    CrustError::config(format!("invalid path pattern '{pattern}': {reason}"))
                })?;
            }
        }
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| {
            CrustError::config(format!("invalid path pattern '{pattern}': {e}"))
        })?;

        Ok(Self {
            source: pattern.to_owned(),
            matcher: Matcher::Regex(regex),
        })
    }

    /// The `/**` pattern, matching every path.
    #[must_use]
    pub fn any() -> Self {
        Self {
            source: "/**".to_owned(),
            matcher: Matcher::Any,
        }
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match &self.matcher {
            Matcher::Any => path.is_empty() || path.starts_with('/'),
            Matcher::Regex(regex) => regex.is_match(path),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn compile_segment(segment: &str, expr: &mut String) -> Result<(), String> {
    let mut chars = segment.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '*' => expr.push_str("[^/]*"),
            '?' => expr.push_str("[^/]"),
            '{' => {
                let mut depth = 1usize;
                let mut body = String::new();
                for c in chars.by_ref() {
                    match c {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                    if depth == 0 {
                        break;
                    }
                    body.push(c);
                }
                if depth != 0 {
                    return Err("unclosed '{'".to_owned());
                }
                expr.push_str(&compile_variable(&body)?);
            }
            '}' => return Err("unexpected '}'".to_owned()),
            other => {
                let mut buf = [0u8; 4];
                expr.push_str(&regex::escape(other.encode_utf8(&mut buf)));
            }
        }
    }
    Ok(())
}

fn compile_variable(body: &str) -> Result<String, String> {
    if body.starts_with('*') {
        return Ok(".+".to_owned());
    }
    match body.split_once(':') {
        Some((_, re)) if re.is_empty() => Err(format!("empty regex in '{{{body}}}'")),
        Some((_, re)) => Ok(format!("(?:{re})")),
        None if body.is_empty() => Err("empty variable name '{}'".to_owned()),
        None => Ok("[^/]+".to_owned()),
    }
}

/// Convert axum's legacy `:param` segments to `{param}`.
///
/// Only a `:` that opens a segment is converted, so `{id:[0-9]+}` is left untouched.
fn convert_axum_params(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();
    let mut segment_start = false;

    while let Some(ch) = chars.next() {
        if ch == ':' && segment_start {
            result.push('{');
            while matches!(chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            result.push('}');
            segment_start = false;
        } else {
            segment_start = ch == '/';
            result.push(ch);
        }
    }

    result
}
