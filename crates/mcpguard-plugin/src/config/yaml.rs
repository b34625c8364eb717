//! YAML plugin documents.
//!
//! Parsing is done by `serde_yaml`. Before that, the text is screened for
//! features plugin documents must not use: anchors, aliases, tags,
//! directives and multi-document streams. Each is rejected with the line it
//! appears on.

use serde_json::Value;
use thiserror::Error;

/// Error produced while reading a YAML document.
#[derive(Debug, Error)]
pub enum YamlError {
    /// The text is not valid YAML.
    #[error("{0}")]
    Syntax(#[from] serde_yaml::Error),

    /// The text uses a YAML feature plugin documents do not allow.
    #[error("line {line}: unsupported YAML feature: {feature}")]
    Unsupported {
        /// 1-based line number.
        line: usize,
        /// Name of the feature.
        feature: &'static str,
    },

    /// The YAML has no JSON equivalent, e.g. a non-string mapping key.
    #[error("invalid document value: {0}")]
    Value(#[from] serde_json::Error),
}

/// Parses `input` into a JSON value. A document without content is `null`.
pub fn parse(input: &str) -> Result<Value, YamlError> {
    if !screen(input)? {
        return Ok(Value::Null);
    }

    let document: serde_yaml::Value = serde_yaml::from_str(input)?;
    Ok(serde_json::to_value(document)?)
}

/// What one line holds once quoted text and comments are skipped.
#[derive(Debug, Default)]
struct LineScan {
    /// Anything besides whitespace and comments.
    content: bool,
    /// The line opens a `|` or `>` block scalar.
    block_scalar: bool,
}

/// Rejects disallowed features. Returns whether the document has content.
fn screen(input: &str) -> Result<bool, YamlError> {
    let mut seen_content = false;
    let mut block_parent: Option<usize> = None;

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let indent = raw.len() - raw.trim_start().len();
        let text = raw.trim();

        if let Some(parent) = block_parent {
            if text.is_empty() || indent > parent {
                continue;
            }
            block_parent = None;
        }

        if text == "---" {
            if seen_content {
                return Err(YamlError::Unsupported {
                    line,
                    feature: "multiple documents",
                });
            }
            continue;
        }
        if text == "..." {
            return Err(YamlError::Unsupported {
                line,
                feature: "multiple documents",
            });
        }
        if text.starts_with('%') {
            return Err(YamlError::Unsupported {
                line,
                feature: "directives",
            });
        }

        let scan = scan_line(text).map_err(|feature| YamlError::Unsupported { line, feature })?;
        seen_content |= scan.content;
        if scan.block_scalar {
            block_parent = Some(indent);
        }
    }

    Ok(seen_content)
}

/// Scans one trimmed line. Node properties (`&`, `*`, `!`) only count where
/// a value may start, so `SELECT * FROM t` stays a plain scalar.
fn scan_line(text: &str) -> Result<LineScan, &'static str> {
    let mut scan = LineScan::default();
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;
    let mut after_space = true;

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            after_space = true;
            continue;
        }

        let value_start = match prev {
            None | Some('[' | '{' | ',') => true,
            Some('-' | ':' | '?') => after_space,
            _ => false,
        };

        match c {
            '#' if after_space => break,
            '&' if value_start => return Err("anchors"),
            '*' if value_start => return Err("aliases"),
            '!' if value_start => return Err("tags"),
            '|' | '>' if value_start => scan.block_scalar = true,
            '"' if value_start => skip_double_quoted(&mut chars),
            '\'' if value_start => skip_single_quoted(&mut chars),
            _ => {}
        }

        scan.content = true;
        prev = Some(c);
        after_space = false;
    }

    Ok(scan)
}

fn skip_double_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return,
            _ => {}
        }
    }
}

fn skip_single_quoted(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
            } else {
                return;
            }
        }
    }
}
