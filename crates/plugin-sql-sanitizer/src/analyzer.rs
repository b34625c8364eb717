//! Statement-level SQL checks.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::config::SqlConfig;
use crate::extract::statement_verb;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*").expect("line comment pattern is valid"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid"));

static WHERE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bwhere\b").expect("where pattern is valid"));

static BIND_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\?|\$\d+|[:@][A-Za-z_][A-Za-z0-9_]*").expect("bind marker pattern is valid")
});

/// Result of checking one or more SQL texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Distinct violations, in discovery order.
    pub violations: Vec<String>,
    /// Number of statements examined.
    pub statements: usize,
}

impl Analysis {
    /// Returns true when nothing was flagged.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    fn flag(&mut self, violation: String) {
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
    }
}

/// Compiled checks for one plugin instance.
#[derive(Debug, Clone)]
pub struct SqlAnalyzer {
    block_delete_without_where: bool,
    block_update_without_where: bool,
    require_parameterization: bool,
    /// Source text and compiled form of each denylist entry.
    blocked: Vec<(String, Regex)>,
}

impl SqlAnalyzer {
    /// Compiles the denylist. Fails on the first invalid pattern.
    pub fn new(config: &SqlConfig) -> Result<Self, regex::Error> {
        let blocked = config
            .blocked_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (pattern.clone(), re))
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            block_delete_without_where: config.block_delete_without_where,
            block_update_without_where: config.block_update_without_where,
            require_parameterization: config.require_parameterization,
            blocked,
        })
    }

    /// Checks every statement in every text.
    pub fn analyze<S: AsRef<str>>(&self, texts: &[S]) -> Analysis {
        let mut analysis = Analysis::default();
        for text in texts {
            for statement in statements(text.as_ref()) {
                analysis.statements += 1;
                self.check(&statement, &mut analysis);
            }
        }
        analysis
    }

    fn check(&self, statement: &str, analysis: &mut Analysis) {
        let verb = statement_verb(statement).unwrap_or_default();
        let has_where = WHERE_CLAUSE.is_match(statement);

        if verb == "DELETE" && self.block_delete_without_where && !has_where {
            analysis.flag("DELETE statement without WHERE clause".to_string());
        }
        if verb == "UPDATE" && self.block_update_without_where && !has_where {
            analysis.flag("UPDATE statement without WHERE clause".to_string());
        }

        for (pattern, re) in &self.blocked {
            if re.is_match(statement) {
                analysis.flag(format!("Statement matches blocked pattern '{pattern}'"));
            }
        }

        if self.require_parameterization && !BIND_MARKER.is_match(statement) {
            analysis.flag("Statement is not parameterized".to_string());
        }
    }
}

/// Splits `text` into comment-free, non-empty statements.
pub fn statements(text: &str) -> Vec<String> {
    let text = BLOCK_COMMENT.replace_all(text, " ");
    let text = LINE_COMMENT.replace_all(&text, "");

    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
