//! PII patterns and the scanner that applies them.

use regex::Regex;
use serde::Serialize;

/// PII types that can be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiType {
    /// Social Security Number (ddd-dd-dddd).
    Ssn,
    /// Email address.
    Email,
    /// 16-digit card number, optionally grouped by dashes or spaces.
    CreditCard,
}

impl PiiType {
    /// Scan order.
    pub const ALL: [PiiType; 3] = [Self::Ssn, Self::Email, Self::CreditCard];

    /// Name reported in metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssn => "ssn",
            Self::Email => "email",
            Self::CreditCard => "credit_card",
        }
    }

    /// Replacement text.
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Ssn => "[REDACTED_SSN]",
            Self::Email => "[REDACTED_EMAIL]",
            Self::CreditCard => "[REDACTED_CC]",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::Ssn => r"\b\d{3}-\d{2}-\d{4}\b",
            Self::Email => r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            Self::CreditCard => r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b",
        }
    }
}

/// What a scan found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Types found, in scan order.
    pub types: Vec<PiiType>,
    /// Total number of matches.
    pub count: usize,
    /// The text with every match replaced.
    pub redacted: String,
}

/// Compiled PII patterns.
#[derive(Debug, Clone)]
pub struct PiiScanner {
    patterns: Vec<(PiiType, Regex)>,
}

impl PiiScanner {
    /// Compiles every pattern.
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = PiiType::ALL
            .into_iter()
            .map(|pii| Regex::new(pii.pattern()).map(|re| (pii, re)))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    /// Scans `text`; `None` when nothing matched.
    pub fn scan(&self, text: &str) -> Option<Detection> {
        let mut redacted = text.to_string();
        let mut types = Vec::new();
        let mut count = 0;

        for (pii, re) in &self.patterns {
            let found = re.find_iter(&redacted).count();
            if found == 0 {
                continue;
            }
            count += found;
            types.push(*pii);
            redacted = re.replace_all(&redacted, pii.placeholder()).into_owned();
        }

        (count > 0).then_some(Detection {
            types,
            count,
            redacted,
        })
    }
}
