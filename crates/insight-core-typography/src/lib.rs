//! `insight-core-typography` - Regex-based typography inspector for `insight-core`.
//!
//! Catches the small mechanical mistakes that do not need a dictionary or a grammar: doubled
//! spaces, a space before punctuation, three dots instead of an ellipsis, a hyphen used as a
//! dash and straight quotes. Every finding carries exactly one replacement suggestion.

use insight_core::{Finding, InsightKind, Inspector};
use regex::{Captures, Regex};

/// Error building a rule from an invalid pattern.
pub use regex::Error as RuleError;

/// A single typography rule: a pattern, a message and a replacement template.
#[derive(Debug, Clone)]
pub struct TypographyRule {
    regex: Regex,
    message: String,
    replacement: String,
    skip_languages: Vec<String>,
}

impl TypographyRule {
    /// `replacement` is a `regex` expansion template (`$1`, `${name}`).
    pub fn new(
        pattern: &str,
        message: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: message.into(),
            replacement: replacement.into(),
            skip_languages: Vec::new(),
        })
    }

    /// Disable the rule for languages whose tag starts with `prefix` (e.g. `"fr"`).
    pub fn skip_language(mut self, prefix: impl Into<String>) -> Self {
        self.skip_languages.push(prefix.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn applies_to(&self, language: &str) -> bool {
        !self
            .skip_languages
            .iter()
            .any(|prefix| language.starts_with(prefix.as_str()))
    }

    fn suggestion(&self, caps: &Captures<'_>) -> String {
        let mut out = String::new();
        caps.expand(&self.replacement, &mut out);
        out
    }
}

/// Which of the built-in rules are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypographyRules {
    pub double_space: bool,
    pub space_before_punctuation: bool,
    pub ellipsis: bool,
    pub dash: bool,
    pub quotes: bool,
}

impl Default for TypographyRules {
    fn default() -> Self {
        Self {
            double_space: true,
            space_before_punctuation: true,
            ellipsis: true,
            dash: true,
            quotes: true,
        }
    }
}

/// Inspector producing [`InsightKind::Typography`] findings.
#[derive(Debug, Clone)]
pub struct TypographyInspector {
    rules: Vec<TypographyRule>,
}

impl TypographyInspector {
    pub fn new(rules: Vec<TypographyRule>) -> Self {
        Self { rules }
    }

    /// The built-in rule set, filtered by `enabled`.
    pub fn with_rules(enabled: TypographyRules) -> Result<Self, RuleError> {
        let mut rules = Vec::new();
        if enabled.double_space {
            rules.push(TypographyRule::new(r"[ \t]{2,}", "Multiple spaces", " ")?);
        }
        if enabled.space_before_punctuation {
            // French puts a (thin) space before two-part punctuation.
            rules.push(
                TypographyRule::new(
                    r"[ \t]+([;:!?])",
                    "Space before punctuation",
                    "$1",
                )?
                .skip_language("fr"),
            );
            rules.push(TypographyRule::new(
                r"(\w)[ \t]+([,.])",
                "Space before punctuation",
                "$1$2",
            )?);
        }
        if enabled.ellipsis {
            rules.push(TypographyRule::new(r"\.\.\.", "Use an ellipsis", "…")?);
        }
        if enabled.dash {
            rules.push(TypographyRule::new(r" -{1,2} ", "Use an en dash", " – ")?);
        }
        if enabled.quotes {
            rules.push(TypographyRule::new(
                r#""([^"\n]*)""#,
                "Use typographic quotes",
                "“$1”",
            )?);
        }
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[TypographyRule] {
        &self.rules
    }

    /// Run all rules over one paragraph; offsets are paragraph-relative characters.
    pub fn check(&self, text: &str, language: &str) -> Vec<Finding> {
        let mut findings = Vec::new();
        for rule in self.rules.iter().filter(|rule| rule.applies_to(language)) {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.get(0) else {
                    continue;
                };
                let Some((left, right)) = char_range_from_match(text, m.start(), m.end()) else {
                    continue;
                };
                findings.push(Finding {
                    kind: InsightKind::Typography,
                    left,
                    right,
                    message: rule.message.clone(),
                    suggestions: vec![rule.suggestion(&caps)],
                });
            }
        }
        findings.sort_by_key(|f| (f.left, f.right));
        findings
    }
}

impl Inspector for TypographyInspector {
    fn inspect(&self, text: &str, language: &str) -> Vec<Finding> {
        self.check(text, language)
    }
}

fn char_range_from_match(
    text: &str,
    match_start_byte: usize,
    match_end_byte: usize,
) -> Option<(usize, usize)> {
    if match_start_byte >= match_end_byte || match_end_byte > text.len() {
        return None;
    }

    let start = text[..match_start_byte].chars().count();
    let end = start + text[match_start_byte..match_end_byte].chars().count();
    if start >= end {
        return None;
    }
    Some((start, end))
}
