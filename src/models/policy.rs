//! Declarative policy rule table.
//!
//! A rule is either a regular expression (one label per matching rule) or a
//! keyword list (one `rule:keyword` label per keyword found). The table can be
//! loaded from YAML:
//!
//! ```yaml
//! rules:
//!   - name: pii_ssn
//!     type: pattern
//!     pattern: '\b\d{3}-\d{2}-\d{4}\b'
//!   - name: sensitive_legal
//!     type: keywords
//!     keywords: ["legal advice", "sue", "lawsuit"]
//! ```

use std::path::Path;

use anyhow::Context;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    #[serde(flatten)]
    pub matcher: RuleMatcher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleMatcher {
    /// Case-insensitive regular expression.
    Pattern { pattern: String },
    /// Case-insensitive substring match against each keyword.
    Keywords { keywords: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTable {
    pub rules: Vec<PolicyRule>,
}

impl RuleTable {
    /// PII patterns followed by harmful and sensitive topic keywords.
    pub fn builtin() -> Self {
        fn pattern(name: &str, pattern: &str) -> PolicyRule {
            PolicyRule {
                name: name.to_string(),
                matcher: RuleMatcher::Pattern {
                    pattern: pattern.to_string(),
                },
            }
        }
        fn keywords(name: &str, words: &[&str]) -> PolicyRule {
            PolicyRule {
                name: name.to_string(),
                matcher: RuleMatcher::Keywords {
                    keywords: words.iter().map(|w| w.to_string()).collect(),
                },
            }
        }

        Self {
            rules: vec![
                pattern("pii_ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
                pattern(
                    "pii_credit_card",
                    r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{4}\b",
                ),
                pattern(
                    "pii_email",
                    r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b",
                ),
                keywords("harmful_violence", &["violence", "harm", "attack", "kill"]),
                keywords("harmful_hate", &["hate", "discriminate", "racist", "sexist"]),
                keywords(
                    "sensitive_medical",
                    &["diagnosis", "prescription", "medical advice"],
                ),
                keywords("sensitive_legal", &["legal advice", "sue", "lawsuit"]),
                keywords(
                    "sensitive_financial",
                    &["investment advice", "stock tip", "financial advice"],
                ),
            ],
        }
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        let table: RuleTable = serde_yaml::from_str(raw).context("invalid policy rule table")?;
        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy rules from {}", path.display()))?;
        Self::from_yaml(&raw)
    }

    /// Compile every rule, failing on the first invalid pattern.
    pub fn compile(&self) -> anyhow::Result<Vec<CompiledRule>> {
        self.rules.iter().map(CompiledRule::compile).collect()
    }
}

/// A rule ready for matching. Keywords keep their table spelling for labels
/// next to a lowercased needle.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub matcher: CompiledMatcher,
}

#[derive(Debug, Clone)]
pub enum CompiledMatcher {
    Pattern(Regex),
    Keywords(Vec<(String, String)>),
}

impl CompiledRule {
    pub fn compile(rule: &PolicyRule) -> anyhow::Result<Self> {
        if rule.name.trim().is_empty() {
            anyhow::bail!("policy rule name must not be empty");
        }
        let matcher = match &rule.matcher {
            RuleMatcher::Pattern { pattern } => CompiledMatcher::Pattern(
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid pattern for rule '{}'", rule.name))?,
            ),
            RuleMatcher::Keywords { keywords } => CompiledMatcher::Keywords(
                keywords
                    .iter()
                    .filter(|k| !k.is_empty())
                    .map(|k| (k.clone(), k.to_lowercase()))
                    .collect(),
            ),
        };
        Ok(Self {
            name: rule.name.clone(),
            matcher,
        })
    }

    /// Labels this rule produces for `text`. `lowered` is `text` lowercased,
    /// passed in so a table scan lowercases once.
    pub fn labels(&self, text: &str, lowered: &str) -> Vec<String> {
        match &self.matcher {
            CompiledMatcher::Pattern(re) => {
                if re.is_match(text) {
                    vec![self.name.clone()]
                } else {
                    vec![]
                }
            }
            CompiledMatcher::Keywords(words) => words
                .iter()
                .filter(|(_, needle)| lowered.contains(needle.as_str()))
                .map(|(word, _)| format!("{}:{}", self.name, word))
                .collect(),
        }
    }
}
