//! Policy screening for prompts and generated answers.
//!
//! Runs the rule table from `models::policy` over text and reports every
//! label that fired. Screening is pure: the same text always produces the
//! same labels, in table order, without de-duplication.

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::models::policy::{CompiledRule, RuleTable};

static BUILTIN_RULES: Lazy<Vec<CompiledRule>> = Lazy::new(|| {
    RuleTable::builtin()
        .compile()
        .expect("invalid built-in policy rules")
});

/// Outcome of screening one text or a prompt/response pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PolicyVerdict {
    pub violation: bool,
    pub violations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PolicyScreener {
    rules: Vec<CompiledRule>,
    enabled: bool,
}

impl Default for PolicyScreener {
    fn default() -> Self {
        Self {
            rules: BUILTIN_RULES.clone(),
            enabled: true,
        }
    }
}

impl PolicyScreener {
    pub fn new(table: &RuleTable) -> anyhow::Result<Self> {
        Ok(Self {
            rules: table.compile()?,
            enabled: true,
        })
    }

    /// A screener that never reports violations.
    pub fn disabled() -> Self {
        Self {
            rules: Vec::new(),
            enabled: false,
        }
    }

    /// Build from config: optional YAML table, optional kill switch.
    pub fn from_config(cfg: &crate::config::Config) -> anyhow::Result<Self> {
        if !cfg.enable_policy_check {
            tracing::warn!("policy screening disabled (ENABLE_POLICY_CHECK=false)");
            return Ok(Self::disabled());
        }
        match &cfg.policy_rules_path {
            Some(path) => {
                let table = RuleTable::from_file(path)?;
                tracing::info!(path = %path, rules = table.rules.len(), "loaded policy rule table");
                Self::new(&table)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn check(&self, text: &str) -> PolicyVerdict {
        if !self.enabled {
            return PolicyVerdict::default();
        }

        let lowered = text.to_lowercase();
        let violations: Vec<String> = self
            .rules
            .iter()
            .flat_map(|rule| rule.labels(text, &lowered))
            .collect();

        for label in &violations {
            tracing::warn!(label = %label, "policy violation detected");
        }

        PolicyVerdict {
            violation: !violations.is_empty(),
            violations,
        }
    }

    /// Screen both sides of an interaction. Labels are prefixed with their
    /// origin, prompt labels first.
    pub fn check_prompt_and_response(&self, prompt: &str, response: &str) -> PolicyVerdict {
        let prompt_verdict = self.check(prompt);
        let response_verdict = self.check(response);

        let violations: Vec<String> = prompt_verdict
            .violations
            .iter()
            .map(|v| format!("prompt:{}", v))
            .chain(
                response_verdict
                    .violations
                    .iter()
                    .map(|v| format!("response:{}", v)),
            )
            .collect();

        let verdict = PolicyVerdict {
            violation: prompt_verdict.violation || response_verdict.violation,
            violations,
        };

        if verdict.violation {
            tracing::info!(
                violation_count = verdict.violations.len(),
                violations = ?verdict.violations,
                "policy check completed with violations"
            );
        } else {
            tracing::debug!("policy check completed - no violations detected");
        }

        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::policy::{PolicyRule, RuleMatcher};

    #[test]
    fn test_clean_text() {
        let screener = PolicyScreener::default();
        let verdict = screener.check("What is machine learning?");
        assert!(!verdict.violation);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_ssn_label() {
        let verdict = PolicyScreener::default().check("SSN 123-45-6789 on file");
        assert!(verdict.violation);
        assert!(verdict.violations.iter().any(|v| v.contains("pii_ssn")));
    }

    #[test]
    fn test_lawsuit_label() {
        let verdict = PolicyScreener::default().check("Can I win a lawsuit against my landlord?");
        assert!(verdict
            .violations
            .iter()
            .any(|v| v.contains("sensitive_legal") && v.contains("lawsuit")));
    }

    #[test]
    fn test_deterministic() {
        let screener = PolicyScreener::default();
        let text = "I hate this; email me at a@b.io about the stock tip";
        let first = screener.check(text);
        for _ in 0..5 {
            assert_eq!(screener.check(text), first);
        }
        assert_eq!(
            first.violations,
            vec![
                "pii_email",
                "harmful_hate:hate",
                "sensitive_financial:stock tip"
            ]
        );
    }

    #[test]
    fn test_pair_prefixes_and_ors() {
        let screener = PolicyScreener::default();
        let verdict = screener.check_prompt_and_response(
            "my card is 4111 1111 1111 1111",
            "You should consult a doctor for a diagnosis.",
        );
        assert!(verdict.violation);
        assert_eq!(
            verdict.violations,
            vec![
                "prompt:pii_credit_card",
                "response:sensitive_medical:diagnosis"
            ]
        );

        let verdict = screener.check_prompt_and_response("hello", "attack at dawn");
        assert!(verdict.violation);
        assert_eq!(verdict.violations, vec!["response:harmful_violence:attack"]);

        let verdict = screener.check_prompt_and_response("hello", "hi there");
        assert!(!verdict.violation);
    }

    #[test]
    fn test_same_label_on_both_sides_not_deduplicated() {
        let screener = PolicyScreener::default();
        let verdict = screener.check_prompt_and_response("kill", "kill");
        assert_eq!(
            verdict.violations,
            vec!["prompt:harmful_violence:kill", "response:harmful_violence:kill"]
        );
    }

    #[test]
    fn test_repeated_keyword_in_table_repeats_label() {
        let table = RuleTable {
            rules: vec![PolicyRule {
                name: "dup".into(),
                matcher: RuleMatcher::Keywords {
                    keywords: vec!["x".into(), "x".into()],
                },
            }],
        };
        let verdict = PolicyScreener::new(&table).unwrap().check("x");
        assert_eq!(verdict.violations, vec!["dup:x", "dup:x"]);
    }

    #[test]
    fn test_disabled_screener() {
        let screener = PolicyScreener::disabled();
        let verdict = screener.check_prompt_and_response("123-45-6789", "kill");
        assert!(!verdict.violation);
        assert!(verdict.violations.is_empty());
    }

    #[test]
    fn test_from_config_respects_kill_switch() {
        let cfg = crate::config::Config {
            enable_policy_check: false,
            ..Default::default()
        };
        let screener = PolicyScreener::from_config(&cfg).unwrap();
        assert_eq!(screener.rule_count(), 0);
        assert_eq!(PolicyScreener::default().rule_count(), 8);
    }
}
