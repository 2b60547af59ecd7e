//! Keyword-based capability detection.
//!
//! Rules are evaluated top to bottom and the first rule with a keyword
//! contained in the lowercased input wins. The table is a plain ordered list
//! so precedence between overlapping rules is visible in configuration.

use serde::{Deserialize, Serialize};

/// A set of keywords that route to one capability name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionRule {
    /// Lowercase substrings; any one of them triggers the rule.
    pub keywords: Vec<String>,
    /// Capability name returned when the rule matches.
    pub capability: String,
}

impl DetectionRule {
    pub fn new<I, S>(keywords: I, capability: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.into().to_lowercase())
                .collect(),
            capability: capability.into(),
        }
    }

    /// Test the rule against input that has already been lowercased.
    fn matches(&self, lowered: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && lowered.contains(k.as_str()))
    }
}

/// Ordered detection table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionRules {
    rules: Vec<DetectionRule>,
}

impl DetectionRules {
    /// An empty table; `detect` always returns `None`.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn from_rules(rules: Vec<DetectionRule>) -> Self {
        Self { rules }
    }

    /// Append a rule at the lowest precedence.
    pub fn push(&mut self, rule: DetectionRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[DetectionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return the capability name of the first matching rule.
    pub fn detect(&self, input: &str) -> Option<&str> {
        let lowered = input.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.capability.as_str())
    }
}

impl Default for DetectionRules {
    /// The stock routing table of the RAHL assistant.
    ///
    /// The two built-in text capabilities sit below the five stock rules, so
    /// they only win when none of those keywords appear.
    fn default() -> Self {
        Self::from_rules(vec![
            DetectionRule::new(["search", "find"], "web_search"),
            DetectionRule::new(["calculate", "math"], "calculator"),
            DetectionRule::new(["code", "program"], "code_executor"),
            DetectionRule::new(["email", "send"], "email_client"),
            DetectionRule::new(["analyze", "data"], "data_analyzer"),
            DetectionRule::new(["summarize", "summary"], "summarizer"),
            DetectionRule::new(["hash", "digest"], "encryption"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let rules = DetectionRules::default();
        assert_eq!(rules.detect("please calculate 2+2"), Some("calculator"));
        assert_eq!(rules.detect("search for cats"), Some("web_search"));
        assert_eq!(rules.detect("good morning"), None);
        assert_eq!(rules.detect("Write a PROGRAM"), Some("code_executor"));
        assert_eq!(rules.detect("Summarize: the meeting ran long."), Some("summarizer"));
        assert_eq!(rules.detect("hash this sentence please"), Some("encryption"));
        assert_eq!(rules.detect("sha256 digest of hello"), Some("encryption"));
    }

    #[test]
    fn test_builtin_rules_rank_last() {
        let rules = DetectionRules::default();
        assert_eq!(rules.len(), 7);
        // "data" belongs to the higher-ranked analyzer rule.
        assert_eq!(rules.detect("please hash this data"), Some("data_analyzer"));
        assert_eq!(rules.detect("send a summary"), Some("email_client"));
        // "encode" contains "code", which the code rule claims first.
        assert_eq!(rules.detect("encode hello"), Some("code_executor"));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = DetectionRules::default();
        // "find" and "math" both match; the search rule sits higher.
        assert_eq!(rules.detect("find the math homework"), Some("web_search"));
        // "send" and "data" both match; email sits above data.
        assert_eq!(rules.detect("send the data"), Some("email_client"));
    }

    #[test]
    fn test_deterministic() {
        let rules = DetectionRules::default();
        let first = rules.detect("analyze this");
        for _ in 0..10 {
            assert_eq!(rules.detect("analyze this"), first);
        }
    }

    #[test]
    fn test_custom_order() {
        let mut rules = DetectionRules::empty();
        assert_eq!(rules.detect("anything"), None);

        rules.push(DetectionRule::new(["Summary"], "summarizer"));
        rules.push(DetectionRule::new(["summ"], "other"));
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.detect("give me a SUMMARY"), Some("summarizer"));
        assert_eq!(rules.detect("summarise"), Some("other"));
    }

    #[test]
    fn test_empty_keyword_never_matches() {
        let rules = DetectionRules::from_rules(vec![DetectionRule::new([""], "everything")]);
        assert_eq!(rules.detect("hello"), None);
    }

    #[test]
    fn test_yaml_shape() {
        let yaml = r#"
- keywords: [hash, digest]
  capability: encryption
- keywords: [summarize]
  capability: summarizer
"#;
        let rules: DetectionRules = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.rules()[0].capability, "encryption");
        assert_eq!(rules.detect("hash this"), Some("encryption"));
    }
}
