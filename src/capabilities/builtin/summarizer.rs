//! Summarizer capability: frequency-scored extractive summaries.
//!
//! Options:
//! - `type`: `extractive` (default), `bullet`, `one_line`
//! - `length`: `short`, `medium` (default), `long`
//! - `ratio`: share of sentences kept by a `medium` extractive summary

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::capabilities::capability::{option_str, Capability, CapabilityFailure};

static SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").expect("valid regex"));
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9']+").expect("valid regex"));

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "has",
        "have", "he", "her", "his", "i", "in", "is", "it", "its", "of", "on", "or", "she", "so",
        "that", "the", "their", "them", "they", "this", "to", "was", "we", "were", "which",
        "will", "with", "you", "your",
    ]
    .into_iter()
    .collect()
});

const DEFAULT_RATIO: f64 = 0.3;
const NO_CONTENT: &str = "No content to summarize.";

/// Picks the highest-scoring sentences of a text and keeps them in order.
#[derive(Debug)]
pub struct Summarizer {
    default_ratio: f64,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self {
            default_ratio: DEFAULT_RATIO,
        }
    }
}

impl Summarizer {
    pub const NAME: &'static str = "summarizer";

    pub fn new() -> Self {
        Self::default()
    }

    /// Build from per-capability settings (`default_ratio`).
    pub fn from_settings(settings: &Value) -> Result<Self, CapabilityFailure> {
        let default_ratio = match settings.get("default_ratio") {
            None | Some(Value::Null) => DEFAULT_RATIO,
            Some(v) => v
                .as_f64()
                .filter(|r| *r > 0.0 && *r <= 1.0)
                .ok_or_else(|| {
                    CapabilityFailure::new("default_ratio must be a number in (0, 1]")
                })?,
        };
        Ok(Self { default_ratio })
    }

    fn sentences(text: &str) -> Vec<&str> {
        SENTENCE
            .find_iter(text)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
        WORD.find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .filter(|w| !STOPWORDS.contains(w.as_str()))
    }

    fn word_count(text: &str) -> usize {
        WORD.find_iter(text).count()
    }

    /// Term frequencies, plus the top five terms by frequency then first use.
    fn frequencies(text: &str) -> (HashMap<String, usize>, Vec<String>) {
        let mut freq: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();
        for term in Self::terms(text) {
            let count = freq.entry(term.clone()).or_insert(0);
            if *count == 0 {
                first_seen.push(term);
            }
            *count += 1;
        }
        let mut keywords = first_seen;
        keywords.sort_by(|a, b| freq[b].cmp(&freq[a]));
        keywords.truncate(5);
        (freq, keywords)
    }

    /// Number of sentences an extractive summary keeps for a length setting.
    fn target_count(total: usize, length: &str, ratio: f64) -> usize {
        let share = |r: f64| (total as f64 * r).floor() as usize;
        let wanted = match length {
            "short" => share(0.1).max(1),
            "long" => share(0.5).max(3),
            _ => share(ratio).max(2),
        };
        wanted.min(total)
    }

    /// Sentence score: summed term frequency, weighted by position and shape.
    fn score(index: usize, total: usize, sentence: &str, freq: &HashMap<String, usize>) -> f64 {
        let mut score = Self::terms(sentence)
            .map(|t| freq.get(&t).copied().unwrap_or(0))
            .sum::<usize>() as f64;
        if index == 0 {
            score *= 1.5;
        }
        if index + 1 == total {
            score *= 1.3;
        }
        if sentence.contains('?') {
            score *= 1.2;
        }
        if sentence.chars().any(|c| c.is_ascii_digit()) {
            score *= 1.1;
        }
        score
    }

    /// Indices of the `count` best sentences, in document order.
    fn select(sentences: &[&str], freq: &HashMap<String, usize>, count: usize) -> Vec<usize> {
        let mut scored: Vec<(usize, f64)> = sentences
            .iter()
            .enumerate()
            .map(|(i, s)| (i, Self::score(i, sentences.len(), s, freq)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        let mut picked: Vec<usize> = scored.into_iter().take(count).map(|(i, _)| i).collect();
        picked.sort_unstable();
        picked
    }

    fn extractive(
        text: &str,
        sentences: &[&str],
        length: &str,
        ratio: f64,
        freq: &HashMap<String, usize>,
    ) -> String {
        if sentences.len() <= 3 {
            return text.to_string();
        }
        let count = Self::target_count(sentences.len(), length, ratio);
        Self::select(sentences, freq, count)
            .into_iter()
            .map(|i| sentences[i])
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Leading sentences as bullets, capitalized and without end punctuation.
    fn bullets(sentences: &[&str], length: &str) -> String {
        let count = match length {
            "short" => 3,
            "medium" => 5,
            _ => 7,
        };
        sentences
            .iter()
            .take(count)
            .map(|sentence| {
                let mut chars = sentence.chars();
                let mut line: String = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                };
                if line.ends_with(['.', '!', '?']) {
                    line.pop();
                }
                format!("• {}", line)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// First sentence of 5 to 20 words, else the first sentence.
    fn one_line(sentences: &[&str]) -> String {
        sentences
            .iter()
            .find(|s| (5..=20).contains(&s.split_whitespace().count()))
            .or_else(|| sentences.first())
            .map_or_else(|| NO_CONTENT.to_string(), |s| s.to_string())
    }
}

#[async_trait]
impl Capability for Summarizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Summarize long text documents"
    }

    fn version(&self) -> Option<&str> {
        Some("1.0.0")
    }

    async fn execute(&self, input: &str, options: &Value) -> Result<Value, CapabilityFailure> {
        let text = input.trim();
        if text.is_empty() {
            return Err(CapabilityFailure::new("Text is empty"));
        }

        let summary_type = option_str(options, "type", "extractive");
        let length = option_str(options, "length", "medium");
        let ratio = options
            .get("ratio")
            .and_then(Value::as_f64)
            .unwrap_or(self.default_ratio);
        if !(ratio > 0.0 && ratio <= 1.0) {
            return Err(CapabilityFailure::new("ratio must be in (0, 1]")
                .with_details(json!({ "ratio": ratio })));
        }

        let sentences = Self::sentences(text);
        let (freq, keywords) = Self::frequencies(text);

        let summary = match summary_type {
            "bullet" => Self::bullets(&sentences, length),
            "one_line" => Self::one_line(&sentences),
            _ => Self::extractive(text, &sentences, length, ratio, &freq),
        };

        let original_words = Self::word_count(text);
        let summary_words = Self::word_count(&summary);
        let reduction = if original_words == 0 {
            0.0
        } else {
            (original_words as f64 - summary_words as f64) / original_words as f64 * 100.0
        };
        let compression = if original_words == 0 {
            1.0
        } else {
            summary_words as f64 / original_words as f64
        };

        Ok(json!({
            "summary": summary,
            "type": summary_type,
            "length": length,
            "statistics": {
                "original_length": text.chars().count(),
                "original_words": original_words,
                "original_sentences": sentences.len(),
                "summary_length": summary.chars().count(),
                "summary_words": summary_words,
                "reduction_percentage": format!("{:.1}%", reduction),
                "compression_ratio": format!("{:.3}", compression),
            },
            "keywords": keywords,
            "source": Self::NAME,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
    }
}
