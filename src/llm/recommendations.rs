//! Best-effort extraction of a recommendation list from free-form model output
//!
//! Models rarely follow the requested list format exactly, so each line is
//! tried as a numbered item, then a bulleted item, then as a bare sentence.
//! Preamble lines ("Here are some suggestions...") and short fragments are
//! discarded.

use aho_corasick::AhoCorasick;
use regex::Regex;

pub const DEFAULT_MAX_ITEMS: usize = 8;
pub const DEFAULT_MIN_LENGTH: usize = 10;

const FILLER_PHRASES: &[&str] = &[
    "here are",
    "here is",
    "recommendation",
    "key points",
    "below are",
    "suggestions:",
];

pub struct RecommendationParser {
    max_items: usize,
    min_length: usize,
    filler: AhoCorasick,
    numbered: Regex,
    bulleted: Regex,
}

impl Default for RecommendationParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITEMS, DEFAULT_MIN_LENGTH)
    }
}

impl RecommendationParser {
    pub fn new(max_items: usize, min_length: usize) -> Self {
        let filler = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(FILLER_PHRASES)
            .expect("Invalid filler phrases");

        let numbered = Regex::new(r"^\d+[.)]\s+(.+)$").expect("Invalid numbered-item regex");
        let bulleted = Regex::new(r"^[-*•·▪‣–—+]\s+(.+)$").expect("Invalid bullet regex");

        Self {
            max_items,
            min_length,
            filler,
            numbered,
            bulleted,
        }
    }

    /// Ordered list of at most `max_items` recommendations, each longer than `min_length` chars
    pub fn parse(&self, text: &str) -> Vec<String> {
        let mut items = Vec::new();

        for line in text.lines() {
            if items.len() >= self.max_items {
                break;
            }

            let line = line.trim();
            if line.is_empty() || self.filler.is_match(line) {
                continue;
            }

            if let Some(item) = self.candidate(line) {
                if self.long_enough(item) {
                    items.push(item.to_string());
                }
            }
        }

        items
    }

    fn candidate<'a>(&self, line: &'a str) -> Option<&'a str> {
        let marked = self
            .numbered
            .captures(line)
            .or_else(|| self.bulleted.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim());

        match marked {
            Some(rest) => Some(rest),
            None if !line.ends_with(':') && self.long_enough(line) => Some(line),
            None => None,
        }
    }

    fn long_enough(&self, text: &str) -> bool {
        text.chars().count() > self.min_length
    }
}
