use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::error::SpellError;

/// Miss count for one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTally {
    pub word: String,
    pub misses: u32,
}

/// Word → incorrect-count mapping, kept in first-seen order of the word list
/// it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordReport {
    entries: Vec<WordTally>,
}

impl WordReport {
    /// A fresh report with every distinct word at zero. Prior counts are not
    /// carried over.
    pub fn reset<S: AsRef<str>>(words: &[S]) -> Self {
        let entries = words
            .iter()
            .map(AsRef::as_ref)
            .unique()
            .map(|word| WordTally {
                word: word.to_string(),
                misses: 0,
            })
            .collect();
        Self { entries }
    }

    /// Bumps the miss count for `word` and returns the new count.
    pub fn record_miss(&mut self, word: &str) -> Result<u32, SpellError> {
        let tally = self
            .entries
            .iter_mut()
            .find(|t| t.word == word)
            .ok_or_else(|| SpellError::UnknownWord(word.to_string()))?;
        tally.misses += 1;
        Ok(tally.misses)
    }

    /// Entries by descending miss count; equal counts keep report order.
    pub fn ranked(&self) -> Vec<(&str, u32)> {
        self.entries
            .iter()
            .sorted_by_key(|t| Reverse(t.misses))
            .map(|t| (t.word.as_str(), t.misses))
            .collect()
    }

    pub fn misses(&self, word: &str) -> Option<u32> {
        self.entries.iter().find(|t| t.word == word).map(|t| t.misses)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.misses(word).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|t| t.word.as_str())
    }

    pub fn total_misses(&self) -> u32 {
        self.entries.iter().map(|t| t.misses).sum()
    }
}
