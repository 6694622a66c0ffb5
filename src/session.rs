use serde::{Deserialize, Serialize};

use crate::cursor::WordCursor;
use crate::profile::Profile;
use crate::report::WordReport;

/// Where the conversation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    AwaitingName,
    Idle,
    Quiz,
    Marking,
}

/// How answers are read back during marking.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PronunciationMode {
    #[default]
    Phonetic,
    Letters,
}

impl PronunciationMode {
    /// Accepts the spoken slot values, including the plural "phonetics".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "phonetic" | "phonetics" | "phonics" | "sounds" => Some(Self::Phonetic),
            "letter" | "letters" => Some(Self::Letters),
            _ => None,
        }
    }
}

/// Ephemeral state for one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub words: Vec<String>,
    pub cursor_index: usize,
    pub state: SessionState,
    pub correct_count: u32,
    pub report: WordReport,
    pub test_attempts: u32,
    pub pronunciation: PronunciationMode,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            words: Vec::new(),
            cursor_index: 0,
            state: SessionState::AwaitingName,
            correct_count: 0,
            report: WordReport::default(),
            test_attempts: 0,
            pronunciation: PronunciationMode::default(),
        }
    }
}

impl Session {
    /// Seeds a fresh session from the durable profile.
    pub fn hydrate(profile: &Profile, pronunciation: PronunciationMode) -> Self {
        let state = if profile.user_name.is_some() {
            SessionState::Idle
        } else {
            SessionState::AwaitingName
        };
        Self {
            words: profile.words.clone(),
            cursor_index: 0,
            state,
            correct_count: 0,
            report: profile.report.clone(),
            test_attempts: profile.test_attempts,
            pronunciation,
        }
    }

    pub fn cursor(&mut self) -> WordCursor<'_> {
        WordCursor::new(&self.words, &mut self.cursor_index)
    }

    /// Rebuilds the report from the current word list, dropping old counts.
    pub fn rebuild_report(&mut self) {
        self.report = WordReport::reset(&self.words);
    }

    /// Rewinds the cursor for a new quiz or marking pass.
    pub fn begin_pass(&mut self, state: SessionState) {
        self.cursor().rewind();
        self.state = state;
    }

    pub fn is_pass_complete(&self) -> bool {
        self.cursor_index >= self.words.len()
    }
}
