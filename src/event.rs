//! Inbound turn events and outbound spoken responses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::SpellError;
use crate::session::PronunciationMode;

/// Raw event as handed over by the request-routing layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub slots: HashMap<String, String>,
}

impl InboundEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            slots: HashMap::new(),
        }
    }

    pub fn with_slot(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.slots.insert(name.into(), value.into());
        self
    }

    /// Parses one line of console input: either a JSON event or the
    /// shorthand `Type` / `Type slot=value with spaces`.
    pub fn parse_line(line: &str) -> Result<Self, SpellError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(SpellError::MalformedEvent("empty input".to_string()));
        }
        if line.starts_with('{') {
            return serde_json::from_str(line).map_err(|e| SpellError::MalformedEvent(e.to_string()));
        }

        let (kind, rest) = match line.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest.trim()),
            None => (line, ""),
        };
        let event = Self::new(kind);
        if rest.is_empty() {
            return Ok(event);
        }
        match rest.split_once('=') {
            Some((slot, value)) if !slot.trim().is_empty() => {
                Ok(event.with_slot(slot.trim(), value.trim()))
            }
            _ => Err(SpellError::MalformedEvent(format!(
                "expected slot=value after {kind}, got {rest:?}"
            ))),
        }
    }

    fn slot(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .find_map(|name| self.slots.get(*name))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// First non-blank value among `names`, or `MissingSlot`.
    fn require(&self, names: &[&str], slot: &'static str) -> Result<String, SpellError> {
        self.slot(names)
            .map(str::to_string)
            .ok_or_else(|| SpellError::MissingSlot {
                turn: self.kind.clone(),
                slot,
            })
    }
}

/// The self-grade given for the last word read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Correct,
    Incorrect,
}

impl Answer {
    /// Only an explicit "yes" counts as correct.
    pub fn from_slot(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "yes" | "yeah" | "yep" | "correct" | "right" => Answer::Correct,
            _ => Answer::Incorrect,
        }
    }
}

/// Typed view of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    SessionStart,
    NameProvided { name: String },
    StartQuiz,
    NextWord,
    StartMarking,
    NextAnswer,
    ConfirmWord { answer: Answer },
    AddWords { text: String },
    ClearList,
    SetPronunciation { mode: PronunciationMode },
    Report,
    Help,
    Stop,
    SessionEnd,
}

/// Discriminant of [`Turn`], used as the key of the guard table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum TurnKind {
    SessionStart,
    NameProvided,
    StartQuiz,
    NextWord,
    StartMarking,
    NextAnswer,
    ConfirmWord,
    AddWords,
    ClearList,
    SetPronunciation,
    Report,
    Help,
    Stop,
    SessionEnd,
}

impl Turn {
    pub fn kind(&self) -> TurnKind {
        match self {
            Turn::SessionStart => TurnKind::SessionStart,
            Turn::NameProvided { .. } => TurnKind::NameProvided,
            Turn::StartQuiz => TurnKind::StartQuiz,
            Turn::NextWord => TurnKind::NextWord,
            Turn::StartMarking => TurnKind::StartMarking,
            Turn::NextAnswer => TurnKind::NextAnswer,
            Turn::ConfirmWord { .. } => TurnKind::ConfirmWord,
            Turn::AddWords { .. } => TurnKind::AddWords,
            Turn::ClearList => TurnKind::ClearList,
            Turn::SetPronunciation { .. } => TurnKind::SetPronunciation,
            Turn::Report => TurnKind::Report,
            Turn::Help => TurnKind::Help,
            Turn::Stop => TurnKind::Stop,
            Turn::SessionEnd => TurnKind::SessionEnd,
        }
    }
}

impl TryFrom<&InboundEvent> for Turn {
    type Error = SpellError;

    fn try_from(event: &InboundEvent) -> Result<Self, Self::Error> {
        let turn = match event.kind.as_str() {
            "SessionStart" | "LaunchRequest" => Turn::SessionStart,
            "NameProvided" | "GetUsernameIntent" => Turn::NameProvided {
                name: event.require(&["name", "userName"], "name")?,
            },
            "StartQuiz" | "BeginQuizIntent" => Turn::StartQuiz,
            "NextWord" | "TellWordIntent" => Turn::NextWord,
            "StartMarking" | "BeginMarkingIntent" => Turn::StartMarking,
            "NextAnswer" | "TellAnswerIntent" => Turn::NextAnswer,
            "ConfirmWord" | "ConfirmWordIntent" => Turn::ConfirmWord {
                answer: Answer::from_slot(&event.require(&["answer", "yesNo"], "answer")?),
            },
            "AddWords" | "AddSpellingIntent" => Turn::AddWords {
                text: event.require(&["words"], "words")?,
            },
            "ClearList" | "ClearSpellingListIntent" => Turn::ClearList,
            "SetPronunciation" => {
                let value = event.require(&["mode"], "mode")?;
                let mode = PronunciationMode::parse(&value).ok_or_else(|| {
                    SpellError::MalformedEvent(format!("unknown pronunciation mode {value:?}"))
                })?;
                Turn::SetPronunciation { mode }
            }
            "ChangeToLettersIntent" => Turn::SetPronunciation {
                mode: PronunciationMode::Letters,
            },
            "ChangeToPhoneticsIntent" => Turn::SetPronunciation {
                mode: PronunciationMode::Phonetic,
            },
            "Report" | "ChildPractiseReportIntent" => Turn::Report,
            "Help" | "AMAZON.HelpIntent" => Turn::Help,
            "Stop" | "AMAZON.StopIntent" | "AMAZON.CancelIntent" => Turn::Stop,
            "SessionEnd" | "SessionEndedRequest" => Turn::SessionEnd,
            other => return Err(SpellError::UnknownEvent(other.to_string())),
        };
        Ok(turn)
    }
}

/// What gets spoken back, and whether the conversation stays open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub speech: String,
    #[serde(rename = "expectsReply")]
    pub expects_reply: bool,
}

impl Response {
    /// Speaks and keeps listening.
    pub fn ask(speech: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            expects_reply: true,
        }
    }

    /// Speaks and closes the conversation.
    pub fn tell(speech: impl Into<String>) -> Self {
        Self {
            speech: speech.into(),
            expects_reply: false,
        }
    }

    pub fn silent() -> Self {
        Self::default()
    }
}
