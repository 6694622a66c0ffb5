//! Turn routing and the session state machine.
//!
//! Every turn kind has exactly one guard (see [`guard_for`]) and one handler.
//! A turn whose guard rejects the current state never reaches its handler and
//! is answered with the "unrecognized" fallback instead.

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::cursor::{ordinal_label, NextResult};
use crate::error::SpellError;
use crate::event::{Answer, InboundEvent, Response, Turn, TurnKind};
use crate::phonetics::{pause, spell_letters, spell_phonetic, LETTER_PAUSE_MS};
use crate::profile::{Profile, ProfileStore};
use crate::session::{PronunciationMode, Session, SessionState};

pub const APOLOGY: &str = "Sorry, I had trouble doing what you asked. Please try again.";
pub const FALLBACK: &str =
    "Sorry, I can't help with that right now. You can update your list or begin a test.";

/// Pause between a read-back spelling and the "did you get that right" prompt.
const CONFIRM_PAUSE_MS: u32 = LETTER_PAUSE_MS;

/// Which session states a turn is accepted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Any,
    Only(SessionState),
}

impl Guard {
    pub fn admits(self, state: SessionState) -> bool {
        match self {
            Guard::Any => true,
            Guard::Only(required) => required == state,
        }
    }
}

/// The guard table.
pub fn guard_for(kind: TurnKind) -> Guard {
    match kind {
        TurnKind::NameProvided => Guard::Only(SessionState::AwaitingName),
        TurnKind::NextWord => Guard::Only(SessionState::Quiz),
        TurnKind::NextAnswer => Guard::Only(SessionState::Marking),
        TurnKind::SessionStart
        | TurnKind::StartQuiz
        | TurnKind::StartMarking
        | TurnKind::ConfirmWord
        | TurnKind::AddWords
        | TurnKind::ClearList
        | TurnKind::SetPronunciation
        | TurnKind::Report
        | TurnKind::Help
        | TurnKind::Stop
        | TurnKind::SessionEnd => Guard::Any,
    }
}

/// Owns one conversation's session and the user's profile, and answers turns.
pub struct Dispatcher<S: ProfileStore> {
    store: S,
    default_pronunciation: PronunciationMode,
    session: Session,
    profile: Profile,
    open: bool,
    /// False after a failed load; the in-memory profile is then a stand-in
    /// and must not overwrite the durable one.
    loaded: bool,
}

impl<S: ProfileStore> Dispatcher<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            default_pronunciation: PronunciationMode::default(),
            session: Session::default(),
            profile: Profile::default(),
            open: false,
            loaded: false,
        }
    }

    /// Pronunciation every new session starts with.
    pub fn with_pronunciation(mut self, mode: PronunciationMode) -> Self {
        self.default_pronunciation = mode;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Handles one turn. Never fails: errors become spoken fallbacks.
    pub fn handle(&mut self, event: &InboundEvent) -> Response {
        match self.try_handle(event) {
            Ok(response) => response,
            Err(err) if err.is_unrecognized() => {
                debug!(%err, "unrecognized turn");
                Response::ask(FALLBACK)
            }
            Err(err) => {
                error!(%err, event = %event.kind, "turn failed");
                Response::ask(APOLOGY)
            }
        }
    }

    fn try_handle(&mut self, event: &InboundEvent) -> Result<Response, SpellError> {
        let turn = Turn::try_from(event)?;
        let kind = turn.kind();

        if !self.open && !matches!(kind, TurnKind::SessionStart | TurnKind::SessionEnd) {
            debug!(turn = %kind, "turn arrived without a session; opening one");
            self.open_session()?;
        }

        let state = self.session.state;
        if !guard_for(kind).admits(state) {
            return Err(SpellError::GuardMismatch {
                turn: kind.to_string(),
                state,
            });
        }
        debug!(turn = %kind, %state, "dispatching turn");

        match turn {
            Turn::SessionStart => self.start_session(),
            Turn::NameProvided { name } => Ok(self.register_name(name)),
            Turn::StartQuiz => Ok(self.start_quiz()),
            Turn::NextWord => Ok(self.next_word()),
            Turn::StartMarking => Ok(self.start_marking()),
            Turn::NextAnswer => self.next_answer(),
            Turn::ConfirmWord { answer } => self.confirm_word(answer),
            Turn::AddWords { text } => Ok(self.add_words(&text)),
            Turn::ClearList => Ok(self.clear_list()),
            Turn::SetPronunciation { mode } => Ok(self.set_pronunciation(mode)),
            Turn::Report => Ok(self.report()),
            Turn::Help => Ok(Response::ask(
                "You can add words by saying add, then your words. \
                 Say begin test to practise, begin checking to mark your answers, \
                 or ask for a report. How can I help?",
            )),
            Turn::Stop => Ok(Response::tell("Goodbye!")),
            Turn::SessionEnd => Ok(self.end_session()),
        }
    }

    /// Loads the profile and seeds a fresh session from it. On a failed load
    /// the session still opens, empty.
    fn open_session(&mut self) -> Result<(), SpellError> {
        let (profile, failure) = match self.store.load() {
            Ok(profile) => (profile.unwrap_or_default(), None),
            Err(err) => (Profile::default(), Some(err)),
        };
        self.session = Session::hydrate(&profile, self.default_pronunciation);
        self.profile = profile;
        self.open = true;
        self.loaded = failure.is_none();
        info!(
            state = %self.session.state,
            words = self.session.words.len(),
            "session opened"
        );
        match failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn end_session(&mut self) -> Response {
        if self.open {
            info!("session ended");
        }
        self.session = Session::default();
        self.open = false;
        Response::silent()
    }

    /// Mirrors the session into the profile and writes it. A failed write is
    /// logged and the turn carries on with in-session state only. Nothing is
    /// written while the session runs on a profile that failed to load.
    fn persist(&mut self) {
        if !self.loaded {
            warn!("profile was not loaded this session; skipping write");
            return;
        }
        self.profile.words = self.session.words.clone();
        self.profile.report = self.session.report.clone();
        self.profile.test_attempts = self.session.test_attempts;
        self.profile.updated_at = Some(Local::now());
        match self.store.save(&self.profile) {
            Ok(()) => info!(words = self.profile.words.len(), "profile saved"),
            Err(err) => warn!(%err, "profile write failed; durable state may be stale"),
        }
    }

    fn transition(&mut self, to: SessionState) {
        if self.session.state != to {
            info!(from = %self.session.state, %to, "state change");
        }
        self.session.begin_pass(to);
    }

    fn start_session(&mut self) -> Result<Response, SpellError> {
        self.open_session()?;
        let speech = match &self.profile.user_name {
            Some(name) => format!(
                "Welcome to Spelling Practice {name}. You can update your list or begin a test"
            ),
            None => "Have we met before? Please tell me your name to continue.".to_string(),
        };
        Ok(Response::ask(speech))
    }

    fn register_name(&mut self, name: String) -> Response {
        let speech = format!(
            "Hello {name}. Welcome to Spelling Practice. You can say update my list or begin test."
        );
        self.profile.user_name = Some(name);
        self.persist();
        info!("name registered");
        self.session.state = SessionState::Idle;
        Response::tell(speech)
    }

    fn start_quiz(&mut self) -> Response {
        self.session.cursor().rewind();
        self.session.test_attempts += 1;
        self.persist();

        if self.session.words.is_empty() {
            return Response::ask("Please add words to your spelling list to begin a test");
        }
        self.transition(SessionState::Quiz);
        Response::ask("Your test will now begin. Say next word to hear your first word.")
    }

    fn next_word(&mut self) -> Response {
        let total = self.session.words.len();
        let speech = match self.session.cursor().next() {
            NextResult::Empty => "You haven't added any words yet. \
                Say update my spelling list to add words to your spelling list."
                .to_string(),
            NextResult::Exhausted => "You have completed your spelling test! \
                You can say 'begin checking' to check your spellings."
                .to_string(),
            NextResult::Word { word, position } => {
                format!("Your {} word is: {word}", ordinal_label(position, total))
            }
        };
        Response::ask(speech)
    }

    fn start_marking(&mut self) -> Response {
        if self.session.report.is_empty() && !self.session.words.is_empty() {
            self.session.rebuild_report();
            self.persist();
        }
        self.session.cursor().rewind();

        if self.session.words.is_empty() {
            return Response::ask("Please add words to your spelling list to begin spell-checking");
        }
        self.session.correct_count = 0;
        self.transition(SessionState::Marking);
        Response::ask(
            "Spell-Checker will now begin. Say next one to hear your first word and its spelling.",
        )
    }

    fn next_answer(&mut self) -> Result<Response, SpellError> {
        let total = self.session.words.len();
        let speech = match self.session.cursor().next() {
            NextResult::Empty => {
                "I'm sorry but it seems that there are no words for you to practise this week."
                    .to_string()
            }
            NextResult::Exhausted => "That's all the words you needed to practise today. \
                You can close this program now."
                .to_string(),
            NextResult::Word { word, position } => {
                let spelling = self.render_spelling(&word)?;
                format!(
                    "Your {} word was {word}. It is spelt as: {spelling}.{} Did you get that right?",
                    ordinal_label(position, total),
                    pause(CONFIRM_PAUSE_MS),
                )
            }
        };
        Ok(Response::ask(speech))
    }

    fn render_spelling(&self, word: &str) -> Result<String, SpellError> {
        match self.session.pronunciation {
            PronunciationMode::Letters => Ok(spell_letters(word)),
            PronunciationMode::Phonetic => spell_phonetic(word),
        }
    }

    fn confirm_word(&mut self, answer: Answer) -> Result<Response, SpellError> {
        let served = self.session.cursor().last_served().map(str::to_string);
        let Some(word) = served else {
            return Ok(Response::ask(
                "There's no word to check yet. Say next one to hear a word first.",
            ));
        };

        let verdict = match answer {
            Answer::Correct => {
                self.session.correct_count += 1;
                "Well done!"
            }
            Answer::Incorrect => {
                let misses = self.session.report.record_miss(&word)?;
                debug!(%word, misses, "miss recorded");
                "Unlucky!"
            }
        };
        self.persist();

        let speech = if !self.session.is_pass_complete() {
            format!("{verdict} You can say 'next one' to hear the spelling of your next word.")
        } else if self.session.state == SessionState::Marking {
            format!(
                "{verdict} Spell-Checking Complete. You got {} out of {} right.",
                self.session.correct_count,
                self.session.words.len()
            )
        } else {
            format!("{verdict} Spell-Checking Complete")
        };
        Ok(Response::ask(speech))
    }

    fn add_words(&mut self, text: &str) -> Response {
        let added = text.split_whitespace().count();
        self.session
            .words
            .extend(text.split_whitespace().map(str::to_string));
        self.session.test_attempts = 0;
        self.persist();

        self.session.rebuild_report();
        self.persist();
        info!(added, total = self.session.words.len(), "words added");

        if added == 1 {
            Response::tell("Ok. I have added the word.")
        } else {
            Response::tell(format!("Ok. I have added {added} words."))
        }
    }

    fn clear_list(&mut self) -> Response {
        self.session.words.clear();
        self.session.cursor().rewind();
        self.persist();
        Response::tell(
            "Ok. I have cleared all the words from your spelling list. \
             You can make a new list by saying 'create a new spelling list'.",
        )
    }

    fn set_pronunciation(&mut self, mode: PronunciationMode) -> Response {
        self.session.pronunciation = mode;
        let label = match mode {
            PronunciationMode::Phonetic => "phonetics",
            PronunciationMode::Letters => "letters",
        };
        Response::ask(format!("Answers will be told in {label}"))
    }

    fn report(&self) -> Response {
        Response::tell(narrate_report(
            self.profile.user_name.as_deref(),
            &self.session,
        ))
    }
}

/// Spoken summary: attempt count, then every missed word, worst first.
pub fn narrate_report(user_name: Option<&str>, session: &Session) -> String {
    let name = user_name.unwrap_or("Your speller");
    let mut speech = format!(
        "{name} has currently attempted the test {}.",
        times(session.test_attempts)
    );
    for (word, misses) in session.report.ranked() {
        if misses > 0 {
            speech.push_str(&format!(" They got the word {word} wrong {}.", times(misses)));
        }
    }
    speech
}

fn times(n: u32) -> String {
    if n == 1 {
        "1 time".to_string()
    } else {
        format!("{n} times")
    }
}
