use spellpal::dispatcher::APOLOGY;
use spellpal::session::SessionState;
use spellpal::report::WordReport;
use spellpal::{
    Dispatcher, InboundEvent, MemoryProfileStore, Profile, ProfileStore, SqliteProfileStore,
};
use tempfile::tempdir;

/// Profiles surviving across conversations, and turns that keep working
/// when the store does not.

fn turn(kind: &str) -> InboundEvent {
    InboundEvent::new(kind)
}

#[test]
fn words_and_report_survive_a_new_conversation() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("profiles.db");

    {
        let store = SqliteProfileStore::open(&db, "ada").unwrap();
        let mut dispatcher = Dispatcher::new(store);
        dispatcher.handle(&turn("SessionStart"));
        dispatcher.handle(&turn("NameProvided").with_slot("name", "Ada"));
        dispatcher.handle(&turn("AddWords").with_slot("words", "ship shop"));
        dispatcher.handle(&turn("StartQuiz"));
        dispatcher.handle(&turn("StartMarking"));
        dispatcher.handle(&turn("NextAnswer"));
        dispatcher.handle(&turn("ConfirmWord").with_slot("answer", "no"));
        dispatcher.handle(&turn("SessionEnd"));
    }

    let store = SqliteProfileStore::open(&db, "ada").unwrap();
    let mut dispatcher = Dispatcher::new(store);
    let greeting = dispatcher.handle(&turn("SessionStart"));
    assert!(greeting.speech.contains("Ada"));

    let session = dispatcher.session();
    assert_eq!(session.state, SessionState::Idle);
    assert_eq!(session.words, vec!["ship", "shop"]);
    assert_eq!(session.test_attempts, 1);
    assert_eq!(session.report.misses("ship"), Some(1));
    assert_eq!(session.cursor_index, 0);
    assert_eq!(session.correct_count, 0);
}

#[test]
fn pronunciation_is_not_carried_between_conversations() {
    let store = MemoryProfileStore::new();
    let mut dispatcher = Dispatcher::new(store);
    dispatcher.handle(&turn("SessionStart"));
    dispatcher.handle(&turn("ChangeToLettersIntent"));
    dispatcher.handle(&turn("SessionEnd"));
    dispatcher.handle(&turn("SessionStart"));
    assert_eq!(
        dispatcher.session().pronunciation,
        spellpal::session::PronunciationMode::Phonetic
    );
}

#[test]
fn failed_writes_keep_the_session_going() {
    let store = MemoryProfileStore::new();
    let mut dispatcher = Dispatcher::new(store.clone());
    dispatcher.handle(&turn("SessionStart"));
    dispatcher.handle(&turn("NameProvided").with_slot("name", "Ada"));
    let saved_before = store.save_count();

    store.set_failing(true);
    let response = dispatcher.handle(&turn("AddWords").with_slot("words", "red blue"));
    assert_eq!(response.speech, "Ok. I have added 2 words.");
    assert_eq!(dispatcher.session().words, vec!["red", "blue"]);
    assert_eq!(store.save_count(), saved_before);

    dispatcher.handle(&turn("StartQuiz"));
    let response = dispatcher.handle(&turn("NextWord"));
    assert_eq!(response.speech, "Your 1st word is: red");

    store.set_failing(false);
    assert!(store.snapshot().unwrap().words.is_empty());
}

#[test]
fn failed_load_apologises_but_opens_an_empty_session() {
    let store = MemoryProfileStore::new();
    store.set_failing(true);
    let mut dispatcher = Dispatcher::new(store.clone());

    let response = dispatcher.handle(&turn("SessionStart"));
    assert_eq!(response.speech, APOLOGY);
    assert!(response.expects_reply);
    assert!(dispatcher.is_open());
    assert_eq!(dispatcher.session().state, SessionState::AwaitingName);
}

#[test]
fn failed_load_never_overwrites_the_stored_profile() {
    let words = vec!["cat".to_string(), "dog".to_string()];
    let store = MemoryProfileStore::with_profile(Profile {
        user_name: Some("Ada".to_string()),
        report: WordReport::reset(&words),
        words,
        test_attempts: 4,
        updated_at: None,
    });
    store.set_failing(true);
    let mut dispatcher = Dispatcher::new(store.clone());
    assert_eq!(dispatcher.handle(&turn("SessionStart")).speech, APOLOGY);

    store.set_failing(false);
    let response = dispatcher.handle(&turn("AddWords").with_slot("words", "fish"));
    assert_eq!(response.speech, "Ok. I have added the word.");
    assert_eq!(dispatcher.session().words, vec!["fish"]);
    assert_eq!(store.save_count(), 0);

    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored.user_name.as_deref(), Some("Ada"));
    assert_eq!(stored.words, vec!["cat", "dog"]);
    assert_eq!(stored.test_attempts, 4);

    dispatcher.handle(&turn("SessionEnd"));
    let greeting = dispatcher.handle(&turn("SessionStart"));
    assert!(greeting.speech.contains("Ada"));
    dispatcher.handle(&turn("AddWords").with_slot("words", "fish"));
    assert_eq!(store.snapshot().unwrap().words, vec!["cat", "dog", "fish"]);
}

#[test]
fn two_users_share_a_database_without_mixing() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("profiles.db");

    for (user, words) in [("ada", "cat"), ("sam", "dog fish")] {
        let store = SqliteProfileStore::open(&db, user).unwrap();
        let mut dispatcher = Dispatcher::new(store);
        dispatcher.handle(&turn("SessionStart"));
        dispatcher.handle(&turn("NameProvided").with_slot("name", user));
        dispatcher.handle(&turn("AddWords").with_slot("words", words));
    }

    let ada = SqliteProfileStore::open(&db, "ada").unwrap().load().unwrap().unwrap();
    let sam = SqliteProfileStore::open(&db, "sam").unwrap().load().unwrap().unwrap();
    assert_eq!(ada.words, vec!["cat"]);
    assert_eq!(sam.words, vec!["dog", "fish"]);
    assert_eq!(sam.report.len(), 2);
}
