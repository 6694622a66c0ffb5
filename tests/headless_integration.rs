use std::sync::mpsc;
use std::time::Duration;

use spellpal::host::Console;
use spellpal::runtime::{HostEvent, Runner, TestTurnSource};
use spellpal::{Dispatcher, MemoryProfileStore};

// Headless integration using the runtime runner + console host without stdin.
// Lines go in through a channel; printed responses come back in a buffer.
#[test]
fn headless_conversation_runs_to_completion() {
    let store = MemoryProfileStore::new();
    let mut console = Console::new(Dispatcher::new(store.clone()), Vec::new(), false);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestTurnSource::new(rx), Duration::from_millis(50));

    for line in [
        "SessionStart",
        "NameProvided name=Ada",
        "AddWords words=cat dog",
        "StartQuiz",
        "NextWord",
        "NextWord",
        "NextWord",
    ] {
        tx.send(line.to_string()).unwrap();
    }
    drop(tx);

    console.run(&runner).unwrap();
    assert!(!console.dispatcher().is_open());

    let text = String::from_utf8(console.into_output()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Have we met before? Please tell me your name to continue.",
            "Hello Ada. Welcome to Spelling Practice. You can say update my list or begin test.",
            "Welcome to Spelling Practice Ada. You can update your list or begin a test",
            "Ok. I have added 2 words.",
            "Welcome to Spelling Practice Ada. You can update your list or begin a test",
            "Your test will now begin. Say next word to hear your first word.",
            "Your 1st word is: cat",
            "Your last word is: dog",
            "You have completed your spelling test! You can say 'begin checking' to check your spellings.",
        ]
    );
    assert_eq!(store.snapshot().unwrap().test_attempts, 1);
}

#[test]
fn headless_idle_timeout_closes_the_session() {
    let mut console = Console::new(Dispatcher::new(MemoryProfileStore::new()), Vec::new(), true);
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestTurnSource::new(rx), Duration::from_millis(5));

    tx.send("SessionStart".to_string()).unwrap();
    match runner.step() {
        HostEvent::Line(line) => console.on_line(&line).unwrap(),
        other => panic!("expected a line, got {other:?}"),
    }
    assert!(console.dispatcher().is_open());

    assert_eq!(runner.step(), HostEvent::Idle);
    console.on_idle();
    assert!(!console.dispatcher().is_open());
    drop(tx);
}
