use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

/// Unified event type consumed by the console host
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// One line of user input.
    Line(String),
    /// Nothing arrived within the idle timeout.
    Idle,
    /// The input source is gone.
    Closed,
}

/// Source of input lines
pub trait TurnSource: Send + 'static {
    /// Block for up to `timeout` waiting for a line.
    fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError>;
}

/// Reads lines from stdin on a background thread
pub struct StdinTurnSource {
    rx: Receiver<String>,
}

impl StdinTurnSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        Self { rx }
    }
}

impl Default for StdinTurnSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSource for StdinTurnSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-backed source for tests
pub struct TestTurnSource {
    rx: Receiver<String>,
}

impl TestTurnSource {
    pub fn new(rx: Receiver<String>) -> Self {
        Self { rx }
    }
}

impl TurnSource for TestTurnSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<String, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls one host event at a time, reporting idleness after `idle_timeout`
pub struct Runner<T: TurnSource> {
    source: T,
    idle_timeout: Duration,
}

impl<T: TurnSource> Runner<T> {
    pub fn new(source: T, idle_timeout: Duration) -> Self {
        Self {
            source,
            idle_timeout,
        }
    }

    pub fn step(&self) -> HostEvent {
        match self.source.recv_timeout(self.idle_timeout) {
            Ok(line) => HostEvent::Line(line),
            Err(RecvTimeoutError::Timeout) => HostEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => HostEvent::Closed,
        }
    }
}
