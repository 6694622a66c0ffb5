//! Console host: turns input lines into events, opens and closes
//! conversations, and prints responses.

use std::io::{self, Write};
use tracing::{info, warn};

use crate::dispatcher::{Dispatcher, FALLBACK};
use crate::event::{InboundEvent, Response, Turn, TurnKind};
use crate::phonetics::strip_markup;
use crate::profile::ProfileStore;
use crate::runtime::{HostEvent, Runner, TurnSource};

pub struct Console<S: ProfileStore, W: Write> {
    dispatcher: Dispatcher<S>,
    out: W,
    json: bool,
}

impl<S: ProfileStore, W: Write> Console<S, W> {
    pub fn new(dispatcher: Dispatcher<S>, out: W, json: bool) -> Self {
        Self {
            dispatcher,
            out,
            json,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<S> {
        &self.dispatcher
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs until the turn source closes.
    pub fn run<T: TurnSource>(&mut self, runner: &Runner<T>) -> io::Result<()> {
        loop {
            match runner.step() {
                HostEvent::Line(line) => self.on_line(&line)?,
                HostEvent::Idle => self.on_idle(),
                HostEvent::Closed => {
                    self.end_conversation();
                    return Ok(());
                }
            }
        }
    }

    pub fn on_line(&mut self, line: &str) -> io::Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let event = match InboundEvent::parse_line(line) {
            Ok(event) => event,
            Err(err) => {
                warn!(%err, "could not parse input");
                return self.emit(&Response::ask(FALLBACK));
            }
        };

        let kind = Turn::try_from(&event).map(|turn| turn.kind()).ok();
        if !self.dispatcher.is_open()
            && !matches!(kind, Some(TurnKind::SessionStart | TurnKind::SessionEnd))
        {
            let greeting = self.dispatcher.handle(&InboundEvent::new("SessionStart"));
            self.emit(&greeting)?;
        }

        let response = self.dispatcher.handle(&event);
        self.emit(&response)?;
        if !response.expects_reply {
            self.end_conversation();
        }
        Ok(())
    }

    pub fn on_idle(&mut self) {
        if self.dispatcher.is_open() {
            info!("session idle; closing");
            self.end_conversation();
        }
    }

    fn end_conversation(&mut self) {
        if self.dispatcher.is_open() {
            self.dispatcher.handle(&InboundEvent::new("SessionEnd"));
        }
    }

    fn emit(&mut self, response: &Response) -> io::Result<()> {
        if self.json {
            let line = serde_json::to_string(response)?;
            writeln!(self.out, "{line}")
        } else if response.speech.is_empty() {
            Ok(())
        } else {
            writeln!(self.out, "{}", strip_markup(&response.speech))
        }
    }
}
