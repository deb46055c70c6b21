use serde::{Deserialize, Serialize};

use crate::model::message::{Message, Speaker};
use crate::model::mode::{EndingKind, Mode};

/// State of one game, from the opening narration to an ending.
///
/// Only the turn orchestrator changes mode, ending and pending event;
/// everything else outside the crate reads through the accessors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    transcript: Vec<Message>,
    round_count: u32,
    mode: Mode,
    is_over: bool,
    ending_kind: EndingKind,
    pending_event_text: String,
    field: String,
    role: String,
}

impl Session {
    pub fn new(field: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            role: role.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(Message {
            speaker,
            text: text.into(),
        });
    }

    /// Counts one story round. Quiz answers and rebuttals do not.
    pub fn advance_round(&mut self) {
        self.round_count += 1;
    }

    /// Back to the unconfigured session shown on the setup screen.
    pub fn reset(&mut self) {
        *self = Session::default();
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn round_count(&self) -> u32 {
        self.round_count
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_over(&self) -> bool {
        self.is_over
    }

    pub fn ending_kind(&self) -> EndingKind {
        self.ending_kind
    }

    pub fn pending_event_text(&self) -> &str {
        &self.pending_event_text
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn is_started(&self) -> bool {
        !self.transcript.is_empty()
    }

    pub(crate) fn begin_event(&mut self, mode: Mode, text: String) {
        debug_assert!(mode != Mode::Normal && !text.is_empty());
        self.mode = mode;
        self.pending_event_text = text;
    }

    pub(crate) fn resume(&mut self) {
        self.mode = Mode::Normal;
        self.pending_event_text.clear();
    }

    pub(crate) fn finish(&mut self, ending: EndingKind) {
        self.resume();
        self.is_over = true;
        self.ending_kind = ending;
    }
}
