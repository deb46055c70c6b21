use std::fmt;

use log::{debug, info, warn};

use crate::config::{GameConfig, QuizSource};
use crate::engine::error::{InvalidTurnInput, MalformedDirective, ProviderError, TurnError};
use crate::engine::llm_client::LlmClient;
use crate::engine::prompt::{ActionShape, PromptBuilder};
use crate::engine::tags::{parse_directives, Directives, Transition};
use crate::engine::trigger::TriggerPolicy;
use crate::logutil::preview;
use crate::model::message::Speaker;
use crate::model::mode::{EndingKind, EventKind, Mode};
use crate::model::session::Session;

const MISSING_EVENT_TEXT: &str =
    "The examiner mumbles something inaudible. Answer anyway to continue.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceLetter {
    A,
    B,
    C,
}

impl fmt::Display for ChoiceLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChoiceLetter::A => "A",
            ChoiceLetter::B => "B",
            ChoiceLetter::C => "C",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    Action(String),
    Choice(ChoiceLetter),
    QuizAnswer(String),
    Rebuttal(String),
}

impl PlayerInput {
    fn kind(&self) -> &'static str {
        match self {
            PlayerInput::Action(_) => "free action",
            PlayerInput::Choice(_) => "lettered choice",
            PlayerInput::QuizAnswer(_) => "quiz answer",
            PlayerInput::Rebuttal(_) => "rebuttal",
        }
    }

    fn accepted_in(&self) -> Mode {
        match self {
            PlayerInput::Action(_) | PlayerInput::Choice(_) => Mode::Normal,
            PlayerInput::QuizAnswer(_) => Mode::Quiz,
            PlayerInput::Rebuttal(_) => Mode::Boss,
        }
    }

    /// Whether this input spends a story round.
    fn is_action(&self) -> bool {
        matches!(self, PlayerInput::Action(_) | PlayerInput::Choice(_))
    }

    /// What the transcript shows for this input.
    fn text(&self) -> String {
        match self {
            PlayerInput::Action(t) | PlayerInput::QuizAnswer(t) | PlayerInput::Rebuttal(t) => {
                t.trim().to_string()
            }
            PlayerInput::Choice(letter) => letter.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnTransition {
    Continued,
    EventStarted(EventKind),
    Resumed,
    GameOver(EndingKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub transition: TurnTransition,
    /// The cleaned reply as recorded in the transcript.
    pub narrative: String,
}

/// Encodes the game rules: one call per turn, tags in the reply drive the session.
pub struct TurnOrchestrator<C, P> {
    client: C,
    policy: P,
    temperature: f32,
    quiz_source: QuizSource,
    system_prompt: Option<String>,
}

impl<C: LlmClient> TurnOrchestrator<C, Box<dyn TriggerPolicy + Send>> {
    pub fn from_config(client: C, config: &GameConfig) -> Self {
        TurnOrchestrator::new(client, config.rules.trigger.build())
            .with_temperature(config.llm.temperature)
            .with_quiz_source(config.rules.quiz_source)
            .with_system_prompt(config.rules.system_prompt.clone())
    }
}

impl<C: LlmClient, P: TriggerPolicy> TurnOrchestrator<C, P> {
    pub fn new(client: C, policy: P) -> Self {
        Self {
            client,
            policy,
            temperature: 0.7,
            quiz_source: QuizSource::Inline,
            system_prompt: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_quiz_source(mut self, quiz_source: QuizSource) -> Self {
        self.quiz_source = quiz_source;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.system_prompt = system_prompt.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Sends the opening prompt and records the first narration.
    /// Not a round. A provider failure leaves the session untouched so
    /// the opening can be retried.
    pub fn open(&mut self, session: &mut Session) -> Result<TurnOutcome, TurnError> {
        if session.is_over() {
            return Err(InvalidTurnInput::GameOver.into());
        }
        if session.is_started() {
            return Err(InvalidTurnInput::AlreadyStarted.into());
        }

        let prompt = PromptBuilder::intro(session.field(), session.role());
        let reply = self.ask(session, 0, &prompt).map_err(|e| {
            warn!("opening failed: {}", e);
            TurnError::Provider(e)
        })?;

        Ok(self.apply(session, parse_directives(&reply), None, false))
    }

    /// Runs one player turn.
    ///
    /// Invalid input is rejected before anything happens. On a provider
    /// failure the player's entry and an error entry stay in the transcript
    /// and nothing else changes.
    pub fn take_turn(
        &mut self,
        session: &mut Session,
        input: PlayerInput,
    ) -> Result<TurnOutcome, TurnError> {
        validate(session, &input)?;

        let history_len = session.transcript().len();
        let mut planned = None;
        let directive = match &input {
            PlayerInput::Action(_) | PlayerInput::Choice(_) => {
                planned = self.policy.should_trigger(session.round_count());
                let shape = match planned {
                    None => ActionShape::Choices,
                    Some(EventKind::Quiz) if self.quiz_source == QuizSource::Separate => {
                        ActionShape::QuizFollows
                    }
                    Some(kind) => ActionShape::Event(kind),
                };
                let action = match &input {
                    PlayerInput::Choice(letter) => format!("I choose option {letter}."),
                    other => other.text(),
                };
                PromptBuilder::action(&action, shape)
            }
            PlayerInput::QuizAnswer(answer) => {
                PromptBuilder::quiz_answer(session.pending_event_text(), answer.trim())
            }
            PlayerInput::Rebuttal(rebuttal) => {
                PromptBuilder::rebuttal(session.pending_event_text(), rebuttal.trim())
            }
        };
        if let Some(kind) = planned {
            info!("round {} triggers a {}", session.round_count(), kind);
        }

        session.record(Speaker::Player, input.text());

        let reply = match self.ask(session, history_len, &directive) {
            Ok(reply) => reply,
            Err(e) => return Err(self.fail(session, e)),
        };
        let directives = parse_directives(&reply);

        let separate_quiz = planned == Some(EventKind::Quiz)
            && self.quiz_source == QuizSource::Separate
            && directives.transition.is_none();
        let quiz = if separate_quiz {
            match self.fetch_quiz_question(session) {
                Ok(question) => Some(question),
                Err(e) => return Err(self.fail(session, e)),
            }
        } else {
            None
        };

        Ok(self.apply(session, directives, quiz, input.is_action()))
    }

    fn ask(
        &self,
        session: &Session,
        history_len: usize,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        debug!("directive: {}", preview(prompt));
        let system = self.system_instruction(session);
        let reply = self.client.ask(
            &system,
            &session.transcript()[..history_len],
            prompt,
            self.temperature,
        )?;
        debug!("reply: {}", preview(&reply));
        Ok(reply)
    }

    /// Second request with no history, used when quizzes are not inline.
    fn fetch_quiz_question(&self, session: &Session) -> Result<String, ProviderError> {
        let prompt = PromptBuilder::quiz_question(session.field(), session.role());
        let system = self.system_instruction(session);
        let reply = self.client.ask(&system, &[], &prompt, self.temperature)?;
        Ok(parse_directives(&reply).narrative)
    }

    fn system_instruction(&self, session: &Session) -> String {
        match &self.system_prompt {
            Some(custom) => custom.clone(),
            None => PromptBuilder::system_instruction(session.field(), session.role()),
        }
    }

    fn fail(&self, session: &mut Session, error: ProviderError) -> TurnError {
        warn!("turn rolled back: {}", error);
        session.record(
            Speaker::Narrator,
            format!("⚠ {error}. Nothing changed, try again."),
        );
        TurnError::Provider(error)
    }

    fn apply(
        &self,
        session: &mut Session,
        directives: Directives,
        separate_quiz: Option<String>,
        is_action: bool,
    ) -> TurnOutcome {
        let answering = session.mode() != Mode::Normal;
        let mut narrative = directives.narrative.clone();

        let transition = match directives.transition {
            Some(Transition::GameOver) => {
                let ending = directives.ending().unwrap_or_else(|e| {
                    warn!("{}, ending as {}", e, EndingKind::Failure.tag());
                    EndingKind::Failure
                });
                session.finish(ending);
                TurnTransition::GameOver(ending)
            }
            Some(Transition::Event(kind)) if !answering => {
                let text = match directives.event_text(kind) {
                    Ok(text) => text.to_string(),
                    Err(e) => {
                        warn!("{}", e);
                        MISSING_EVENT_TEXT.to_string()
                    }
                };
                session.begin_event(kind.mode(), text);
                TurnTransition::EventStarted(kind)
            }
            Some(Transition::Event(kind)) => {
                debug!("ignoring {} marker while grading", kind);
                narrative = directives.flattened();
                session.resume();
                TurnTransition::Resumed
            }
            None if answering => {
                session.resume();
                TurnTransition::Resumed
            }
            None => match separate_quiz {
                Some(question) if !question.is_empty() => {
                    session.begin_event(Mode::Quiz, question);
                    TurnTransition::EventStarted(EventKind::Quiz)
                }
                Some(_) => {
                    warn!("{}", MalformedDirective::MissingEventPayload(EventKind::Quiz));
                    session.begin_event(Mode::Quiz, MISSING_EVENT_TEXT.to_string());
                    TurnTransition::EventStarted(EventKind::Quiz)
                }
                None => TurnTransition::Continued,
            },
        };

        if is_action {
            session.advance_round();
        }

        if !narrative.is_empty() {
            session.record(Speaker::Narrator, narrative.clone());
        }
        if let TurnTransition::EventStarted(kind) = transition {
            let label = match kind {
                EventKind::Quiz => "📝 Pop quiz",
                EventKind::BossBattle => "⚔ Boss battle",
            };
            let line = format!("{label}: {}", session.pending_event_text());
            session.record(Speaker::Narrator, line);
        }

        info!(
            "round {} -> {:?} (mode {}, over {})",
            session.round_count(),
            transition,
            session.mode(),
            session.is_over()
        );

        TurnOutcome {
            transition,
            narrative,
        }
    }
}

fn validate(session: &Session, input: &PlayerInput) -> Result<(), InvalidTurnInput> {
    if session.is_over() {
        return Err(InvalidTurnInput::GameOver);
    }
    if input.accepted_in() != session.mode() {
        return Err(InvalidTurnInput::WrongMode {
            mode: session.mode(),
            input: input.kind(),
        });
    }
    if input.text().is_empty() {
        return Err(InvalidTurnInput::EmptyInput);
    }
    Ok(())
}
