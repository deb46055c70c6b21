use std::cell::RefCell;
use std::collections::VecDeque;

use academic_survival::config::QuizSource;
use academic_survival::engine::error::{InvalidTurnInput, ProviderError, TurnError};
use academic_survival::engine::llm_client::LlmClient;
use academic_survival::engine::orchestrator::{
    ChoiceLetter, PlayerInput, TurnOrchestrator, TurnTransition,
};
use academic_survival::engine::trigger::{Periodic, TriggerPolicy};
use academic_survival::model::message::{Message, Speaker};
use academic_survival::model::mode::{EndingKind, EventKind, Mode};
use academic_survival::model::session::Session;

const CHOICES: &str = "The cryostat hisses.\nA) Refill\nB) Pray\nC) Email the PI";

#[derive(Debug, Clone)]
struct Call {
    prior_turns: Vec<Message>,
    prompt: String,
    temperature: f32,
}

/// Replays canned replies in order and remembers every request.
#[derive(Default)]
struct Scripted {
    replies: RefCell<VecDeque<Result<String, ProviderError>>>,
    calls: RefCell<Vec<Call>>,
}

impl Scripted {
    fn new() -> Self {
        Self::default()
    }

    fn reply(self, text: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(text.to_string()));
        self
    }

    fn fail(self, error: ProviderError) -> Self {
        self.replies.borrow_mut().push_back(Err(error));
        self
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn last_call(&self) -> Call {
        self.calls.borrow().last().cloned().expect("no calls made")
    }
}

impl LlmClient for Scripted {
    fn ask(
        &self,
        _system_instruction: &str,
        prior_turns: &[Message],
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        self.calls.borrow_mut().push(Call {
            prior_turns: prior_turns.to_vec(),
            prompt: prompt.to_string(),
            temperature,
        });
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(CHOICES.to_string()))
    }
}

fn player(text: &str) -> Message {
    Message {
        speaker: Speaker::Player,
        text: text.to_string(),
    }
}

fn narrator(text: &str) -> Message {
    Message {
        speaker: Speaker::Narrator,
        text: text.to_string(),
    }
}

fn never() -> Periodic {
    Periodic::new(None, None)
}

fn session() -> Session {
    Session::new("Condensed matter", "Experimental")
}

fn action(text: &str) -> PlayerInput {
    PlayerInput::Action(text.to_string())
}

#[test]
fn plain_actions_add_one_round_each() {
    let mut orch = TurnOrchestrator::new(Scripted::new(), never());
    let mut s = session();

    for round in 1..=10 {
        let outcome = orch.take_turn(&mut s, action("Keep measuring")).unwrap();
        assert_eq!(outcome.transition, TurnTransition::Continued);
        assert_eq!(s.round_count(), round);
        assert_eq!(s.mode(), Mode::Normal);
    }
    assert_eq!(orch.client().call_count(), 10);
    assert_eq!(s.transcript().len(), 20);
}

#[test]
fn lettered_choice_is_recorded_as_letter() {
    let mut orch = TurnOrchestrator::new(Scripted::new(), never());
    let mut s = session();

    orch.take_turn(&mut s, PlayerInput::Choice(ChoiceLetter::B)).unwrap();
    assert_eq!(s.transcript()[0], player("B"));
    assert!(orch.client().last_call().prompt.contains("I choose option B."));
    assert_eq!(s.round_count(), 1);
}

#[test]
fn trigger_round_requests_quiz_and_enters_quiz_mode() {
    let client = Scripted::new()
        .reply(CHOICES)
        .reply(CHOICES)
        .reply(CHOICES)
        .reply("Your PI corners you.\n[EVENT: QUIZ]: What is the Fermi energy?");
    let mut orch = TurnOrchestrator::new(client, Periodic::new(Some(3), None));
    let mut s = session();

    for _ in 0..3 {
        orch.take_turn(&mut s, action("Work")).unwrap();
        assert!(!orch.client().last_call().prompt.contains("[EVENT: QUIZ]"));
    }
    assert_eq!(s.round_count(), 3);

    let outcome = orch.take_turn(&mut s, action("Go to group meeting")).unwrap();
    let prompt = orch.client().last_call().prompt;
    assert!(prompt.contains("[EVENT: QUIZ]"));
    assert!(prompt.contains("NO lettered choices"));

    assert_eq!(outcome.transition, TurnTransition::EventStarted(EventKind::Quiz));
    assert_eq!(outcome.narrative, "Your PI corners you.");
    assert_eq!(s.mode(), Mode::Quiz);
    assert_eq!(s.pending_event_text(), "What is the Fermi energy?");
    assert_eq!(s.round_count(), 4);
}

#[test]
fn quiz_answer_resumes_without_spending_a_round() {
    let client = Scripted::new()
        .reply("[EVENT: QUIZ]: Define a phonon.")
        .reply("Correct, barely. Sanity +5.\nA) x\nB) y\nC) z");
    let mut orch = TurnOrchestrator::new(client, Periodic::new(Some(1), None));
    let mut s = session();
    s.advance_round();

    orch.take_turn(&mut s, action("Attend seminar")).unwrap();
    assert_eq!(s.mode(), Mode::Quiz);
    let rounds = s.round_count();

    let outcome = orch
        .take_turn(&mut s, PlayerInput::QuizAnswer("A quantized lattice vibration".into()))
        .unwrap();
    assert_eq!(outcome.transition, TurnTransition::Resumed);
    assert_eq!(s.round_count(), rounds);
    assert_eq!(s.mode(), Mode::Normal);
    assert!(s.pending_event_text().is_empty());

    let prompt = orch.client().last_call().prompt;
    assert!(prompt.starts_with("[ANSWER_QUIZ]: A quantized lattice vibration"));
    assert!(prompt.contains("Define a phonon."));
}

#[test]
fn rebuttal_resumes_even_if_reply_carries_an_event_tag() {
    let client = Scripted::new()
        .reply("[EVENT: BOSS_BATTLE]: Reviewer 2 says your sample is contaminated.")
        .reply("REJECTED. [EVENT: QUIZ] Funding -10.");
    let mut orch = TurnOrchestrator::new(client, Periodic::new(None, Some(1)));
    let mut s = session();
    s.advance_round();

    orch.take_turn(&mut s, action("Submit the paper")).unwrap();
    assert_eq!(s.mode(), Mode::Boss);
    let rounds = s.round_count();

    let outcome = orch
        .take_turn(&mut s, PlayerInput::Rebuttal("We ran three controls.".into()))
        .unwrap();
    assert!(orch
        .client()
        .last_call()
        .prompt
        .starts_with("[GRADE: REBUTTAL]: We ran three controls."));
    assert_eq!(outcome.transition, TurnTransition::Resumed);
    assert_eq!(outcome.narrative, "REJECTED.\n\nFunding -10.");
    assert_eq!(s.mode(), Mode::Normal);
    assert_eq!(s.round_count(), rounds);
}

#[test]
fn game_over_report_is_displayed_without_tag() {
    let client = Scripted::new().reply("[GAME_OVER: SUCCESS_INDUSTRY]: You now optimise ad clicks.");
    let mut orch = TurnOrchestrator::new(client, never());
    let mut s = session();

    let outcome = orch.take_turn(&mut s, action("Accept the offer")).unwrap();
    assert_eq!(outcome.transition, TurnTransition::GameOver(EndingKind::SuccessIndustry));
    assert!(s.is_over());
    assert_eq!(s.ending_kind(), EndingKind::SuccessIndustry);
    assert_eq!(
        s.transcript().last().unwrap(),
        &narrator("You now optimise ad clicks.")
    );
}

#[test]
fn unknown_ending_falls_back_to_failure() {
    let mut orch = TurnOrchestrator::new(Scripted::new().reply("The end. [GAME_OVER: FOO]"), never());
    let mut s = session();

    orch.take_turn(&mut s, action("Give up")).unwrap();
    assert!(s.is_over());
    assert_eq!(s.ending_kind(), EndingKind::Failure);
}

#[test]
fn game_over_during_quiz_is_terminal() {
    let client = Scripted::new()
        .reply("[EVENT: QUIZ]: What is 1+1?")
        .reply("Wrong. [GAME_OVER: FAILURE] You sell sweet potatoes now.");
    let mut orch = TurnOrchestrator::new(client, Periodic::new(Some(1), None));
    let mut s = session();
    s.advance_round();

    orch.take_turn(&mut s, action("Work")).unwrap();
    orch.take_turn(&mut s, PlayerInput::QuizAnswer("3".into())).unwrap();
    assert!(s.is_over());
    assert_eq!(s.ending_kind(), EndingKind::Failure);
    assert_eq!(s.mode(), Mode::Normal);
}

#[test]
fn finished_game_rejects_input_without_calling_the_model() {
    let mut orch = TurnOrchestrator::new(
        Scripted::new().reply("[GAME_OVER: SUCCESS_ACADEMIC] Tenure!"),
        never(),
    );
    let mut s = session();
    orch.take_turn(&mut s, action("Publish")).unwrap();
    assert_eq!(orch.client().call_count(), 1);
    let before = s.clone();

    for input in [
        action("One more experiment"),
        PlayerInput::Choice(ChoiceLetter::A),
        PlayerInput::QuizAnswer("x".into()),
        PlayerInput::Rebuttal("y".into()),
    ] {
        match orch.take_turn(&mut s, input) {
            Err(TurnError::Invalid(InvalidTurnInput::GameOver)) => {}
            other => panic!("expected GameOver rejection, got {:?}", other),
        }
    }
    assert_eq!(orch.client().call_count(), 1);
    assert_eq!(s, before);
}

#[test]
fn wrong_mode_and_empty_input_are_rejected_locally() {
    let mut orch = TurnOrchestrator::new(Scripted::new(), never());
    let mut s = session();

    match orch.take_turn(&mut s, PlayerInput::Rebuttal("No.".into())) {
        Err(TurnError::Invalid(InvalidTurnInput::WrongMode { mode, input })) => {
            assert_eq!(mode, Mode::Normal);
            assert_eq!(input, "rebuttal");
        }
        other => panic!("expected WrongMode, got {:?}", other),
    }
    match orch.take_turn(&mut s, action("   ")) {
        Err(TurnError::Invalid(InvalidTurnInput::EmptyInput)) => {}
        other => panic!("expected EmptyInput, got {:?}", other),
    }
    assert_eq!(orch.client().call_count(), 0);
    assert!(s.transcript().is_empty());
}

#[test]
fn provider_failure_rolls_back_everything_but_the_player_entry() {
    let client = Scripted::new()
        .reply(CHOICES)
        .fail(ProviderError::Quota)
        .reply(CHOICES);
    let mut orch = TurnOrchestrator::new(client, never());
    let mut s = session();

    orch.take_turn(&mut s, action("Start")).unwrap();
    let rounds = s.round_count();

    match orch.take_turn(&mut s, action("Order liquid helium")) {
        Err(TurnError::Provider(ProviderError::Quota)) => {}
        other => panic!("expected quota error, got {:?}", other),
    }
    assert_eq!(s.round_count(), rounds);
    assert_eq!(s.mode(), Mode::Normal);
    assert!(!s.is_over());

    let tail = &s.transcript()[s.transcript().len() - 2..];
    assert_eq!(tail[0], player("Order liquid helium"));
    assert_eq!(tail[1].speaker, Speaker::Narrator);
    assert!(tail[1].text.contains("quota"));
    assert_eq!(tail[1].text.matches("try again").count(), 1);

    // Still playable.
    orch.take_turn(&mut s, action("Try again")).unwrap();
    assert_eq!(s.round_count(), rounds + 1);
}

#[test]
fn provider_failure_during_quiz_keeps_quiz_pending() {
    let client = Scripted::new()
        .reply("[EVENT: QUIZ]: Name a boson.")
        .fail(ProviderError::Malformed("truncated".into()));
    let mut orch = TurnOrchestrator::new(client, Periodic::new(Some(1), None));
    let mut s = session();
    s.advance_round();

    orch.take_turn(&mut s, action("Work")).unwrap();
    assert!(orch.take_turn(&mut s, PlayerInput::QuizAnswer("Photon".into())).is_err());
    assert_eq!(s.mode(), Mode::Quiz);
    assert_eq!(s.pending_event_text(), "Name a boson.");
}

#[test]
fn history_excludes_the_current_directive() {
    let mut orch = TurnOrchestrator::new(Scripted::new(), never()).with_temperature(1.2);
    let mut s = session();

    orch.take_turn(&mut s, action("First")).unwrap();
    orch.take_turn(&mut s, action("Second")).unwrap();

    let call = orch.client().last_call();
    assert_eq!(call.prior_turns, vec![player("First"), narrator(CHOICES)]);
    assert_eq!(call.temperature, 1.2);
}

#[test]
fn missing_event_text_gets_a_placeholder() {
    let client = Scripted::new().reply("A hush falls. [EVENT: BOSS_BATTLE]");
    let mut orch = TurnOrchestrator::new(client, Periodic::new(None, Some(1)));
    let mut s = session();
    s.advance_round();

    orch.take_turn(&mut s, action("Defend thesis")).unwrap();
    assert_eq!(s.mode(), Mode::Boss);
    assert!(!s.pending_event_text().is_empty());
}

#[test]
fn spontaneous_event_tag_is_honoured_in_normal_mode() {
    let client = Scripted::new().reply("Surprise! [EVENT: QUIZ]: What is a Cooper pair?");
    let mut orch = TurnOrchestrator::new(client, never());
    let mut s = session();

    orch.take_turn(&mut s, action("Nap")).unwrap();
    assert_eq!(s.mode(), Mode::Quiz);
    assert_eq!(s.round_count(), 1);
}

#[test]
fn separate_quiz_source_makes_a_second_isolated_request() {
    let client = Scripted::new()
        .reply("You drift off during the colloquium.")
        .reply("Which symmetry does a ferromagnet break?");
    let mut orch = TurnOrchestrator::new(client, Periodic::new(Some(1), None))
        .with_quiz_source(QuizSource::Separate);
    let mut s = session();
    s.advance_round();

    let outcome = orch.take_turn(&mut s, action("Go to colloquium")).unwrap();
    assert_eq!(outcome.transition, TurnTransition::EventStarted(EventKind::Quiz));
    assert_eq!(orch.client().call_count(), 2);

    let calls = orch.client().calls.borrow().clone();
    assert!(!calls[0].prompt.contains("[EVENT: QUIZ]"));
    assert!(calls[1].prior_turns.is_empty());
    assert_eq!(s.mode(), Mode::Quiz);
    assert_eq!(s.pending_event_text(), "Which symmetry does a ferromagnet break?");
}

#[test]
fn failed_quiz_request_rolls_back_the_turn() {
    let client = Scripted::new()
        .reply("You drift off.")
        .fail(ProviderError::Auth(401));
    let mut orch = TurnOrchestrator::new(client, Periodic::new(Some(1), None))
        .with_quiz_source(QuizSource::Separate);
    let mut s = session();
    s.advance_round();

    assert!(orch.take_turn(&mut s, action("Go")).is_err());
    assert_eq!(s.round_count(), 1);
    assert_eq!(s.mode(), Mode::Normal);
    assert_eq!(s.transcript().len(), 2);
}

#[test]
fn opening_is_not_a_round_and_only_happens_once() {
    let mut orch = TurnOrchestrator::new(Scripted::new().reply("Welcome to the lab."), never());
    let mut s = session();

    let outcome = orch.open(&mut s).unwrap();
    assert_eq!(outcome.narrative, "Welcome to the lab.");
    assert_eq!(s.round_count(), 0);
    assert!(s.is_started());
    assert!(orch.client().last_call().prompt.contains("Experimental"));

    match orch.open(&mut s) {
        Err(TurnError::Invalid(InvalidTurnInput::AlreadyStarted)) => {}
        other => panic!("expected AlreadyStarted, got {:?}", other),
    }
    assert_eq!(orch.client().call_count(), 1);
}

#[test]
fn failed_opening_leaves_session_unopened() {
    let client = Scripted::new()
        .fail(ProviderError::Quota)
        .reply("Welcome to the lab.");
    let mut orch = TurnOrchestrator::new(client, never());
    let mut s = session();

    match orch.open(&mut s) {
        Err(TurnError::Provider(ProviderError::Quota)) => {}
        other => panic!("expected quota error, got {:?}", other),
    }
    assert!(!s.is_started());
    assert!(s.transcript().is_empty());
    assert_eq!(s.round_count(), 0);

    orch.open(&mut s).unwrap();
    assert_eq!(s.transcript(), &[narrator("Welcome to the lab.")][..]);
    assert_eq!(orch.client().call_count(), 2);
}

#[test]
fn boxed_policy_from_config_drives_turns() {
    let mut config = academic_survival::config::GameConfig::default();
    config.rules.trigger = academic_survival::engine::trigger::TriggerConfig::Periodic {
        quiz_every: None,
        boss_every: Some(2),
    };
    let client = Scripted::new()
        .reply(CHOICES)
        .reply(CHOICES)
        .reply("[EVENT: BOSS_BATTLE]: The committee doubts you.");
    let mut orch = TurnOrchestrator::from_config(client, &config);
    let mut s = session();

    for _ in 0..3 {
        orch.take_turn(&mut s, action("Work")).unwrap();
    }
    assert_eq!(s.mode(), Mode::Boss);
}

#[test]
fn reset_after_play_equals_fresh_session() {
    let mut orch = TurnOrchestrator::new(Scripted::new(), never());
    let mut s = session();
    orch.open(&mut s).unwrap();
    orch.take_turn(&mut s, action("Work")).unwrap();

    s.reset();
    assert_eq!(s, Session::default());
}

#[test]
fn periodic_policy_skips_opening_round() {
    let mut p = Periodic::new(Some(3), Some(4));
    assert_eq!(p.should_trigger(0), None);
}
