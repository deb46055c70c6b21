use std::sync::mpsc::{Receiver, Sender};

use log::{debug, info, warn};

use crate::engine::error::TurnError;
use crate::engine::llm_client::{LlmClient, LmStudioClient};
use crate::engine::orchestrator::{TurnOrchestrator, TurnOutcome};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::trigger::TriggerPolicy;
use crate::model::session::Session;

/// Something that can report whether the model server is reachable.
pub trait ConnectionCheck {
    fn check(&self) -> Result<String, String>;
}

impl ConnectionCheck for LmStudioClient {
    fn check(&self) -> Result<String, String> {
        self.test_connection().map_err(|e| e.to_string())
    }
}

/// Owns one session and processes commands strictly one at a time.
pub struct Engine<C, P> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    session: Session,
    orchestrator: TurnOrchestrator<C, P>,
}

impl<C, P> Engine<C, P>
where
    C: LlmClient + ConnectionCheck,
    P: TriggerPolicy,
{
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        orchestrator: TurnOrchestrator<C, P>,
    ) -> Self {
        Self {
            rx,
            tx,
            session: Session::default(),
            orchestrator,
        }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            if !self.handle(cmd) {
                break;
            }
        }
        debug!("engine stopped");
    }

    /// Returns false once the UI side has gone away.
    fn handle(&mut self, cmd: EngineCommand) -> bool {
        let response = match cmd {
            EngineCommand::StartGame { field, role } => {
                info!("new game: {} / {}", role, field);
                self.session = Session::new(field, role);
                match self.orchestrator.open(&mut self.session) {
                    Ok(_) => EngineResponse::SessionUpdated(self.session.clone()),
                    // Nothing was recorded, so the setup screen stays up.
                    Err(TurnError::Provider(e)) => {
                        EngineResponse::InputRejected(format!("⚠ {e}. Try starting again."))
                    }
                    Err(TurnError::Invalid(e)) => {
                        warn!("rejected opening: {}", e);
                        EngineResponse::InputRejected(e.to_string())
                    }
                }
            }

            EngineCommand::Submit(input) => {
                self.run_turn(|orch, session| orch.take_turn(session, input))
            }

            EngineCommand::Reset => {
                info!("session reset");
                self.session.reset();
                EngineResponse::SessionUpdated(self.session.clone())
            }

            EngineCommand::TestConnection => {
                EngineResponse::ConnectionStatus(self.orchestrator.client().check())
            }
        };

        self.tx.send(response).is_ok()
    }

    fn run_turn<F>(&mut self, turn: F) -> EngineResponse
    where
        F: FnOnce(&mut TurnOrchestrator<C, P>, &mut Session) -> Result<TurnOutcome, TurnError>,
    {
        match turn(&mut self.orchestrator, &mut self.session) {
            Ok(_) => EngineResponse::SessionUpdated(self.session.clone()),
            // The error entry is already in the transcript.
            Err(TurnError::Provider(_)) => EngineResponse::SessionUpdated(self.session.clone()),
            Err(TurnError::Invalid(e)) => {
                warn!("rejected input: {}", e);
                EngineResponse::InputRejected(e.to_string())
            }
        }
    }
}
