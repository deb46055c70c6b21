use crate::engine::orchestrator::PlayerInput;
use crate::model::session::Session;

pub enum EngineCommand {
    StartGame { field: String, role: String },
    Submit(PlayerInput),
    Reset,
    TestConnection,
}

pub enum EngineResponse {
    SessionUpdated(Session),
    /// Input refused before anything was sent; the session is unchanged.
    InputRejected(String),
    ConnectionStatus(Result<String, String>),
}
