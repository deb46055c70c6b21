pub mod engine;
pub mod error;
pub mod protocol;

pub mod llm_client;
pub mod orchestrator;
pub mod prompt;
pub mod tags;
pub mod trigger;
