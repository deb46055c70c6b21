//! Turn-based "academic survival" role-play driven by a chat model.
//!
//! The library holds the game core: the [`model::session::Session`] the
//! player mutates turn by turn, the [`engine::orchestrator::TurnOrchestrator`]
//! that encodes the rules, and the tag parser that reads control markers
//! out of free-text model replies. The binary wraps it in an egui window.

pub mod config;
pub mod engine;
pub mod logutil;
pub mod model;
