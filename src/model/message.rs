use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Player,
    Narrator,
}

impl Speaker {
    /// Key used for colour lookup in the UI settings.
    pub fn key(&self) -> &'static str {
        match self {
            Speaker::Player => "Player",
            Speaker::Narrator => "Narrator",
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    pub text: String,
}
