use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::error::MalformedDirective;

/// Which input affordance the session accepts next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Normal,
    Quiz,
    Boss,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Normal => "normal",
            Mode::Quiz => "quiz",
            Mode::Boss => "boss battle",
        };
        f.write_str(s)
    }
}

/// A scripted interruption of the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Quiz,
    BossBattle,
}

impl EventKind {
    pub fn mode(&self) -> Mode {
        match self {
            EventKind::Quiz => Mode::Quiz,
            EventKind::BossBattle => Mode::Boss,
        }
    }

    /// The sentinel the model is asked to emit for this event.
    pub fn marker(&self) -> &'static str {
        match self {
            EventKind::Quiz => "[EVENT: QUIZ]",
            EventKind::BossBattle => "[EVENT: BOSS_BATTLE]",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Quiz => f.write_str("quiz"),
            EventKind::BossBattle => f.write_str("boss battle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingKind {
    #[default]
    None,
    SuccessAcademic,
    SuccessIndustry,
    Failure,
}

impl EndingKind {
    /// Tag names the model may use, in match order.
    pub const TAGGED: [EndingKind; 3] = [
        EndingKind::SuccessAcademic,
        EndingKind::SuccessIndustry,
        EndingKind::Failure,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            EndingKind::None => "NONE",
            EndingKind::SuccessAcademic => "SUCCESS_ACADEMIC",
            EndingKind::SuccessIndustry => "SUCCESS_INDUSTRY",
            EndingKind::Failure => "FAILURE",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EndingKind::None => "Still going",
            EndingKind::SuccessAcademic => "Tenure track secured",
            EndingKind::SuccessIndustry => "Escaped to industry",
            EndingKind::Failure => "Dropped out",
        }
    }
}

impl FromStr for EndingKind {
    type Err = MalformedDirective;

    /// Substring match against the known tag names.
    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        EndingKind::TAGGED
            .into_iter()
            .find(|kind| payload.contains(kind.tag()))
            .ok_or_else(|| MalformedDirective::UnknownEnding(payload.trim().to_string()))
    }
}
