use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::mode::EventKind;

/// Decides whether an action turn should be turned into a quiz or a boss battle.
///
/// `round_count` is the number of rounds already played, before the current
/// action is counted. Round 0 is the opening and never triggers.
pub trait TriggerPolicy {
    fn should_trigger(&mut self, round_count: u32) -> Option<EventKind>;
}

impl<P: TriggerPolicy + ?Sized> TriggerPolicy for Box<P> {
    fn should_trigger(&mut self, round_count: u32) -> Option<EventKind> {
        (**self).should_trigger(round_count)
    }
}

/// Fires on fixed multiples of the round count. A boss battle wins when
/// both intervals divide the same round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    quiz_every: Option<u32>,
    boss_every: Option<u32>,
}

impl Periodic {
    pub fn new(quiz_every: Option<u32>, boss_every: Option<u32>) -> Self {
        Self {
            quiz_every: quiz_every.filter(|n| *n > 0),
            boss_every: boss_every.filter(|n| *n > 0),
        }
    }
}

impl TriggerPolicy for Periodic {
    fn should_trigger(&mut self, round_count: u32) -> Option<EventKind> {
        if round_count == 0 {
            return None;
        }
        let hits = |every: Option<u32>| {
            every
                .and_then(|n| round_count.checked_rem(n))
                .is_some_and(|r| r == 0)
        };

        if hits(self.boss_every) {
            Some(EventKind::BossBattle)
        } else if hits(self.quiz_every) {
            Some(EventKind::Quiz)
        } else {
            None
        }
    }
}

/// Rolls a die every round.
#[derive(Debug, Clone)]
pub struct Probabilistic {
    chance: f64,
    boss_share: f64,
    rng: StdRng,
}

impl Probabilistic {
    pub fn new(chance: f64, boss_share: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            chance: probability(chance),
            boss_share: probability(boss_share),
            rng,
        }
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

impl TriggerPolicy for Probabilistic {
    fn should_trigger(&mut self, round_count: u32) -> Option<EventKind> {
        if round_count == 0 || !self.rng.gen_bool(self.chance) {
            return None;
        }
        if self.rng.gen_bool(self.boss_share) {
            Some(EventKind::BossBattle)
        } else {
            Some(EventKind::Quiz)
        }
    }
}

/// Persisted choice of trigger policy. Exactly one is active per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerConfig {
    Periodic {
        quiz_every: Option<u32>,
        boss_every: Option<u32>,
    },
    Probabilistic {
        chance: f64,
        boss_share: f64,
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig::Periodic {
            quiz_every: Some(3),
            boss_every: Some(7),
        }
    }
}

impl TriggerConfig {
    pub fn build(&self) -> Box<dyn TriggerPolicy + Send> {
        match *self {
            TriggerConfig::Periodic {
                quiz_every,
                boss_every,
            } => Box::new(Periodic::new(quiz_every, boss_every)),
            TriggerConfig::Probabilistic {
                chance,
                boss_share,
                seed,
            } => Box::new(Probabilistic::new(chance, boss_share, seed)),
        }
    }
}
