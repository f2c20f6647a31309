use crate::model::player::Team;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_SCORE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    /// Declarers took three or four tricks.
    Made,
    /// Declarers took all five.
    March,
    /// Declarers took fewer than three; defenders score.
    Euchred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScore {
    pub team: Team,
    pub points: u32,
    pub outcome: RoundOutcome,
}

impl RoundScore {
    pub fn points_for(&self, team: Team) -> u32 {
        if team == self.team { self.points } else { 0 }
    }
}

pub fn score_round(declaring: Team, tricks: [u8; 2]) -> RoundScore {
    let made = tricks[declaring.index()];
    match made {
        5.. => RoundScore {
            team: declaring,
            points: 2,
            outcome: RoundOutcome::March,
        },
        3..=4 => RoundScore {
            team: declaring,
            points: 1,
            outcome: RoundOutcome::Made,
        },
        _ => RoundScore {
            team: declaring.other(),
            points: 2,
            outcome: RoundOutcome::Euchred,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    totals: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { totals: [0; 2] }
    }

    pub fn add(&mut self, team: Team, points: u32) {
        self.totals[team.index()] += points;
    }

    pub fn apply(&mut self, score: &RoundScore) {
        self.add(score.team, score.points);
    }

    pub fn set_totals(&mut self, totals: [u32; 2]) {
        self.totals = totals;
    }

    pub fn score(&self, team: Team) -> u32 {
        self.totals[team.index()]
    }

    pub fn standings(&self) -> &[u32; 2] {
        &self.totals
    }

    pub fn winner(&self, target: u32) -> Option<Team> {
        Team::BOTH
            .iter()
            .copied()
            .find(|team| self.score(*team) >= target)
    }
}

impl Default for ScoreBoard {
    fn default() -> Self {
        Self::new()
    }
}
