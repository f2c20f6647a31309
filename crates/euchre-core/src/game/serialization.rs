use super::match_state::MatchState;
use crate::model::player::Seat;
use crate::model::score::DEFAULT_TARGET_SCORE;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSnapshot {
    pub seed: u64,
    pub round_number: u32,
    pub dealer: Seat,
    pub scores: [u32; 2],
    #[serde(default = "default_target_score")]
    pub target_score: u32,
}

fn default_target_score() -> u32 {
    DEFAULT_TARGET_SCORE
}

impl MatchSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        MatchSnapshot {
            seed: state.seed(),
            round_number: state.round_number(),
            dealer: state.dealer(),
            scores: *state.scores().standings(),
            target_score: state.target_score(),
        }
    }

    pub fn restore(self) -> MatchState {
        MatchState::from_snapshot(&self)
    }

    pub fn to_json(state: &MatchState) -> serde_json::Result<String> {
        let snapshot = Self::capture(state);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
