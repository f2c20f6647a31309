pub mod engine;
pub mod monte_carlo;
pub mod player;
pub mod policy;

pub use engine::{
    DecisionPoint, DecisionTiming, EngineConfig, EngineError, GameEngine, GameSummary,
    RoundSummary, Substitution, Validation,
};
pub use monte_carlo::{
    CandidateValue, Decision, MonteCarloConfig, MonteCarloEngine, RolloutError, RolloutRequest,
};
pub use player::{AgentError, Bid, BidContext, DiscardContext, PlayContext, Player};
pub use policy::{
    HighValuePlayer, HighWithCautionPlayer, LowValuePlayer, MonteCarloPlayer, RandomPlayer,
};
