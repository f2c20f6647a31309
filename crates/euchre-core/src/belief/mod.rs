//! Hidden-card inference for one seat.
//!
//! - `chart`: the tri-state ownership table (`ChanceChart`) and its update rules.
//! - `sampler`: consistent hidden-deal sampling for rollouts.

mod chart;
mod sampler;

pub use chart::{BeliefError, CardState, ChanceChart, HOLDER_COUNT, Holder};
pub use sampler::{DealSampler, SampledDeal, SamplingError};
