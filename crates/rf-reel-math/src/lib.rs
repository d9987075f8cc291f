//! # rf-reel-math — Reel Strip Math and Search
//!
//! Computes the exact payout behaviour of reel-based slot games and searches
//! for reel strips whose long-run RTP, jackpot probability and bonus tier
//! frequencies land on designer targets.
//!
//! ## Features
//!
//! - **Outcome Evaluator**: Pure line-pay rules for classic, football and carnival games
//! - **Exhaustive Enumeration**: Every `L^C` stop combination, materialized or streamed in parallel
//! - **Rejection Sampling**: Win cap, big win and jackpot thinning over the enumerated distribution
//! - **Target Search**: Candidate loop with seeds, iteration caps, timeouts and cancellation
//! - **Presets**: Ready-made classic, football and carnival setups
//!
//! ## Architecture
//!
//! ```text
//! CandidateSource ──> ReelArrangement
//!                          │
//!                          v
//!     Enumerator (+ SlotModel: OutcomeEvaluator)
//!                          │  outcome per stop combination
//!                          v
//!     Sampler ──> SampleStats ──> SearchLoop::judge ──> accept / reject
//!                                        │
//!                                        v
//!                                 SearchRecord → file
//! ```

pub mod cancel;
pub mod candidate;
pub mod config;
pub mod enumerator;
pub mod error;
pub mod evaluator;
pub mod paytable;
pub mod persist;
pub mod presets;
pub mod sampling;
pub mod search;
pub mod symbols;

pub use cancel::*;
pub use candidate::*;
pub use config::*;
pub use enumerator::*;
pub use error::*;
pub use evaluator::*;
pub use paytable::*;
pub use persist::*;
pub use sampling::*;
pub use search::*;
pub use symbols::*;

/// RNG driving candidate generation and sampling
pub type SearchRng = rand_chacha::ChaCha8Rng;
