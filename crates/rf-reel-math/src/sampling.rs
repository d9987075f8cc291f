//! Rejection sampling over the enumerated outcome distribution
//!
//! The search does not judge a candidate on the raw enumeration. Each
//! outcome passes through a [`Sampler`] that drops capped wins and thins out
//! big wins and jackpots, and only kept samples feed the means.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SamplingPolicy;
use crate::enumerator::Enumerator;
use crate::evaluator::{JACKPOT_COMPONENT, OutcomeEvaluator, RTP_COMPONENT};
use crate::symbols::ReelArrangement;

/// Aggregate statistics of one sampled enumeration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleStats {
    /// Per-component sums over kept samples
    pub sums: Vec<f64>,
    /// Largest component 0 among kept samples
    pub max_win: f64,
    /// Kept samples
    pub kept: u64,
    /// Every enumerated combination
    pub total: u64,
    /// Combinations paying above 1.0, kept or not
    pub over_unity: u64,
    /// Kept samples paying above 1.0
    pub kept_over_unity: u64,
    /// Kept samples paying nothing
    pub zero_wins: u64,
    /// Outcomes dropped by the win cap
    pub capped: u64,
    /// Big wins thinned out
    pub dropped_big_wins: u64,
    /// Jackpots thinned out
    pub dropped_jackpots: u64,
    /// Combination IDs of thinned-out jackpots (bounded)
    pub blocked: Vec<u64>,
}

impl SampleStats {
    pub fn new(width: usize) -> Self {
        Self {
            sums: vec![0.0; width],
            ..Default::default()
        }
    }

    /// Per-component means over kept samples (zeros when nothing was kept)
    pub fn means(&self) -> Vec<f64> {
        if self.kept == 0 {
            return vec![0.0; self.sums.len()];
        }
        let kept = self.kept as f64;
        self.sums.iter().map(|s| s / kept).collect()
    }

    /// Fraction of combinations that survived sampling
    pub fn kept_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.kept as f64 / self.total as f64
        }
    }

    /// Fold `other` into `self`, keeping at most `max_blocked` blocked IDs
    pub fn merge(&mut self, other: SampleStats, max_blocked: usize) {
        if self.sums.len() < other.sums.len() {
            self.sums.resize(other.sums.len(), 0.0);
        }
        for (sum, value) in self.sums.iter_mut().zip(&other.sums) {
            *sum += value;
        }
        self.max_win = self.max_win.max(other.max_win);
        self.kept += other.kept;
        self.total += other.total;
        self.over_unity += other.over_unity;
        self.kept_over_unity += other.kept_over_unity;
        self.zero_wins += other.zero_wins;
        self.capped += other.capped;
        self.dropped_big_wins += other.dropped_big_wins;
        self.dropped_jackpots += other.dropped_jackpots;

        let room = max_blocked.saturating_sub(self.blocked.len());
        self.blocked.extend(other.blocked.into_iter().take(room));
    }
}

/// Applies a [`SamplingPolicy`] to individual outcomes
#[derive(Debug, Clone)]
pub struct Sampler {
    policy: SamplingPolicy,
    width: usize,
    max_blocked: usize,
}

impl Sampler {
    pub fn new(policy: SamplingPolicy, width: usize, max_blocked: usize) -> Self {
        Self {
            policy,
            width,
            max_blocked,
        }
    }

    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Empty accumulator of the right width
    pub fn empty(&self) -> SampleStats {
        SampleStats::new(self.width)
    }

    /// Feed one outcome into `stats`
    pub fn observe<R: Rng + ?Sized>(
        &self,
        stats: &mut SampleStats,
        rng: &mut R,
        id: u64,
        outcome: &[f64],
    ) {
        stats.total += 1;
        let win = outcome[RTP_COMPONENT];
        if win > 1.0 {
            stats.over_unity += 1;
        }

        if self.policy.win_cap.is_some_and(|cap| win > cap) {
            stats.capped += 1;
            return;
        }

        if win > self.policy.big_win_threshold && !keep_one_in(rng, self.policy.big_win_keep_one_in) {
            stats.dropped_big_wins += 1;
            return;
        }

        let jackpot = outcome.get(JACKPOT_COMPONENT).is_some_and(|&j| j > 0.0);
        if jackpot && !keep_one_in(rng, self.policy.jackpot_keep_one_in) {
            stats.dropped_jackpots += 1;
            if stats.blocked.len() < self.max_blocked {
                stats.blocked.push(id);
            }
            return;
        }

        stats.kept += 1;
        for (sum, value) in stats.sums.iter_mut().zip(outcome) {
            *sum += value;
        }
        stats.max_win = stats.max_win.max(win);
        if win > 1.0 {
            stats.kept_over_unity += 1;
        }
        if win == 0.0 {
            stats.zero_wins += 1;
        }
    }

    /// Combine two chunk accumulators, left before right
    pub fn merge(&self, mut left: SampleStats, right: SampleStats) -> SampleStats {
        left.merge(right, self.max_blocked);
        left
    }
}

/// Draw the 1-in-`n` keep decision; `None` and `n <= 1` always keep
#[inline]
fn keep_one_in<R: Rng + ?Sized>(rng: &mut R, n: Option<u32>) -> bool {
    match n {
        Some(n) if n > 1 => rng.random_range(0..n) == 0,
        _ => true,
    }
}

type ChunkState = (SampleStats, ChaCha8Rng);

/// Sample the full stop distribution of an arrangement
///
/// Chunk `k` draws from `ChaCha8Rng::seed_from_u64(sample_seed)` on stream
/// `k`, so the result depends only on the seed and the chunk size.
pub fn sample_distribution<E: OutcomeEvaluator + ?Sized>(
    enumerator: &Enumerator<'_, E>,
    arrangement: &ReelArrangement,
    sampler: &Sampler,
    sample_seed: u64,
) -> SampleStats {
    let (stats, _) = enumerator.fold(
        arrangement,
        |chunk| {
            let mut rng = ChaCha8Rng::seed_from_u64(sample_seed);
            rng.set_stream(chunk);
            (sampler.empty(), rng)
        },
        |state: &mut ChunkState, id, outcome| {
            sampler.observe(&mut state.0, &mut state.1, id, outcome)
        },
        |left: ChunkState, right: ChunkState| (sampler.merge(left.0, right.0), left.1),
    );
    stats
}
