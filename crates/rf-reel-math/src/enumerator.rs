//! Exhaustive stop enumeration
//!
//! Every reel rests at each of its `L` positions with equal probability, so
//! the exact outcome distribution of an arrangement is the evaluator applied
//! to all `L^C` stop vectors. A combination is identified by the mixed-radix
//! index `Σ stop[c] · L^c` (column 0 is the least significant digit).
//!
//! Two paths share that contract:
//!
//! - [`Enumerator::compute`] materializes every outcome vector. Memory grows
//!   with `L^C`, so it refuses games above a configured limit.
//! - [`Enumerator::fold`] streams outcomes into per-chunk accumulators that
//!   are merged in chunk order, so nothing but the accumulators is retained
//!   and results do not depend on the number of worker threads.

use std::time::Instant;

use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::config::GridSpec;
use crate::error::{ReelError, ReelResult};
use crate::evaluator::OutcomeEvaluator;
use crate::symbols::ReelArrangement;

/// Number of stop combinations, `reel_length ^ columns`
pub fn combination_count(reel_length: usize, columns: usize) -> Option<u64> {
    (reel_length as u64).checked_pow(u32::try_from(columns).ok()?)
}

/// Combination ID of a stop vector
pub fn encode(stops: &[usize], reel_length: usize) -> u64 {
    stops
        .iter()
        .rev()
        .fold(0u64, |id, &stop| id * reel_length as u64 + stop as u64)
}

/// Stop vector of a combination ID, written into `stops`
pub fn decode_into(id: u64, reel_length: usize, stops: &mut [usize]) {
    let radix = reel_length as u64;
    let mut rest = id;
    for stop in stops.iter_mut() {
        *stop = (rest % radix) as usize;
        rest /= radix;
    }
}

/// Stop vector of a combination ID
pub fn decode(id: u64, reel_length: usize, columns: usize) -> Vec<usize> {
    let mut stops = vec![0; columns];
    decode_into(id, reel_length, &mut stops);
    stops
}

/// Step `stops` to the next combination ID; false after the last one
#[inline]
pub fn advance(stops: &mut [usize], reel_length: usize) -> bool {
    for stop in stops.iter_mut() {
        *stop += 1;
        if *stop < reel_length {
            return true;
        }
        *stop = 0;
    }
    false
}

/// Every outcome vector of an arrangement, indexed by combination ID
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeMap {
    width: usize,
    values: Vec<f64>,
}

impl OutcomeMap {
    /// Number of combinations
    pub fn len(&self) -> usize {
        self.values.len() / self.width
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Outcome vector width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Outcome of one combination
    pub fn get(&self, id: u64) -> Option<&[f64]> {
        let start = usize::try_from(id).ok()?.checked_mul(self.width)?;
        self.values.get(start..start + self.width)
    }

    /// `(combination ID, outcome)` pairs in ID order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[f64])> + '_ {
        self.values
            .chunks_exact(self.width)
            .enumerate()
            .map(|(id, outcome)| (id as u64, outcome))
    }

    /// Sum of one component over every combination
    pub fn component_sum(&self, component: usize) -> f64 {
        self.iter().map(|(_, o)| o[component]).sum()
    }

    /// Maximum of one component over every combination
    pub fn component_max(&self, component: usize) -> f64 {
        self.iter()
            .map(|(_, o)| o[component])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Exact per-component means under uniform stops
    pub fn means(&self) -> Vec<f64> {
        let n = self.len().max(1) as f64;
        (0..self.width)
            .map(|c| self.component_sum(c) / n)
            .collect()
    }
}

/// Enumerates all stop combinations of an arrangement
pub struct Enumerator<'a, E: OutcomeEvaluator + ?Sized> {
    evaluator: &'a E,
    reel_length: usize,
    columns: usize,
    chunk_size: u64,
    max_materialized: u64,
    cancel: Option<CancelToken>,
    deadline: Option<Instant>,
}

impl<'a, E: OutcomeEvaluator + ?Sized> Enumerator<'a, E> {
    pub fn new(evaluator: &'a E, grid: &GridSpec) -> Self {
        Self {
            evaluator,
            reel_length: grid.reel_length as usize,
            columns: grid.columns as usize,
            chunk_size: 16_384,
            max_materialized: 1 << 22,
            cancel: None,
            deadline: None,
        }
    }

    /// Combinations per parallel work unit
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Largest enumeration [`Enumerator::compute`] will materialize
    pub fn with_max_materialized(mut self, limit: u64) -> Self {
        self.max_materialized = limit;
        self
    }

    /// Skip remaining chunks once the token is cancelled
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Skip remaining chunks once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Number of stop combinations
    pub fn combinations(&self) -> u64 {
        combination_count(self.reel_length, self.columns).unwrap_or(u64::MAX)
    }

    fn chunk_count(&self) -> usize {
        self.combinations().div_ceil(self.chunk_size) as usize
    }

    fn should_stop(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Materialize the outcome of every combination
    pub fn compute(&self, arrangement: &ReelArrangement) -> ReelResult<OutcomeMap> {
        let combinations = self.combinations();
        if combinations > self.max_materialized {
            return Err(ReelError::EnumerationTooLarge {
                combinations,
                limit: self.max_materialized,
            });
        }

        let width = self.evaluator.outcome_len();
        let invalid = self.evaluator.is_invalid(arrangement);
        let mut values = vec![0.0; combinations as usize * width];
        let chunk_len = self.chunk_size as usize * width;

        values
            .par_chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(chunk, slice)| {
                let mut stops = vec![0; self.columns];
                decode_into(chunk as u64 * self.chunk_size, self.reel_length, &mut stops);
                for out in slice.chunks_exact_mut(width) {
                    if invalid {
                        self.evaluator.penalty_into(out);
                    } else {
                        self.evaluator.spin_into(arrangement, &stops, out);
                    }
                    advance(&mut stops, self.reel_length);
                }
            });

        Ok(OutcomeMap { width, values })
    }

    /// Stream every outcome through per-chunk accumulators
    ///
    /// `init(chunk)` creates the accumulator of a chunk, `step` folds one
    /// `(combination ID, outcome)` into it, and `merge` combines accumulators
    /// left to right in chunk order. Chunk boundaries depend only on the
    /// chunk size, so `init` may derive per-chunk state (e.g. an RNG stream)
    /// from the chunk index and stay reproducible.
    pub fn fold<A, I, S, M>(&self, arrangement: &ReelArrangement, init: I, step: S, merge: M) -> A
    where
        A: Send,
        I: Fn(u64) -> A + Sync,
        S: Fn(&mut A, u64, &[f64]) + Sync,
        M: Fn(A, A) -> A,
    {
        let total = self.combinations();
        let width = self.evaluator.outcome_len();
        let invalid = self.evaluator.is_invalid(arrangement);

        let partials: Vec<A> = (0..self.chunk_count())
            .into_par_iter()
            .map(|chunk| {
                let chunk = chunk as u64;
                let mut acc = init(chunk);
                if self.should_stop() {
                    return acc;
                }

                let start = chunk * self.chunk_size;
                let end = start.saturating_add(self.chunk_size).min(total);
                let mut stops = vec![0; self.columns];
                decode_into(start, self.reel_length, &mut stops);
                let mut out = vec![0.0; width];
                if invalid {
                    self.evaluator.penalty_into(&mut out);
                }

                for id in start..end {
                    if !invalid {
                        self.evaluator.spin_into(arrangement, &stops, &mut out);
                    }
                    step(&mut acc, id, &out);
                    advance(&mut stops, self.reel_length);
                }
                acc
            })
            .collect();

        partials
            .into_iter()
            .reduce(merge)
            .unwrap_or_else(|| init(0))
    }
}
