//! Candidate arrangement sources
//!
//! The search treats the source as a black box: it asks for the next
//! arrangement and hands over the search RNG. Mutation or crossover based
//! generators plug in here by implementing [`CandidateSource`].

use rand::Rng;
use rand::seq::SliceRandom;

use crate::SearchRng;
use crate::config::GameConfig;
use crate::symbols::{ReelArrangement, ReelStrip, SymbolId, SymbolKind};

/// Supplies candidate arrangements to the search loop
pub trait CandidateSource {
    /// Produce the next candidate
    fn next(&mut self, rng: &mut SearchRng) -> ReelArrangement;
}

impl<F> CandidateSource for F
where
    F: FnMut(&mut SearchRng) -> ReelArrangement,
{
    fn next(&mut self, rng: &mut SearchRng) -> ReelArrangement {
        self(rng)
    }
}

/// Uniformly random strips
#[derive(Debug, Clone)]
pub struct RandomReels {
    columns: usize,
    reel_length: usize,
    alphabet_len: usize,
    /// Symbols every strip starts with before random filling
    required: Vec<SymbolId>,
}

impl RandomReels {
    /// Every cell drawn independently and uniformly from the alphabet
    pub fn uniform(game: &GameConfig) -> Self {
        Self {
            columns: game.grid.columns as usize,
            reel_length: game.grid.reel_length as usize,
            alphabet_len: game.symbols.len(),
            required: Vec::new(),
        }
    }

    /// Strips that always pass the validity check: each symbol appears at
    /// least once, each wild twice, the rest is uniform, then shuffled.
    ///
    /// Falls back to uniform strips when the reel is too short to hold the
    /// required symbols.
    pub fn valid_only(game: &GameConfig) -> Self {
        let mut required: Vec<SymbolId> = (0..game.symbols.len() as SymbolId).collect();
        required.extend(game.symbols.ids_of(SymbolKind::Wild));

        let mut source = Self::uniform(game);
        if required.len() <= source.reel_length {
            source.required = required;
        } else {
            log::warn!(
                "Reel length {} cannot hold {} required symbols, drawing uniform strips",
                source.reel_length,
                required.len()
            );
        }
        source
    }

    fn strip(&self, rng: &mut SearchRng) -> ReelStrip {
        let mut symbols = Vec::with_capacity(self.reel_length);
        symbols.extend_from_slice(&self.required);
        while symbols.len() < self.reel_length {
            symbols.push(rng.random_range(0..self.alphabet_len) as SymbolId);
        }
        if !self.required.is_empty() {
            symbols.shuffle(rng);
        }
        ReelStrip::new(symbols)
    }
}

impl CandidateSource for RandomReels {
    fn next(&mut self, rng: &mut SearchRng) -> ReelArrangement {
        ReelArrangement::new((0..self.columns).map(|_| self.strip(rng)).collect())
    }
}

/// Always returns the same arrangement (re-evaluation, tests)
#[derive(Debug, Clone)]
pub struct FixedReels {
    arrangement: ReelArrangement,
}

impl FixedReels {
    pub fn new(arrangement: ReelArrangement) -> Self {
        Self { arrangement }
    }
}

impl CandidateSource for FixedReels {
    fn next(&mut self, _rng: &mut SearchRng) -> ReelArrangement {
        self.arrangement.clone()
    }
}
