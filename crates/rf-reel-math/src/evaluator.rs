//! Outcome evaluation: pure rules mapping (arrangement, stops) to outcomes
//!
//! One contract, [`OutcomeEvaluator`], covers every game variant. The
//! shipped implementation, [`SlotModel`], is a variant-tagged rule set that
//! carries its paylines, paytable and wild bonus table as data.

use smallvec::SmallVec;

use crate::config::{BonusTier, GameConfig, GameVariant, GridSpec};
use crate::error::ConfigError;
use crate::paytable::{Payline, Paytable, match_line};
use crate::symbols::{ReelArrangement, SymbolId, SymbolKind, SymbolSet};

/// Value written to every outcome component of an invalid arrangement
pub const INVALID_REELS_PENALTY: f64 = 1_000_000.0;

/// Component holding the per-payline RTP contribution
pub const RTP_COMPONENT: usize = 0;
/// Component holding the jackpot indicator
pub const JACKPOT_COMPONENT: usize = 1;
/// First bonus tier component
pub const FIRST_TIER_COMPONENT: usize = 2;

/// Outcome of one spin
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeVector(pub Vec<f64>);

impl OutcomeVector {
    /// Per-payline payout
    pub fn rtp(&self) -> f64 {
        self.0[RTP_COMPONENT]
    }

    pub fn jackpot(&self) -> bool {
        self.0[JACKPOT_COMPONENT] > 0.0
    }

    /// Bonus tier indicators
    pub fn tiers(&self) -> &[f64] {
        &self.0[FIRST_TIER_COMPONENT.min(self.0.len())..]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Every component carries the invalid-reels penalty
    pub fn is_penalty(&self) -> bool {
        self.0.iter().all(|&v| v == INVALID_REELS_PENALTY)
    }

    /// Any component carries the invalid-reels penalty
    pub fn has_penalty(&self) -> bool {
        self.0.iter().any(|&v| v >= INVALID_REELS_PENALTY)
    }
}

/// Evaluation contract shared by every game variant
///
/// Implementations must be pure: the same arrangement and stops always give
/// the same outcome.
pub trait OutcomeEvaluator: Send + Sync {
    /// Width of the outcome vector
    fn outcome_len(&self) -> usize;

    /// Total line payout over all paylines
    fn win(&self, arrangement: &ReelArrangement, stops: &[usize]) -> f64;

    /// At least one payline is wild in every column
    fn jackpot(&self, arrangement: &ReelArrangement, stops: &[usize]) -> bool;

    /// Scatter count. No shipped variant pays scatters.
    fn scatters(&self, _arrangement: &ReelArrangement, _stops: &[usize]) -> u32 {
        0
    }

    /// Bonus symbols in the full visible window
    fn bonus(&self, arrangement: &ReelArrangement, stops: &[usize]) -> u32;

    /// Structural check over whole strips, independent of stops
    fn is_invalid(&self, arrangement: &ReelArrangement) -> bool;

    /// Write the outcome of a spin into `out`.
    ///
    /// The arrangement must already be known to be valid.
    fn spin_into(&self, arrangement: &ReelArrangement, stops: &[usize], out: &mut [f64]);

    /// Write the all-penalty outcome into `out`
    fn penalty_into(&self, out: &mut [f64]) {
        out.fill(INVALID_REELS_PENALTY);
    }

    /// Outcome of a spin, penalized when the arrangement is invalid
    fn result(&self, arrangement: &ReelArrangement, stops: &[usize]) -> OutcomeVector {
        let mut out = vec![0.0; self.outcome_len()];
        if self.is_invalid(arrangement) {
            self.penalty_into(&mut out);
        } else {
            self.spin_into(arrangement, stops, &mut out);
        }
        OutcomeVector(out)
    }
}

type Line = SmallVec<[SymbolId; 8]>;

/// Line-pay slot rules for one game variant
#[derive(Debug, Clone)]
pub struct SlotModel {
    variant: GameVariant,
    grid: GridSpec,
    symbols: SymbolSet,
    paylines: Vec<Payline>,
    paytable: Paytable,
    wild_bonus: Option<Vec<f64>>,
    bonus_tiers: Vec<BonusTier>,
}

impl SlotModel {
    /// Build the rules of a validated game
    pub fn new(game: &GameConfig) -> Result<Self, ConfigError> {
        game.validate()?;
        Ok(Self {
            variant: game.variant,
            grid: game.grid,
            symbols: game.symbols.clone(),
            paylines: game.paylines.clone(),
            paytable: game.paytable.clone(),
            wild_bonus: game.wild_bonus.clone().filter(|_| game.variant.pays_wild_bonus()),
            bonus_tiers: game.bonus_tiers.clone(),
        })
    }

    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn paylines(&self) -> &[Payline] {
        &self.paylines
    }

    /// Symbols under a payline, before wild substitution
    pub fn resolve_line(
        &self,
        arrangement: &ReelArrangement,
        stops: &[usize],
        payline: &Payline,
    ) -> Vec<SymbolId> {
        self.line(arrangement, stops, payline).into_vec()
    }

    #[inline]
    fn line(&self, arrangement: &ReelArrangement, stops: &[usize], payline: &Payline) -> Line {
        (0..self.grid.columns as usize)
            .map(|c| arrangement.symbol_at(c, stops[c] + payline.row(c)))
            .collect()
    }

    /// Pay of one resolved line, and whether it was all wild
    #[inline]
    fn line_pay(&self, line: &mut [SymbolId]) -> (f64, bool) {
        let matched = match_line(line, &self.symbols);
        let mut pay = self.paytable.pay(matched.run, matched.reference);
        if let Some(table) = &self.wild_bonus {
            pay += table.get(matched.wilds).copied().unwrap_or(0.0);
        }
        (pay, matched.all_wild)
    }

    /// Win and jackpot from a single pass over the paylines
    fn scan_paylines(&self, arrangement: &ReelArrangement, stops: &[usize]) -> (f64, bool) {
        let mut win = 0.0;
        let mut jackpot = false;
        for payline in &self.paylines {
            let mut line = self.line(arrangement, stops, payline);
            let (pay, all_wild) = self.line_pay(&mut line);
            win += pay;
            jackpot |= all_wild;
        }
        (win, jackpot)
    }

    fn tier_index(&self, bonus: u32) -> Option<usize> {
        self.bonus_tiers.iter().position(|t| t.count == bonus)
    }

    fn above_tiers(&self, bonus: u32) -> bool {
        self.bonus_tiers.last().is_some_and(|t| bonus > t.count)
    }
}

impl OutcomeEvaluator for SlotModel {
    fn outcome_len(&self) -> usize {
        2 + self.bonus_tiers.len()
    }

    fn win(&self, arrangement: &ReelArrangement, stops: &[usize]) -> f64 {
        self.scan_paylines(arrangement, stops).0
    }

    fn jackpot(&self, arrangement: &ReelArrangement, stops: &[usize]) -> bool {
        self.paylines.iter().any(|payline| {
            (0..self.grid.columns as usize)
                .all(|c| self.symbols.is_wild(arrangement.symbol_at(c, stops[c] + payline.row(c))))
        })
    }

    fn bonus(&self, arrangement: &ReelArrangement, stops: &[usize]) -> u32 {
        let mut count = 0;
        for column in 0..self.grid.columns as usize {
            for row in 0..self.grid.rows as usize {
                if self.symbols.is_bonus(arrangement.symbol_at(column, stops[column] + row)) {
                    count += 1;
                }
            }
        }
        count
    }

    fn is_invalid(&self, arrangement: &ReelArrangement) -> bool {
        // Every symbol, the bonus symbol included, appears at least once;
        // wilds at least twice
        arrangement.strips.iter().any(|strip| {
            let counts = strip.counts(self.symbols.len());
            counts.iter().enumerate().any(|(id, &count)| {
                count == 0 || (self.symbols.kinds[id] == SymbolKind::Wild && count < 2)
            })
        })
    }

    fn spin_into(&self, arrangement: &ReelArrangement, stops: &[usize], out: &mut [f64]) {
        out.fill(0.0);
        let (win, jackpot) = self.scan_paylines(arrangement, stops);
        out[0] = win / self.paylines.len() as f64;
        if jackpot {
            out[1] = 1.0;
        }

        if self.variant.counts_bonus() && !self.bonus_tiers.is_empty() {
            let bonus = self.bonus(arrangement, stops);
            if let Some(tier) = self.tier_index(bonus) {
                out[FIRST_TIER_COMPONENT + tier] = 1.0;
            } else if self.above_tiers(bonus) {
                // More bonus symbols than any tier defines on one screen
                out[0] += INVALID_REELS_PENALTY;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Target;
    use crate::paytable::Payline;

    const A: SymbolId = 0;
    const B: SymbolId = 1;
    const W: SymbolId = 2;
    const X: SymbolId = 3; // bonus

    /// 3 columns, 3 rows, strips of 6, two paylines (middle and top)
    fn game(variant: GameVariant) -> GameConfig {
        let counts_bonus = variant.counts_bonus();
        let mut pairs = vec![
            ("A", SymbolKind::Regular),
            ("B", SymbolKind::Regular),
            ("WILD", SymbolKind::Wild),
        ];
        if counts_bonus {
            pairs.push(("BONUS", SymbolKind::Bonus));
        }
        let symbols = SymbolSet::from_pairs(&pairs);
        let n = symbols.len();
        let mut two_pays = vec![0.0; n];
        two_pays[A as usize] = 1.0;
        let mut three_pays = vec![0.0; n];
        three_pays[A as usize] = 10.0;
        three_pays[B as usize] = 5.0;
        three_pays[W as usize] = 50.0;
        GameConfig {
            name: "test".into(),
            variant,
            grid: GridSpec::new(3, 3, 6),
            symbols,
            paylines: vec![Payline::straight(1, 3), Payline::straight(0, 3)],
            paytable: Paytable::new(vec![vec![0.0; n], vec![0.0; n], two_pays, three_pays]),
            wild_bonus: variant.pays_wild_bonus().then(|| vec![0.0, 0.5, 1.0, 0.0]),
            bonus_tiers: if counts_bonus {
                vec![BonusTier::new(3, 10), BonusTier::new(4, 15), BonusTier::new(5, 25)]
            } else {
                Vec::new()
            },
            targets: vec![Target::within(0.9, 0.01)],
        }
    }

    fn arrangement(columns: [[SymbolId; 6]; 3]) -> ReelArrangement {
        ReelArrangement::from_columns(columns.iter().map(|c| c.to_vec()).collect())
    }

    /// Valid classic strips; stop 0 shows rows [A, B, W]
    fn classic_reels() -> ReelArrangement {
        arrangement([[A, B, W, W, A, B], [A, B, W, W, A, B], [A, B, W, W, A, B]])
    }

    #[test]
    fn test_win_counts_left_anchored_runs() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = classic_reels();
        // Top line (row 0): A A A -> 10; middle line (row 1): B B B -> 5
        assert_eq!(model.win(&reels, &[0, 0, 0]), 15.0);
        // Stops [0, 0, 1]: top A A B -> run 2 pays 1; middle B B W -> B B B pays 5
        assert_eq!(model.win(&reels, &[0, 0, 1]), 6.0);
    }

    #[test]
    fn test_wild_substitutes_into_run() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = classic_reels();
        // Stops [2, 0, 0]: top W A A -> A x3 = 10; middle W B B -> B x3 = 5
        assert_eq!(model.win(&reels, &[2, 0, 0]), 15.0);
        assert!(!model.jackpot(&reels, &[2, 0, 0]));
    }

    #[test]
    fn test_jackpot_requires_all_wild_line() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = classic_reels();
        // Stops [2, 2, 2]: top W W W, middle W W W
        assert!(model.jackpot(&reels, &[2, 2, 2]));
        assert_eq!(model.win(&reels, &[2, 2, 2]), 100.0);
        // Stops [2, 2, 1]: top W W B, middle W W W -> middle still jackpot
        assert!(model.jackpot(&reels, &[2, 2, 1]));
        // Stops [2, 2, 0]: top W W A, middle W W B -> no all-wild line
        assert!(!model.jackpot(&reels, &[2, 2, 0]));
    }

    #[test]
    fn test_result_components() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = classic_reels();
        let outcome = model.result(&reels, &[2, 2, 2]);
        assert_eq!(outcome.as_slice(), &[50.0, 1.0]);
        assert!(outcome.jackpot());
        assert!(!outcome.has_penalty());
        let outcome = model.result(&reels, &[0, 0, 0]);
        assert_eq!(outcome.as_slice(), &[7.5, 0.0]);
    }

    #[test]
    fn test_valid_arrangement_never_penalized() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = classic_reels();
        assert!(!model.is_invalid(&reels));
        for a in 0..6 {
            for b in 0..6 {
                for c in 0..6 {
                    assert!(!model.result(&reels, &[a, b, c]).has_penalty());
                }
            }
        }
    }

    #[test]
    fn test_single_wild_column_is_invalid() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = arrangement([[A, B, W, W, A, B], [A, B, W, A, A, B], [A, B, W, W, A, B]]);
        assert!(model.is_invalid(&reels));
        for stop in 0..6 {
            assert!(model.result(&reels, &[stop, stop, stop]).is_penalty());
        }
    }

    #[test]
    fn test_missing_symbol_is_invalid() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = arrangement([[A, A, W, W, A, A], [A, B, W, W, A, B], [A, B, W, W, A, B]]);
        assert!(model.is_invalid(&reels));
    }

    #[test]
    fn test_missing_bonus_is_invalid() {
        let model = SlotModel::new(&game(GameVariant::Football)).unwrap();
        let reels = arrangement([[A, B, W, W, A, X], [A, B, W, W, A, B], [A, B, W, W, A, X]]);
        assert!(model.is_invalid(&reels));
        let reels = arrangement([[A, B, W, W, A, X], [A, B, W, W, X, B], [A, B, W, W, A, X]]);
        assert!(!model.is_invalid(&reels));
    }

    #[test]
    fn test_bonus_counts_full_window() {
        let model = SlotModel::new(&game(GameVariant::Football)).unwrap();
        let reels = arrangement([[X, X, X, W, W, A], [B, X, W, W, X, A], [X, A, B, W, W, X]]);
        // Stop 0 windows: [X X X] [B X W] [X A B] -> 5
        assert_eq!(model.bonus(&reels, &[0, 0, 0]), 5);
        // Stop 3 windows: [W W A] [W X A] [W W X] -> 2
        assert_eq!(model.bonus(&reels, &[3, 3, 3]), 2);
    }

    #[test]
    fn test_bonus_tiers_and_overflow_penalty() {
        let model = SlotModel::new(&game(GameVariant::Football)).unwrap();
        let reels = arrangement([[X, X, A, W, W, B], [X, X, B, W, W, A], [X, X, A, W, W, B]]);
        assert!(!model.is_invalid(&reels));

        // [X X A] [X X B] [X X A] -> 6 bonus, above the 5 tier
        let outcome = model.result(&reels, &[0, 0, 0]);
        assert_eq!(model.bonus(&reels, &[0, 0, 0]), 6);
        assert!(outcome.rtp() >= INVALID_REELS_PENALTY);
        assert_eq!(outcome.tiers(), &[0.0, 0.0, 0.0]);
        assert!(!outcome.is_penalty());

        // Stops [0, 0, 2]: [X X A] [X X B] [A W W] -> 4 bonus, mid tier
        let outcome = model.result(&reels, &[0, 0, 2]);
        assert_eq!(outcome.tiers(), &[0.0, 1.0, 0.0]);
        assert_eq!(outcome.rtp(), 0.0);
    }

    #[test]
    fn test_wild_bonus_table() {
        let model = SlotModel::new(&game(GameVariant::Carnival)).unwrap();
        let reels = arrangement([[W, A, X, W, B, A], [A, B, X, W, W, A], [A, X, B, W, W, B]]);
        // Top line W A A -> A x3 pays 10 plus wild_bonus[1] = 0.5
        // Middle line A B X -> reference A, run 1 pays 0, no wilds
        assert_eq!(model.win(&reels, &[0, 0, 0]), 10.5);

        // Top line A B W -> run 1 pays 0, yet its wild still adds 0.5
        let reels = arrangement([[A, B, W, W, X, A], [B, A, W, W, X, B], [W, X, A, W, B, A]]);
        assert_eq!(model.win(&reels, &[0, 0, 0]), 0.5);
    }

    #[test]
    fn test_scatters_never_pay() {
        let model = SlotModel::new(&game(GameVariant::Football)).unwrap();
        let reels = arrangement([[X, X, X, W, W, A], [B, X, W, W, X, A], [X, A, B, W, W, X]]);
        assert_eq!(model.scatters(&reels, &[0, 0, 0]), 0);
    }

    #[test]
    fn test_resolve_line_wraps() {
        let model = SlotModel::new(&game(GameVariant::Classic)).unwrap();
        let reels = classic_reels();
        let middle = &model.paylines()[0];
        assert_eq!(model.resolve_line(&reels, &[5, 5, 5], middle), vec![A, A, A]);
    }
}
