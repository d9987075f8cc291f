//! Built-in game setups
//!
//! Each preset bundles a validated game definition with the search settings
//! it was tuned with.

use crate::config::{
    BonusTier, GameConfig, GameSetup, GameVariant, GridSpec, SamplingPolicy, SearchConfig, Target,
};
use crate::paytable::{Paytable, classic_paylines, football_paylines, standard_20_paylines};
use crate::symbols::{SymbolKind, SymbolSet};

fn alphabet(regular: &[&str], extra: &[(&str, SymbolKind)]) -> SymbolSet {
    let mut pairs: Vec<(&str, SymbolKind)> =
        regular.iter().map(|&name| (name, SymbolKind::Regular)).collect();
    pairs.extend_from_slice(extra);
    SymbolSet::from_pairs(&pairs)
}

/// 3×3 classic: line wins and an all-wild jackpot
pub fn classic() -> GameSetup {
    let symbols = alphabet(
        &["A", "B", "C", "D", "E", "F", "G"],
        &[("WILD", SymbolKind::Wild)],
    );
    let paytable = Paytable::with_runs(
        3,
        symbols.len(),
        &[(3, &[1000.0, 300.0, 100.0, 50.0, 20.0, 10.0, 5.0, 0.0])],
    );

    GameSetup {
        game: GameConfig {
            name: "classic".into(),
            variant: GameVariant::Classic,
            grid: GridSpec::new(3, 3, 40),
            symbols,
            paylines: classic_paylines(),
            paytable,
            wild_bonus: None,
            bonus_tiers: Vec::new(),
            targets: vec![Target::within(0.8, 0.01), Target::within(0.00001, 0.00001)],
        },
        search: SearchConfig {
            min_samples: 30_000,
            ..Default::default()
        },
    }
}

/// 5×3 football: 25 lines, free-spin tiers, payouts above 10 discarded
pub fn football() -> GameSetup {
    let symbols = alphabet(
        &["A", "B", "C", "D", "E", "F", "G", "H"],
        &[("WILD", SymbolKind::Wild), ("BONUS", SymbolKind::Bonus)],
    );
    let paytable = Paytable::with_runs(
        5,
        symbols.len(),
        &[
            (3, &[15.0, 10.0, 10.0, 7.0, 7.0, 6.0, 5.0, 5.0, 0.0, 0.0]),
            (4, &[30.0, 20.0, 20.0, 15.0, 15.0, 12.0, 10.0, 10.0, 0.0, 0.0]),
            (5, &[75.0, 50.0, 50.0, 25.0, 25.0, 20.0, 15.0, 15.0, 0.0, 0.0]),
        ],
    );

    GameSetup {
        game: GameConfig {
            name: "football".into(),
            variant: GameVariant::Football,
            grid: GridSpec::new(5, 3, 20),
            symbols,
            paylines: football_paylines(),
            paytable,
            wild_bonus: None,
            bonus_tiers: vec![
                BonusTier::new(3, 10),
                BonusTier::new(4, 15),
                BonusTier::new(5, 25),
            ],
            // Tier frequencies are reported but not targeted
            targets: vec![Target::at_most(0.9), Target::at_most(0.0001).nonzero()],
        },
        search: SearchConfig {
            sampling: SamplingPolicy {
                big_win_keep_one_in: None,
                ..SamplingPolicy::default()
            }
            .with_win_cap(10.0),
            min_samples: 1_000,
            ..Default::default()
        },
    }
}

/// 5×3 carnival: football rules plus a wild bonus on every payline
///
/// Each line adds `wild_bonus[wilds on the line]`, whether or not its run pays.
pub fn carnival() -> GameSetup {
    let symbols = alphabet(
        &["A", "B", "C", "D", "E", "F"],
        &[("WILD", SymbolKind::Wild), ("BONUS", SymbolKind::Bonus)],
    );
    let paytable = Paytable::with_runs(
        5,
        symbols.len(),
        &[
            (3, &[20.0, 15.0, 10.0, 8.0, 5.0, 4.0, 0.0, 0.0]),
            (4, &[50.0, 40.0, 30.0, 20.0, 15.0, 10.0, 0.0, 0.0]),
            (5, &[200.0, 100.0, 75.0, 50.0, 30.0, 20.0, 0.0, 0.0]),
        ],
    );

    GameSetup {
        game: GameConfig {
            name: "carnival".into(),
            variant: GameVariant::Carnival,
            grid: GridSpec::new(5, 3, 30),
            symbols,
            paylines: standard_20_paylines(),
            paytable,
            wild_bonus: Some(vec![0.0, 0.0, 1.0, 2.0, 5.0, 0.0]),
            bonus_tiers: vec![
                BonusTier::new(3, 10),
                BonusTier::new(4, 15),
                BonusTier::new(5, 25),
            ],
            targets: vec![
                Target::within(0.92, 0.01),
                Target::within(0.00002, 0.00002),
                Target::within(0.02, 0.005),
                Target::within(0.008, 0.003),
                Target::within(0.002, 0.001),
            ],
        },
        search: SearchConfig {
            min_samples: 100_000,
            ..Default::default()
        },
    }
}

/// Preset for a variant
pub fn for_variant(variant: GameVariant) -> GameSetup {
    match variant {
        GameVariant::Classic => classic(),
        GameVariant::Football => football(),
        GameVariant::Carnival => carnival(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for setup in [classic(), football(), carnival()] {
            assert!(setup.game.validate().is_ok(), "{}", setup.game.name);
            assert!(setup.game.targets.len() <= setup.game.outcome_len());
        }
    }

    #[test]
    fn test_preset_geometry() {
        let classic = classic().game;
        assert_eq!(classic.grid.combinations(), Some(64_000));
        assert_eq!(classic.paylines.len(), 20);
        assert_eq!(classic.paytable.pay(3, 0), 1000.0);

        let football = football().game;
        assert_eq!(football.grid.combinations(), Some(3_200_000));
        assert_eq!(football.paylines.len(), 25);
        assert_eq!(football.paytable.pay(5, 0), 75.0);

        let carnival = carnival().game;
        assert_eq!(carnival.paylines.len(), 20);
        assert_eq!(carnival.symbols.id_of("BONUS"), Some(7));
    }

    #[test]
    fn test_for_variant() {
        for variant in [GameVariant::Classic, GameVariant::Football, GameVariant::Carnival] {
            assert_eq!(for_variant(variant).game.variant, variant);
        }
    }

    #[test]
    fn test_football_accepts_on_rtp_and_jackpot_alone() {
        use crate::evaluator::SlotModel;
        use crate::sampling::SampleStats;
        use crate::search::{Evaluation, RejectReason, SearchLoop, Verdict};
        use crate::symbols::ReelArrangement;

        let setup = football();
        let model = SlotModel::new(&setup.game).unwrap();
        let search = SearchLoop::new(&setup.game, &model, setup.search.clone());
        let mut stats = SampleStats::new(setup.game.outcome_len());
        stats.kept = 5_000;
        let mut evaluation = Evaluation {
            arrangement: ReelArrangement::from_columns(Vec::new()),
            stats,
            // Tier 3 hit on 16% of kept spins
            means: vec![0.797, 7.2e-6, 0.159, 0.054, 0.011],
            epsilons: Vec::new(),
            iteration: 1,
        };
        assert_eq!(search.judge(&evaluation), Verdict::Accept);

        evaluation.means[1] = 0.0;
        assert!(matches!(
            search.judge(&evaluation),
            Verdict::Reject(RejectReason::Target { component: 1, .. })
        ));

        evaluation.means[1] = 7.2e-6;
        evaluation.means[0] = 0.91;
        assert!(matches!(
            search.judge(&evaluation),
            Verdict::Reject(RejectReason::Target { component: 0, .. })
        ));
    }

    #[test]
    fn test_football_sampling() {
        let sampling = football().search.sampling;
        assert_eq!(sampling.win_cap, Some(10.0));
        assert_eq!(sampling.big_win_keep_one_in, None);
        assert_eq!(sampling.jackpot_keep_one_in, Some(100));
    }
}
