//! Game and search configuration

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ReelResult};
use crate::paytable::{Payline, Paytable, validate_paylines};
use crate::symbols::SymbolSet;

/// Grid specification (columns × rows) plus reel strip length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub columns: u8,
    /// Number of visible rows per reel
    pub rows: u8,
    /// Symbols on every reel strip
    pub reel_length: u16,
}

impl GridSpec {
    pub fn new(columns: u8, rows: u8, reel_length: u16) -> Self {
        Self {
            columns,
            rows,
            reel_length,
        }
    }

    /// Number of stop combinations, `reel_length ^ columns`
    pub fn combinations(&self) -> Option<u64> {
        (self.reel_length as u64).checked_pow(self.columns as u32)
    }

    /// Total visible positions
    pub fn visible_cells(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

/// Game variant, selecting which rules of the evaluator apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameVariant {
    /// Line wins and jackpot only
    Classic,
    /// Line wins, jackpot and free-spin tiers from bonus symbols
    Football,
    /// Football rules plus a per-line bonus for substituting wilds
    Carnival,
}

impl GameVariant {
    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Football => "football",
            Self::Carnival => "carnival",
        }
    }

    /// Does this variant count bonus symbols toward tiers?
    pub fn counts_bonus(self) -> bool {
        !matches!(self, Self::Classic)
    }

    /// Does this variant pay the wild bonus table?
    pub fn pays_wild_bonus(self) -> bool {
        matches!(self, Self::Carnival)
    }
}

impl fmt::Display for GameVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bonus tier: exactly `count` bonus symbols in the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusTier {
    /// Bonus symbols required
    pub count: u32,
    /// Free spins awarded (informational)
    #[serde(default)]
    pub free_spins: u32,
}

impl BonusTier {
    pub fn new(count: u32, free_spins: u32) -> Self {
        Self { count, free_spins }
    }
}

/// How a target judges its measured mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// `|mean - value| <= tolerance`
    #[default]
    Within,
    /// `mean <= value + tolerance`
    AtMost,
}

/// Desired long-run mean of one outcome component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub value: f64,
    pub tolerance: f64,
    #[serde(default)]
    pub mode: TargetMode,
    /// Reject candidates whose mean for this component is exactly zero
    #[serde(default)]
    pub require_nonzero: bool,
}

impl Target {
    /// Target `value ± tolerance`
    pub fn within(value: f64, tolerance: f64) -> Self {
        Self {
            value,
            tolerance,
            mode: TargetMode::Within,
            require_nonzero: false,
        }
    }

    /// Ceiling target, met by any mean not above `ceiling`
    pub fn at_most(ceiling: f64) -> Self {
        Self {
            value: ceiling,
            tolerance: 0.0,
            mode: TargetMode::AtMost,
            require_nonzero: false,
        }
    }

    pub fn nonzero(mut self) -> Self {
        self.require_nonzero = true;
        self
    }

    /// Absolute error of a measured mean
    #[inline]
    pub fn epsilon(&self, mean: f64) -> f64 {
        (mean - self.value).abs()
    }

    /// Does a measured mean satisfy this target?
    pub fn accepts(&self, mean: f64) -> bool {
        if self.require_nonzero && mean == 0.0 {
            return false;
        }
        match self.mode {
            TargetMode::Within => self.epsilon(mean) <= self.tolerance,
            TargetMode::AtMost => mean <= self.value + self.tolerance,
        }
    }
}

/// Complete game definition
///
/// Built once, validated once, never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Game name
    pub name: String,
    /// Rule set
    pub variant: GameVariant,
    /// Geometry
    pub grid: GridSpec,
    /// Symbol alphabet
    pub symbols: SymbolSet,
    /// Paylines
    pub paylines: Vec<Payline>,
    /// `[run_length][symbol]` pays
    pub paytable: Paytable,
    /// `[wild cells on line]` pays (carnival)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wild_bonus: Option<Vec<f64>>,
    /// Bonus tiers, lowest count first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bonus_tiers: Vec<BonusTier>,
    /// Targets for a prefix of the outcome vector
    pub targets: Vec<Target>,
}

impl GameConfig {
    /// Outcome vector width: RTP, jackpot, then one slot per bonus tier
    pub fn outcome_len(&self) -> usize {
        2 + self.bonus_tiers.len()
    }

    /// Largest bonus count that still maps to a tier
    pub fn max_tier_count(&self) -> Option<u32> {
        self.bonus_tiers.last().map(|t| t.count)
    }

    /// Validate the game definition
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if grid.columns == 0 || grid.rows == 0 {
            return Err(ConfigError::InvalidGrid("Grid must have at least 1 column and 1 row"));
        }
        if grid.reel_length == 0 {
            return Err(ConfigError::InvalidGrid("Reel strips cannot be empty"));
        }
        if grid.combinations().is_none() {
            return Err(ConfigError::CombinationOverflow {
                reel_length: grid.reel_length,
                columns: grid.columns,
            });
        }

        if self.symbols.is_empty() {
            return Err(ConfigError::EmptyAlphabet);
        }
        if self.symbols.kinds.len() != self.symbols.names.len() {
            return Err(ConfigError::KindCount {
                symbols: self.symbols.names.len(),
                kinds: self.symbols.kinds.len(),
            });
        }

        validate_paylines(&self.paylines, grid.columns, grid.rows)?;
        self.paytable.validate(grid.columns, self.symbols.len())?;

        match (&self.wild_bonus, self.variant.pays_wild_bonus()) {
            (Some(table), true) => {
                let expected = grid.columns as usize + 1;
                if table.len() != expected {
                    return Err(ConfigError::WildBonusLength {
                        expected,
                        actual: table.len(),
                    });
                }
            }
            (Some(_), false) => {
                return Err(ConfigError::VariantMismatch {
                    variant: self.variant.name(),
                    feature: "a wild bonus table",
                });
            }
            (None, true) => return Err(ConfigError::WildBonusLength {
                expected: grid.columns as usize + 1,
                actual: 0,
            }),
            (None, false) => {}
        }

        if !self.bonus_tiers.is_empty() {
            if !self.variant.counts_bonus() {
                return Err(ConfigError::VariantMismatch {
                    variant: self.variant.name(),
                    feature: "bonus tiers",
                });
            }
            if !self.symbols.has_bonus() {
                return Err(ConfigError::MissingBonusSymbol);
            }
            let ordered = self.bonus_tiers.first().is_some_and(|t| t.count > 0)
                && self.bonus_tiers.windows(2).all(|w| w[0].count < w[1].count);
            if !ordered {
                return Err(ConfigError::BonusTierOrder);
            }
        }

        if self.targets.len() > self.outcome_len() {
            return Err(ConfigError::TargetLength {
                targets: self.targets.len(),
                outcome_len: self.outcome_len(),
            });
        }
        for (index, target) in self.targets.iter().enumerate() {
            if !target.tolerance.is_finite() || target.tolerance < 0.0 || !target.value.is_finite() {
                return Err(ConfigError::TargetTolerance {
                    index,
                    tolerance: target.tolerance,
                });
            }
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SEARCH CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════

/// Rejection-sampling rules applied to the enumerated distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingPolicy {
    /// Outcomes paying above this are dropped entirely
    #[serde(default)]
    pub win_cap: Option<f64>,
    /// Payout above which an outcome counts as a big win
    pub big_win_threshold: f64,
    /// Keep one big win in N (None = keep all)
    #[serde(default)]
    pub big_win_keep_one_in: Option<u32>,
    /// Keep one jackpot in N (None = keep all)
    #[serde(default)]
    pub jackpot_keep_one_in: Option<u32>,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            win_cap: None,
            big_win_threshold: 1.0,
            big_win_keep_one_in: Some(30),
            jackpot_keep_one_in: Some(100),
        }
    }
}

impl SamplingPolicy {
    /// Keep every outcome; means are the exact enumerated means
    pub fn exhaustive() -> Self {
        Self {
            win_cap: None,
            big_win_threshold: 1.0,
            big_win_keep_one_in: None,
            jackpot_keep_one_in: None,
        }
    }

    /// Drop outcomes paying above `cap`
    pub fn with_win_cap(mut self, cap: f64) -> Self {
        self.win_cap = Some(cap);
        self
    }
}

/// Search loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Subsampling rules
    pub sampling: SamplingPolicy,
    /// Kept samples must exceed this count for acceptance
    pub min_samples: u64,
    /// Stop after this many candidates (None = run until accepted)
    pub max_iterations: Option<u64>,
    /// Wall-clock limit
    pub timeout: Option<Duration>,
    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,
    /// Log progress every N candidates (0 = never)
    pub report_every: u64,
    /// Stop combinations per parallel work unit
    pub chunk_size: u64,
    /// Maximum blocked combination IDs kept for diagnostics
    pub max_blocked: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingPolicy::default(),
            min_samples: 0,
            max_iterations: None,
            timeout: None,
            seed: None,
            report_every: 1,
            chunk_size: 16_384,
            max_blocked: 10_000,
        }
    }
}

impl SearchConfig {
    /// Exhaustive sampling, bounded run: for tests and re-evaluation
    pub fn exact() -> Self {
        Self {
            sampling: SamplingPolicy::exhaustive(),
            max_iterations: Some(1),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_min_samples(mut self, min_samples: u64) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingPolicy) -> Self {
        self.sampling = sampling;
        self
    }
}

/// A game plus the search settings tuned for it; the JSON config file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSetup {
    pub game: GameConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl GameSetup {
    /// Parse and validate a JSON setup
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let setup: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        setup.game.validate()?;
        Ok(setup)
    }

    /// Load, parse and validate a JSON setup file
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }

    pub fn to_json_pretty(&self) -> ReelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolKind;

    fn tiny_game() -> GameConfig {
        GameConfig {
            name: "tiny".into(),
            variant: GameVariant::Football,
            grid: GridSpec::new(3, 3, 10),
            symbols: SymbolSet::from_pairs(&[
                ("A", SymbolKind::Regular),
                ("WILD", SymbolKind::Wild),
                ("BONUS", SymbolKind::Bonus),
            ]),
            paylines: vec![Payline::straight(1, 3)],
            paytable: Paytable::with_runs(3, 3, &[(3, &[10.0, 0.0, 0.0])]),
            wild_bonus: None,
            bonus_tiers: vec![BonusTier::new(3, 10), BonusTier::new(4, 15)],
            targets: vec![Target::within(0.9, 0.01), Target::within(0.001, 0.001)],
        }
    }

    #[test]
    fn test_grid_spec() {
        let grid = GridSpec::new(5, 3, 20);
        assert_eq!(grid.combinations(), Some(3_200_000));
        assert_eq!(grid.visible_cells(), 15);
        assert_eq!(GridSpec::new(20, 3, 60_000).combinations(), None);
    }

    #[test]
    fn test_combination_overflow_rejected() {
        let mut game = tiny_game();
        game.grid = GridSpec::new(20, 3, 60_000);
        assert_eq!(
            game.validate(),
            Err(ConfigError::CombinationOverflow {
                reel_length: 60_000,
                columns: 20,
            })
        );
    }

    #[test]
    fn test_empty_alphabet_rejected() {
        let mut game = tiny_game();
        game.symbols = SymbolSet::from_pairs(&[]);
        assert_eq!(game.validate(), Err(ConfigError::EmptyAlphabet));
    }

    #[test]
    fn test_valid_game() {
        let game = tiny_game();
        assert!(game.validate().is_ok());
        assert_eq!(game.outcome_len(), 4);
        assert_eq!(game.max_tier_count(), Some(4));
    }

    #[test]
    fn test_invalid_grid() {
        let mut game = tiny_game();
        game.grid.rows = 0;
        assert!(matches!(game.validate(), Err(ConfigError::InvalidGrid(_))));

        let mut game = tiny_game();
        game.grid.reel_length = 0;
        assert!(matches!(game.validate(), Err(ConfigError::InvalidGrid(_))));
    }

    #[test]
    fn test_kind_count_mismatch() {
        let mut game = tiny_game();
        game.symbols.kinds.pop();
        assert_eq!(
            game.validate(),
            Err(ConfigError::KindCount { symbols: 3, kinds: 2 })
        );
    }

    #[test]
    fn test_paytable_shape_checked() {
        let mut game = tiny_game();
        game.paytable.rows.pop();
        assert!(matches!(game.validate(), Err(ConfigError::PaytableRows { .. })));

        let mut game = tiny_game();
        game.paytable.rows[2].push(1.0);
        assert!(matches!(
            game.validate(),
            Err(ConfigError::PaytableColumns { row: 2, .. })
        ));
    }

    #[test]
    fn test_bonus_tiers_checked() {
        let mut game = tiny_game();
        game.bonus_tiers = vec![BonusTier::new(4, 0), BonusTier::new(3, 0)];
        assert_eq!(game.validate(), Err(ConfigError::BonusTierOrder));

        let mut game = tiny_game();
        game.symbols = SymbolSet::from_pairs(&[
            ("A", SymbolKind::Regular),
            ("WILD", SymbolKind::Wild),
            ("B", SymbolKind::Regular),
        ]);
        assert_eq!(game.validate(), Err(ConfigError::MissingBonusSymbol));

        let mut game = tiny_game();
        game.variant = GameVariant::Classic;
        assert!(matches!(game.validate(), Err(ConfigError::VariantMismatch { .. })));
    }

    #[test]
    fn test_wild_bonus_checked() {
        let mut game = tiny_game();
        game.wild_bonus = Some(vec![0.0; 4]);
        assert!(matches!(game.validate(), Err(ConfigError::VariantMismatch { .. })));

        game.variant = GameVariant::Carnival;
        assert!(game.validate().is_ok());

        game.wild_bonus = Some(vec![0.0; 3]);
        assert_eq!(
            game.validate(),
            Err(ConfigError::WildBonusLength { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn test_targets_checked() {
        let mut game = tiny_game();
        game.targets = vec![Target::within(0.9, 0.01); 5];
        assert_eq!(
            game.validate(),
            Err(ConfigError::TargetLength { targets: 5, outcome_len: 4 })
        );

        let mut game = tiny_game();
        game.targets[1].tolerance = -1.0;
        assert!(matches!(
            game.validate(),
            Err(ConfigError::TargetTolerance { index: 1, .. })
        ));
    }

    #[test]
    fn test_target_modes() {
        let within = Target::within(0.8, 0.01);
        assert!(within.accepts(0.805));
        assert!(!within.accepts(0.82));
        assert!((within.epsilon(0.75) - 0.05).abs() < 1e-12);

        let ceiling = Target::at_most(0.9);
        assert!(ceiling.accepts(0.1));
        assert!(ceiling.accepts(0.9));
        assert!(!ceiling.accepts(0.91));

        let nonzero = Target::at_most(0.0001).nonzero();
        assert!(!nonzero.accepts(0.0));
        assert!(nonzero.accepts(0.00005));
    }

    #[test]
    fn test_setup_json_roundtrip() {
        let setup = GameSetup {
            game: tiny_game(),
            search: SearchConfig::default().with_seed(7),
        };
        let json = setup.to_json_pretty().unwrap();
        let parsed = GameSetup::from_json_str(&json).unwrap();
        assert_eq!(parsed.game.name, "tiny");
        assert_eq!(parsed.game.variant, GameVariant::Football);
        assert_eq!(parsed.game.paylines, setup.game.paylines);
        assert_eq!(parsed.game.bonus_tiers, setup.game.bonus_tiers);
        assert_eq!(parsed.search.seed, Some(7));
        assert_eq!(parsed.search.sampling.big_win_keep_one_in, Some(30));
    }

    #[test]
    fn test_search_config_has_no_materialization_limit() {
        let json = serde_json::to_value(SearchConfig::default()).unwrap();
        assert!(json.get("max_materialized").is_none());

        // Older setup files carrying the key still load
        let mut value = serde_json::to_value(GameSetup {
            game: tiny_game(),
            search: SearchConfig::default(),
        })
        .unwrap();
        value["search"]["max_materialized"] = serde_json::json!(1);
        let parsed = GameSetup::from_json_str(&value.to_string()).unwrap();
        assert_eq!(parsed.search, SearchConfig::default());
    }

    #[test]
    fn test_setup_json_rejects_invalid_game() {
        let mut setup = GameSetup {
            game: tiny_game(),
            search: SearchConfig::default(),
        };
        setup.game.paylines.clear();
        let json = serde_json::to_string(&setup).unwrap();
        assert_eq!(
            GameSetup::from_json_str(&json),
            Err(ConfigError::EmptyPaylines)
        );
        assert!(matches!(
            GameSetup::from_json_str("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
