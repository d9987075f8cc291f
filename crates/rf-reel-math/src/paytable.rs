//! Paylines, paytables and line matching

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::symbols::{SymbolId, SymbolSet};

/// A payline definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payline {
    /// Row offset for each column (e.g., [1, 0, 0, 0, 1])
    pub positions: Vec<u8>,
}

impl Payline {
    pub fn new(positions: Vec<u8>) -> Self {
        Self { positions }
    }

    /// Create a straight line (same row across all columns)
    pub fn straight(row: u8, columns: u8) -> Self {
        Self {
            positions: vec![row; columns as usize],
        }
    }

    /// Row offset of a column
    #[inline]
    pub fn row(&self, column: usize) -> usize {
        self.positions[column] as usize
    }
}

fn lines(rows: &[&[u8]]) -> Vec<Payline> {
    rows.iter().map(|r| Payline::new(r.to_vec())).collect()
}

/// The 20 lines of the 3×3 classic machine
pub fn classic_paylines() -> Vec<Payline> {
    lines(&[
        &[0, 0, 0],
        &[1, 1, 1],
        &[2, 2, 2],
        &[0, 1, 0],
        &[2, 1, 2],
        &[1, 0, 1],
        &[1, 2, 1],
        &[0, 2, 0],
        &[2, 0, 2],
        &[0, 1, 2],
        &[2, 1, 0],
        &[0, 0, 1],
        &[1, 1, 2],
        &[1, 1, 0],
        &[2, 2, 1],
        &[1, 0, 0],
        &[2, 1, 1],
        &[0, 1, 1],
        &[1, 2, 2],
        &[0, 2, 1],
    ])
}

/// The 25 lines of the 5×3 football machine
pub fn football_paylines() -> Vec<Payline> {
    lines(&[
        &[0, 0, 0, 0, 0],
        &[1, 1, 1, 1, 1],
        &[2, 2, 2, 2, 2],
        &[1, 2, 2, 2, 1],
        &[1, 0, 1, 2, 1],
        &[0, 0, 2, 0, 0],
        &[2, 2, 0, 2, 2],
        &[0, 1, 2, 1, 0],
        &[0, 1, 1, 1, 0],
        &[0, 1, 0, 1, 0],
        &[0, 2, 2, 2, 0],
        &[2, 0, 0, 0, 2],
        &[2, 1, 0, 1, 2],
        &[0, 0, 1, 2, 2],
        &[2, 1, 2, 1, 2],
        &[1, 2, 0, 2, 1],
        &[2, 1, 1, 1, 2],
        &[1, 2, 1, 0, 1],
        &[1, 1, 2, 1, 1],
        &[0, 2, 0, 2, 0],
        &[2, 0, 2, 0, 2],
        &[1, 0, 0, 0, 1],
        &[2, 2, 1, 0, 0],
        &[1, 1, 0, 1, 1],
        &[1, 0, 2, 0, 1],
    ])
}

/// Standard payline patterns for a 5×3 grid
pub fn standard_20_paylines() -> Vec<Payline> {
    let mut paylines = vec![
        // Straight lines
        Payline::straight(1, 5), // Middle
        Payline::straight(0, 5), // Top
        Payline::straight(2, 5), // Bottom
    ];
    paylines.extend(lines(&[
        // V shapes
        &[0, 1, 2, 1, 0],
        &[2, 1, 0, 1, 2],
        // Zigzag
        &[0, 0, 1, 2, 2],
        &[2, 2, 1, 0, 0],
        &[1, 0, 0, 0, 1],
        &[1, 2, 2, 2, 1],
        // W shapes
        &[0, 1, 0, 1, 0],
        &[2, 1, 2, 1, 2],
        // Diagonal
        &[0, 1, 1, 1, 0],
        &[2, 1, 1, 1, 2],
        // Steps
        &[1, 1, 0, 1, 1],
        &[1, 1, 2, 1, 1],
        // Complex
        &[0, 2, 0, 2, 0],
        &[2, 0, 2, 0, 2],
        &[1, 0, 1, 0, 1],
        &[1, 2, 1, 2, 1],
        &[0, 0, 2, 0, 0],
    ]));
    paylines
}

/// Check payline geometry against a `columns × rows` window
pub fn validate_paylines(paylines: &[Payline], columns: u8, rows: u8) -> Result<(), ConfigError> {
    if paylines.is_empty() {
        return Err(ConfigError::EmptyPaylines);
    }
    for (index, line) in paylines.iter().enumerate() {
        if line.positions.len() != columns as usize {
            return Err(ConfigError::PaylineLength {
                index,
                expected: columns as usize,
                actual: line.positions.len(),
            });
        }
        if let Some((column, &row)) = line.positions.iter().enumerate().find(|(_, r)| **r >= rows) {
            return Err(ConfigError::PaylineRow {
                index,
                column,
                row,
                rows,
            });
        }
    }
    Ok(())
}

/// Payout table indexed by `[run_length][symbol]`
///
/// Row `k` holds the pay for a left-anchored run of exactly `k` symbols,
/// so a game with `C` columns has `C + 1` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paytable {
    pub rows: Vec<Vec<f64>>,
}

impl Paytable {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Build a table that pays only for the given run lengths
    ///
    /// `pays` lists `(run_length, pay per symbol)`; every other row pays 0.
    pub fn with_runs(columns: u8, symbol_count: usize, pays: &[(usize, &[f64])]) -> Self {
        let mut rows = vec![vec![0.0; symbol_count]; columns as usize + 1];
        for &(run, values) in pays {
            if let Some(row) = rows.get_mut(run) {
                for (slot, &value) in row.iter_mut().zip(values) {
                    *slot = value;
                }
            }
        }
        Self { rows }
    }

    /// Pay for a run of `run` symbols of `symbol`
    #[inline]
    pub fn pay(&self, run: usize, symbol: SymbolId) -> f64 {
        self.rows
            .get(run)
            .and_then(|row| row.get(symbol as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest single-line pay in the table
    pub fn max_pay(&self) -> f64 {
        self.rows
            .iter()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    /// Check table dimensions: `columns + 1` rows of `symbol_count` entries
    pub fn validate(&self, columns: u8, symbol_count: usize) -> Result<(), ConfigError> {
        let expected = columns as usize + 1;
        if self.rows.len() != expected {
            return Err(ConfigError::PaytableRows {
                expected,
                actual: self.rows.len(),
            });
        }
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != symbol_count {
                return Err(ConfigError::PaytableColumns {
                    row,
                    expected: symbol_count,
                    actual: values.len(),
                });
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LINE MATCHING
// ═══════════════════════════════════════════════════════════════════════════

/// Reference symbol of a resolved line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineReference {
    /// Leftmost non-wild symbol
    Symbol(SymbolId),
    /// Every cell is wild; carries the wild symbol closing the line
    AllWild(SymbolId),
}

impl LineReference {
    pub fn symbol(self) -> SymbolId {
        match self {
            Self::Symbol(s) | Self::AllWild(s) => s,
        }
    }
}

/// Outcome of matching one resolved line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineMatch {
    /// Symbol the run is paid as
    pub reference: SymbolId,
    /// Left-anchored run length after wild substitution
    pub run: usize,
    /// Wild cells on the line before substitution
    pub wilds: usize,
    /// Every cell was wild
    pub all_wild: bool,
}

/// Find the reference symbol of a line: the leftmost non-wild symbol
pub fn reference_symbol(line: &[SymbolId], symbols: &SymbolSet) -> LineReference {
    match line.iter().find(|&&s| !symbols.is_wild(s)) {
        Some(&symbol) => LineReference::Symbol(symbol),
        None => LineReference::AllWild(line.last().copied().unwrap_or_default()),
    }
}

/// Replace every wild cell by `reference`, returning how many were replaced
pub fn substitute_wilds(line: &mut [SymbolId], reference: SymbolId, symbols: &SymbolSet) -> usize {
    let mut replaced = 0;
    for cell in line.iter_mut() {
        if symbols.is_wild(*cell) {
            *cell = reference;
            replaced += 1;
        }
    }
    replaced
}

/// Count `reference` from column 0 up to the first mismatch
#[inline]
pub fn run_length(line: &[SymbolId], reference: SymbolId) -> usize {
    line.iter().take_while(|&&s| s == reference).count()
}

/// Match a resolved line in place (wild cells are substituted)
pub fn match_line(line: &mut [SymbolId], symbols: &SymbolSet) -> LineMatch {
    let reference = reference_symbol(line, symbols);
    match reference {
        LineReference::AllWild(wild) => LineMatch {
            reference: wild,
            run: line.len(),
            wilds: line.len(),
            all_wild: true,
        },
        LineReference::Symbol(symbol) => {
            let wilds = substitute_wilds(line, symbol, symbols);
            LineMatch {
                reference: symbol,
                run: run_length(line, symbol),
                wilds,
                all_wild: false,
            }
        }
    }
}
