//! Symbol alphabet, reel strips and reel arrangements

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Symbol identifier, an index into the game's alphabet
pub type SymbolId = u32;

/// Symbol kind classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SymbolKind {
    /// Regular paying symbol
    Regular = 0,
    /// Wild - substitutes for others on a payline
    Wild = 1,
    /// Bonus - counted anywhere in the window toward bonus tiers
    Bonus = 2,
}

/// The symbol alphabet of a game
///
/// Symbol `i` is labelled `names[i]` and classified as `kinds[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSet {
    /// Human labels (e.g., "A", "B", "WILD")
    pub names: Vec<String>,
    /// Kind of each symbol
    pub kinds: Vec<SymbolKind>,
}

impl SymbolSet {
    /// Create an alphabet from labels and kinds
    pub fn new(names: Vec<String>, kinds: Vec<SymbolKind>) -> Self {
        Self { names, kinds }
    }

    /// Create an alphabet from `(label, kind)` pairs
    pub fn from_pairs(pairs: &[(&str, SymbolKind)]) -> Self {
        Self {
            names: pairs.iter().map(|(name, _)| (*name).to_string()).collect(),
            kinds: pairs.iter().map(|(_, kind)| *kind).collect(),
        }
    }

    /// Number of symbols
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Kind of a symbol
    #[inline]
    pub fn kind(&self, id: SymbolId) -> SymbolKind {
        self.kinds[id as usize]
    }

    #[inline]
    pub fn is_wild(&self, id: SymbolId) -> bool {
        self.kind(id) == SymbolKind::Wild
    }

    #[inline]
    pub fn is_bonus(&self, id: SymbolId) -> bool {
        self.kind(id) == SymbolKind::Bonus
    }

    /// Label of a symbol
    pub fn name(&self, id: SymbolId) -> &str {
        &self.names[id as usize]
    }

    /// Look up a symbol by label
    pub fn id_of(&self, name: &str) -> Option<SymbolId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| i as SymbolId)
    }

    /// All symbol IDs of a given kind
    pub fn ids_of(&self, kind: SymbolKind) -> Vec<SymbolId> {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == kind)
            .map(|(i, _)| i as SymbolId)
            .collect()
    }

    /// Does the alphabet contain a bonus symbol?
    pub fn has_bonus(&self) -> bool {
        self.kinds.contains(&SymbolKind::Bonus)
    }
}

/// A cyclic reel strip for one column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReelStrip {
    /// Symbol IDs in order
    pub symbols: Vec<SymbolId>,
}

impl ReelStrip {
    /// Create a new reel strip
    pub fn new(symbols: Vec<SymbolId>) -> Self {
        Self { symbols }
    }

    /// Get symbol at position (wraps around)
    #[inline]
    pub fn symbol_at(&self, position: usize) -> SymbolId {
        self.symbols[position % self.symbols.len()]
    }

    /// Get total strip length
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Occurrences of every symbol of an alphabet of `alphabet_len` symbols
    pub fn counts(&self, alphabet_len: usize) -> Vec<usize> {
        let mut counts = vec![0; alphabet_len];
        for &symbol in &self.symbols {
            if let Some(count) = counts.get_mut(symbol as usize) {
                *count += 1;
            }
        }
        counts
    }
}

/// One reel strip per column, a full candidate "chromosome"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReelArrangement {
    pub strips: Vec<ReelStrip>,
}

impl ReelArrangement {
    pub fn new(strips: Vec<ReelStrip>) -> Self {
        Self { strips }
    }

    /// Build an arrangement from per-column symbol IDs
    pub fn from_columns(columns: Vec<Vec<SymbolId>>) -> Self {
        Self {
            strips: columns.into_iter().map(ReelStrip::new).collect(),
        }
    }

    /// Number of columns
    pub fn columns(&self) -> usize {
        self.strips.len()
    }

    /// Strip of a column
    pub fn strip(&self, column: usize) -> &ReelStrip {
        &self.strips[column]
    }

    /// Symbol at a position of a column (wraps around)
    #[inline]
    pub fn symbol_at(&self, column: usize, position: usize) -> SymbolId {
        self.strips[column].symbol_at(position)
    }

    /// Check the structural contract every candidate must satisfy:
    /// `columns` strips of exactly `reel_length` symbols, all inside the alphabet.
    ///
    /// This is about shape only. Whether the strips are *valid* for play is
    /// the evaluator's business.
    pub fn check_shape(
        &self,
        columns: usize,
        reel_length: usize,
        alphabet_len: usize,
    ) -> Result<(), String> {
        if self.strips.len() != columns {
            return Err(format!(
                "{} strips, expected {}",
                self.strips.len(),
                columns
            ));
        }
        for (column, strip) in self.strips.iter().enumerate() {
            if strip.len() != reel_length {
                return Err(format!(
                    "strip {} has {} symbols, expected {}",
                    column,
                    strip.len(),
                    reel_length
                ));
            }
            if let Some(&bad) = strip.symbols.iter().find(|&&s| s as usize >= alphabet_len) {
                return Err(format!(
                    "strip {} uses symbol {} outside alphabet of {}",
                    column, bad, alphabet_len
                ));
            }
        }
        Ok(())
    }

    /// Compact code: labels joined by `,` within a column, columns joined by `|`
    pub fn code(&self, symbols: &SymbolSet) -> String {
        self.strips
            .iter()
            .map(|strip| {
                strip
                    .symbols
                    .iter()
                    .map(|&s| symbols.name(s))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Parse a compact code produced by [`ReelArrangement::code`]
    pub fn from_code(code: &str, symbols: &SymbolSet) -> ReelResult<Self> {
        let mut strips = Vec::new();
        for (column, part) in code.trim().split('|').enumerate() {
            let ids = part
                .split(',')
                .map(|label| {
                    let label = label.trim();
                    symbols.id_of(label).ok_or_else(|| {
                        ReelError::MalformedCandidate(format!(
                            "unknown symbol '{}' in column {}",
                            label, column
                        ))
                    })
                })
                .collect::<ReelResult<Vec<_>>>()?;
            strips.push(ReelStrip::new(ids));
        }
        Ok(Self { strips })
    }

    /// Human-readable rendering, one column per line
    pub fn display<'a>(&'a self, symbols: &'a SymbolSet) -> ArrangementDisplay<'a> {
        ArrangementDisplay {
            arrangement: self,
            symbols,
        }
    }
}

/// Labelled view of an arrangement for printing
pub struct ArrangementDisplay<'a> {
    arrangement: &'a ReelArrangement,
    symbols: &'a SymbolSet,
}

impl fmt::Display for ArrangementDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (column, strip) in self.arrangement.strips.iter().enumerate() {
            write!(f, "reel {}:", column)?;
            for &symbol in &strip.symbols {
                write!(f, " {}", self.symbols.name(symbol))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
