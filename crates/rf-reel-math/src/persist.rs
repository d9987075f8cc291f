//! Result records and the output sink

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{GameConfig, GameVariant};
use crate::error::ReelResult;
use crate::evaluator::{JACKPOT_COMPONENT, RTP_COMPONENT};
use crate::search::{Evaluation, format_components};

/// Output artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable reels plus summary lines
    #[default]
    Text,
    /// One JSON record per line
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

/// Persisted description of an accepted arrangement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: Uuid,
    pub variant: GameVariant,
    pub means: Vec<f64>,
    pub epsilons: Vec<f64>,
    pub rtp: f64,
    pub jackpot: f64,
    /// Win cap applied while sampling
    pub bound: Option<f64>,
    pub reel_size: usize,
    /// Compact arrangement code, see [`crate::ReelArrangement::code`]
    pub code: String,
    /// Symbol labels per column
    pub reels: Vec<Vec<String>>,
    pub kept: u64,
    pub total: u64,
    pub over_unity: u64,
    pub max_win: f64,
    pub blocked: Vec<u64>,
}

impl SearchRecord {
    pub fn new(game: &GameConfig, evaluation: &Evaluation, bound: Option<f64>) -> Self {
        let stats = &evaluation.stats;
        let arrangement = &evaluation.arrangement;
        Self {
            id: Uuid::new_v4(),
            variant: game.variant,
            means: evaluation.means.clone(),
            epsilons: evaluation.epsilons.clone(),
            rtp: evaluation.means.get(RTP_COMPONENT).copied().unwrap_or(0.0),
            jackpot: evaluation.means.get(JACKPOT_COMPONENT).copied().unwrap_or(0.0),
            bound,
            reel_size: game.grid.reel_length as usize,
            code: arrangement.code(&game.symbols),
            reels: arrangement
                .strips
                .iter()
                .map(|strip| {
                    strip
                        .symbols
                        .iter()
                        .map(|&s| game.symbols.name(s).to_string())
                        .collect()
                })
                .collect(),
            kept: stats.kept,
            total: stats.total,
            over_unity: stats.over_unity,
            max_win: stats.max_win,
            blocked: stats.blocked.clone(),
        }
    }

    /// Single-line JSON document
    pub fn to_json_line(&self) -> ReelResult<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Reels, then means, epsilons and sample counters
pub fn render_text(game: &GameConfig, evaluation: &Evaluation) -> String {
    let stats = &evaluation.stats;
    let mut text = evaluation.arrangement.display(&game.symbols).to_string();
    text.push_str(&format!("means: {}\n", format_components(&evaluation.means)));
    text.push_str(&format!("epsilons: {}\n", format_components(&evaluation.epsilons)));
    text.push_str(&format!("kept: {} / {}\n", stats.kept, stats.total));
    text.push_str(&format!("over unity: {}\n", stats.over_unity));
    text.push_str(&format!("zero wins: {}\n", stats.zero_wins));
    text.push_str(&format!("max win: {:.4}\n", stats.max_win));
    text.push_str(&format!("blocked: {}\n", stats.blocked.len()));
    text
}

/// Render an evaluation in the chosen format
pub fn render(
    format: OutputFormat,
    game: &GameConfig,
    evaluation: &Evaluation,
    bound: Option<f64>,
) -> ReelResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(game, evaluation)),
        OutputFormat::Json => SearchRecord::new(game, evaluation, bound).to_json_line(),
    }
}

/// Append to `path`, creating it if missing
pub fn append_result(path: impl AsRef<Path>, contents: &str) -> ReelResult<()> {
    let path = path.as_ref();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    log::info!("Wrote result to {}", path.display());
    Ok(())
}

/// `model-<variant>-<YYYY-MM-DD HH-MM-SS>.<ext>`
pub fn default_output_name(variant: GameVariant, format: OutputFormat, at: NaiveDateTime) -> String {
    format!(
        "model-{}-{}.{}",
        variant,
        at.format("%Y-%m-%d %H-%M-%S"),
        format.extension()
    )
}
