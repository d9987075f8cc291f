//! Reel strip search
//!
//! Usage:
//!   reel-search                     - Search carnival reels
//!   reel-search --classic           - Search classic 3×3 reels
//!   reel-search --football          - Search football reels
//!   reel-search --config game.json  - Search a custom game
//!   reel-search --evaluate CODE     - Evaluate one arrangement and exit

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use rf_reel_math::{
    CandidateSource, GameSetup, OutputFormat, RandomReels, ReelArrangement, SearchLoop,
    SearchOutcome, SlotModel, Verdict, append_result, default_output_name, presets, render,
    render_text,
};

#[derive(Parser)]
#[command(
    name = "reel-search",
    about = "Search reel strips that hit RTP, jackpot and bonus tier targets"
)]
struct Cli {
    /// Classic 3×3 game
    #[arg(long, group = "game")]
    classic: bool,

    /// Carnival game (the default)
    #[arg(long, group = "game")]
    chinese: bool,

    /// Football game
    #[arg(long, group = "game")]
    football: bool,

    /// Custom game setup (JSON)
    #[arg(long, group = "game", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Random seed (default: OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many candidates
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Stop after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Worker threads for enumeration (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Log progress every N candidates (0 = never)
    #[arg(long)]
    report_every: Option<u64>,

    /// Kept samples required for acceptance
    #[arg(long)]
    min_samples: Option<u64>,

    /// Draw fully uniform strips, including invalid ones
    #[arg(long)]
    unconstrained: bool,

    /// Output file (default: model-<variant>-<timestamp>.<ext>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Evaluate one arrangement code instead of searching
    #[arg(long, value_name = "CODE")]
    evaluate: Option<String>,

    /// Print the resolved setup as JSON and exit
    #[arg(long)]
    dump_config: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let setup = resolve_setup(&cli)?;
    if cli.dump_config {
        println!("{}", setup.to_json_pretty()?);
        return Ok(());
    }

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to configure worker threads")?;
    log::info!("Using {} worker threads", threads);

    let model = SlotModel::new(&setup.game).context("Invalid game definition")?;
    let search = SearchLoop::new(&setup.game, &model, setup.search.clone());

    if let Some(code) = &cli.evaluate {
        return evaluate(&setup, &search, code);
    }

    let mut source: Box<dyn CandidateSource> = if cli.unconstrained {
        Box::new(RandomReels::uniform(&setup.game))
    } else {
        Box::new(RandomReels::valid_only(&setup.game))
    };
    let report = search.run(source.as_mut())?;

    let evaluation = match &report.outcome {
        SearchOutcome::Accepted(evaluation) => evaluation,
        other => {
            if let Some(best) = other.best() {
                println!("Closest rejected candidate (iteration {}):", best.iteration);
                print!("{}", render_text(&setup.game, best));
            }
            bail!(
                "No candidate accepted: search {} after {} iterations",
                other.label(),
                report.iterations
            );
        }
    };

    let format = OutputFormat::from(cli.format);
    let path = cli.output.clone().unwrap_or_else(|| {
        let now = chrono::Local::now().naive_local();
        PathBuf::from(default_output_name(setup.game.variant, format, now))
    });
    let contents = render(format, &setup.game, evaluation, setup.search.sampling.win_cap)?;
    append_result(&path, &contents)
        .with_context(|| format!("Failed to write result to {}", path.display()))?;

    print!("{}", render_text(&setup.game, evaluation));
    println!("Saved to {}", path.display());
    Ok(())
}

/// Preset or config file, with command-line overrides applied
fn resolve_setup(cli: &Cli) -> Result<GameSetup> {
    let mut setup = if let Some(path) = &cli.config {
        GameSetup::from_path(path)
            .with_context(|| format!("Failed to load setup from {}", path.display()))?
    } else if cli.classic {
        presets::classic()
    } else if cli.football {
        presets::football()
    } else {
        presets::carnival()
    };

    let search = &mut setup.search;
    if cli.seed.is_some() {
        search.seed = cli.seed;
    }
    if cli.max_iterations.is_some() {
        search.max_iterations = cli.max_iterations;
    }
    if let Some(secs) = cli.timeout_secs {
        search.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(every) = cli.report_every {
        search.report_every = every;
    }
    if let Some(min_samples) = cli.min_samples {
        search.min_samples = min_samples;
    }
    Ok(setup)
}

fn evaluate(setup: &GameSetup, search: &SearchLoop<'_, SlotModel>, code: &str) -> Result<()> {
    let arrangement = ReelArrangement::from_code(code, &setup.game.symbols)
        .context("Failed to parse arrangement code")?;
    let evaluation = search.evaluate(&arrangement, setup.search.seed.unwrap_or(0))?;
    print!("{}", render_text(&setup.game, &evaluation));
    match search.judge(&evaluation) {
        Verdict::Accept => println!("verdict: accept"),
        Verdict::Reject(reason) => println!("verdict: reject ({})", reason),
    }
    Ok(())
}
