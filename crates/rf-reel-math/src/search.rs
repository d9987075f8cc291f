//! Rejection-sampling search for reel arrangements
//!
//! Each iteration pulls a candidate, streams its full stop distribution
//! through the [`Sampler`], and compares the means of the kept samples with
//! the game's targets. The loop stops on the first accepted candidate, or
//! when an iteration cap, timeout or cancellation ends it. Timeout and
//! cancellation are also checked between enumeration chunks, so a single
//! large candidate cannot overrun them by more than one chunk per worker.

use std::fmt;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};

use crate::SearchRng;
use crate::cancel::CancelToken;
use crate::candidate::CandidateSource;
use crate::config::{GameConfig, SearchConfig, Target};
use crate::enumerator::Enumerator;
use crate::error::{ReelError, ReelResult};
use crate::evaluator::OutcomeEvaluator;
use crate::sampling::{SampleStats, Sampler, sample_distribution};
use crate::symbols::ReelArrangement;

/// Statistics of one evaluated candidate
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub arrangement: ReelArrangement,
    pub stats: SampleStats,
    /// Per-component means over kept samples
    pub means: Vec<f64>,
    /// `|mean - target|` for every targeted component
    pub epsilons: Vec<f64>,
    /// 1-based iteration that produced the candidate (0 outside a search)
    pub iteration: u64,
}

impl Evaluation {
    /// Summed epsilon, used to rank rejected candidates
    pub fn total_epsilon(&self) -> f64 {
        self.epsilons.iter().sum()
    }
}

/// Why a candidate was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    /// Strips failed the structural validity check
    InvalidReels,
    /// Not enough samples survived sampling
    TooFewSamples { kept: u64, required: u64 },
    /// A component mean missed its target
    Target {
        component: usize,
        mean: f64,
        target: Target,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidReels => write!(f, "invalid reels"),
            Self::TooFewSamples { kept, required } => {
                write!(f, "{} kept samples, need more than {}", kept, required)
            }
            Self::Target {
                component,
                mean,
                target,
            } => write!(
                f,
                "component {} mean {:.6} misses target {:.6} ± {:.6}",
                component, mean, target.value, target.tolerance
            ),
        }
    }
}

/// Decision on one candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept)
    }
}

/// How a search ended
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A candidate met every target
    Accepted(Evaluation),
    /// The iteration cap was reached
    Exhausted { best: Option<Evaluation> },
    /// The wall-clock limit was reached
    TimedOut { best: Option<Evaluation> },
    /// The cancel token was triggered
    Cancelled { best: Option<Evaluation> },
}

impl SearchOutcome {
    pub fn accepted(&self) -> Option<&Evaluation> {
        match self {
            Self::Accepted(evaluation) => Some(evaluation),
            _ => None,
        }
    }

    /// Accepted candidate, or the closest rejected one
    pub fn best(&self) -> Option<&Evaluation> {
        match self {
            Self::Accepted(evaluation) => Some(evaluation),
            Self::Exhausted { best } | Self::TimedOut { best } | Self::Cancelled { best } => {
                best.as_ref()
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "accepted",
            Self::Exhausted { .. } => "exhausted",
            Self::TimedOut { .. } => "timed out",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}

/// Search result plus run counters
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    /// Candidates pulled from the source
    pub iterations: u64,
    /// Candidates rejected as structurally invalid
    pub invalid_candidates: u64,
    pub elapsed: Duration,
}

/// The rejection-sampling search
pub struct SearchLoop<'a, E: OutcomeEvaluator + ?Sized> {
    game: &'a GameConfig,
    evaluator: &'a E,
    config: SearchConfig,
    sampler: Sampler,
    cancel: CancelToken,
}

impl<'a, E: OutcomeEvaluator + ?Sized> SearchLoop<'a, E> {
    pub fn new(game: &'a GameConfig, evaluator: &'a E, config: SearchConfig) -> Self {
        let sampler = Sampler::new(config.sampling, evaluator.outcome_len(), config.max_blocked);
        Self {
            game,
            evaluator,
            config,
            sampler,
            cancel: CancelToken::new(),
        }
    }

    /// Share an external cancel token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops this search
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn check_candidate(&self, arrangement: &ReelArrangement) -> ReelResult<()> {
        arrangement
            .check_shape(
                self.game.grid.columns as usize,
                self.game.grid.reel_length as usize,
                self.game.symbols.len(),
            )
            .map_err(ReelError::MalformedCandidate)
    }

    /// Sample one arrangement and compute means and epsilons
    pub fn evaluate(&self, arrangement: &ReelArrangement, sample_seed: u64) -> ReelResult<Evaluation> {
        self.evaluate_until(arrangement, sample_seed, None)
    }

    fn evaluate_until(
        &self,
        arrangement: &ReelArrangement,
        sample_seed: u64,
        deadline: Option<Instant>,
    ) -> ReelResult<Evaluation> {
        self.check_candidate(arrangement)?;

        let mut enumerator = Enumerator::new(self.evaluator, &self.game.grid)
            .with_chunk_size(self.config.chunk_size)
            .with_cancel(self.cancel.clone());
        if let Some(deadline) = deadline {
            enumerator = enumerator.with_deadline(deadline);
        }
        let stats = sample_distribution(&enumerator, arrangement, &self.sampler, sample_seed);
        let means = stats.means();
        let epsilons = self
            .game
            .targets
            .iter()
            .zip(&means)
            .map(|(target, &mean)| target.epsilon(mean))
            .collect();

        Ok(Evaluation {
            arrangement: arrangement.clone(),
            stats,
            means,
            epsilons,
            iteration: 0,
        })
    }

    /// Compare an evaluation with the sample threshold and every target
    pub fn judge(&self, evaluation: &Evaluation) -> Verdict {
        let kept = evaluation.stats.kept;
        if kept <= self.config.min_samples {
            return Verdict::Reject(RejectReason::TooFewSamples {
                kept,
                required: self.config.min_samples,
            });
        }
        for (component, (target, &mean)) in self.game.targets.iter().zip(&evaluation.means).enumerate() {
            if !target.accepts(mean) {
                return Verdict::Reject(RejectReason::Target {
                    component,
                    mean,
                    target: *target,
                });
            }
        }
        Verdict::Accept
    }

    /// Run with the configured seed, or OS entropy when none is set
    pub fn run<S: CandidateSource + ?Sized>(&self, source: &mut S) -> ReelResult<SearchReport> {
        let mut rng = match self.config.seed {
            Some(seed) => SearchRng::seed_from_u64(seed),
            None => SearchRng::from_os_rng(),
        };
        self.run_with_rng(source, &mut rng)
    }

    /// Run drawing candidates and sample seeds from `rng`
    pub fn run_with_rng<S: CandidateSource + ?Sized>(
        &self,
        source: &mut S,
        rng: &mut SearchRng,
    ) -> ReelResult<SearchReport> {
        let start = Instant::now();
        let deadline = self.config.timeout.and_then(|limit| start.checked_add(limit));
        let mut best: Option<Evaluation> = None;
        let mut iterations = 0u64;
        let mut invalid_candidates = 0u64;

        log::info!(
            "Searching {} ({}): {} stop combinations per candidate, {} targets",
            self.game.name,
            self.game.variant,
            self.game.grid.combinations().unwrap_or(u64::MAX),
            self.game.targets.len()
        );

        let outcome = loop {
            if self.cancel.is_cancelled() {
                break SearchOutcome::Cancelled { best };
            }
            if self.config.max_iterations.is_some_and(|max| iterations >= max) {
                break SearchOutcome::Exhausted { best };
            }
            if self.config.timeout.is_some_and(|limit| start.elapsed() >= limit) {
                break SearchOutcome::TimedOut { best };
            }

            iterations += 1;
            let candidate = source.next(rng);
            self.check_candidate(&candidate)?;
            let sample_seed: u64 = rng.random();

            if self.evaluator.is_invalid(&candidate) {
                invalid_candidates += 1;
                log::warn!("Candidate {} rejected: invalid reels", iterations);
                continue;
            }

            let mut evaluation = self.evaluate_until(&candidate, sample_seed, deadline)?;
            evaluation.iteration = iterations;
            // Partial enumeration; the statistics are incomplete
            if self.cancel.is_cancelled() {
                break SearchOutcome::Cancelled { best };
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break SearchOutcome::TimedOut { best };
            }

            if self.config.report_every > 0 && iterations % self.config.report_every == 0 {
                log::info!(
                    "Iteration {}: means [{}] eps [{}] kept {}/{} max win {:.2}",
                    iterations,
                    format_components(&evaluation.means),
                    format_components(&evaluation.epsilons),
                    evaluation.stats.kept,
                    evaluation.stats.total,
                    evaluation.stats.max_win
                );
            }

            match self.judge(&evaluation) {
                Verdict::Accept => {
                    log::info!("Candidate {} accepted", iterations);
                    break SearchOutcome::Accepted(evaluation);
                }
                Verdict::Reject(reason) => {
                    log::debug!("Candidate {} rejected: {}", iterations, reason);
                    if best
                        .as_ref()
                        .is_none_or(|b| evaluation.total_epsilon() < b.total_epsilon())
                    {
                        best = Some(evaluation);
                    }
                }
            }
        };

        let elapsed = start.elapsed();
        log::info!(
            "Search {} after {} iterations ({} invalid) in {:.1}s",
            outcome.label(),
            iterations,
            invalid_candidates,
            elapsed.as_secs_f64()
        );

        Ok(SearchReport {
            outcome,
            iterations,
            invalid_candidates,
            elapsed,
        })
    }
}

/// `0.800123, 0.000010` style rendering of a component vector
pub fn format_components(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.6}", v))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::FixedReels;
    use crate::config::SamplingPolicy;
    use crate::evaluator::SlotModel;
    use crate::test_support::{single_reel_game, strip};

    #[test]
    fn test_judge_requires_samples_above_threshold() {
        let game = single_reel_game();
        let model = SlotModel::new(&game).unwrap();
        let search = SearchLoop::new(&game, &model, SearchConfig::exact().with_min_samples(4));
        let evaluation = search.evaluate(&strip("A,A,WILD,WILD", &game), 0).unwrap();
        assert_eq!(evaluation.stats.kept, 4);
        assert_eq!(
            search.judge(&evaluation),
            Verdict::Reject(RejectReason::TooFewSamples { kept: 4, required: 4 })
        );

        let search = SearchLoop::new(&game, &model, SearchConfig::exact().with_min_samples(3));
        assert!(search.judge(&evaluation).is_accept());
    }

    #[test]
    fn test_judge_reports_missed_component() {
        let mut game = single_reel_game();
        game.targets[0].value = 0.5;
        let model = SlotModel::new(&game).unwrap();
        let search = SearchLoop::new(&game, &model, SearchConfig::exact());
        let evaluation = search.evaluate(&strip("A,A,WILD,WILD", &game), 0).unwrap();
        assert_eq!(evaluation.epsilons, vec![0.5]);
        assert!(matches!(
            search.judge(&evaluation),
            Verdict::Reject(RejectReason::Target { component: 0, .. })
        ));
    }

    #[test]
    fn test_cancel_before_first_iteration() {
        let game = single_reel_game();
        let model = SlotModel::new(&game).unwrap();
        let search = SearchLoop::new(&game, &model, SearchConfig::default());
        search.cancel_token().cancel();

        let mut pulled = 0;
        let mut source = |_: &mut SearchRng| {
            pulled += 1;
            ReelArrangement::from_columns(vec![vec![0, 0, 1, 1]])
        };
        let report = search.run(&mut source).unwrap();
        assert_eq!(report.outcome, SearchOutcome::Cancelled { best: None });
        assert_eq!(report.iterations, 0);
        assert_eq!(pulled, 0);
    }

    #[test]
    fn test_exhausted_keeps_best_rejected() {
        let mut game = single_reel_game();
        game.targets[0].value = 0.9;
        let model = SlotModel::new(&game).unwrap();
        let config = SearchConfig::exact().with_max_iterations(3).with_seed(5);
        let search = SearchLoop::new(&game, &model, config);
        let mut source = FixedReels::new(strip("A,A,WILD,WILD", &game));
        let report = search.run(&mut source).unwrap();

        assert_eq!(report.iterations, 3);
        assert_eq!(report.outcome.label(), "exhausted");
        let best = report.outcome.best().unwrap();
        assert_eq!(best.iteration, 1);
        assert!((best.total_epsilon() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_candidates_are_counted_not_evaluated() {
        let game = single_reel_game();
        let model = SlotModel::new(&game).unwrap();
        let search = SearchLoop::new(&game, &model, SearchConfig::exact().with_max_iterations(2));
        let mut source = FixedReels::new(strip("A,A,A,WILD", &game));
        let report = search.run(&mut source).unwrap();
        assert_eq!(report.invalid_candidates, 2);
        assert_eq!(report.outcome, SearchOutcome::Exhausted { best: None });
    }

    #[test]
    fn test_malformed_candidate_is_fatal() {
        let game = single_reel_game();
        let model = SlotModel::new(&game).unwrap();
        let search = SearchLoop::new(&game, &model, SearchConfig::exact());
        let mut source = FixedReels::new(ReelArrangement::from_columns(vec![vec![0, 1, 1]]));
        assert!(matches!(
            search.run(&mut source),
            Err(ReelError::MalformedCandidate(_))
        ));

        let mut source = FixedReels::new(ReelArrangement::from_columns(vec![vec![0, 1, 1, 9]]));
        assert!(matches!(
            search.run(&mut source),
            Err(ReelError::MalformedCandidate(_))
        ));
    }

    #[test]
    fn test_zero_timeout_stops_immediately() {
        let game = single_reel_game();
        let model = SlotModel::new(&game).unwrap();
        let config = SearchConfig::default()
            .with_sampling(SamplingPolicy::exhaustive())
            .with_timeout(Duration::ZERO);
        let search = SearchLoop::new(&game, &model, config);
        let mut source = FixedReels::new(strip("A,A,WILD,WILD", &game));
        let report = search.run(&mut source).unwrap();
        assert_eq!(report.outcome, SearchOutcome::TimedOut { best: None });
        assert_eq!(report.iterations, 0);
    }

    #[test]
    fn test_timeout_during_enumeration_discards_candidate() {
        let game = single_reel_game();
        let model = SlotModel::new(&game).unwrap();
        let config = SearchConfig::exact()
            .with_max_iterations(10)
            .with_timeout(Duration::from_millis(10));
        let search = SearchLoop::new(&game, &model, config);

        // The deadline passes while the source builds the first candidate
        let mut source = |_: &mut SearchRng| {
            std::thread::sleep(Duration::from_millis(30));
            ReelArrangement::from_columns(vec![vec![0, 0, 1, 1]])
        };
        let report = search.run(&mut source).unwrap();
        assert_eq!(report.iterations, 1);
        assert_eq!(report.outcome, SearchOutcome::TimedOut { best: None });
    }

    #[test]
    fn test_format_components() {
        assert_eq!(format_components(&[0.8, 0.00001]), "0.800000, 0.000010");
        assert_eq!(format_components(&[]), "");
    }
}
