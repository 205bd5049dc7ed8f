//! Public solver facade: validation, street dispatch, and result assembly.

use crate::budget::Budget;
use crate::clock::{Clock, MonotonicClock};
use crate::error::SolveError;
use crate::heuristic;
use crate::mcts::{Parallelism, RootStat, SearchConfig, Widening, run_search};
use crate::movegen;
use ofc_core::model::hand_type::HandType;
use ofc_core::model::row::RowId;
use ofc_core::state::{Action, GameState, StateError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_RNG_SEED: u64 = 0x5EED;

/// Engine tuning exposed to callers. Every knob has a sensible default; the
/// solver itself reads no environment and no files.
#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Worker threads spawned per solve.
    pub threads: usize,
    /// UCT exploration constant.
    pub exploration_c: f64,
    /// Worker layout; root parallelism has no cross-worker coordination.
    pub parallelism: Parallelism,
    /// Playout exploration: chance of a uniformly random action instead of
    /// the heuristic argmax.
    pub eps_greedy: f64,
    /// Progressive widening; useful above roughly 40 branches.
    pub progressive_widening: Option<Widening>,
    /// Bounded playout-value cache capacity.
    pub transposition_memo: Option<usize>,
    /// Root seed for the per-worker RNG streams.
    pub rng_seed: u64,
    /// Opener candidates kept after static ordering.
    pub opener_candidates: usize,
    /// Soft cap on live tree nodes per solve.
    pub node_cap: usize,
    /// Minimum merged visits before a root-parallel child is eligible.
    pub min_merge_visits: u64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            exploration_c: std::f64::consts::SQRT_2,
            parallelism: Parallelism::Root,
            eps_greedy: 0.08,
            progressive_widening: None,
            transposition_memo: None,
            rng_seed: DEFAULT_RNG_SEED,
            opener_candidates: movegen::DEFAULT_OPENER_CANDIDATES,
            node_cap: 250_000,
            min_merge_visits: 1,
        }
    }
}

/// The chosen action plus the evidence behind it.
#[derive(Debug, Clone)]
pub struct Decision {
    pub action: Action,
    /// Mean playout value of the chosen action.
    pub expected_score: f64,
    /// Share of all simulations spent on the chosen action.
    pub confidence: f64,
    pub simulations_performed: u64,
    pub elapsed: Duration,
    /// False when the deadline or cancellation stopped the search early.
    pub complete: bool,
    /// True when the engine fell back to fewer workers than requested.
    pub degraded: bool,
    /// `(action, mean value, visits)`, most-visited first.
    pub top_actions: Vec<(Action, f64, u64)>,
}

/// Shallow analysis of a state, no tree search involved.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Made hand per row (top, middle, bottom); `None` for an empty row.
    pub per_row_type: [Option<HandType>; 3],
    pub current_royalties: u32,
    pub foul_probability: f64,
    pub fantasy_land_probability: f64,
    /// Candidate actions with their static heuristic scores.
    pub top_actions: Vec<(Action, f64)>,
}

pub struct Solver {
    options: SolveOptions,
    clock: Arc<dyn Clock>,
}

impl Solver {
    pub fn new(options: SolveOptions) -> Self {
        Self::with_clock(options, Arc::new(MonotonicClock::new()))
    }

    /// Inject a clock; tests drive deadlines with a fake.
    pub fn with_clock(options: SolveOptions, clock: Arc<dyn Clock>) -> Self {
        Self { options, clock }
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Pick the best placement (and discard) for the dealt cards under the
    /// given budget.
    pub fn solve(&self, state: &GameState, budget: &Budget) -> Result<Decision, SolveError> {
        self.validate_for_solve(state)?;
        let started = self.clock.now();

        let scored = movegen::scored(state, self.options.opener_candidates);
        if scored.is_empty() {
            return Ok(Decision {
                action: Action::Fold,
                expected_score: 0.0,
                confidence: 0.0,
                simulations_performed: 0,
                elapsed: self.clock.now() - started,
                complete: true,
                degraded: false,
                top_actions: Vec::new(),
            });
        }
        let actions: Vec<Action> = scored.iter().map(|(action, _)| *action).collect();
        debug!(
            street = state.street.number(),
            candidates = actions.len(),
            "solve dispatch"
        );

        let config = self.search_config();
        let report = run_search(state, &actions, &config, budget, self.clock.as_ref(), started);
        let elapsed = self.clock.now() - started;
        Ok(self.build_decision(&actions, report, elapsed))
    }

    /// Static summary of the state from the heuristic evaluator only.
    pub fn analyze(&self, state: &GameState) -> Result<Summary, SolveError> {
        state.validate().map_err(SolveError::from)?;
        let per_row_type = [
            row_summary(state, RowId::Top),
            row_summary(state, RowId::Middle),
            row_summary(state, RowId::Bottom),
        ];
        let current_royalties = if state.arrangement.is_complete() {
            state.arrangement.royalties()
        } else {
            heuristic::partial_royalties(&state.arrangement) as u32
        };
        let top_actions = if state.dealt.is_empty() {
            Vec::new()
        } else {
            movegen::scored(state, self.options.opener_candidates)
        };
        Ok(Summary {
            per_row_type,
            current_royalties,
            foul_probability: heuristic::foul_probability(state),
            fantasy_land_probability: heuristic::fantasy_land_probability(state),
            top_actions,
        })
    }

    fn validate_for_solve(&self, state: &GameState) -> Result<(), SolveError> {
        state.validate().map_err(SolveError::from)?;
        if state.is_terminal() {
            return Err(SolveError::InconsistentState("arrangement is already complete"));
        }
        if state.dealt.is_empty() {
            return Err(SolveError::InvalidInput(StateError::DealtCountMismatch {
                expected: state.street.dealt_count(),
                actual: 0,
            }));
        }
        state.ensure_future_draws().map_err(SolveError::from)?;
        Ok(())
    }

    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            threads: self.options.threads.max(1),
            exploration_c: self.options.exploration_c,
            eps_greedy: self.options.eps_greedy,
            parallelism: self.options.parallelism,
            widening: self.options.progressive_widening,
            memo_capacity: self.options.transposition_memo,
            rng_seed: self.options.rng_seed,
            opener_candidates: self.options.opener_candidates.max(1),
            node_cap: self.options.node_cap,
        }
    }

    fn build_decision(
        &self,
        actions: &[Action],
        report: crate::mcts::SearchReport,
        elapsed: Duration,
    ) -> Decision {
        let root_stats: Vec<RootStat> = report.root_stats;
        let total_visits: u64 = root_stats.iter().map(|stat| stat.visits).sum();

        let chosen_index = if total_visits == 0 {
            0
        } else {
            match self.options.parallelism {
                // Merged trees: best mean among children with enough support.
                Parallelism::Root if self.options.threads > 1 => {
                    let min = self.options.min_merge_visits.max(1);
                    let mut pool: Vec<usize> = (0..root_stats.len())
                        .filter(|&i| root_stats[i].visits >= min)
                        .collect();
                    if pool.is_empty() {
                        pool = (0..root_stats.len()).collect();
                    }
                    best_by(&pool, |&i| (root_stats[i].mean(), root_stats[i].visits as f64))
                }
                // Single tree: robust child, most visits first.
                _ => best_by(&(0..root_stats.len()).collect::<Vec<_>>(), |&i| {
                    (root_stats[i].visits as f64, root_stats[i].mean())
                }),
            }
        };

        let chosen = &root_stats[chosen_index];
        let mut top_actions: Vec<(Action, f64, u64)> = root_stats
            .iter()
            .map(|stat| (stat.action, stat.mean(), stat.visits))
            .collect();
        top_actions.sort_by(|a, b| {
            b.2.cmp(&a.2)
                .then_with(|| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal))
        });

        Decision {
            action: actions[chosen_index],
            expected_score: chosen.mean(),
            confidence: if total_visits == 0 {
                0.0
            } else {
                chosen.visits as f64 / total_visits as f64
            },
            simulations_performed: report.simulations,
            elapsed,
            complete: report.complete,
            degraded: report.degraded,
            top_actions,
        }
    }
}

fn row_summary(state: &GameState, id: RowId) -> Option<HandType> {
    if state.arrangement.row(id).is_empty() {
        None
    } else {
        Some(heuristic::made_hand(&state.arrangement, id))
    }
}

/// Index with the lexicographically largest key; earlier indices win ties.
fn best_by<K: PartialOrd>(indices: &[usize], key: impl Fn(&usize) -> K) -> usize {
    let mut best = indices[0];
    let mut best_key = key(&indices[0]);
    for &index in &indices[1..] {
        let candidate = key(&index);
        if candidate > best_key {
            best = index;
            best_key = candidate;
        }
    }
    best
}
