//! Search driver: selection, expansion, playout, back-propagation, and the
//! worker pool.

use crate::budget::Budget;
use crate::clock::Clock;
use crate::heuristic;
use crate::mcts::memo::{TranspositionMemo, state_key};
use crate::mcts::node::{Node, NodeBudget};
use crate::mcts::{Parallelism, RootStat, SearchConfig};
use crate::movegen;
use crate::rng::{SplitMix64, worker_stream};
use ofc_core::model::arrangement::Arrangement;
use ofc_core::scoring::{score_matchup, score_self};
use ofc_core::state::{Action, GameState};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Simulations run when the caller supplies no bound at all.
const DEFAULT_SIMULATIONS: u64 = 100_000;

/// Opener candidates considered for sampled opponents; opponents do not need
/// the full candidate fan-out.
const OPPONENT_OPENER_CANDIDATES: usize = 8;

/// Terminal leaf value: matchup against a sampled opponent when one is
/// available, self-evaluation otherwise.
pub(crate) type LeafValueFn = dyn Fn(&Arrangement, Option<&Arrangement>) -> f64 + Send + Sync;

fn default_leaf_value(mine: &Arrangement, theirs: Option<&Arrangement>) -> f64 {
    match theirs {
        Some(opponent) => score_matchup(mine, opponent),
        None => score_self(mine),
    }
}

/// Outcome of one full search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Per-root-action statistics, in generator order.
    pub root_stats: Vec<RootStat>,
    pub simulations: u64,
    /// False when the deadline or cancellation cut the search short.
    pub complete: bool,
    /// True when thread spawning failed and the search fell back to a
    /// single worker.
    pub degraded: bool,
    pub dropped_playouts: u64,
    pub memo_hits: u64,
}

struct SharedCounters {
    simulations: AtomicU64,
    dropped: AtomicU64,
    cut_short: AtomicBool,
}

struct WorkerCtx<'a> {
    config: &'a SearchConfig,
    budget: &'a Budget,
    clock: &'a dyn Clock,
    deadline: Option<Duration>,
    max_simulations: Option<u64>,
    counters: &'a SharedCounters,
    memo: Option<&'a Mutex<TranspositionMemo>>,
    node_budget: &'a NodeBudget,
    leaf_value: &'a LeafValueFn,
    use_virtual_loss: bool,
    allow_prune: bool,
}

pub(crate) fn run_search(
    root_state: &GameState,
    actions: &[Action],
    config: &SearchConfig,
    budget: &Budget,
    clock: &dyn Clock,
    started: Duration,
) -> SearchReport {
    let deadline = budget.time_limit.map(|limit| started + limit);
    let unbounded =
        budget.time_limit.is_none() && budget.max_simulations.is_none() && budget.cancel.is_none();
    let max_simulations = if unbounded {
        Some(DEFAULT_SIMULATIONS)
    } else {
        budget.max_simulations
    };

    let counters = SharedCounters {
        simulations: AtomicU64::new(0),
        dropped: AtomicU64::new(0),
        cut_short: AtomicBool::new(false),
    };
    let memo = config
        .memo_capacity
        .map(|capacity| Mutex::new(TranspositionMemo::new(capacity)));
    let node_budget = NodeBudget::new(config.node_cap);
    let threads = config.threads.max(1);
    let tree_mode = config.parallelism == Parallelism::Tree && threads > 1;

    let ctx = WorkerCtx {
        config,
        budget,
        clock,
        deadline,
        max_simulations,
        counters: &counters,
        memo: memo.as_ref(),
        node_budget: &node_budget,
        leaf_value: &default_leaf_value,
        use_virtual_loss: tree_mode,
        allow_prune: !tree_mode,
    };

    let tree_count = if tree_mode { 1 } else { threads };
    let trees: Vec<Arc<Node>> = (0..tree_count)
        .map(|_| Node::new_root(root_state.clone(), actions.to_vec()))
        .collect();

    let mut degraded = false;
    if threads == 1 {
        let mut rng = worker_stream(config.rng_seed, 0);
        run_worker(&trees[0], &ctx, &mut rng);
    } else {
        let spawn_failures = AtomicU64::new(0);
        std::thread::scope(|scope| {
            let mut handles = Vec::with_capacity(threads);
            for worker in 0..threads {
                let tree = if tree_mode { &trees[0] } else { &trees[worker] };
                let ctx_ref = &ctx;
                let builder = std::thread::Builder::new().name(format!("ofc-mcts-{worker}"));
                let seed = config.rng_seed;
                match builder.spawn_scoped(scope, move || {
                    let mut rng = worker_stream(seed, worker);
                    run_worker(tree, ctx_ref, &mut rng);
                }) {
                    Ok(handle) => handles.push(handle),
                    Err(_) => {
                        spawn_failures.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }
            if handles.is_empty() {
                // No worker threads at all: degrade to an in-place search.
                let mut rng = worker_stream(config.rng_seed, 0);
                run_worker(&trees[0], &ctx, &mut rng);
            }
            for handle in handles {
                let _ = handle.join();
            }
        });
        degraded = spawn_failures.load(Ordering::SeqCst) > 0;
    }

    let dropped = counters.dropped.load(Ordering::SeqCst);
    #[cfg(debug_assertions)]
    if dropped > 0 {
        tracing::warn!(dropped, "dropped defensive playouts during search");
    }
    let memo_hits = memo
        .as_ref()
        .map(|m| m.lock().expect("memo lock").hits())
        .unwrap_or(0);
    let simulations = counters.simulations.load(Ordering::SeqCst);
    debug!(simulations, memo_hits, "search finished");

    SearchReport {
        root_stats: collect_root_stats(actions, &trees),
        simulations,
        complete: !counters.cut_short.load(Ordering::SeqCst),
        degraded,
        dropped_playouts: dropped,
        memo_hits,
    }
}

fn run_worker(root: &Arc<Node>, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) {
    loop {
        if ctx.budget.is_cancelled() {
            ctx.counters.cut_short.store(true, Ordering::SeqCst);
            return;
        }
        if let Some(deadline) = ctx.deadline {
            if ctx.clock.now() >= deadline {
                ctx.counters.cut_short.store(true, Ordering::SeqCst);
                return;
            }
        }
        if let Some(max) = ctx.max_simulations {
            if ctx.counters.simulations.fetch_add(1, Ordering::SeqCst) >= max {
                ctx.counters.simulations.fetch_sub(1, Ordering::SeqCst);
                return;
            }
        } else {
            ctx.counters.simulations.fetch_add(1, Ordering::SeqCst);
        }

        if simulate_once(root, ctx, rng).is_none() {
            ctx.counters.simulations.fetch_sub(1, Ordering::SeqCst);
            ctx.counters.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// One selection/expansion/playout/back-propagation pass. `None` marks a
/// defensive drop; no statistics are updated in that case.
fn simulate_once(root: &Arc<Node>, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) -> Option<f64> {
    let mut node = root.clone();

    let value = loop {
        if node.terminal {
            match terminal_value(&node, ctx, rng) {
                Some(value) => break value,
                None => return drop_descent(&node, ctx),
            }
        }

        let allowed = ctx
            .config
            .widening
            .map(|w| w.limit(node.snapshot().effective_visits()))
            .unwrap_or(usize::MAX);
        let expand_action = {
            let children = node.children.lock().expect("children lock");
            if children.len() < allowed {
                let mut untried = node.untried.lock().expect("untried lock");
                if untried.is_empty() { None } else { Some(untried.remove(0)) }
            } else {
                None
            }
        };

        if let Some(action) = expand_action {
            match expand(root, &node, action, ctx, rng) {
                Expansion::Child(child) => {
                    if ctx.use_virtual_loss {
                        child.add_virtual_loss();
                    }
                    node = child;
                    match expanded_leaf_value(&node, ctx, rng) {
                        Some(value) => break value,
                        None => return drop_descent(&node, ctx),
                    }
                }
                Expansion::CapReached => {
                    // Keep the action available for when space frees up.
                    node.untried.lock().expect("untried lock").insert(0, action);
                    match playout_value(&node.state, ctx, rng) {
                        Some(value) => break value,
                        None => return drop_descent(&node, ctx),
                    }
                }
                Expansion::Illegal => return drop_descent(&node, ctx),
            }
        } else {
            match select_child(&node, ctx) {
                Some(child) => {
                    if ctx.use_virtual_loss {
                        child.add_virtual_loss();
                    }
                    node = child;
                }
                None => match playout_value(&node.state, ctx, rng) {
                    Some(value) => break value,
                    None => return drop_descent(&node, ctx),
                },
            }
        }
    };

    // Back-propagate through the parent links; only the root carries no
    // virtual loss.
    let mut current = Some(node);
    while let Some(visited) = current {
        let parent = visited.parent.upgrade();
        visited.record(value, ctx.use_virtual_loss && parent.is_some());
        current = parent;
    }
    Some(value)
}

/// Release the virtual losses taken along a dropped descent.
fn drop_descent(leaf: &Arc<Node>, ctx: &WorkerCtx<'_>) -> Option<f64> {
    if ctx.use_virtual_loss {
        let mut current = Some(leaf.clone());
        while let Some(node) = current {
            let parent = node.parent.upgrade();
            if parent.is_some() {
                let mut stats = node.stats.lock().expect("stats lock");
                if stats.virtual_loss > 0 {
                    stats.virtual_loss -= 1;
                }
            }
            current = parent;
        }
    }
    None
}

enum Expansion {
    Child(Arc<Node>),
    CapReached,
    Illegal,
}

fn expand(
    root: &Arc<Node>,
    parent: &Arc<Node>,
    action: Action,
    ctx: &WorkerCtx<'_>,
    rng: &mut SplitMix64,
) -> Expansion {
    if !ctx.node_budget.try_allocate() {
        let reclaimed = ctx.allow_prune && prune_least_visited(root, ctx);
        if !reclaimed || !ctx.node_budget.try_allocate() {
            return Expansion::CapReached;
        }
    }

    let mut state = parent.state.clone();
    if state.apply_mut(&action).is_err() {
        ctx.node_budget.release(1);
        return Expansion::Illegal;
    }
    if !state.is_terminal() {
        let need = state.street.dealt_count();
        if let Some(cards) = state.unseen.sample(need, rng) {
            if state.deal(&cards).is_err() {
                ctx.node_budget.release(1);
                return Expansion::Illegal;
            }
        }
        // With the unseen set exhausted the node keeps an empty hand and is
        // valued by playout fallback.
    }
    let untried = if state.is_terminal() || state.dealt.is_empty() {
        Vec::new()
    } else {
        movegen::generate(&state, ctx.config.opener_candidates)
    };

    let child = Node::new_child(parent, action, state, untried);
    parent
        .children
        .lock()
        .expect("children lock")
        .push(child.clone());
    Expansion::Child(child)
}

/// Drop the grandchildren of the least-visited root branch and return its
/// nodes to the budget. The branch keeps its statistics and can regrow.
fn prune_least_visited(root: &Arc<Node>, ctx: &WorkerCtx<'_>) -> bool {
    let children = root.children.lock().expect("children lock");
    if children.len() < 2 {
        return false;
    }
    let least = children
        .iter()
        .min_by_key(|child| child.visits())
        .cloned()
        .expect("non-empty children");
    drop(children);

    let reclaimed = least.subtree_size() - 1;
    if reclaimed == 0 {
        return false;
    }
    least.children.lock().expect("children lock").clear();
    let regenerated = if least.terminal || least.state.dealt.is_empty() {
        Vec::new()
    } else {
        movegen::generate(&least.state, ctx.config.opener_candidates)
    };
    *least.untried.lock().expect("untried lock") = regenerated;
    ctx.node_budget.release(reclaimed);
    true
}

fn select_child(node: &Node, ctx: &WorkerCtx<'_>) -> Option<Arc<Node>> {
    let children = node.children.lock().expect("children lock");
    if children.is_empty() {
        return None;
    }
    // Every child gets one visit before UCT applies.
    for child in children.iter() {
        if child.snapshot().effective_visits() == 0 {
            return Some(child.clone());
        }
    }
    let parent_visits = node.snapshot().effective_visits().max(1);
    let ln_parent = (parent_visits as f64).ln().max(0.0);
    let c = ctx.config.exploration_c;
    let mut best: Option<(Arc<Node>, f64)> = None;
    for child in children.iter() {
        let stats = child.snapshot();
        let visits = stats.effective_visits() as f64;
        let uct = stats.effective_value() / visits + c * (ln_parent / visits).sqrt();
        match &best {
            Some((_, best_uct)) if uct <= *best_uct => {}
            _ => best = Some((child.clone(), uct)),
        }
    }
    best.map(|(child, _)| child)
}

/// Value of a freshly expanded leaf, through the memo when enabled.
fn expanded_leaf_value(node: &Arc<Node>, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) -> Option<f64> {
    if node.terminal {
        return terminal_value(node, ctx, rng);
    }
    if let Some(memo) = ctx.memo {
        let key = state_key(&node.state);
        if let Some(cached) = memo.lock().expect("memo lock").lookup(key) {
            return Some(cached);
        }
        let value = playout_value(&node.state, ctx, rng)?;
        memo.lock().expect("memo lock").record(key, value);
        return Some(value);
    }
    playout_value(&node.state, ctx, rng)
}

/// Terminal nodes have a fixed value, computed on first visit.
fn terminal_value(node: &Arc<Node>, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) -> Option<f64> {
    if let Some(value) = *node.cached_value.lock().expect("value lock") {
        return Some(value);
    }
    let value = final_value(&node.state, ctx, rng)?;
    *node.cached_value.lock().expect("value lock") = Some(value);
    Some(value)
}

/// Default-policy playout to the end of the hand.
fn playout_value(state: &GameState, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) -> Option<f64> {
    let mut sim = state.clone();
    while !sim.is_terminal() {
        if sim.dealt.is_empty() {
            let need = sim.street.dealt_count();
            match sim.unseen.sample(need, rng) {
                Some(cards) => {
                    if sim.deal(&cards).is_err() {
                        return None;
                    }
                }
                // Deck exhausted mid-playout: fall back to the static value.
                None => return Some(heuristic::heuristic_value(&sim)),
            }
        }
        let actions = movegen::generate(&sim, ctx.config.opener_candidates);
        if actions.is_empty() {
            return None;
        }
        let pick = if ctx.config.eps_greedy > 0.0 && rng.gen::<f64>() < ctx.config.eps_greedy {
            rng.gen_range(0..actions.len())
        } else {
            0
        };
        if sim.apply_mut(&actions[pick]).is_err() {
            return None;
        }
    }
    final_value(&sim, ctx, rng)
}

/// Score a completed hand, sampling an opponent completion when the unseen
/// set still supports one.
fn final_value(state: &GameState, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) -> Option<f64> {
    let opponent = sample_opponent(state, ctx, rng);
    Some((ctx.leaf_value)(&state.arrangement, opponent.as_ref()))
}

/// Play an opponent hand to completion with the default policy from the
/// cards this player has not seen.
fn sample_opponent(state: &GameState, ctx: &WorkerCtx<'_>, rng: &mut SplitMix64) -> Option<Arrangement> {
    let mut opponent = GameState::fresh();
    opponent.unseen = state.unseen.union(state.known_opponent);
    while !opponent.is_terminal() {
        let need = opponent.street.dealt_count();
        let cards = opponent.unseen.sample(need, rng)?;
        opponent.deal(&cards).ok()?;
        let actions = movegen::generate(&opponent, OPPONENT_OPENER_CANDIDATES);
        if actions.is_empty() {
            return None;
        }
        let pick = if ctx.config.eps_greedy > 0.0 && rng.gen::<f64>() < ctx.config.eps_greedy {
            rng.gen_range(0..actions.len())
        } else {
            0
        };
        opponent.apply_mut(&actions[pick]).ok()?;
    }
    Some(opponent.arrangement)
}

/// Merge root-child statistics across trees, reported in generator order.
fn collect_root_stats(actions: &[Action], trees: &[Arc<Node>]) -> Vec<RootStat> {
    let mut stats: Vec<RootStat> = actions
        .iter()
        .map(|action| RootStat { action: *action, visits: 0, total_value: 0.0 })
        .collect();
    for tree in trees {
        let children = tree.children.lock().expect("children lock");
        for child in children.iter() {
            let Some(action) = child.action else { continue };
            if let Some(slot) = stats.iter_mut().find(|s| s.action == action) {
                let snapshot = child.snapshot();
                slot.visits += snapshot.visits;
                slot.total_value += snapshot.total_value;
            }
        }
    }
    stats
}
