//! Search-tree nodes.
//!
//! Parents own children through `Arc`; the back-pointer is a `Weak` used only
//! during back-propagation. Statistics sit behind a per-node lock so tree
//! parallelism can update them without tearing.

use ofc_core::state::{Action, GameState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct NodeStats {
    pub visits: u64,
    pub total_value: f64,
    pub virtual_loss: u32,
}

impl NodeStats {
    /// Visit count as seen by UCT, virtual losses included.
    pub fn effective_visits(&self) -> u64 {
        self.visits + self.virtual_loss as u64
    }

    /// Value sum as seen by UCT, virtual losses included.
    pub fn effective_value(&self) -> f64 {
        self.total_value - self.virtual_loss as f64
    }
}

pub(crate) struct Node {
    /// Action that led here; `None` for the root.
    pub action: Option<Action>,
    /// Determinized state: dealt cards for the next decision are fixed at
    /// node creation.
    pub state: GameState,
    pub terminal: bool,
    pub stats: Mutex<NodeStats>,
    pub untried: Mutex<Vec<Action>>,
    pub children: Mutex<Vec<Arc<Node>>>,
    pub parent: Weak<Node>,
    /// Fixed terminal value, computed on the first visit.
    pub cached_value: Mutex<Option<f64>>,
}

impl Node {
    pub fn new_root(state: GameState, untried: Vec<Action>) -> Arc<Self> {
        Arc::new(Self {
            action: None,
            terminal: state.is_terminal(),
            state,
            stats: Mutex::new(NodeStats::default()),
            untried: Mutex::new(untried),
            children: Mutex::new(Vec::new()),
            parent: Weak::new(),
            cached_value: Mutex::new(None),
        })
    }

    pub fn new_child(
        parent: &Arc<Node>,
        action: Action,
        state: GameState,
        untried: Vec<Action>,
    ) -> Arc<Self> {
        Arc::new(Self {
            action: Some(action),
            terminal: state.is_terminal(),
            state,
            stats: Mutex::new(NodeStats::default()),
            untried: Mutex::new(untried),
            children: Mutex::new(Vec::new()),
            parent: Arc::downgrade(parent),
            cached_value: Mutex::new(None),
        })
    }

    pub fn visits(&self) -> u64 {
        self.stats.lock().expect("stats lock").visits
    }

    pub fn snapshot(&self) -> NodeStats {
        *self.stats.lock().expect("stats lock")
    }

    pub fn add_virtual_loss(&self) {
        self.stats.lock().expect("stats lock").virtual_loss += 1;
    }

    /// Record a playout result, releasing one virtual loss if present.
    pub fn record(&self, value: f64, release_virtual_loss: bool) {
        let mut stats = self.stats.lock().expect("stats lock");
        stats.visits += 1;
        stats.total_value += value;
        if release_virtual_loss && stats.virtual_loss > 0 {
            stats.virtual_loss -= 1;
        }
    }

    /// Nodes in this subtree, the node itself included.
    pub fn subtree_size(&self) -> usize {
        let children = self.children.lock().expect("children lock");
        1 + children.iter().map(|child| child.subtree_size()).sum::<usize>()
    }
}

/// Tree-wide node budget. When the cap is reached expansion stops; the
/// search keeps playing out from selected leaves instead.
#[derive(Debug)]
pub(crate) struct NodeBudget {
    allocated: AtomicUsize,
    cap: usize,
}

impl NodeBudget {
    pub fn new(cap: usize) -> Self {
        Self { allocated: AtomicUsize::new(0), cap: cap.max(1) }
    }

    pub fn try_allocate(&self) -> bool {
        let mut current = self.allocated.load(Ordering::Relaxed);
        loop {
            if current >= self.cap {
                return false;
            }
            match self.allocated.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(seen) => current = seen,
            }
        }
    }

    pub fn release(&self, count: usize) {
        self.allocated.fetch_sub(count.min(self.allocated.load(Ordering::Relaxed)), Ordering::Relaxed);
    }
}
