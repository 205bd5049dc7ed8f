//! Bounded value cache keyed by a canonical state hash.
//!
//! This is a value cache, not subtree sharing: a hit replays the stored mean
//! instead of running a fresh playout. Eviction is oldest-first.

use ofc_core::model::row::RowId;
use ofc_core::state::GameState;
use std::collections::{HashMap, VecDeque};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, Default)]
struct MemoEntry {
    visits: u64,
    total_value: f64,
}

#[derive(Debug)]
pub(crate) struct TranspositionMemo {
    entries: HashMap<u64, MemoEntry>,
    order: VecDeque<u64>,
    capacity: usize,
    hits: u64,
}

impl TranspositionMemo {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(1 << 20)),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            hits: 0,
        }
    }

    /// Mean stored value for the state, if present.
    pub fn lookup(&mut self, key: u64) -> Option<f64> {
        match self.entries.get(&key) {
            Some(entry) if entry.visits > 0 => {
                self.hits += 1;
                Some(entry.total_value / entry.visits as f64)
            }
            _ => None,
        }
    }

    pub fn record(&mut self, key: u64, value: f64) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.visits += 1;
            entry.total_value += value;
            return;
        }
        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.entries.insert(key, MemoEntry { visits: 1, total_value: value });
        self.order.push_back(key);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }
}

/// Canonical hash of (arrangement, unseen, dealt). Row card order does not
/// matter; dealt order does not matter.
pub(crate) fn state_key(state: &GameState) -> u64 {
    let mut hasher = DefaultHasher::new();
    for id in RowId::ALL {
        let mut bits = 0u64;
        for card in state.arrangement.row(id).iter() {
            bits |= 1u64 << card.index();
        }
        bits.hash(&mut hasher);
    }
    state.unseen.bits().hash(&mut hasher);
    state.dealt_set().bits().hash(&mut hasher);
    state.street.number().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::{TranspositionMemo, state_key};
    use ofc_core::model::card::Card;
    use ofc_core::state::GameState;

    #[test]
    fn lookup_returns_mean_of_recorded_values() {
        let mut memo = TranspositionMemo::new(8);
        assert_eq!(memo.lookup(1), None);
        memo.record(1, 2.0);
        memo.record(1, 4.0);
        assert_eq!(memo.lookup(1), Some(3.0));
        assert_eq!(memo.hits(), 1);
    }

    #[test]
    fn eviction_is_oldest_first() {
        let mut memo = TranspositionMemo::new(2);
        memo.record(1, 1.0);
        memo.record(2, 2.0);
        memo.record(3, 3.0);
        assert_eq!(memo.lookup(1), None);
        assert!(memo.lookup(3).is_some());
    }

    #[test]
    fn state_key_ignores_dealt_order() {
        let mut a = GameState::fresh();
        let mut b = GameState::fresh();
        let cards: Vec<Card> = ["As", "Ks", "Qs", "Js", "Ts"]
            .iter()
            .map(|t| t.parse().unwrap())
            .collect();
        let mut reversed = cards.clone();
        reversed.reverse();
        a.deal(&cards).unwrap();
        b.deal(&reversed).unwrap();
        assert_eq!(state_key(&a), state_key(&b));
    }

    #[test]
    fn state_key_distinguishes_states() {
        let fresh = GameState::fresh();
        let mut dealt = GameState::fresh();
        dealt
            .deal(&["As", "Ks", "Qs", "Js", "Ts"].map(|t| t.parse::<Card>().unwrap()))
            .unwrap();
        assert_ne!(state_key(&fresh), state_key(&dealt));
    }
}
