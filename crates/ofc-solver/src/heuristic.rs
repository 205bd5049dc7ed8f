//! Static evaluation of partial states.
//!
//! Two bounds drive both move ordering and foul pruning: a *made-hand* lower
//! bound (what the row is already guaranteed to hold) and an optimistic upper
//! bound on what the row can still become given the unseen cards. Both are
//! cheap and never allocate.

use ofc_core::model::arrangement::{Arrangement, bottom_royalty, middle_royalty, top_royalty};
use ofc_core::model::card_set::CardSet;
use once_cell::sync::Lazy;
use ofc_core::model::hand_type::{HandCategory, HandType};
use ofc_core::model::row::RowId;
use ofc_core::scoring::FOUL_PENALTY;
use ofc_core::state::GameState;

const TOP_WEIGHT: f64 = 0.3;
const MIDDLE_WEIGHT: f64 = 0.5;
const BOTTOM_WEIGHT: f64 = 0.5;

const MAX_RANK: u8 = 14;

/// Fast scalar value of a non-terminal state: partial royalties plus weighted
/// row strength, minus the estimated foul risk.
pub fn heuristic_value(state: &GameState) -> f64 {
    let arrangement = &state.arrangement;
    let resources = Resources::of(state);

    let top = upper_bound(arrangement, RowId::Top, &resources);
    let middle = upper_bound(arrangement, RowId::Middle, &resources);
    let bottom = upper_bound(arrangement, RowId::Bottom, &resources);

    partial_royalties(arrangement)
        + TOP_WEIGHT * top.category.ordinal() as f64
        + MIDDLE_WEIGHT * middle.category.ordinal() as f64
        + BOTTOM_WEIGHT * bottom.category.ordinal() as f64
        - foul_risk(state)
}

/// Royalties already locked in by made hands, row by row.
pub fn partial_royalties(arrangement: &Arrangement) -> f64 {
    let top = made_hand(arrangement, RowId::Top);
    let middle = made_hand(arrangement, RowId::Middle);
    let bottom = made_hand(arrangement, RowId::Bottom);
    (top_royalty(top) + middle_royalty(middle.category) + bottom_royalty(bottom.category)) as f64
}

/// Estimated foul cost in `[0, FOUL_PENALTY]`.
pub fn foul_risk(state: &GameState) -> f64 {
    if foul_forced(state) {
        return FOUL_PENALTY;
    }
    let arrangement = &state.arrangement;
    let resources = Resources::of(state);
    let mut risk = 0.0;
    for (above, below) in [(RowId::Top, RowId::Middle), (RowId::Middle, RowId::Bottom)] {
        if arrangement.row(above).is_full() && arrangement.row(below).is_full() {
            continue;
        }
        let floor = made_hand(arrangement, above);
        let ceiling = upper_bound(arrangement, below, &resources);
        let margin = ceiling.category.ordinal() as i32 - floor.category.ordinal() as i32;
        risk += match margin {
            i32::MIN..=-1 => FOUL_PENALTY / 2.0,
            0 => 1.5,
            1 => 0.5,
            _ => 0.0,
        };
    }
    risk.min(FOUL_PENALTY)
}

/// Foul probability estimate in `[0, 1]`.
pub fn foul_probability(state: &GameState) -> f64 {
    if state.arrangement.is_complete() {
        return if state.arrangement.is_fouled() { 1.0 } else { 0.0 };
    }
    foul_risk(state) / FOUL_PENALTY
}

/// True when no completion can avoid a foul: some row already outranks
/// everything the row below can still become.
pub fn foul_forced(state: &GameState) -> bool {
    let arrangement = &state.arrangement;
    if arrangement.is_complete() {
        return arrangement.is_fouled();
    }
    let resources = Resources::of(state);
    let top_floor = made_hand(arrangement, RowId::Top);
    let middle_floor = made_hand(arrangement, RowId::Middle);
    let middle_ceiling = upper_bound(arrangement, RowId::Middle, &resources);
    let bottom_ceiling = upper_bound(arrangement, RowId::Bottom, &resources);
    top_floor > middle_ceiling || middle_floor > bottom_ceiling
}

/// Chance of entering Fantasy Land: certain once a QQ+ top is made and the
/// arrangement stays clean, otherwise a coarse outs-based estimate.
pub fn fantasy_land_probability(state: &GameState) -> f64 {
    let arrangement = &state.arrangement;
    if arrangement.is_complete() {
        return if arrangement.qualifies_fantasy_land() { 1.0 } else { 0.0 };
    }
    let clean = 1.0 - foul_probability(state);
    let top = made_hand(arrangement, RowId::Top);
    let qualified = match top.category {
        HandCategory::Trips => true,
        HandCategory::Pair => top.ranks[0] >= 12,
        _ => false,
    };
    if qualified {
        return clean;
    }
    if state.arrangement.row(RowId::Top).is_full() {
        return 0.0;
    }
    // Count queen-or-better pairing outs still unseen.
    let mut outs = state.unseen.wilds().len();
    for card in state.arrangement.row(RowId::Top).iter() {
        if let Some(rank) = card.rank() {
            if rank.value() >= 12 {
                outs += unseen_rank_count(state.unseen, rank.value());
            }
        }
    }
    clean * (outs as f64 * 0.05).min(0.4)
}

/// Rank/suit resources still available to complete rows.
pub(crate) struct Resources {
    rank_counts: [u8; 15],
    suit_counts: [u8; 4],
    wilds: u8,
}

impl Resources {
    pub(crate) fn of(state: &GameState) -> Self {
        let available = state.unseen.union(state.dealt_set());
        let mut rank_counts = [0u8; 15];
        let mut suit_counts = [0u8; 4];
        let mut wilds = 0u8;
        for card in available.iter() {
            match (card.rank(), card.suit()) {
                (Some(rank), Some(suit)) => {
                    rank_counts[rank.value() as usize] += 1;
                    suit_counts[suit as usize] += 1;
                }
                _ => wilds += 1,
            }
        }
        Self { rank_counts, suit_counts, wilds }
    }
}

fn unseen_rank_count(unseen: CardSet, rank_value: u8) -> u32 {
    unseen
        .iter()
        .filter(|card| card.rank().map(|r| r.value()) == Some(rank_value))
        .count() as u32
}

struct RowShape {
    counts: [u8; 15],
    ranks: [u8; 5],
    len: usize,
    wilds: u8,
    suit: Option<u8>,
    suit_uniform: bool,
}

fn row_shape(arrangement: &Arrangement, id: RowId) -> RowShape {
    let mut shape = RowShape {
        counts: [0; 15],
        ranks: [0; 5],
        len: 0,
        wilds: 0,
        suit: None,
        suit_uniform: true,
    };
    for card in arrangement.row(id).iter() {
        match (card.rank(), card.suit()) {
            (Some(rank), Some(suit)) => {
                shape.counts[rank.value() as usize] += 1;
                shape.ranks[shape.len] = rank.value();
                shape.len += 1;
                match shape.suit {
                    None => shape.suit = Some(suit as u8),
                    Some(seen) if seen != suit as u8 => shape.suit_uniform = false,
                    Some(_) => {}
                }
            }
            _ => shape.wilds += 1,
        }
    }
    shape.ranks[..shape.len].sort_unstable_by(|a, b| b.cmp(a));
    shape
}

/// The hand a partial row is already guaranteed to hold, from rank
/// multiplicities alone. Full rows evaluate exactly.
pub(crate) fn made_hand(arrangement: &Arrangement, id: RowId) -> HandType {
    if let Some(exact) = arrangement.row_hand_type(id) {
        return exact;
    }
    let shape = row_shape(arrangement, id);
    if shape.len == 0 && shape.wilds == 0 {
        return HandType::new(HandCategory::HighCard, [0; 5]);
    }

    let mut best_rank = 0u8;
    let mut best_count = 0u8;
    let mut second_pair = 0u8;
    for value in (2..=MAX_RANK).rev() {
        let count = shape.counts[value as usize];
        if count > best_count || (count == best_count && count > 0 && value > best_rank) {
            if best_count >= 2 && second_pair == 0 {
                second_pair = best_rank;
            }
            best_count = count;
            best_rank = value;
        } else if count >= 2 && second_pair == 0 {
            second_pair = value;
        }
    }

    // Wilds placed in the row strengthen its guaranteed multiplicity.
    let effective = best_count + shape.wilds;
    let category = match effective {
        0 | 1 => HandCategory::HighCard,
        2 => HandCategory::Pair,
        3 => HandCategory::Trips,
        _ => HandCategory::Quads,
    };
    let category = if category == HandCategory::Pair && second_pair != 0 {
        HandCategory::TwoPair
    } else {
        category
    };

    let mut ranks = [0u8; 5];
    match category {
        HandCategory::TwoPair => {
            ranks[0] = best_rank.max(second_pair);
            ranks[1] = best_rank.min(second_pair);
        }
        _ => {
            ranks[0] = if best_count == 0 && shape.wilds > 0 {
                MAX_RANK
            } else {
                best_rank
            };
            let mut at = 1;
            for &rank in &shape.ranks[..shape.len] {
                if at >= 5 {
                    break;
                }
                if rank != best_rank {
                    ranks[at] = rank;
                    at += 1;
                }
            }
        }
    }
    HandType::new(category, ranks)
}

/// Optimistic bound on what a row can become given the remaining resources.
/// Full rows evaluate exactly; for open rows the bound may overshoot but
/// never undershoots.
pub(crate) fn upper_bound(arrangement: &Arrangement, id: RowId, resources: &Resources) -> HandType {
    if let Some(exact) = arrangement.row_hand_type(id) {
        return exact;
    }
    let shape = row_shape(arrangement, id);
    let slots = arrangement.row(id).open_slots() as u8;
    let optimistic = [MAX_RANK; 5];

    if id == RowId::Top {
        if let Some(rank) = best_multiplicity_reach(&shape, resources, slots, 3) {
            return HandType::new(HandCategory::Trips, [rank, MAX_RANK, MAX_RANK, 0, 0]);
        }
        if let Some(rank) = best_multiplicity_reach(&shape, resources, slots, 2) {
            return HandType::new(HandCategory::Pair, [rank, MAX_RANK, MAX_RANK, 0, 0]);
        }
        return HandType::new(HandCategory::HighCard, [MAX_RANK, MAX_RANK, MAX_RANK, 0, 0]);
    }

    let distinct = shape.ranks[..shape.len].windows(2).all(|w| w[0] != w[1]);
    let suited = shape.suit_uniform && shape.len > 0;
    let suit_resource = shape
        .suit
        .map(|s| resources.suit_counts[s as usize])
        .unwrap_or_else(|| *resources.suit_counts.iter().max().unwrap_or(&0));
    let suit_ok = (shape.suit.is_none() || suited)
        && suit_resource + resources.wilds >= slots
        && shape.wilds + shape.len as u8 + slots == 5;

    if suit_ok && distinct {
        if let Some(top) = best_window(&shape.ranks[..shape.len]) {
            return if top == MAX_RANK {
                HandType::new(HandCategory::RoyalFlush, [0; 5])
            } else {
                HandType::new(HandCategory::StraightFlush, [top, 0, 0, 0, 0])
            };
        }
    }
    if let Some(rank) = best_multiplicity_reach(&shape, resources, slots, 4) {
        return HandType::new(HandCategory::Quads, [rank, MAX_RANK, 0, 0, 0]);
    }
    if full_house_reachable(&shape, resources, slots) {
        return HandType::new(HandCategory::FullHouse, [MAX_RANK, MAX_RANK - 1, 0, 0, 0]);
    }
    if suit_ok {
        return HandType::new(HandCategory::Flush, optimistic);
    }
    if distinct {
        if let Some(top) = best_window(&shape.ranks[..shape.len]) {
            return HandType::new(HandCategory::Straight, [top, 0, 0, 0, 0]);
        }
    }
    if let Some(rank) = best_multiplicity_reach(&shape, resources, slots, 3) {
        return HandType::new(HandCategory::Trips, [rank, MAX_RANK, MAX_RANK, 0, 0]);
    }
    HandType::new(HandCategory::TwoPair, optimistic)
}

/// Highest rank whose multiplicity can reach `target` with the open slots and
/// remaining copies (wilds count toward any rank).
fn best_multiplicity_reach(
    shape: &RowShape,
    resources: &Resources,
    slots: u8,
    target: u8,
) -> Option<u8> {
    let wilds_in_row = shape.wilds;
    for value in (2..=MAX_RANK).rev() {
        let have = shape.counts[value as usize] + wilds_in_row;
        if have >= target {
            return Some(value);
        }
        let needed = target - have;
        let available = resources.rank_counts[value as usize] + resources.wilds;
        if needed <= slots && needed <= available {
            return Some(value);
        }
    }
    None
}

fn full_house_reachable(shape: &RowShape, resources: &Resources, slots: u8) -> bool {
    if slots >= 5 {
        return true;
    }
    // Optimistic: a trip of one placed-or-unseen rank plus a pair of another.
    let mut trip_possible = false;
    let mut pair_ranks = 0u8;
    for value in 2..=MAX_RANK {
        let have = shape.counts[value as usize];
        let reach = have + resources.rank_counts[value as usize] + resources.wilds;
        if reach >= 3 && (3u8.saturating_sub(have)) <= slots {
            trip_possible = true;
        }
        if reach >= 2 {
            pair_ranks += 1;
        }
    }
    trip_possible && pair_ranks >= 2 && shape.len as u8 + shape.wilds + slots == 5
}

/// Straight windows by descending top rank, the wheel last. Built once and
/// shared by every worker.
static STRAIGHT_WINDOWS: Lazy<[(u8, [u8; 5]); 10]> = Lazy::new(|| {
    let mut windows = [(0u8, [0u8; 5]); 10];
    for (slot, top) in (5..=MAX_RANK).rev().enumerate() {
        windows[slot] = if top == 5 {
            (5, [14, 2, 3, 4, 5])
        } else {
            (top, [top - 4, top - 3, top - 2, top - 1, top])
        };
    }
    windows
});

/// Highest straight window containing every placed rank.
fn best_window(ranks: &[u8]) -> Option<u8> {
    STRAIGHT_WINDOWS
        .iter()
        .find(|(_, window)| ranks.iter().all(|rank| window.contains(rank)))
        .map(|(top, _)| *top)
}
