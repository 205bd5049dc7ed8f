//! Hand evaluation for 3- and 5-card rows, with wildcard resolution.
//!
//! The five-card path uses rank and suit histograms; wildcards are resolved
//! by structural descent through the categories from royal flush downward,
//! accepting the first reachable one. Everything runs on stack arrays.

use crate::model::card::Card;
use crate::model::hand_type::{HandCategory, HandType};

const RANK_LOW: u8 = 2;
const RANK_HIGH: u8 = 14;

/// Evaluate a five-card hand, resolving up to two wildcards optimally.
pub fn evaluate_five(cards: &[Card; 5]) -> HandType {
    let mut counts = [0u8; 15];
    let mut plain = [0u8; 5];
    let mut plain_len = 0usize;
    let mut wilds = 0u8;
    let mut suit_uniform = true;
    let mut suit_seen: Option<u8> = None;

    for card in cards.iter() {
        match (card.rank(), card.suit()) {
            (Some(rank), Some(suit)) => {
                counts[rank.value() as usize] += 1;
                plain[plain_len] = rank.value();
                plain_len += 1;
                match suit_seen {
                    None => suit_seen = Some(suit as u8),
                    Some(seen) if seen != suit as u8 => suit_uniform = false,
                    Some(_) => {}
                }
            }
            _ => wilds += 1,
        }
    }

    sort_desc(&mut plain[..plain_len]);

    if wilds == 0 {
        evaluate_five_plain(&plain, &counts, suit_uniform)
    } else {
        evaluate_five_wild(&plain[..plain_len], &counts, suit_uniform, wilds)
    }
}

/// Evaluate a three-card (top row) hand. Only high card, pair and trips are
/// reachable.
pub fn evaluate_three(cards: &[Card; 3]) -> HandType {
    let mut plain = [0u8; 3];
    let mut plain_len = 0usize;
    let mut wilds = 0u8;

    for card in cards.iter() {
        match card.rank() {
            Some(rank) => {
                plain[plain_len] = rank.value();
                plain_len += 1;
            }
            None => wilds += 1,
        }
    }

    sort_desc(&mut plain[..plain_len]);

    match wilds {
        0 => {
            let [a, b, c] = plain;
            if a == b && b == c {
                HandType::new(HandCategory::Trips, [a, 0, 0, 0, 0])
            } else if a == b {
                HandType::new(HandCategory::Pair, [a, c, 0, 0, 0])
            } else if b == c {
                HandType::new(HandCategory::Pair, [b, a, 0, 0, 0])
            } else {
                HandType::new(HandCategory::HighCard, [a, b, c, 0, 0])
            }
        }
        1 => {
            // The wild matches the higher rank.
            let (a, b) = (plain[0], plain[1]);
            if a == b {
                HandType::new(HandCategory::Trips, [a, 0, 0, 0, 0])
            } else {
                HandType::new(HandCategory::Pair, [a, b, 0, 0, 0])
            }
        }
        _ => {
            let base = if plain_len > 0 { plain[0] } else { RANK_HIGH };
            HandType::new(HandCategory::Trips, [base, 0, 0, 0, 0])
        }
    }
}

fn sort_desc(ranks: &mut [u8]) {
    // Insertion sort; the slices are at most five elements.
    for i in 1..ranks.len() {
        let mut j = i;
        while j > 0 && ranks[j - 1] < ranks[j] {
            ranks.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn evaluate_five_plain(sorted: &[u8; 5], counts: &[u8; 15], flush: bool) -> HandType {
    let straight_top = straight_top_plain(counts);

    if flush {
        if let Some(top) = straight_top {
            return if top == RANK_HIGH {
                HandType::new(HandCategory::RoyalFlush, [0; 5])
            } else {
                HandType::new(HandCategory::StraightFlush, [top, 0, 0, 0, 0])
            };
        }
    }

    let mut quad = 0u8;
    let mut trip = 0u8;
    let mut pair_hi = 0u8;
    let mut pair_lo = 0u8;
    for value in (RANK_LOW..=RANK_HIGH).rev() {
        match counts[value as usize] {
            4 => quad = value,
            3 => trip = value,
            2 => {
                if pair_hi == 0 {
                    pair_hi = value;
                } else {
                    pair_lo = value;
                }
            }
            _ => {}
        }
    }

    if quad != 0 {
        let kicker = highest_except(sorted, quad);
        return HandType::new(HandCategory::Quads, [quad, kicker, 0, 0, 0]);
    }
    if trip != 0 && pair_hi != 0 {
        return HandType::new(HandCategory::FullHouse, [trip, pair_hi, 0, 0, 0]);
    }
    if flush {
        return HandType::new(HandCategory::Flush, *sorted);
    }
    if let Some(top) = straight_top {
        return HandType::new(HandCategory::Straight, [top, 0, 0, 0, 0]);
    }
    if trip != 0 {
        let mut ranks = [trip, 0, 0, 0, 0];
        fill_kickers(&mut ranks, 1, sorted, &[trip]);
        return HandType::new(HandCategory::Trips, ranks);
    }
    if pair_lo != 0 {
        let kicker = highest_except2(sorted, pair_hi, pair_lo);
        return HandType::new(HandCategory::TwoPair, [pair_hi, pair_lo, kicker, 0, 0]);
    }
    if pair_hi != 0 {
        let mut ranks = [pair_hi, 0, 0, 0, 0];
        fill_kickers(&mut ranks, 1, sorted, &[pair_hi]);
        return HandType::new(HandCategory::Pair, ranks);
    }
    HandType::new(HandCategory::HighCard, *sorted)
}

/// Structural descent for hands with one or two wildcards.
///
/// Categories are tried strongest first; because exactly `5 - wilds` ranks
/// are present, a straight window that contains every plain rank always has
/// enough wildcards to fill its gaps.
fn evaluate_five_wild(plain: &[u8], counts: &[u8; 15], suit_uniform: bool, wilds: u8) -> HandType {
    debug_assert!(matches!(wilds, 1 | 2));
    let distinct = plain.windows(2).all(|pair| pair[0] != pair[1]);

    if suit_uniform && distinct {
        if plain.iter().all(|&rank| rank >= 10) {
            return HandType::new(HandCategory::RoyalFlush, [0; 5]);
        }
        if let Some(top) = best_straight_window(plain, 13) {
            return HandType::new(HandCategory::StraightFlush, [top, 0, 0, 0, 0]);
        }
    }

    // Quads: highest rank that the wildcards can complete to four.
    for value in (RANK_LOW..=RANK_HIGH).rev() {
        let have = counts[value as usize];
        if have >= 1 && have + wilds >= 4 {
            let spent = 4u8.saturating_sub(have).min(wilds);
            let kicker = if plain.iter().any(|&r| r != value) {
                highest_except(plain, value)
            } else {
                // A wildcard is left over; it becomes the best absent rank.
                debug_assert!(wilds > spent);
                if value == RANK_HIGH { RANK_HIGH - 1 } else { RANK_HIGH }
            };
            return HandType::new(HandCategory::Quads, [value, kicker, 0, 0, 0]);
        }
    }

    if let Some((trip, pair)) = best_full_house(counts, wilds) {
        return HandType::new(HandCategory::FullHouse, [trip, pair, 0, 0, 0]);
    }

    if suit_uniform {
        // Wildcards become the highest ranks missing from the suit.
        let mut ranks = [0u8; 5];
        let mut len = 0usize;
        for &rank in plain {
            ranks[len] = rank;
            len += 1;
        }
        let mut candidate = RANK_HIGH;
        while len < 5 {
            if !plain.contains(&candidate) {
                ranks[len] = candidate;
                len += 1;
            }
            candidate -= 1;
        }
        sort_desc(&mut ranks);
        return HandType::new(HandCategory::Flush, ranks);
    }

    if distinct {
        if let Some(top) = best_straight_window(plain, 14) {
            return HandType::new(HandCategory::Straight, [top, 0, 0, 0, 0]);
        }
    }

    // Trips: highest rank the wildcards can complete to three.
    for value in (RANK_LOW..=RANK_HIGH).rev() {
        let have = counts[value as usize];
        if have >= 1 && have + wilds >= 3 {
            let mut ranks = [value, 0, 0, 0, 0];
            fill_kickers(&mut ranks, 1, plain, &[value]);
            return HandType::new(HandCategory::Trips, ranks);
        }
    }

    // One wildcard, all plain ranks distinct: pair the highest.
    let mut ranks = [plain[0], 0, 0, 0, 0];
    fill_kickers(&mut ranks, 1, &plain[1..], &[]);
    HandType::new(HandCategory::Pair, ranks)
}

/// Straight top for a plain hand: five distinct consecutive ranks, with the
/// wheel (A-2-3-4-5) counting as top five.
fn straight_top_plain(counts: &[u8; 15]) -> Option<u8> {
    for top in (5..=RANK_HIGH).rev() {
        if window_complete(counts, top) {
            return Some(top);
        }
    }
    None
}

fn window_complete(counts: &[u8; 15], top: u8) -> bool {
    window_ranks(top).iter().all(|&r| counts[r as usize] == 1)
}

const fn window_ranks(top: u8) -> [u8; 5] {
    if top == 5 {
        [14, 2, 3, 4, 5]
    } else {
        [top - 4, top - 3, top - 2, top - 1, top]
    }
}

/// Highest straight window containing every plain rank; gaps are filled by
/// wildcards. `max_top` lets the caller exclude the royal window.
fn best_straight_window(plain: &[u8], max_top: u8) -> Option<u8> {
    for top in (5..=max_top).rev() {
        let window = window_ranks(top);
        if plain.iter().all(|rank| window.contains(rank)) {
            return Some(top);
        }
    }
    None
}

/// Best (trip, pair) full house completable with the given wildcards.
fn best_full_house(counts: &[u8; 15], wilds: u8) -> Option<(u8, u8)> {
    let mut best: Option<(u8, u8)> = None;
    for trip in (RANK_LOW..=RANK_HIGH).rev() {
        let have_trip = counts[trip as usize];
        if have_trip == 0 || have_trip + wilds < 3 {
            continue;
        }
        let spare = wilds - 3u8.saturating_sub(have_trip).min(wilds);
        for pair in (RANK_LOW..=RANK_HIGH).rev() {
            if pair == trip {
                continue;
            }
            let have_pair = counts[pair as usize];
            if have_pair == 0 || have_pair + spare < 2 {
                continue;
            }
            if best.map_or(true, |b| (trip, pair) > b) {
                best = Some((trip, pair));
            }
            break;
        }
    }
    best
}

fn highest_except(ranks: &[u8], skip: u8) -> u8 {
    let mut best = 0u8;
    for &rank in ranks {
        if rank != skip && rank > best {
            best = rank;
        }
    }
    best
}

fn highest_except2(ranks: &[u8], skip_a: u8, skip_b: u8) -> u8 {
    let mut best = 0u8;
    for &rank in ranks {
        if rank != skip_a && rank != skip_b && rank > best {
            best = rank;
        }
    }
    best
}

/// Copy kickers (ranks not in `skip`) in descending order into `ranks`
/// starting at `from`.
fn fill_kickers(ranks: &mut [u8; 5], from: usize, sorted: &[u8], skip: &[u8]) {
    let mut at = from;
    for &rank in sorted {
        if at >= 5 {
            break;
        }
        if !skip.contains(&rank) {
            ranks[at] = rank;
            at += 1;
        }
    }
}
