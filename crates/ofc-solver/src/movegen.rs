//! Legal-action enumeration for the opener and the three-card streets.
//!
//! Openers enumerate the 243 row assignments of the five dealt cards, dedupe
//! by the per-row card sets, drop assignments that already force a foul, and
//! keep the best candidates by static score. Streets enumerate the three
//! discard choices times the placements of the remaining pair.

use crate::heuristic;
use ofc_core::model::card::Card;
use ofc_core::model::card_set::CardSet;
use ofc_core::model::row::RowId;
use ofc_core::state::{Action, GameState, Street};
use std::collections::HashSet;

/// Default number of opener candidates handed to the search.
pub const DEFAULT_OPENER_CANDIDATES: usize = 30;

const ROWS: [RowId; 3] = [RowId::Top, RowId::Middle, RowId::Bottom];

/// Actions for the state's street, strongest static score first.
pub fn generate(state: &GameState, opener_limit: usize) -> Vec<Action> {
    scored(state, opener_limit)
        .into_iter()
        .map(|(action, _)| action)
        .collect()
}

/// Actions with their static ordering scores, strongest first.
pub fn scored(state: &GameState, opener_limit: usize) -> Vec<(Action, f64)> {
    let raw = match state.street {
        Street::Initial => opener_assignments(state),
        _ => street_placements(state),
    };

    // Drop foul-forcing prefixes, but never return an empty action list for
    // a state that has dealt cards.
    let mut survivors: Vec<(Action, GameState)> = raw
        .iter()
        .filter_map(|action| state.apply(action).ok().map(|next| (*action, next)))
        .collect();
    let pruned: Vec<(Action, GameState)> = survivors
        .iter()
        .filter(|(_, next)| !heuristic::foul_forced(next))
        .cloned()
        .collect();
    if !pruned.is_empty() {
        survivors = pruned;
    }

    let mut scored: Vec<(Action, f64)> = survivors
        .into_iter()
        .map(|(action, next)| {
            let score = heuristic::heuristic_value(&next) + order_bonus(&next);
            (action, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if state.street == Street::Initial && scored.len() > opener_limit.max(1) {
        scored.truncate(opener_limit.max(1));
    }
    scored
}

/// Small nudge for keeping rows ordered bottom-heavy and not starving rows
/// of outs; layered on top of the heuristic value for ordering only.
fn order_bonus(state: &GameState) -> f64 {
    let arrangement = &state.arrangement;
    let mut bonus = 0.0;
    let top = arrangement.row(RowId::Top).len() as f64;
    let middle = arrangement.row(RowId::Middle).len() as f64;
    let bottom = arrangement.row(RowId::Bottom).len() as f64;
    if bottom >= middle && middle >= top {
        bonus += 0.25;
    }
    // Leaving a nearly-finished row with no matching outs is a liability.
    let unseen = state.unseen.len() as f64;
    if unseen > 0.0 {
        bonus -= (13.0 - top - middle - bottom) / unseen * 0.5;
    }
    bonus
}

/// All distinct row assignments of the five opener cards.
fn opener_assignments(state: &GameState) -> Vec<Action> {
    if state.dealt.len() != 5 {
        return Vec::new();
    }
    let cards: [Card; 5] = [
        state.dealt[0],
        state.dealt[1],
        state.dealt[2],
        state.dealt[3],
        state.dealt[4],
    ];
    let mut seen: HashSet<(u64, u64)> = HashSet::with_capacity(243);
    let mut actions = Vec::with_capacity(128);

    for code in 0..243u32 {
        let mut digits = code;
        let mut rows = [RowId::Top; 5];
        let mut counts = [0usize; 3];
        for slot in rows.iter_mut() {
            let digit = (digits % 3) as usize;
            digits /= 3;
            *slot = ROWS[digit];
            counts[digit] += 1;
        }
        if counts[0] > RowId::Top.capacity() {
            continue;
        }
        let mut top_set = CardSet::empty();
        let mut middle_set = CardSet::empty();
        for (card, row) in cards.iter().zip(rows.iter()) {
            match row {
                RowId::Top => top_set.insert(*card),
                RowId::Middle => middle_set.insert(*card),
                RowId::Bottom => {}
            }
        }
        if !seen.insert((top_set.bits(), middle_set.bits())) {
            continue;
        }
        let placements = [
            (cards[0], rows[0]),
            (cards[1], rows[1]),
            (cards[2], rows[2]),
            (cards[3], rows[3]),
            (cards[4], rows[4]),
        ];
        actions.push(Action::Opener { placements });
    }
    actions
}

/// Street actions: each discard choice times each placement of the remaining
/// two cards over rows with room.
fn street_placements(state: &GameState) -> Vec<Action> {
    if state.dealt.len() != 3 {
        return Vec::new();
    }
    let mut actions = Vec::with_capacity(27);
    for discard_index in 0..3 {
        let discard = state.dealt[discard_index];
        let kept: Vec<Card> = state
            .dealt
            .iter()
            .copied()
            .filter(|card| *card != discard)
            .collect();
        for first_row in ROWS {
            for second_row in ROWS {
                let mut open = [
                    state.arrangement.row(RowId::Top).open_slots(),
                    state.arrangement.row(RowId::Middle).open_slots(),
                    state.arrangement.row(RowId::Bottom).open_slots(),
                ];
                if open[row_index(first_row)] == 0 {
                    continue;
                }
                open[row_index(first_row)] -= 1;
                if open[row_index(second_row)] == 0 {
                    continue;
                }
                actions.push(Action::Street {
                    placements: [(kept[0], first_row), (kept[1], second_row)],
                    discard,
                });
            }
        }
    }
    actions
}

const fn row_index(id: RowId) -> usize {
    match id {
        RowId::Top => 0,
        RowId::Middle => 1,
        RowId::Bottom => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_OPENER_CANDIDATES, generate, scored};
    use ofc_core::model::card::Card;
    use ofc_core::model::row::RowId;
    use ofc_core::state::{Action, GameState};

    fn card(text: &str) -> Card {
        text.parse().expect("valid card")
    }

    fn cards(texts: &[&str]) -> Vec<Card> {
        texts.iter().map(|t| card(t)).collect()
    }

    fn opener_state(texts: &[&str]) -> GameState {
        let mut state = GameState::fresh();
        state.deal(&cards(texts)).unwrap();
        state
    }

    #[test]
    fn opener_candidates_are_legal_and_bounded() {
        let state = opener_state(&["As", "Ks", "Qs", "Js", "Ts"]);
        let actions = generate(&state, DEFAULT_OPENER_CANDIDATES);
        assert!(!actions.is_empty());
        assert!(actions.len() <= DEFAULT_OPENER_CANDIDATES);
        for action in &actions {
            let next = state.apply(action).expect("generated action is legal");
            assert_eq!(next.arrangement.card_count(), 5);
        }
    }

    #[test]
    fn royal_opener_keeps_all_five_on_the_bottom() {
        let state = opener_state(&["As", "Ks", "Qs", "Js", "Ts"]);
        let top = &generate(&state, DEFAULT_OPENER_CANDIDATES)[0];
        let next = state.apply(top).expect("legal");
        assert_eq!(next.arrangement.row(RowId::Bottom).len(), 5);
    }

    #[test]
    fn street_actions_cover_each_discard() {
        let mut state = opener_state(&["As", "Ks", "Qs", "Js", "Ts"]);
        let opener = generate(&state, DEFAULT_OPENER_CANDIDATES)[0];
        state.apply_mut(&opener).unwrap();
        state.deal(&cards(&["2c", "3d", "4h"])).unwrap();

        let actions = generate(&state, DEFAULT_OPENER_CANDIDATES);
        assert!(!actions.is_empty());
        let mut discards = std::collections::HashSet::new();
        for action in &actions {
            match action {
                Action::Street { discard, .. } => {
                    discards.insert(*discard);
                }
                _ => panic!("expected street actions"),
            }
            let next = state.apply(action).expect("generated action is legal");
            assert_eq!(next.arrangement.card_count(), 7);
            assert_eq!(next.discarded.len(), 1);
        }
        assert_eq!(discards.len(), 3);
    }

    #[test]
    fn full_rows_limit_street_placements() {
        let mut state = GameState::fresh();
        for text in ["Ah", "Ad", "Ac", "As", "Kd"] {
            let c = card(text);
            state.unseen.remove(c);
            state.arrangement.place(c, RowId::Bottom).unwrap();
        }
        for text in ["Qh", "Qd", "Qs", "Jc", "Jd"] {
            let c = card(text);
            state.unseen.remove(c);
            state.arrangement.place(c, RowId::Middle).unwrap();
        }
        state.street = ofc_core::state::Street::Fourth;
        state.deal(&cards(&["2c", "3d", "4h"])).unwrap();

        let actions = generate(&state, DEFAULT_OPENER_CANDIDATES);
        assert!(!actions.is_empty());
        for action in &actions {
            if let Action::Street { placements, .. } = action {
                for (_, row) in placements {
                    assert_eq!(*row, RowId::Top);
                }
            }
        }
    }

    #[test]
    fn ordering_scores_are_descending() {
        let state = opener_state(&["As", "Ks", "Qs", "Js", "Ts"]);
        let scored = scored(&state, DEFAULT_OPENER_CANDIDATES);
        for pair in scored.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn trips_opener_offers_top_trips_candidate() {
        let state = opener_state(&["Ah", "Ad", "Ac", "7s", "2d"]);
        let actions = generate(&state, DEFAULT_OPENER_CANDIDATES);
        let has_trips_top = actions.iter().any(|action| {
            let next = state.apply(action).expect("legal");
            next.arrangement.row(RowId::Top).len() == 3
                && next.arrangement.row(RowId::Top).iter().all(|c| {
                    c.rank().map(|r| r.value()) == Some(14)
                })
        });
        assert!(has_trips_top);
    }
}
