use ofc_core::model::card::Card;
use ofc_core::model::row::RowId;
use ofc_core::state::{Action, GameState, Street};
use ofc_solver::heuristic;
use ofc_solver::{Budget, SolveOptions, Solver};

fn card(text: &str) -> Card {
    text.parse().expect("valid card")
}

/// Bottom four kings, middle a pair of nines, three low cards dealt: the
/// decision must keep the prefix completable, placing two cards and
/// discarding the third.
fn quad_kings_state() -> GameState {
    let mut state = GameState::fresh();
    for text in ["Ks", "Kd", "Kh", "Kc"] {
        let c = card(text);
        state.unseen.remove(c);
        state.arrangement.place(c, RowId::Bottom).unwrap();
    }
    for text in ["9s", "9d"] {
        let c = card(text);
        state.unseen.remove(c);
        state.arrangement.place(c, RowId::Middle).unwrap();
    }
    state.street = Street::Second;
    state
        .deal(&[card("2c"), card("3d"), card("4h")])
        .expect("three-card street deal");
    state
}

#[test]
fn decision_places_two_and_discards_one() {
    let state = quad_kings_state();
    let solver = Solver::new(SolveOptions {
        rng_seed: 7,
        ..SolveOptions::default()
    });
    let decision = solver
        .solve(&state, &Budget::simulations(2_000))
        .expect("state is valid");

    let (placements, discard) = match decision.action {
        Action::Street { placements, discard } => (placements, discard),
        other => panic!("expected a street action, got {other:?}"),
    };
    let dealt = [card("2c"), card("3d"), card("4h")];
    assert!(dealt.contains(&discard));
    for (placed, _) in placements {
        assert!(dealt.contains(&placed));
        assert_ne!(placed, discard);
    }

    // The chosen prefix must still be completable without a foul.
    let next = state.apply(&decision.action).expect("decision is legal");
    assert!(!heuristic::foul_forced(&next));
}

#[test]
fn every_offered_candidate_avoids_forced_fouls() {
    let state = quad_kings_state();
    let solver = Solver::new(SolveOptions::default());
    let summary = solver.analyze(&state).expect("state is valid");
    assert!(!summary.top_actions.is_empty());
    for (action, _) in &summary.top_actions {
        let next = state.apply(action).expect("candidate is legal");
        assert!(!heuristic::foul_forced(&next), "candidate {action:?} forces a foul");
    }
}
