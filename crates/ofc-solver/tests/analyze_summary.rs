use ofc_core::model::card::Card;
use ofc_core::model::hand_type::HandCategory;
use ofc_core::model::row::RowId;
use ofc_core::state::{GameState, Street};
use ofc_solver::{SolveOptions, Solver};

fn card(text: &str) -> Card {
    text.parse().expect("valid card")
}

fn place(state: &mut GameState, row: RowId, texts: &[&str]) {
    for text in texts {
        let c = card(text);
        state.unseen.remove(c);
        state.arrangement.place(c, row).unwrap();
    }
}

#[test]
fn summary_reports_rows_royalties_and_probabilities() {
    let mut state = GameState::fresh();
    place(&mut state, RowId::Top, &["Qh", "Qd"]);
    place(&mut state, RowId::Middle, &["Kh", "Kd", "Ks"]);
    place(&mut state, RowId::Bottom, &["Ah", "Ad", "As", "Ac"]);
    state.street = Street::Third;

    let solver = Solver::new(SolveOptions::default());
    let summary = solver.analyze(&state).expect("state is valid");

    assert_eq!(
        summary.per_row_type[0].map(|h| h.category),
        Some(HandCategory::Pair)
    );
    assert_eq!(
        summary.per_row_type[1].map(|h| h.category),
        Some(HandCategory::Trips)
    );
    assert_eq!(
        summary.per_row_type[2].map(|h| h.category),
        Some(HandCategory::Quads)
    );
    // Made queens up top (7), trips (2) and quads (10) all count already.
    assert_eq!(summary.current_royalties, 19);
    assert!(summary.foul_probability < 0.5);
    assert!(summary.fantasy_land_probability > 0.5);
    // No dealt cards, so no candidate actions.
    assert!(summary.top_actions.is_empty());
}

#[test]
fn summary_lists_scored_candidates_for_dealt_cards() {
    let mut state = GameState::fresh();
    state
        .deal(&["Ah", "Kd", "9s", "9c", "2h"].map(|t| card(t)))
        .unwrap();

    let solver = Solver::new(SolveOptions::default());
    let summary = solver.analyze(&state).expect("state is valid");
    assert!(!summary.top_actions.is_empty());
    assert!(summary.top_actions.len() <= solver.options().opener_candidates);
    for window in summary.top_actions.windows(2) {
        assert!(window[0].1 >= window[1].1);
    }
    for (action, _) in &summary.top_actions {
        state.apply(action).expect("candidate is legal");
    }
}

#[test]
fn empty_rows_have_no_hand_type() {
    let state = GameState::fresh();
    let solver = Solver::new(SolveOptions::default());
    let summary = solver.analyze(&state).expect("state is valid");
    assert_eq!(summary.per_row_type, [None, None, None]);
    assert_eq!(summary.current_royalties, 0);
}
