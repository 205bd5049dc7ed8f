use ofc_core::model::card::Card;
use ofc_core::state::GameState;
use ofc_solver::{Budget, CancelHandle, SolveOptions, Solver};
use std::time::{Duration, Instant};

fn opener_state() -> GameState {
    let mut state = GameState::fresh();
    let cards: Vec<Card> = ["Ah", "Kd", "9s", "9c", "2h"]
        .iter()
        .map(|t| t.parse().expect("valid card"))
        .collect();
    state.deal(&cards).unwrap();
    state
}

#[test]
fn cancellation_stops_two_workers_promptly() {
    let state = opener_state();
    let solver = Solver::new(SolveOptions {
        threads: 2,
        rng_seed: 42,
        ..SolveOptions::default()
    });

    let cancel = CancelHandle::new();
    let trigger = cancel.clone();
    let signaller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(100));
        trigger.cancel();
    });

    let budget = Budget::simulations(1_000_000_000).with_cancel(cancel);
    let started = Instant::now();
    let decision = solver.solve(&state, &budget).expect("state is valid");
    let wall = started.elapsed();
    signaller.join().unwrap();

    assert!(!decision.complete);
    assert!(decision.simulations_performed > 0);
    assert!(
        wall <= Duration::from_millis(250),
        "solve took {wall:?} after a 100ms cancellation"
    );
    // The decision must be one of the generated candidates.
    let summary = solver.analyze(&state).expect("state is valid");
    assert!(
        summary
            .top_actions
            .iter()
            .any(|(action, _)| *action == decision.action)
    );
}
