//! Head-to-head and self scoring for completed arrangements.

use crate::model::arrangement::Arrangement;
use crate::model::row::RowId;

/// Points forfeited by the fouling side in a heads-up matchup.
pub const FOUL_PENALTY: f64 = 6.0;

/// Bonus for winning all three row comparisons.
pub const SCOOP_BONUS: f64 = 3.0;

const STRENGTH_CREDIT: f64 = 0.1;

/// Score a completed arrangement on its own, with no opponent model:
/// royalties, minus the foul penalty when fouled, plus a small per-row
/// strength credit so stronger non-royalty rows still order ahead.
pub fn score_self(mine: &Arrangement) -> f64 {
    let mut score = mine.royalties() as f64;
    if mine.is_fouled() {
        score -= FOUL_PENALTY;
    }
    for id in RowId::ALL {
        if let Some(hand) = mine.row_hand_type(id) {
            score += STRENGTH_CREDIT * hand.category.ordinal() as f64;
        }
    }
    score
}

/// Score `mine` against `theirs` from my perspective: one point per row won,
/// the scoop bonus for winning all three, plus the royalty difference. A
/// fouled side loses every row comparison and forfeits its royalties; both
/// fouling washes to zero.
pub fn score_matchup(mine: &Arrangement, theirs: &Arrangement) -> f64 {
    let my_foul = mine.is_fouled();
    let their_foul = theirs.is_fouled();

    match (my_foul, their_foul) {
        (true, true) => return 0.0,
        (true, false) => return -FOUL_PENALTY - theirs.royalties() as f64,
        (false, true) => return FOUL_PENALTY + mine.royalties() as f64,
        (false, false) => {}
    }

    let mut row_points = 0i32;
    let mut my_wins = 0;
    let mut their_wins = 0;
    for id in RowId::ALL {
        match (mine.row_hand_type(id), theirs.row_hand_type(id)) {
            (Some(my_hand), Some(their_hand)) => {
                if my_hand > their_hand {
                    row_points += 1;
                    my_wins += 1;
                } else if their_hand > my_hand {
                    row_points -= 1;
                    their_wins += 1;
                }
            }
            _ => return 0.0,
        }
    }

    let mut score = row_points as f64;
    if my_wins == 3 {
        score += SCOOP_BONUS;
    } else if their_wins == 3 {
        score -= SCOOP_BONUS;
    }
    score + mine.royalties() as f64 - theirs.royalties() as f64
}

/// Sum of pairwise matchups against several opponents.
pub fn score_against_field(mine: &Arrangement, field: &[Arrangement]) -> f64 {
    field
        .iter()
        .map(|opponent| score_matchup(mine, opponent))
        .sum()
}
