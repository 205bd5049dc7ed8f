//! Serde-friendly snapshots of a game state, with cards in their
//! two-character text form.

use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::row::RowId;
use crate::state::{GameState, StateError, Street};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSnapshot {
    pub top: Vec<String>,
    pub middle: Vec<String>,
    pub bottom: Vec<String>,
    pub unseen: Vec<String>,
    pub discarded: Vec<String>,
    pub known_opponent: Vec<String>,
    pub street: u8,
    pub dealt: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    BadCard(String),
    BadStreet(u8),
    Invalid(StateError),
}

impl From<StateError> for SnapshotError {
    fn from(error: StateError) -> Self {
        SnapshotError::Invalid(error)
    }
}

impl StateSnapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            top: row_texts(state, RowId::Top),
            middle: row_texts(state, RowId::Middle),
            bottom: row_texts(state, RowId::Bottom),
            unseen: set_texts(state.unseen),
            discarded: set_texts(state.discarded),
            known_opponent: set_texts(state.known_opponent),
            street: state.street.number(),
            dealt: state.dealt.iter().map(Card::to_string).collect(),
        }
    }

    pub fn restore(&self) -> Result<GameState, SnapshotError> {
        let street = Street::from_number(self.street).ok_or(SnapshotError::BadStreet(self.street))?;
        let mut state = GameState {
            arrangement: Default::default(),
            unseen: parse_set(&self.unseen)?,
            discarded: parse_set(&self.discarded)?,
            known_opponent: parse_set(&self.known_opponent)?,
            street,
            dealt: parse_cards(&self.dealt)?,
        };
        for (texts, row) in [
            (&self.top, RowId::Top),
            (&self.middle, RowId::Middle),
            (&self.bottom, RowId::Bottom),
        ] {
            for card in parse_cards(texts)? {
                state.arrangement.place(card, row).map_err(StateError::from)?;
            }
        }
        state.validate()?;
        Ok(state)
    }
}

fn row_texts(state: &GameState, id: RowId) -> Vec<String> {
    state.arrangement.row(id).iter().map(|c| c.to_string()).collect()
}

fn set_texts(set: CardSet) -> Vec<String> {
    set.iter().map(|c| c.to_string()).collect()
}

fn parse_cards(texts: &[String]) -> Result<Vec<Card>, SnapshotError> {
    texts
        .iter()
        .map(|text| {
            text.parse::<Card>()
                .map_err(|_| SnapshotError::BadCard(text.clone()))
        })
        .collect()
}

fn parse_set(texts: &[String]) -> Result<CardSet, SnapshotError> {
    Ok(CardSet::from_cards(&parse_cards(texts)?))
}

#[cfg(test)]
mod tests {
    use super::{SnapshotError, StateSnapshot};
    use crate::model::card::Card;
    use crate::model::row::RowId;
    use crate::state::{Action, GameState};

    fn card(text: &str) -> Card {
        text.parse().expect("valid card")
    }

    fn mid_hand_state() -> GameState {
        let mut state = GameState::fresh();
        state
            .deal(&["As", "Ks", "Qs", "Js", "Ts"].map(|t| card(t)))
            .unwrap();
        state
            .apply_mut(&Action::Opener {
                placements: [
                    (card("As"), RowId::Bottom),
                    (card("Ks"), RowId::Bottom),
                    (card("Qs"), RowId::Bottom),
                    (card("Js"), RowId::Bottom),
                    (card("Ts"), RowId::Bottom),
                ],
            })
            .unwrap();
        state.deal(&["2c", "3d", "4h"].map(|t| card(t))).unwrap();
        state
    }

    #[test]
    fn snapshot_roundtrip_preserves_state() {
        let state = mid_hand_state();
        let snapshot = StateSnapshot::capture(&state);
        let restored = snapshot.restore().expect("snapshot restores");
        assert_eq!(restored, state);
    }

    #[test]
    fn snapshot_survives_json() {
        let state = mid_hand_state();
        let snapshot = StateSnapshot::capture(&state);
        let json = serde_json::to_string(&snapshot).expect("serializes");
        let parsed: StateSnapshot = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(parsed.restore().expect("restores"), state);
    }

    #[test]
    fn bad_card_text_is_reported() {
        let state = GameState::fresh();
        let mut snapshot = StateSnapshot::capture(&state);
        snapshot.discarded.push("zz".to_string());
        assert_eq!(
            snapshot.restore(),
            Err(SnapshotError::BadCard("zz".to_string()))
        );
    }

    #[test]
    fn bad_street_is_reported() {
        let state = GameState::fresh();
        let mut snapshot = StateSnapshot::capture(&state);
        snapshot.street = 9;
        assert_eq!(snapshot.restore(), Err(SnapshotError::BadStreet(9)));
    }
}
