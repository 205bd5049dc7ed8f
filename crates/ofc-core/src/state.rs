//! Game state snapshots and action application.

use crate::model::arrangement::{Arrangement, ArrangementError};
use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::row::RowId;
use core::fmt;

/// One round of the dealing schedule: the five-card opener, then four
/// three-card streets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Street {
    Initial = 0,
    First = 1,
    Second = 2,
    Third = 3,
    Fourth = 4,
}

impl Street {
    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            0 => Some(Street::Initial),
            1 => Some(Street::First),
            2 => Some(Street::Second),
            3 => Some(Street::Third),
            4 => Some(Street::Fourth),
            _ => None,
        }
    }

    /// Cards dealt at this street.
    pub const fn dealt_count(self) -> usize {
        match self {
            Street::Initial => 5,
            _ => 3,
        }
    }

    /// Cards placed into rows at this street.
    pub const fn placement_count(self) -> usize {
        match self {
            Street::Initial => 5,
            _ => 2,
        }
    }

    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "street {}", self.number())
    }
}

/// A solver decision applied to a state: either the five-card opener layout,
/// a street placement with its discard, or a concession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Opener {
        placements: [(Card, RowId); 5],
    },
    Street {
        placements: [(Card, RowId); 2],
        discard: Card,
    },
    Fold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    DuplicateCard(Card),
    DealtCountMismatch { expected: usize, actual: usize },
    DealtWhileComplete,
    CardNotDealt(Card),
    RowFull(RowId),
    NotEnoughUnseen { needed: u32, available: u32 },
    WrongActionShape,
    FoldNotPlayable,
}

impl From<ArrangementError> for StateError {
    fn from(error: ArrangementError) -> Self {
        match error {
            ArrangementError::RowFull(id) => StateError::RowFull(id),
            ArrangementError::DuplicateCard(card) => StateError::DuplicateCard(card),
        }
    }
}

/// Snapshot of a single player's view of the hand in progress.
///
/// `unseen` is the complement of every known-consumed card; opponents and
/// future draws are sampled from it. The three bookkeeping sets and the
/// placed cards stay pairwise disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub arrangement: Arrangement,
    pub unseen: CardSet,
    pub discarded: CardSet,
    pub known_opponent: CardSet,
    pub street: Street,
    pub dealt: Vec<Card>,
}

impl GameState {
    /// Fresh hand: empty arrangement, the full 54-card deck unseen.
    pub fn fresh() -> Self {
        Self {
            arrangement: Arrangement::new(),
            unseen: CardSet::full_deck(),
            discarded: CardSet::empty(),
            known_opponent: CardSet::empty(),
            street: Street::Initial,
            dealt: Vec::new(),
        }
    }

    pub fn dealt_set(&self) -> CardSet {
        CardSet::from_cards(&self.dealt)
    }

    /// Every card this player has consumed or holds.
    pub fn consumed(&self) -> CardSet {
        self.arrangement
            .placed()
            .union(self.discarded)
            .union(self.known_opponent)
            .union(self.dealt_set())
    }

    pub fn is_terminal(&self) -> bool {
        self.arrangement.is_complete()
    }

    /// Row slots still to fill.
    pub fn open_slots(&self) -> usize {
        RowId::ALL
            .iter()
            .map(|&id| self.arrangement.row(id).open_slots())
            .sum()
    }

    /// Check the input rules: disjoint card sets, dealt count matching the
    /// street, no dealt cards on a complete arrangement.
    pub fn validate(&self) -> Result<(), StateError> {
        if !self.dealt.is_empty() {
            if self.arrangement.is_complete() {
                return Err(StateError::DealtWhileComplete);
            }
            let expected = self.street.dealt_count();
            if self.dealt.len() != expected {
                return Err(StateError::DealtCountMismatch {
                    expected,
                    actual: self.dealt.len(),
                });
            }
        }

        let groups = [
            self.arrangement.placed(),
            self.discarded,
            self.known_opponent,
            self.dealt_set(),
            self.unseen,
        ];
        let mut seen = CardSet::empty();
        for group in groups {
            if !seen.is_disjoint(group) {
                let clash = seen.intersection(group);
                let card = clash.nth(0).expect("non-empty intersection");
                return Err(StateError::DuplicateCard(card));
            }
            seen = seen.union(group);
        }

        let dealt_distinct = self.dealt_set().len() as usize;
        if dealt_distinct != self.dealt.len() {
            let mut counted = CardSet::empty();
            for card in &self.dealt {
                if counted.contains(*card) {
                    return Err(StateError::DuplicateCard(*card));
                }
                counted.insert(*card);
            }
        }
        Ok(())
    }

    /// Confirm the unseen set can still cover every draw the rest of the
    /// hand needs (three cards for each street still to come).
    pub fn ensure_future_draws(&self) -> Result<(), StateError> {
        let needed = 3 * (4 - self.street.number()) as u32;
        if self.unseen.len() < needed {
            return Err(StateError::NotEnoughUnseen {
                needed,
                available: self.unseen.len(),
            });
        }
        Ok(())
    }

    /// Move dealt cards out of `unseen` into the hand.
    pub fn deal(&mut self, cards: &[Card]) -> Result<(), StateError> {
        if self.arrangement.is_complete() {
            return Err(StateError::DealtWhileComplete);
        }
        if !self.dealt.is_empty() {
            return Err(StateError::WrongActionShape);
        }
        let expected = self.street.dealt_count();
        if cards.len() != expected {
            return Err(StateError::DealtCountMismatch {
                expected,
                actual: cards.len(),
            });
        }
        for card in cards {
            if !self.unseen.contains(*card) {
                return Err(StateError::DuplicateCard(*card));
            }
            self.unseen.remove(*card);
        }
        self.dealt.extend_from_slice(cards);
        Ok(())
    }

    /// Apply an action in place: place (and discard) the dealt cards and
    /// advance the street.
    pub fn apply_mut(&mut self, action: &Action) -> Result<(), StateError> {
        match action {
            Action::Opener { placements } => {
                if self.street != Street::Initial || self.dealt.len() != 5 {
                    return Err(StateError::WrongActionShape);
                }
                for (card, row) in placements {
                    if !self.dealt.contains(card) {
                        return Err(StateError::CardNotDealt(*card));
                    }
                    self.arrangement.place(*card, *row)?;
                }
            }
            Action::Street { placements, discard } => {
                if self.street == Street::Initial || self.dealt.len() != 3 {
                    return Err(StateError::WrongActionShape);
                }
                if !self.dealt.contains(discard) {
                    return Err(StateError::CardNotDealt(*discard));
                }
                for (card, row) in placements {
                    if !self.dealt.contains(card) || card == discard {
                        return Err(StateError::CardNotDealt(*card));
                    }
                    self.arrangement.place(*card, *row)?;
                }
                self.discarded.insert(*discard);
            }
            Action::Fold => return Err(StateError::FoldNotPlayable),
        }
        self.dealt.clear();
        if let Some(next) = self.street.next() {
            self.street = next;
        }
        Ok(())
    }

    /// Pure variant of [`apply_mut`].
    pub fn apply(&self, action: &Action) -> Result<GameState, StateError> {
        let mut next = self.clone();
        next.apply_mut(action)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, GameState, StateError, Street};
    use crate::model::card::Card;
    use crate::model::card_set::CardSet;
    use crate::model::row::RowId;

    fn card(text: &str) -> Card {
        text.parse().expect("valid card")
    }

    fn cards(texts: &[&str]) -> Vec<Card> {
        texts.iter().map(|t| card(t)).collect()
    }

    #[test]
    fn street_schedule() {
        assert_eq!(Street::Initial.dealt_count(), 5);
        assert_eq!(Street::Third.dealt_count(), 3);
        assert_eq!(Street::Initial.placement_count(), 5);
        assert_eq!(Street::Second.placement_count(), 2);
        assert_eq!(Street::Fourth.next(), None);
        assert_eq!(Street::from_number(5), None);
    }

    #[test]
    fn fresh_state_validates() {
        let state = GameState::fresh();
        assert!(state.validate().is_ok());
        assert_eq!(state.unseen.len(), 54);
        assert_eq!(state.open_slots(), 13);
    }

    #[test]
    fn deal_moves_cards_out_of_unseen() {
        let mut state = GameState::fresh();
        state.deal(&cards(&["As", "Ks", "Qs", "Js", "Ts"])).unwrap();
        assert_eq!(state.unseen.len(), 49);
        assert_eq!(state.dealt.len(), 5);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn deal_rejects_wrong_count_and_unknown_cards() {
        let mut state = GameState::fresh();
        assert_eq!(
            state.deal(&cards(&["As", "Ks"])),
            Err(StateError::DealtCountMismatch { expected: 5, actual: 2 })
        );
        state.deal(&cards(&["As", "Ks", "Qs", "Js", "Ts"])).unwrap();
        let opener = Action::Opener {
            placements: [
                (card("As"), RowId::Bottom),
                (card("Ks"), RowId::Bottom),
                (card("Qs"), RowId::Bottom),
                (card("Js"), RowId::Bottom),
                (card("Ts"), RowId::Bottom),
            ],
        };
        state.apply_mut(&opener).unwrap();
        // The ace of spades is already placed; dealing it again must fail.
        assert_eq!(
            state.deal(&cards(&["As", "2c", "3c"])),
            Err(StateError::DuplicateCard(card("As")))
        );
    }

    #[test]
    fn opener_fills_rows_and_advances() {
        let mut state = GameState::fresh();
        state.deal(&cards(&["As", "Ks", "Qs", "Js", "Ts"])).unwrap();
        let opener = Action::Opener {
            placements: [
                (card("As"), RowId::Bottom),
                (card("Ks"), RowId::Bottom),
                (card("Qs"), RowId::Bottom),
                (card("Js"), RowId::Bottom),
                (card("Ts"), RowId::Bottom),
            ],
        };
        state.apply_mut(&opener).unwrap();
        assert_eq!(state.street, Street::First);
        assert!(state.dealt.is_empty());
        assert_eq!(state.arrangement.row(RowId::Bottom).len(), 5);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn street_action_places_two_and_discards_one() {
        let mut state = GameState::fresh();
        state.deal(&cards(&["As", "Ks", "Qs", "Js", "Ts"])).unwrap();
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
        state.deal(&cards(&["2c", "3d", "4h"])).unwrap();
        let action = Action::Street {
            placements: [(card("2c"), RowId::Top), (card("3d"), RowId::Middle)],
            discard: card("4h"),
        };
        state.apply_mut(&action).unwrap();
        assert_eq!(state.street, Street::Second);
        assert!(state.discarded.contains(card("4h")));
        assert_eq!(state.arrangement.card_count(), 7);
        assert!(state.validate().is_ok());
    }

    #[test]
    fn street_action_rejects_discarded_placement() {
        let mut state = GameState::fresh();
        state.deal(&cards(&["As", "Ks", "Qs", "Js", "Ts"])).unwrap();
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
        state.deal(&cards(&["2c", "3d", "4h"])).unwrap();
        let action = Action::Street {
            placements: [(card("4h"), RowId::Top), (card("3d"), RowId::Middle)],
            discard: card("4h"),
        };
        assert_eq!(state.apply_mut(&action), Err(StateError::CardNotDealt(card("4h"))));
    }

    #[test]
    fn future_draws_need_enough_unseen() {
        let mut state = GameState::fresh();
        state.street = Street::First;
        assert!(state.ensure_future_draws().is_ok());
        state.unseen = CardSet::empty();
        assert_eq!(
            state.ensure_future_draws(),
            Err(StateError::NotEnoughUnseen { needed: 9, available: 0 })
        );
        // The last street needs no further draws.
        state.street = Street::Fourth;
        assert!(state.ensure_future_draws().is_ok());
    }

    #[test]
    fn validate_catches_overlapping_sets() {
        let mut state = GameState::fresh();
        state.deal(&cards(&["As", "Ks", "Qs", "Js", "Ts"])).unwrap();
        state.known_opponent.insert(card("As"));
        assert_eq!(state.validate(), Err(StateError::DuplicateCard(card("As"))));
    }

    #[test]
    fn fold_is_not_playable() {
        let mut state = GameState::fresh();
        assert_eq!(state.apply_mut(&Action::Fold), Err(StateError::FoldNotPlayable));
    }
}
