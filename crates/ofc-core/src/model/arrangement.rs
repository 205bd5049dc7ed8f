use crate::eval::{evaluate_five, evaluate_three};
use crate::model::card::Card;
use crate::model::card_set::CardSet;
use crate::model::hand_type::{HandCategory, HandType};
use crate::model::rank::Rank;
use crate::model::row::{Row, RowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrangementError {
    RowFull(RowId),
    DuplicateCard(Card),
}

/// The three face-up rows a player builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrangement {
    top: Row,
    middle: Row,
    bottom: Row,
}

impl Default for Arrangement {
    fn default() -> Self {
        Self::new()
    }
}

impl Arrangement {
    pub fn new() -> Self {
        Self {
            top: Row::new(RowId::Top),
            middle: Row::new(RowId::Middle),
            bottom: Row::new(RowId::Bottom),
        }
    }

    pub fn row(&self, id: RowId) -> &Row {
        match id {
            RowId::Top => &self.top,
            RowId::Middle => &self.middle,
            RowId::Bottom => &self.bottom,
        }
    }

    fn row_mut(&mut self, id: RowId) -> &mut Row {
        match id {
            RowId::Top => &mut self.top,
            RowId::Middle => &mut self.middle,
            RowId::Bottom => &mut self.bottom,
        }
    }

    pub fn can_place(&self, id: RowId) -> bool {
        !self.row(id).is_full()
    }

    pub fn place(&mut self, card: Card, id: RowId) -> Result<(), ArrangementError> {
        if self.contains(card) {
            return Err(ArrangementError::DuplicateCard(card));
        }
        if !self.row_mut(id).push(card) {
            return Err(ArrangementError::RowFull(id));
        }
        Ok(())
    }

    pub fn contains(&self, card: Card) -> bool {
        RowId::ALL.iter().any(|&id| self.row(id).contains(card))
    }

    pub fn card_count(&self) -> usize {
        RowId::ALL.iter().map(|&id| self.row(id).len()).sum()
    }

    /// All placed cards as a set.
    pub fn placed(&self) -> CardSet {
        let mut set = CardSet::empty();
        for id in RowId::ALL {
            for card in self.row(id).iter() {
                set.insert(card);
            }
        }
        set
    }

    pub fn is_complete(&self) -> bool {
        RowId::ALL.iter().all(|&id| self.row(id).is_full())
    }

    /// Hand type of a row; `None` until the row is full.
    pub fn row_hand_type(&self, id: RowId) -> Option<HandType> {
        let row = self.row(id);
        if !row.is_full() {
            return None;
        }
        Some(match id {
            RowId::Top => {
                let mut cards = [Card::from_index(0).expect("index 0"); 3];
                for (slot, card) in cards.iter_mut().zip(row.iter()) {
                    *slot = card;
                }
                evaluate_three(&cards)
            }
            RowId::Middle | RowId::Bottom => {
                let mut cards = [Card::from_index(0).expect("index 0"); 5];
                for (slot, card) in cards.iter_mut().zip(row.iter()) {
                    *slot = card;
                }
                evaluate_five(&cards)
            }
        })
    }

    /// A complete arrangement fouls when the rows are not ordered
    /// `bottom >= middle >= top` by hand strength. Incomplete arrangements
    /// never report as fouled.
    pub fn is_fouled(&self) -> bool {
        match (
            self.row_hand_type(RowId::Top),
            self.row_hand_type(RowId::Middle),
            self.row_hand_type(RowId::Bottom),
        ) {
            (Some(top), Some(middle), Some(bottom)) => bottom < middle || middle < top,
            _ => false,
        }
    }

    /// Royalty total for a complete, non-fouled arrangement; zero otherwise.
    pub fn royalties(&self) -> u32 {
        if !self.is_complete() || self.is_fouled() {
            return 0;
        }
        let mut total = 0;
        if let Some(top) = self.row_hand_type(RowId::Top) {
            total += top_royalty(top);
        }
        if let Some(middle) = self.row_hand_type(RowId::Middle) {
            total += middle_royalty(middle.category);
        }
        if let Some(bottom) = self.row_hand_type(RowId::Bottom) {
            total += bottom_royalty(bottom.category);
        }
        total
    }

    /// Fantasy Land entry: top row pair of queens or better, no foul.
    pub fn qualifies_fantasy_land(&self) -> bool {
        if !self.is_complete() || self.is_fouled() {
            return false;
        }
        match self.row_hand_type(RowId::Top) {
            Some(top) => match top.category {
                HandCategory::Trips => true,
                HandCategory::Pair => top.ranks[0] >= Rank::Queen.value(),
                _ => false,
            },
            None => false,
        }
    }

    /// Fantasy Land retention: trips on top, or quads or better in the middle
    /// or bottom row. A scoring signal only.
    pub fn retains_fantasy_land(&self) -> bool {
        if !self.is_complete() || self.is_fouled() {
            return false;
        }
        let trips_top = self
            .row_hand_type(RowId::Top)
            .is_some_and(|top| top.category == HandCategory::Trips);
        let quads_plus = [RowId::Middle, RowId::Bottom].iter().any(|&id| {
            self.row_hand_type(id)
                .is_some_and(|hand| hand.category >= HandCategory::Quads)
        });
        trips_top || quads_plus
    }
}

/// Top-row royalties: pair of sixes through aces score 1..9, trips of rank r
/// score 10 + (r - 2).
pub fn top_royalty(hand: HandType) -> u32 {
    match hand.category {
        HandCategory::Pair if hand.ranks[0] >= 6 => (hand.ranks[0] - 5) as u32,
        HandCategory::Trips => 8 + hand.ranks[0] as u32,
        _ => 0,
    }
}

pub fn middle_royalty(category: HandCategory) -> u32 {
    match category {
        HandCategory::Trips => 2,
        HandCategory::Straight => 4,
        HandCategory::Flush => 8,
        HandCategory::FullHouse => 12,
        HandCategory::Quads => 20,
        HandCategory::StraightFlush => 30,
        HandCategory::RoyalFlush => 50,
        _ => 0,
    }
}

pub fn bottom_royalty(category: HandCategory) -> u32 {
    match category {
        HandCategory::Straight => 2,
        HandCategory::Flush => 4,
        HandCategory::FullHouse => 6,
        HandCategory::Quads => 10,
        HandCategory::StraightFlush => 15,
        HandCategory::RoyalFlush => 25,
        _ => 0,
    }
}
