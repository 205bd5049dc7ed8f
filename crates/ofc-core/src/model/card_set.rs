use crate::model::card::{Card, DECK_SIZE};
use core::fmt;
use rand::Rng;

/// A set of cards as a 54-bit mask.
///
/// Bits 0..52 are the standard deck in card-index order; bits 52 and 53 are
/// the two wildcards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CardSet(u64);

const FULL_MASK: u64 = (1u64 << DECK_SIZE) - 1;
const STANDARD_MASK: u64 = (1u64 << 52) - 1;

impl CardSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The 52 standard cards, no wildcards.
    pub const fn standard_deck() -> Self {
        Self(STANDARD_MASK)
    }

    /// All 54 cards including both wildcards.
    pub const fn full_deck() -> Self {
        Self(FULL_MASK)
    }

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits & FULL_MASK)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn from_cards(cards: &[Card]) -> Self {
        let mut set = Self::empty();
        for card in cards {
            set.insert(*card);
        }
        set
    }

    pub fn insert(&mut self, card: Card) {
        self.0 |= 1u64 << card.index();
    }

    pub fn remove(&mut self, card: Card) {
        self.0 &= !(1u64 << card.index());
    }

    pub const fn contains(self, card: Card) -> bool {
        self.0 & (1u64 << card.index()) != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_disjoint(self, other: Self) -> bool {
        self.0 & other.0 == 0
    }

    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The wildcards contained in this set.
    pub const fn wilds(self) -> Self {
        Self(self.0 & !STANDARD_MASK)
    }

    /// The non-wild cards contained in this set.
    pub const fn standard(self) -> Self {
        Self(self.0 & STANDARD_MASK)
    }

    /// Cards in ascending index order.
    pub fn iter(self) -> CardSetIter {
        CardSetIter(self.0)
    }

    /// The `n`-th card (0-based) in ascending index order.
    pub fn nth(self, mut n: u32) -> Option<Card> {
        let mut bits = self.0;
        while bits != 0 {
            let index = bits.trailing_zeros() as u8;
            if n == 0 {
                return Card::from_index(index);
            }
            n -= 1;
            bits &= bits - 1;
        }
        None
    }

    /// Draw `k` cards uniformly without replacement using the supplied RNG.
    ///
    /// Identical RNG state yields an identical draw, which keeps search
    /// traces reproducible. Returns `None` when fewer than `k` cards remain.
    pub fn sample<R: Rng + ?Sized>(self, k: usize, rng: &mut R) -> Option<Vec<Card>> {
        let mut remaining = self;
        let mut drawn = Vec::with_capacity(k);
        for _ in 0..k {
            let size = remaining.len();
            if size == 0 {
                return None;
            }
            let pick = rng.gen_range(0..size);
            let card = remaining.nth(pick).expect("pick below cardinality");
            remaining.remove(card);
            drawn.push(card);
        }
        Some(drawn)
    }
}

impl FromIterator<Card> for CardSet {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut set = Self::empty();
        for card in iter {
            set.insert(card);
        }
        set
    }
}

impl fmt::Display for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for card in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", card)?;
            first = false;
        }
        Ok(())
    }
}

pub struct CardSetIter(u64);

impl Iterator for CardSetIter {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Card::from_index(index)
    }
}
