use ofc_core::eval::{evaluate_five, evaluate_three};
use ofc_core::model::card::Card;
use ofc_core::model::card_set::CardSet;
use ofc_core::model::hand_type::HandCategory;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

fn five(texts: [&str; 5]) -> [Card; 5] {
    texts.map(|t| t.parse().expect("valid card"))
}

#[test]
fn wild_resolves_broadway_spades_to_royal_flush() {
    let hand = evaluate_five(&five(["As", "Ks", "Qs", "Js", "Xj"]));
    assert_eq!(hand.category, HandCategory::RoyalFlush);
}

#[test]
fn wild_resolves_three_aces_to_quads_not_full_house() {
    let hand = evaluate_five(&five(["Ah", "Ad", "Ac", "Xj", "2s"]));
    assert_eq!(hand.category, HandCategory::Quads);
    assert_eq!(hand.ranks[0], 14);
}

#[test]
fn evaluation_is_invariant_under_permutation() {
    let mut rng = StdRng::seed_from_u64(1234);
    let deck: Vec<Card> = CardSet::full_deck().iter().collect();
    for _ in 0..500 {
        let mut cards: Vec<Card> = deck
            .choose_multiple(&mut rng, 5)
            .copied()
            .collect();
        let reference = evaluate_five(&[cards[0], cards[1], cards[2], cards[3], cards[4]]);
        cards.shuffle(&mut rng);
        let shuffled = evaluate_five(&[cards[0], cards[1], cards[2], cards[3], cards[4]]);
        assert_eq!(reference, shuffled);
    }
}

#[test]
fn wild_never_loses_to_any_manual_substitution() {
    let mut rng = StdRng::seed_from_u64(777);
    let standard: Vec<Card> = CardSet::standard_deck().iter().collect();
    let wild: Card = "Xj".parse().unwrap();
    for _ in 0..200 {
        let fixed: Vec<Card> = standard.choose_multiple(&mut rng, 4).copied().collect();
        let with_wild = evaluate_five(&[fixed[0], fixed[1], fixed[2], fixed[3], wild]);
        for candidate in standard.iter().copied() {
            if fixed.contains(&candidate) {
                continue;
            }
            let manual = evaluate_five(&[fixed[0], fixed[1], fixed[2], fixed[3], candidate]);
            assert!(
                with_wild >= manual,
                "{candidate} beat the wildcard over {fixed:?}"
            );
        }
    }
}

#[test]
fn adding_a_matching_card_is_monotone() {
    // Upgrading a kicker to a matching rank never weakens the hand.
    let before = evaluate_five(&five(["Qc", "Qd", "7h", "5s", "2c"]));
    let paired = evaluate_five(&five(["Qc", "Qd", "7h", "5s", "7c"]));
    let tripped = evaluate_five(&five(["Qc", "Qd", "Qh", "5s", "7c"]));
    assert!(paired > before);
    assert!(tripped > paired);
}

#[test]
fn three_card_hands_reach_only_high_pair_trips() {
    let mut rng = StdRng::seed_from_u64(4242);
    let deck: Vec<Card> = CardSet::full_deck().iter().collect();
    for _ in 0..500 {
        let cards: Vec<Card> = deck.choose_multiple(&mut rng, 3).copied().collect();
        let hand = evaluate_three(&[cards[0], cards[1], cards[2]]);
        assert!(matches!(
            hand.category,
            HandCategory::HighCard | HandCategory::Pair | HandCategory::Trips
        ));
    }
}
