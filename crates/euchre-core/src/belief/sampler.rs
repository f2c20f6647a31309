//! Consistent hidden-deal sampling from a [`ChanceChart`].

use super::chart::{ChanceChart, HOLDER_COUNT, Holder};
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::Seat;
use rand::Rng;
use rand::seq::SliceRandom;
use std::array;
use thiserror::Error;

/// Precomputed partition plan for one decision; every `sample` call reuses it.
#[derive(Debug, Clone)]
pub struct DealSampler {
    perspective: Seat,
    own_hand: Hand,
    fixed: [Vec<Card>; HOLDER_COUNT],
    open_slots: [usize; HOLDER_COUNT],
    pool: Vec<Card>,
}

impl DealSampler {
    /// Builds the plan from the chart's unseen pool and hand sizes.
    ///
    /// With `pin_known` set, cards the chart has confirmed at another holder are placed there
    /// before the rest of the pool is shuffled.
    pub fn new(chart: &ChanceChart, own_hand: &Hand, pin_known: bool) -> Result<Self, SamplingError> {
        let mut sizes = [0u8; HOLDER_COUNT];
        for holder in Holder::ALL {
            sizes[holder.index()] = chart.hand_size(holder);
        }
        let pinned = if pin_known { chart.pinned() } else { Vec::new() };
        Self::from_parts(
            chart.perspective(),
            own_hand,
            chart.unseen_pool(),
            &pinned,
            sizes,
        )
    }

    pub fn from_parts(
        perspective: Seat,
        own_hand: &Hand,
        mut pool: Vec<Card>,
        pinned: &[(Holder, Card)],
        sizes: [u8; HOLDER_COUNT],
    ) -> Result<Self, SamplingError> {
        let me = Holder::Seat(perspective).index();
        let mut open_slots: [usize; HOLDER_COUNT] = array::from_fn(|idx| {
            if idx == me { 0 } else { sizes[idx] as usize }
        });

        let expected: usize = open_slots.iter().sum();
        if pool.len() != expected {
            return Err(SamplingError::DealSizeMismatch {
                pool: pool.len(),
                expected,
            });
        }

        let mut fixed: [Vec<Card>; HOLDER_COUNT] = array::from_fn(|_| Vec::new());
        for &(holder, card) in pinned {
            let Some(position) = pool.iter().position(|&c| c == card) else {
                continue;
            };
            let slots = &mut open_slots[holder.index()];
            if *slots == 0 {
                return Err(SamplingError::PinnedOverflow { holder });
            }
            *slots -= 1;
            fixed[holder.index()].push(pool.swap_remove(position));
        }
        pool.sort_by_key(|card| card.to_id());

        Ok(Self {
            perspective,
            own_hand: own_hand.clone(),
            fixed,
            open_slots,
            pool,
        })
    }

    /// Cards left to shuffle after pinning.
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SampledDeal {
        let mut shuffled = self.pool.clone();
        shuffled.shuffle(rng);

        let mut cursor = 0;
        let mut take = |holder: Holder| {
            let h = holder.index();
            let mut cards = self.fixed[h].clone();
            let end = cursor + self.open_slots[h];
            cards.extend_from_slice(&shuffled[cursor..end]);
            cursor = end;
            cards
        };

        let mut hands: [Hand; 4] = array::from_fn(|_| Hand::new());
        for seat in Seat::LOOP {
            hands[seat.index()] = if seat == self.perspective {
                self.own_hand.clone()
            } else {
                Hand::with_cards(take(Holder::Seat(seat)))
            };
        }
        let kitty = take(Holder::Kitty);

        SampledDeal { hands, kitty }
    }
}

/// One concrete assignment of every unseen card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledDeal {
    hands: [Hand; 4],
    kitty: Vec<Card>,
}

impl SampledDeal {
    pub fn hand(&self, seat: Seat) -> &Hand {
        &self.hands[seat.index()]
    }

    pub fn hands(&self) -> &[Hand; 4] {
        &self.hands
    }

    pub fn kitty(&self) -> &[Card] {
        &self.kitty
    }

    pub fn into_hands(self) -> [Hand; 4] {
        self.hands
    }
}

/// Errors that can arise while building a sampling plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplingError {
    #[error("unseen pool has {pool} cards but holders expect {expected}")]
    DealSizeMismatch { pool: usize, expected: usize },
    #[error("more cards pinned to {holder} than it holds")]
    PinnedOverflow { holder: Holder },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::deck::Deck;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashSet;

    fn chart_for(seed: u64, perspective: Seat) -> (ChanceChart, Hand) {
        let deal = Deck::shuffled_with_seed(seed).deal();
        let hand = deal.hands[perspective.index()].clone();
        let chart = ChanceChart::new(perspective, &hand, deal.upcard()).unwrap();
        (chart, hand)
    }

    #[test]
    fn deterministic_with_fixed_seed() {
        let (chart, hand) = chart_for(7, Seat::P3);
        let sampler = DealSampler::new(&chart, &hand, true).unwrap();

        let mut rng_a = SmallRng::seed_from_u64(123);
        let mut rng_b = SmallRng::seed_from_u64(123);
        assert_eq!(sampler.sample(&mut rng_a), sampler.sample(&mut rng_b));
    }

    #[test]
    fn sample_matches_hand_sizes_and_covers_deck() {
        let (chart, hand) = chart_for(11, Seat::P1);
        let sampler = DealSampler::new(&chart, &hand, true).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        let deal = sampler.sample(&mut rng);

        assert_eq!(deal.hand(Seat::P1), &hand);
        let mut seen = HashSet::new();
        for seat in Seat::LOOP {
            assert_eq!(deal.hand(seat).len(), 5);
            seen.extend(deal.hand(seat).iter().copied());
        }
        assert_eq!(deal.kitty().len(), 4);
        seen.extend(deal.kitty().iter().copied());
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn pinned_cards_stay_with_their_holder() {
        let (chart, hand) = chart_for(3, Seat::P2);
        let upcard = chart
            .pinned()
            .into_iter()
            .find(|(holder, _)| *holder == Holder::Kitty)
            .map(|(_, card)| card)
            .unwrap();
        let sampler = DealSampler::new(&chart, &hand, true).unwrap();
        assert_eq!(sampler.pool_size(), 18);
        let mut rng = SmallRng::seed_from_u64(99);
        for _ in 0..20 {
            assert!(sampler.sample(&mut rng).kitty().contains(&upcard));
        }
    }

    #[test]
    fn unpinned_pool_includes_known_cards() {
        let (chart, hand) = chart_for(3, Seat::P2);
        let sampler = DealSampler::new(&chart, &hand, false).unwrap();
        assert_eq!(sampler.pool_size(), 19);
    }

    #[test]
    fn size_mismatch_is_reported() {
        let (chart, hand) = chart_for(1, Seat::P4);
        let mut pool = chart.unseen_pool();
        pool.pop();
        let err = DealSampler::from_parts(Seat::P4, &hand, pool, &[], [5, 5, 5, 5, 4]).unwrap_err();
        assert_eq!(
            err,
            SamplingError::DealSizeMismatch {
                pool: 18,
                expected: 19,
            }
        );
        assert_eq!(err.to_string(), "unseen pool has 18 cards but holders expect 19");
    }

    #[test]
    fn overfull_pin_is_reported() {
        let (chart, hand) = chart_for(1, Seat::P4);
        let pool = chart.unseen_pool();
        let pinned: Vec<_> = pool.iter().take(5).map(|&card| (Holder::Kitty, card)).collect();
        let err = DealSampler::from_parts(Seat::P4, &hand, pool, &pinned, [5, 5, 5, 5, 4]).unwrap_err();
        assert_eq!(err, SamplingError::PinnedOverflow { holder: Holder::Kitty });
        let source: &dyn std::error::Error = &err;
        assert_eq!(source.to_string(), "more cards pinned to Kitty than it holds");
    }
}
