use euchre_core::belief::{CardState, ChanceChart, DealSampler, Holder};
use euchre_core::game::match_state::MatchState;
use euchre_core::model::bidding::{BidProgress, BidStage};
use euchre_core::model::card::{Card, DECK_SIZE};
use euchre_core::model::player::Seat;
use euchre_core::model::round::{PlayOutcome, RoundState};
use euchre_core::model::suit::Suit;
use euchre_core::model::trick::Trick;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn fresh_charts(round: &RoundState) -> Vec<ChanceChart> {
    Seat::LOOP
        .iter()
        .map(|&seat| ChanceChart::new(seat, round.hand(seat), round.upcard()).unwrap())
        .collect()
}

fn random_suit_except(rng: &mut StdRng, forbidden: Suit) -> Suit {
    let allowed: Vec<Suit> = Suit::ALL
        .iter()
        .copied()
        .filter(|suit| *suit != forbidden)
        .collect();
    allowed[rng.gen_range(0..allowed.len())]
}

fn actual_holder(round: &RoundState, discard: Option<Card>, card: Card) -> Option<Holder> {
    if let Some(seat) = Seat::LOOP
        .iter()
        .copied()
        .find(|seat| round.hand(*seat).contains(card))
    {
        return Some(Holder::Seat(seat));
    }
    if round.kitty().contains(&card) || discard == Some(card) {
        return Some(Holder::Kitty);
    }
    None
}

fn check_charts(round: &RoundState, charts: &[ChanceChart], discard: Option<Card>) {
    assert_eq!(round.card_count(), DECK_SIZE);
    for chart in charts {
        let own = round.hand(chart.perspective());
        DealSampler::new(chart, own, true).expect("unseen pool matches hand sizes");
        for card in Card::all() {
            let holder = actual_holder(round, discard, card);
            for candidate in Holder::ALL {
                match chart.state(candidate, card) {
                    CardState::Has => assert_eq!(holder, Some(candidate), "{card} misplaced"),
                    CardState::Lacks => assert_ne!(holder, Some(candidate), "{card} ruled out"),
                    CardState::Unknown => {}
                }
            }
            if holder.is_some() {
                assert!((chart.column_mass(card) - 1.0).abs() < 1e-4);
            }
        }
    }
}

/// Random bidding in the spirit of a coin-flip agent; returns the dealer's discard if any.
fn bid(round: &mut RoundState, charts: &mut [ChanceChart], rng: &mut StdRng) -> Option<Card> {
    let dealer = round.dealer();
    let upcard = round.upcard();
    while let Some(stage) = round.bid_stage() {
        let seat = round.expected_actor().unwrap();
        match stage {
            BidStage::RoundOne if rng.gen_bool(0.3) => {
                round.order_up(seat).unwrap();
                let hand = round.hand(dealer).cards().to_vec();
                let discard = hand[rng.gen_range(0..hand.len())];
                round.discard(dealer, discard).unwrap();
                for chart in charts.iter_mut() {
                    let seen = (chart.perspective() == dealer).then_some(discard);
                    chart.note_pickup(dealer, upcard, seen).unwrap();
                }
                return Some(discard);
            }
            BidStage::RoundTwo if rng.gen_bool(0.3) => {
                let suit = random_suit_except(rng, upcard.suit);
                round.call_trump(seat, suit).unwrap();
            }
            BidStage::DealerForced => {
                let suit = random_suit_except(rng, upcard.suit);
                round.force_trump(seat, suit).unwrap();
            }
            _ => {
                if let BidProgress::UpcardTurnedDown { upcard } = round.pass(seat).unwrap() {
                    for chart in charts.iter_mut() {
                        chart.card_played(Holder::Kitty, upcard).unwrap();
                        chart.recompute_probabilities().unwrap();
                    }
                }
            }
        }
        assert_eq!(round.card_count(), DECK_SIZE);
    }
    None
}

fn play(round: &mut RoundState, charts: &mut [ChanceChart], discard: Option<Card>, rng: &mut StdRng) {
    let trump = round.trump().unwrap();
    while let Some(seat) = round.expected_actor() {
        let lead = round.current_trick().and_then(Trick::lead_suit);
        let legal = round.legal_cards(seat);
        let card = legal[rng.gen_range(0..legal.len())];
        let outcome = round.play_card(seat, card).unwrap();
        assert_eq!(round.card_count(), DECK_SIZE);

        for chart in charts.iter_mut() {
            chart.card_played(Holder::Seat(seat), card).unwrap();
            if let Some(lead) = lead {
                if card.effective_suit(trump) != lead {
                    chart.did_not_follow(Holder::Seat(seat), lead, trump).unwrap();
                }
            }
        }

        if !matches!(outcome, PlayOutcome::Played) {
            for chart in charts.iter_mut() {
                chart.recompute_probabilities().unwrap();
            }
            check_charts(round, charts, discard);
        }
    }
}

#[test]
fn seeded_games_keep_cards_and_beliefs_consistent() {
    for seed in 0..12u64 {
        let mut match_state = MatchState::with_seed(Seat::P1, seed);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x00E0_C4E0);
        let mut rounds = 0;

        while !match_state.is_over() {
            let round = match_state.round_mut();
            let mut charts = fresh_charts(round);
            check_charts(round, &charts, None);

            let discard = bid(round, &mut charts, &mut rng);
            check_charts(round, &charts, discard);
            play(round, &mut charts, discard, &mut rng);

            let result = round.result().expect("round finished");
            assert_eq!(result.tricks.iter().sum::<u8>(), 5);

            match_state.finish_round_and_start_next();
            rounds += 1;
            assert!(rounds < 200, "game should reach the target score");
        }

        let winner = match_state.winner().unwrap();
        assert!(match_state.scores().score(winner) >= 10);
        assert!(match_state.scores().score(winner.other()) < 10);
    }
}
