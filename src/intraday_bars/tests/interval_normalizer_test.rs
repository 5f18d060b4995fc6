use intraday_bars::{
    models::interval::{IntervalRequest, IntervalVocabulary},
    providers::{alpha_vantage, barchart, ib, iex},
};
use proptest::prelude::*;

const VOCABULARIES: [&IntervalVocabulary; 4] = [
    &alpha_vantage::VOCABULARY,
    &barchart::VOCABULARY,
    &iex::VOCABULARY,
    &ib::VOCABULARY,
];

fn request() -> impl Strategy<Value = IntervalRequest> {
    prop_oneof![
        any::<i64>().prop_map(IntervalRequest::Minutes),
        (-5i64..2_000).prop_map(IntervalRequest::Minutes),
        "[0-9]{1,4}".prop_map(IntervalRequest::Text),
        "[a-z ]{0,8}".prop_map(IntervalRequest::Text),
        prop::sample::select(vec!["d", "w", "m", "1 hour", "5min", "daily", "30 secs"])
            .prop_map(|s| IntervalRequest::Text(s.to_string())),
    ]
}

proptest! {
    #[test]
    fn normalizing_is_idempotent_and_total(raw in request()) {
        for vocab in VOCABULARIES {
            let once = vocab.normalize(raw.clone());
            prop_assert_eq!(vocab.normalize(once.label()), once.clone(), "{} produced {:?}", vocab.provider(), once);
            prop_assert_eq!(vocab.normalize(&once), once);
        }
    }

    #[test]
    fn counts_past_the_widest_bucket_land_on_it(minutes in 60i64..=i64::MAX) {
        let ib_token = ib::VOCABULARY.normalize(minutes);
        prop_assert_eq!(ib_token.label(), "1 hour");
        let av_token = alpha_vantage::VOCABULARY.normalize(minutes);
        prop_assert_eq!(av_token.label(), "60min");
        let ib_text_token = ib::VOCABULARY.normalize(minutes.to_string());
        prop_assert_eq!(ib_text_token.label(), "1 hour");
    }

    #[test]
    fn minutes_never_round_up(minutes in 1i64..600) {
        for vocab in VOCABULARIES {
            let token = vocab.normalize(minutes);
            prop_assert!(i64::from(token.minutes()) <= minutes);
        }
    }
}

#[test]
fn seven_minutes_per_vendor() {
    assert_eq!(ib::VOCABULARY.normalize(7).label(), "5 mins");
    assert_eq!(alpha_vantage::VOCABULARY.normalize(7).label(), "5min");
    assert_eq!(barchart::VOCABULARY.normalize(7).label(), "7");
    assert_eq!(iex::VOCABULARY.normalize(7).label(), "7");
}

#[test]
fn oversized_counts_at_the_edges() {
    assert_eq!(ib::VOCABULARY.normalize(i64::MAX).label(), "1 hour");
    assert_eq!(ib::VOCABULARY.normalize(i64::MAX / 60 + 1).label(), "1 hour");
    assert_eq!(alpha_vantage::VOCABULARY.normalize("99999999999999999999999").label(), "60min");
    assert_eq!(barchart::VOCABULARY.normalize(i64::MAX).label(), u32::MAX.to_string());
    assert_eq!(iex::VOCABULARY.normalize(10_000).label(), "10000");
    // Widest intraday bucket, one minute short.
    assert_eq!(ib::VOCABULARY.normalize(59).label(), "30 mins");
}
