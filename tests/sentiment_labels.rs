use quickcheck_macros::quickcheck;
use sentiment_chart_wasm::domain::chart::TooltipData;
use sentiment_chart_wasm::domain::market_data::Timestamp;
use sentiment_chart_wasm::domain::sentiment::{
    LabelStyle, SENTIMENT_THRESHOLD, SentimentBias, score_to_color, sentiment_label,
};

#[test]
fn sweep_across_the_score_domain() {
    let expected = [
        (-1.0, "Negative", "Bearish"),
        (-0.5, "Negative", "Bearish"),
        (-0.33, "Negative", "Bearish"),
        (-0.32, "Neutral", "Neutral"),
        (0.0, "Neutral", "Neutral"),
        (0.32, "Neutral", "Neutral"),
        (0.33, "Positive", "Bullish"),
        (0.5, "Positive", "Bullish"),
        (1.0, "Positive", "Bullish"),
    ];
    for (score, sentiment, market) in expected {
        assert_eq!(sentiment_label(score, LabelStyle::Sentiment), sentiment, "score {score}");
        assert_eq!(sentiment_label(score, LabelStyle::Market), market, "score {score}");
    }
}

#[quickcheck]
fn both_wordings_agree_on_direction(score: f64) -> bool {
    let bias = SentimentBias::from_score(score);
    let sentiment = sentiment_label(score, LabelStyle::Sentiment);
    let market = sentiment_label(score, LabelStyle::Market);
    match bias {
        SentimentBias::Positive => sentiment == "Positive" && market == "Bullish" && score >= SENTIMENT_THRESHOLD,
        SentimentBias::Negative => sentiment == "Negative" && market == "Bearish" && score <= -SENTIMENT_THRESHOLD,
        SentimentBias::Neutral => sentiment == "Neutral" && market == "Neutral",
    }
}

#[quickcheck]
fn colour_is_always_a_valid_rgb(score: f64) -> bool {
    let color = score_to_color(score);
    color.starts_with("rgb(") && color.ends_with(')') && color.matches(", ").count() == 2
}

#[test]
fn tooltip_and_widgets_share_the_classifier() {
    let tooltip = TooltipData::compose(Timestamp::from_secs(0), (0.0, 0.0), None, Some(0.33), LabelStyle::Market)
        .expect("sentiment present");
    let sample = tooltip.sentiment.expect("sentiment sample");
    assert_eq!(sample.label, sentiment_label(0.33, LabelStyle::Market));
    assert_eq!(sample.color, score_to_color(0.33));
}
