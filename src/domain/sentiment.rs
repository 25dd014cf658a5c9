//! Score classification and colouring shared by the chart tooltip and every
//! display widget. Keep all threshold checks going through this module.

use serde::Serialize;
use strum::{AsRefStr, Display as StrumDisplay};

use crate::domain::market_data::clamp_score;

/// Boundary between neutral and a directional label.
pub const SENTIMENT_THRESHOLD: f64 = 0.33;

/// Direction of a sentiment score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SentimentBias {
    Positive,
    Neutral,
    Negative,
}

/// Wording used by a widget: sentiment ("Positive") or market ("Bullish").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, StrumDisplay, AsRefStr)]
pub enum LabelStyle {
    #[default]
    #[strum(serialize = "sentiment")]
    Sentiment,
    #[strum(serialize = "market")]
    Market,
}

impl SentimentBias {
    pub fn from_score(score: f64) -> Self {
        if score >= SENTIMENT_THRESHOLD {
            Self::Positive
        } else if score <= -SENTIMENT_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn label(&self, style: LabelStyle) -> &'static str {
        match (self, style) {
            (Self::Positive, LabelStyle::Sentiment) => "Positive",
            (Self::Positive, LabelStyle::Market) => "Bullish",
            (Self::Negative, LabelStyle::Sentiment) => "Negative",
            (Self::Negative, LabelStyle::Market) => "Bearish",
            (Self::Neutral, _) => "Neutral",
        }
    }
}

pub fn sentiment_label(score: f64, style: LabelStyle) -> &'static str {
    SentimentBias::from_score(score).label(style)
}

const BEARISH_RGB: (f64, f64, f64) = (239.0, 68.0, 68.0);
const NEUTRAL_RGB: (f64, f64, f64) = (156.0, 163.0, 175.0);
const BULLISH_RGB: (f64, f64, f64) = (34.0, 197.0, 94.0);

/// Continuous red → grey → green gradient over [-1, 1].
///
/// Total: out-of-range scores clamp, NaN is treated as neutral.
pub fn score_to_color(score: f64) -> String {
    let score = clamp_score(score);
    let (from, to, t) = if score < 0.0 {
        (NEUTRAL_RGB, BEARISH_RGB, -score)
    } else {
        (NEUTRAL_RGB, BULLISH_RGB, score)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    format!("rgb({}, {}, {})", lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

/// `+0.42` / `-0.10` style rendering of a score.
pub fn format_score(score: f64) -> String {
    format!("{:+.2}", clamp_score(score))
}

/// Score rendered as a signed percentage, e.g. `+42%`.
pub fn format_percent(score: f64) -> String {
    format!("{:+.0}%", clamp_score(score) * 100.0)
}

/// Gauge needle angle in degrees: -90 (fully bearish) to 90 (fully bullish).
pub fn gauge_angle(score: f64) -> f64 {
    clamp_score(score) * 90.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(sentiment_label(0.33, LabelStyle::Sentiment), "Positive");
        assert_eq!(sentiment_label(-0.33, LabelStyle::Market), "Bearish");
        assert_eq!(sentiment_label(0.3299, LabelStyle::Market), "Neutral");
    }

    #[test]
    fn gradient_endpoints() {
        assert_eq!(score_to_color(1.0), "rgb(34, 197, 94)");
        assert_eq!(score_to_color(-1.0), "rgb(239, 68, 68)");
        assert_eq!(score_to_color(0.0), "rgb(156, 163, 175)");
        assert_eq!(score_to_color(f64::NAN), score_to_color(0.0));
        assert_eq!(score_to_color(5.0), score_to_color(1.0));
    }

    #[test]
    fn formatting() {
        assert_eq!(format_score(0.4213), "+0.42");
        assert_eq!(format_percent(-0.5), "-50%");
        assert_eq!(gauge_angle(-1.0), -90.0);
    }
}
