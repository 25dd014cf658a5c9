use std::cell::RefCell;
use std::rc::Rc;

use leptos::*;

use crate::domain::animation::AnimatedValue;
use crate::domain::interaction::{ScrubState, use_scrub_store};
use crate::domain::sentiment::{LabelStyle, format_percent, format_score, gauge_angle, score_to_color, sentiment_label};
use crate::infrastructure::frame::BrowserFrameScheduler;

const NUMBER_DURATION_SECS: f64 = 0.6;
const SCORE_DURATION_SECS: f64 = 0.8;
/// Score jumps at least this large replay the sweep from neutral.
pub const SCORE_RESTART_THRESHOLD: f64 = 0.25;

/// Displayed value that eases towards `target` on every change.
///
/// One interpolation at a time per widget; it is cancelled synchronously on
/// unmount so no frame writes into a disposed signal.
fn use_animated_value(target: MaybeSignal<f64>, duration_secs: f64, restart_threshold: Option<f64>) -> ReadSignal<f64> {
    let (displayed, set_displayed) = create_signal(0.0);
    let mut animated = AnimatedValue::new(BrowserFrameScheduler, 0.0, duration_secs, move |value| {
        set_displayed.set(value)
    });
    if let Some(threshold) = restart_threshold {
        animated = animated.with_restart_threshold(threshold, 0.0);
    }
    let animated = Rc::new(RefCell::new(animated));

    {
        let animated = Rc::clone(&animated);
        create_effect(move |_| {
            let to = target.get();
            animated.borrow_mut().set_target(to);
        });
    }
    on_cleanup(move || animated.borrow_mut().stop());
    displayed
}

/// Counter that animates between values.
#[component]
pub fn AnimatedNumber(
    #[prop(into)] value: MaybeSignal<f64>,
    #[prop(default = 0)] decimals: usize,
    #[prop(optional)] prefix: &'static str,
    #[prop(optional)] suffix: &'static str,
) -> impl IntoView {
    let displayed = use_animated_value(value, NUMBER_DURATION_SECS, None);
    view! {
        <span class="animated-number">
            {move || format!("{}{:.*}{}", prefix, decimals, displayed.get(), suffix)}
        </span>
    }
}

/// Score badge; label and colour follow the interpolated score, so a change
/// of direction sweeps through the gradient.
#[component]
pub fn SentimentBadge(
    #[prop(into)] score: MaybeSignal<f64>,
    #[prop(optional)] style: LabelStyle,
) -> impl IntoView {
    let displayed = use_animated_value(score, SCORE_DURATION_SECS, Some(SCORE_RESTART_THRESHOLD));
    view! {
        <span
            class="sentiment-badge"
            style:color=move || score_to_color(displayed.get())
            aria-label=move || format!("Sentiment {}", sentiment_label(displayed.get(), style))
        >
            <span class="sentiment-badge__score">{move || format_score(displayed.get())}</span>
            " "
            <span class="sentiment-badge__label">{move || sentiment_label(displayed.get(), style)}</span>
        </span>
    }
}

/// Half-dial gauge over [-1, 1].
#[component]
pub fn SentimentGauge(#[prop(into)] score: MaybeSignal<f64>) -> impl IntoView {
    let displayed = use_animated_value(score, SCORE_DURATION_SECS, Some(SCORE_RESTART_THRESHOLD));
    view! {
        <div class="sentiment-gauge" role="meter" aria-valuemin="-1" aria-valuemax="1"
            aria-valuenow=move || format!("{:.2}", displayed.get())
            aria-label="Sentiment gauge"
        >
            <div class="sentiment-gauge__dial"></div>
            <div
                class="sentiment-gauge__needle"
                style:transform=move || format!("rotate({:.1}deg)", gauge_angle(displayed.get()))
                style:background-color=move || score_to_color(displayed.get())
            ></div>
            <div class="sentiment-gauge__value" style:color=move || score_to_color(displayed.get())>
                {move || format_percent(displayed.get())}
            </div>
        </div>
    }
}

/// Floating pill that follows an active scrub on any chart.
#[component]
pub fn ScrubPill(
    /// Whether the scrubbed value is a sentiment score (coloured) or a price.
    #[prop(default = true)]
    sentiment: bool,
) -> impl IntoView {
    let scrub = use_scrub_store();
    let visible = move || scrub.is_scrubbing() && scrub.value().is_some();
    view! {
        <Show when=visible>
            <div
                class="scrub-pill"
                role="status"
                style:left=move || format!("{:.2}%", scrub.position())
                style:color=move || {
                    if sentiment { scrub.value().map(score_to_color).unwrap_or_default() } else { String::new() }
                }
            >
                {move || {
                    let state = scrub.state();
                    let value = state.value.map(|v| if sentiment { format_score(v) } else { format!("{:.2}", v) });
                    format!("{} · {}", value.unwrap_or_default(), state.timestamp.unwrap_or_default())
                }}
            </div>
        </Show>
    }
}

/// Score shown by the legend badge. A scrub only takes over when the
/// scrubbed series is sentiment; a scrubbed price never reaches the badge.
pub fn legend_score(scrub: &ScrubState, scrubs_sentiment: bool, latest: Option<f64>) -> f64 {
    let scrubbed = (scrubs_sentiment && scrub.is_scrubbing).then_some(scrub.value).flatten();
    scrubbed.or(latest).unwrap_or(0.0)
}

/// Ticker header with the last close and the sentiment reading, or the
/// scrubbed sentiment while a gesture is active.
#[component]
pub fn ChartLegend(
    #[prop(into)] ticker: MaybeSignal<String>,
    #[prop(into)] close: MaybeSignal<Option<f64>>,
    #[prop(into)] sentiment: MaybeSignal<Option<f64>>,
    /// Whether scrub values are sentiment scores rather than prices.
    #[prop(default = true)]
    scrubs_sentiment: bool,
    #[prop(optional)] style: LabelStyle,
) -> impl IntoView {
    let scrub = use_scrub_store();
    let shown_score = Signal::derive(move || legend_score(&scrub.state(), scrubs_sentiment, sentiment.get()));
    let close_value = Signal::derive(move || close.get().unwrap_or(0.0));

    view! {
        <div class="chart-legend">
            <span class="chart-legend__ticker">{move || ticker.get()}</span>
            <Show when=move || close.get().is_some()>
                <AnimatedNumber value=close_value decimals=2 prefix="$" />
            </Show>
            <SentimentBadge score=shown_score style=style />
        </div>
    }
}
