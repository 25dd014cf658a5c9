use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo::render::{AnimationFrame, request_animation_frame};
use leptos::html::{Canvas, Div};
use leptos::*;
use strum::IntoEnumIterator;
use wasm_bindgen_futures::spawn_local;
use web_sys::{PointerEvent, WheelEvent};

use crate::application::{ChartConfig, ChartOrchestrator, Layer, ScrubSeries, load_into};
use crate::domain::chart::{ChartOptions, RedrawHandle, TooltipData};
use crate::domain::interaction::provide_scrub_store;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{ChartQuery, Resolution, SentimentSource, TimeRange};
use crate::domain::sentiment::LabelStyle;
use crate::event_utils::on_window_resize_debounced;
use crate::infrastructure::http::HttpChartDataSource;
use crate::infrastructure::rendering::{Canvas2dSurface, CanvasChart};
use crate::infrastructure::storage::SessionPreferenceStore;
use crate::presentation::widgets::{ChartLegend, ScrubPill, SentimentGauge};
use crate::time_utils::format_tooltip_time;
use crate::{log_debug, log_error};

type BrowserChart = CanvasChart<Canvas2dSurface>;
type BrowserOrchestrator = ChartOrchestrator<BrowserChart, SessionPreferenceStore>;

const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Latest values the chart hands to sibling widgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSummary {
    pub ticker: String,
    pub latest_close: Option<f64>,
    pub latest_sentiment: Option<f64>,
}

/// View-side mirror of the orchestrator, refreshed after every change.
#[derive(Debug, Clone, PartialEq)]
struct ChartStatus {
    time_range: TimeRange,
    resolution: Resolution,
    effective_resolution: Option<Resolution>,
    expected_resolution: Resolution,
    source: SentimentSource,
    loading: bool,
    error: Option<String>,
    retryable: bool,
    advisory: Option<String>,
}

/// Option text for the resolution picker; names the resolution that will be
/// shown instead when the range does not serve it.
fn resolution_option_label(resolution: Resolution, range: TimeRange) -> String {
    if resolution.is_supported_for(range) {
        resolution.to_string()
    } else {
        format!("{} ({} for {})", resolution, resolution.fallback_for(range), range)
    }
}

impl ChartStatus {
    fn of(orchestrator: &BrowserOrchestrator) -> Self {
        Self {
            time_range: orchestrator.time_range(),
            resolution: orchestrator.preferred_resolution(),
            effective_resolution: orchestrator.effective_resolution(),
            expected_resolution: orchestrator.expected_resolution(),
            source: orchestrator.source(),
            loading: orchestrator.is_loading(),
            error: orchestrator.error().map(ToString::to_string),
            retryable: orchestrator.error().is_some_and(|e| e.is_retryable()),
            advisory: orchestrator.advisory().map(str::to_string),
        }
    }
}

#[component]
pub fn App(config: ChartConfig) -> impl IntoView {
    provide_scrub_store();
    let summary = create_rw_signal(ChartSummary { ticker: config.ticker.to_string(), ..Default::default() });
    let scrubs_sentiment = config.scrub_series == ScrubSeries::Sentiment;

    view! {
        <div class="sentiment-chart-app">
            <ChartLegend
                ticker=Signal::derive(move || summary.with(|s| s.ticker.clone()))
                close=Signal::derive(move || summary.with(|s| s.latest_close))
                sentiment=Signal::derive(move || summary.with(|s| s.latest_sentiment))
                scrubs_sentiment=scrubs_sentiment
                style=LabelStyle::Market
            />
            <div class="sentiment-chart-app__body">
                <SentimentChart config=config summary=summary />
                <SentimentGauge score=Signal::derive(move || summary.with(|s| s.latest_sentiment.unwrap_or(0.0))) />
            </div>
            <ScrubPill sentiment=scrubs_sentiment />
        </div>
    }
}

/// Canvas chart with selection controls, tooltip, advisory and retry.
#[component]
pub fn SentimentChart(config: ChartConfig, summary: RwSignal<ChartSummary>) -> impl IntoView {
    let canvas_ref = create_node_ref::<Canvas>();
    let container_ref = create_node_ref::<Div>();

    let scrub = crate::domain::interaction::use_scrub_store();
    let preferences = SessionPreferenceStore::new(config.resolution_storage_key.clone());
    let source = Rc::new(HttpChartDataSource::new(config.api_base_url.clone()));
    let debounce_ms = config.resize_debounce_ms;
    let orchestrator: Rc<RefCell<BrowserOrchestrator>> =
        Rc::new(RefCell::new(ChartOrchestrator::new(config, preferences, scrub)));

    let (status, set_status) = create_signal(ChartStatus::of(&orchestrator.borrow()));
    let (tooltip, set_tooltip) = create_signal::<Option<TooltipData>>(None);
    let layers = create_rw_signal((true, true, true));

    let sync: Rc<dyn Fn()> = {
        let orchestrator = Rc::clone(&orchestrator);
        Rc::new(move || {
            let Ok(o) = orchestrator.try_borrow() else { return };
            set_status.set(ChartStatus::of(&o));
            summary.update(|s| {
                s.ticker = o.ticker().to_string();
                s.latest_close = o.latest_close();
                s.latest_sentiment = o.latest_sentiment();
            });
        })
    };

    let fetch: Rc<dyn Fn(Option<ChartQuery>)> = {
        let orchestrator = Rc::clone(&orchestrator);
        let sync = Rc::clone(&sync);
        Rc::new(move |query: Option<ChartQuery>| {
            sync();
            let Some(query) = query else { return };
            let orchestrator = Rc::clone(&orchestrator);
            let source = Rc::clone(&source);
            let sync = Rc::clone(&sync);
            spawn_local(async move {
                load_into(orchestrator, &*source, query).await;
                sync();
            });
        })
    };

    // Host construction once the canvas is in the DOM.
    {
        let orchestrator = Rc::clone(&orchestrator);
        let fetch = Rc::clone(&fetch);
        create_effect(move |initialized: Option<bool>| {
            if initialized == Some(true) {
                return true;
            }
            let Some(canvas) = canvas_ref.get() else { return false };
            let canvas: web_sys::HtmlCanvasElement = (*canvas).clone();
            let surface = match Canvas2dSurface::new(canvas) {
                Ok(surface) => surface,
                Err(e) => {
                    log_error!(LogComponent::Presentation("SentimentChart"), "canvas unavailable: {}", e);
                    return false;
                }
            };
            let (width, height) = {
                let o = orchestrator.borrow();
                (o.config().width, o.config().height)
            };
            let pixel_ratio = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
            surface.set_size(width, height, pixel_ratio);
            let options = ChartOptions { width, height, pixel_ratio, ..ChartOptions::default() };
            let host = CanvasChart::new(surface, options, paint_scheduler(Rc::downgrade(&orchestrator)));

            let query = orchestrator.borrow_mut().initialize(host);
            fetch(query);
            true
        });
    }

    // Debounced window resize; the canvas keeps its configured height.
    let resize = {
        let orchestrator = Rc::clone(&orchestrator);
        on_window_resize_debounced(debounce_ms, move || {
            let Some(container) = container_ref.get_untracked() else { return };
            let width = f64::from(container.client_width());
            let Ok(mut o) = orchestrator.try_borrow_mut() else { return };
            let height = o.config().height;
            o.resize(width, height);
            if let Some(host) = o.host() {
                let options = host.options();
                host.surface().set_size(options.width, options.height, options.pixel_ratio);
            }
        })
    };

    {
        let orchestrator = Rc::clone(&orchestrator);
        on_cleanup(move || {
            drop(resize);
            orchestrator.borrow_mut().dispose();
            log_debug!(LogComponent::Presentation("SentimentChart"), "unmounted");
        });
    }

    let on_pointer_down = {
        let orchestrator = Rc::clone(&orchestrator);
        move |ev: PointerEvent| {
            let Ok(mut o) = orchestrator.try_borrow_mut() else { return };
            o.pointer_down(f64::from(ev.offset_x()), f64::from(ev.offset_y()));
            set_tooltip.set(o.tooltip());
        }
    };
    let on_pointer_move = {
        let orchestrator = Rc::clone(&orchestrator);
        move |ev: PointerEvent| {
            let Ok(mut o) = orchestrator.try_borrow_mut() else { return };
            o.pointer_move(f64::from(ev.offset_x()), f64::from(ev.offset_y()));
            set_tooltip.set(o.tooltip());
        }
    };
    let on_pointer_up = {
        let orchestrator = Rc::clone(&orchestrator);
        move |_: PointerEvent| {
            if let Ok(mut o) = orchestrator.try_borrow_mut() {
                o.pointer_up();
            }
        }
    };
    let on_pointer_leave = {
        let orchestrator = Rc::clone(&orchestrator);
        move |_: PointerEvent| {
            if let Ok(mut o) = orchestrator.try_borrow_mut() {
                o.pointer_leave();
            }
            set_tooltip.set(None);
        }
    };
    let on_pointer_cancel = on_pointer_leave.clone();
    let on_wheel = {
        let orchestrator = Rc::clone(&orchestrator);
        move |ev: WheelEvent| {
            ev.prevent_default();
            let factor = if ev.delta_y() < 0.0 { WHEEL_ZOOM_STEP } else { 1.0 / WHEEL_ZOOM_STEP };
            if let Ok(mut o) = orchestrator.try_borrow_mut() {
                if let Some(host) = o.host_mut() {
                    host.zoom_at(f64::from(ev.offset_x()), factor);
                }
            }
        }
    };

    let on_range = {
        let orchestrator = Rc::clone(&orchestrator);
        let fetch = Rc::clone(&fetch);
        move |ev: web_sys::Event| {
            if let Ok(range) = event_target_value(&ev).parse::<TimeRange>() {
                let query = orchestrator.borrow_mut().set_time_range(range);
                fetch(query);
            }
        }
    };
    let on_resolution = {
        let orchestrator = Rc::clone(&orchestrator);
        let fetch = Rc::clone(&fetch);
        move |ev: web_sys::Event| {
            if let Ok(resolution) = event_target_value(&ev).parse::<Resolution>() {
                let query = orchestrator.borrow_mut().set_resolution(resolution);
                fetch(query);
            }
        }
    };
    let on_source = {
        let orchestrator = Rc::clone(&orchestrator);
        let fetch = Rc::clone(&fetch);
        move |ev: web_sys::Event| {
            if let Ok(source) = event_target_value(&ev).parse::<SentimentSource>() {
                let query = orchestrator.borrow_mut().set_source(source);
                fetch(query);
            }
        }
    };
    let on_retry = {
        let orchestrator = Rc::clone(&orchestrator);
        let fetch = Rc::clone(&fetch);
        move |_: web_sys::MouseEvent| {
            let query = orchestrator.borrow_mut().retry();
            fetch(query);
        }
    };
    let toggle_layer = {
        let orchestrator = Rc::clone(&orchestrator);
        move |layer: Layer, visible: bool| {
            orchestrator.borrow_mut().set_layer_visible(layer, visible);
            layers.update(|(price, sentiment, volatility)| match layer {
                Layer::Price => *price = visible,
                Layer::Sentiment => *sentiment = visible,
                Layer::Volatility => *volatility = visible,
            });
        }
    };

    let layer_toggles = Layer::iter()
        .map(|layer| {
            let toggle_layer = toggle_layer.clone();
            let checked = move || {
                layers.with(|(price, sentiment, volatility)| match layer {
                    Layer::Price => *price,
                    Layer::Sentiment => *sentiment,
                    Layer::Volatility => *volatility,
                })
            };
            view! {
                <label class="chart-controls__layer">
                    <input
                        type="checkbox"
                        aria-label=format!("Show {} layer", layer)
                        prop:checked=checked
                        on:change=move |ev| toggle_layer(layer, event_target_checked(&ev))
                    />
                    {layer.to_string()}
                </label>
            }
        })
        .collect_view();

    view! {
        <div class="sentiment-chart" node_ref=container_ref>
            <div class="chart-controls" role="toolbar" aria-label="Chart controls">
                <select aria-label="Time range" on:change=on_range>
                    {TimeRange::iter()
                        .map(|range| view! {
                            <option value=range.to_string() selected=move || status.with(|s| s.time_range == range)>
                                {range.to_string()}
                            </option>
                        })
                        .collect_view()}
                </select>
                <select aria-label="Price resolution" on:change=on_resolution>
                    {Resolution::iter()
                        .map(|resolution| view! {
                            <option
                                value=resolution.to_string()
                                selected=move || status.with(|s| s.resolution == resolution)
                            >
                                {move || status.with(|s| resolution_option_label(resolution, s.time_range))}
                            </option>
                        })
                        .collect_view()}
                </select>
                <select aria-label="Sentiment source" on:change=on_source>
                    {SentimentSource::iter()
                        .map(|source| view! {
                            <option value=source.to_string() selected=move || status.with(|s| s.source == source)>
                                {source.to_string()}
                            </option>
                        })
                        .collect_view()}
                </select>
                {layer_toggles}
            </div>

            <Show when=move || status.with(|s| s.advisory.is_some())>
                <div class="chart-advisory" role="status">
                    {move || status.with(|s| s.advisory.clone().unwrap_or_default())}
                </div>
            </Show>

            <Show when=move || status.with(|s| s.error.is_some())>
                <div class="chart-error" role="alert">
                    <span>{move || status.with(|s| s.error.clone().unwrap_or_default())}</span>
                    <button
                        class="chart-error__retry"
                        aria-label="Retry loading chart data"
                        style:display=move || if status.with(|s| s.retryable) { "inline-block" } else { "none" }
                        on:click=on_retry.clone()
                    >
                        "Retry"
                    </button>
                </div>
            </Show>

            <div class="chart-wrapper" aria-busy=move || status.with(|s| s.loading.to_string())>
                <canvas
                    node_ref=canvas_ref
                    class="chart-canvas"
                    role="img"
                    aria-label="Price and sentiment chart"
                    style="touch-action: none; cursor: crosshair;"
                    on:pointerdown=on_pointer_down
                    on:pointermove=on_pointer_move
                    on:pointerup=on_pointer_up
                    on:pointerleave=on_pointer_leave
                    on:pointercancel=on_pointer_cancel
                    on:wheel=on_wheel
                />
                <ChartTooltip tooltip=tooltip />
                <Show when=move || status.with(|s| s.loading)>
                    <div class="chart-loading">"Loading…"</div>
                </Show>
            </div>

            <div class="chart-status">
                {move || status.with(|s| match s.effective_resolution.unwrap_or(s.expected_resolution) {
                    effective if effective != s.resolution => format!("{} · {} (showing {})", s.time_range, s.resolution, effective),
                    _ => format!("{} · {}", s.time_range, s.resolution),
                })}
            </div>
        </div>
    }
}

/// Hover tooltip, positioned next to the pointer.
#[component]
fn ChartTooltip(tooltip: ReadSignal<Option<TooltipData>>) -> impl IntoView {
    view! {
        <div
            class="tooltip"
            role="tooltip"
            style:display=move || if tooltip.with(Option::is_some) { "block" } else { "none" }
            style:left=move || tooltip.with(|t| t.as_ref().map(|t| format!("{}px", t.x + 12.0)).unwrap_or_default())
            style:top=move || tooltip.with(|t| t.as_ref().map(|t| format!("{}px", t.y + 12.0)).unwrap_or_default())
        >
            {move || {
                tooltip.with(|t| {
                    t.as_ref().map(|t| {
                        view! {
                            <div class="tooltip__time">{format_tooltip_time(t.time)}</div>
                            {t.price.as_ref().map(|p| view! {
                                <div class="tooltip__price">
                                    {format!("O {:.2}  H {:.2}  L {:.2}  C {:.2} ({:+.2}%)", p.open, p.high, p.low, p.close, p.change_percent)}
                                </div>
                            })}
                            {t.sentiment.as_ref().map(|s| {
                                let color = s.color.clone();
                                view! {
                                    <div class="tooltip__sentiment" style:color=color>
                                        {format!("Sentiment {:+.2} · {}", s.score, s.label)}
                                    </div>
                                }
                            })}
                        }
                    })
                })
            }}
        </div>
    }
}

/// Redraw handle that coalesces requests into one paint per animation frame.
fn paint_scheduler(orchestrator: Weak<RefCell<BrowserOrchestrator>>) -> RedrawHandle {
    let pending: Rc<RefCell<Option<AnimationFrame>>> = Rc::new(RefCell::new(None));
    let scheduled = Rc::new(Cell::new(false));
    RedrawHandle::new(move || {
        if scheduled.replace(true) {
            return;
        }
        let orchestrator = orchestrator.clone();
        let scheduled = Rc::clone(&scheduled);
        let slot = Rc::clone(&pending);
        let frame = request_animation_frame(move |_| {
            scheduled.set(false);
            slot.borrow_mut().take();
            let Some(orchestrator) = orchestrator.upgrade() else { return };
            let Ok(mut o) = orchestrator.try_borrow_mut() else { return };
            if let Some(host) = o.host_mut() {
                host.paint_if_dirty();
            }
        });
        *pending.borrow_mut() = Some(frame);
    })
}

#[cfg(test)]
mod tests {
    use super::resolution_option_label;
    use crate::domain::market_data::{Resolution, TimeRange};

    #[test]
    fn picker_names_the_served_resolution() {
        assert_eq!(resolution_option_label(Resolution::FiveMinutes, TimeRange::OneWeek), "5m");
        assert_eq!(resolution_option_label(Resolution::FiveMinutes, TimeRange::OneYear), "5m (1d for 1Y)");
        assert_eq!(resolution_option_label(Resolution::OneHour, TimeRange::ThreeMonths), "1h (4h for 3M)");
    }
}
