use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use sentiment_chart_wasm::application::{ChartConfig, ChartOrchestrator, Layer, OrchestratorState, ScrubSeries};
use sentiment_chart_wasm::domain::chart::{
    ChartOptions, CrosshairHandler, HostChart, PrimitiveId, PrimitiveRef, RedrawHandle, SeriesData, SeriesId,
    SeriesOptions, SeriesValue, SubscriptionId,
};
use sentiment_chart_wasm::domain::errors::{ChartError, ChartResult};
use sentiment_chart_wasm::domain::interaction::ScrubStore;
use sentiment_chart_wasm::domain::market_data::{
    Candle, ChartData, ChartDataSource, ChartQuery, OHLCV, Price, Resolution, SentimentPoint, SentimentSource,
    Ticker, TimeRange, Timestamp, Volume,
};
use sentiment_chart_wasm::infrastructure::rendering::{CanvasChart, RecordingSurface};
use sentiment_chart_wasm::infrastructure::storage::MemoryPreferenceStore;

/// 2024-01-01T00:00:00Z
const T0: i64 = 1_704_067_200;
const HOUR: i64 = 3_600;

/// Canvas host that also records the lifecycle calls made on it.
struct SpyHost {
    inner: CanvasChart<RecordingSurface>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl SpyHost {
    fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let inner = CanvasChart::new(RecordingSurface::new(), ChartOptions::default(), RedrawHandle::noop());
        (Self { inner, calls: Rc::clone(&calls) }, calls)
    }

    fn record(&self, call: &str) {
        self.calls.borrow_mut().push(call.to_string());
    }
}

impl HostChart for SpyHost {
    fn add_series(&mut self, options: SeriesOptions) -> SeriesId {
        self.inner.add_series(options)
    }
    fn remove_series(&mut self, series: SeriesId) {
        self.inner.remove_series(series)
    }
    fn set_series_data(&mut self, series: SeriesId, data: SeriesData) {
        self.inner.set_series_data(series, data)
    }
    fn set_series_visible(&mut self, series: SeriesId, visible: bool) {
        self.inner.set_series_visible(series, visible)
    }
    fn is_series_visible(&self, series: SeriesId) -> bool {
        self.inner.is_series_visible(series)
    }
    fn sample(&self, series: SeriesId, time: Timestamp) -> Option<SeriesValue> {
        self.inner.sample(series, time)
    }
    fn time_to_coordinate(&self, time: Timestamp) -> Option<f64> {
        self.inner.time_to_coordinate(time)
    }
    fn coordinate_to_time(&self, x: f64) -> Option<Timestamp> {
        self.inner.coordinate_to_time(x)
    }
    fn bar_spacing(&self) -> f64 {
        self.inner.bar_spacing()
    }
    fn fit_content(&mut self) {
        self.inner.fit_content()
    }
    fn width(&self) -> f64 {
        self.inner.width()
    }
    fn height(&self) -> f64 {
        self.inner.height()
    }
    fn resize(&mut self, width: f64, height: f64) {
        self.inner.resize(width, height)
    }
    fn subscribe_crosshair_move(&mut self, handler: CrosshairHandler) -> SubscriptionId {
        self.record("subscribe");
        self.inner.subscribe_crosshair_move(handler)
    }
    fn unsubscribe_crosshair_move(&mut self, subscription: SubscriptionId) {
        self.record("unsubscribe");
        self.inner.unsubscribe_crosshair_move(subscription)
    }
    fn set_crosshair_position(&mut self, x: f64, y: f64) {
        self.inner.set_crosshair_position(x, y)
    }
    fn clear_crosshair_position(&mut self) {
        self.inner.clear_crosshair_position()
    }
    fn attach_primitive(&mut self, series: SeriesId, primitive: PrimitiveRef) -> Option<PrimitiveId> {
        self.record("attach");
        self.inner.attach_primitive(series, primitive)
    }
    fn detach_primitive(&mut self, primitive: PrimitiveId) {
        self.record("detach");
        self.inner.detach_primitive(primitive)
    }
    fn request_redraw(&self) {
        self.inner.request_redraw()
    }
    fn remove(&mut self) {
        self.record("remove");
        assert_eq!(self.inner.subscriber_count(), 0, "subscribers released before removal");
        assert_eq!(self.inner.primitive_count(), 0, "primitives detached before removal");
        self.inner.remove()
    }
}

type Orchestrator = ChartOrchestrator<SpyHost, MemoryPreferenceStore>;

fn bar(ts: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle::new(
        Timestamp::from_secs(ts),
        OHLCV::new(Price::from(open), Price::from(high), Price::from(low), Price::from(close), Volume::from(10.0)),
    )
}

fn hourly(count: i64, resolution: Resolution) -> ChartData {
    let candles = (0..count).map(|i| bar(T0 + i * HOUR, 100.0, 105.0, 95.0, 102.0)).collect();
    let sentiment = (0..count).map(|i| SentimentPoint::new(Timestamp::from_secs(T0 + i * HOUR), 0.42)).collect();
    ChartData::new(candles, sentiment, resolution)
}

fn ready(config: ChartConfig) -> (Orchestrator, ChartQuery, ScrubStore, Rc<RefCell<Vec<String>>>) {
    let scrub = ScrubStore::new();
    let mut orchestrator = ChartOrchestrator::new(config, MemoryPreferenceStore::new(), scrub);
    let (host, calls) = SpyHost::new();
    let query = orchestrator.initialize(host).expect("first initialize yields a query");
    (orchestrator, query, scrub, calls)
}

fn x_of(orchestrator: &Orchestrator, ts: i64) -> f64 {
    orchestrator
        .host()
        .and_then(|host| host.time_to_coordinate(Timestamp::from_secs(ts)))
        .expect("bar on screen")
}

#[test]
fn initialize_sets_up_series_shading_and_first_query() {
    let (mut orchestrator, query, _, calls) = ready(ChartConfig::default());

    assert_eq!(orchestrator.state(), OrchestratorState::Ready);
    assert!(orchestrator.is_loading());
    assert_eq!(query.ticker, Ticker::from("SPY"));
    assert_eq!(query.time_range, TimeRange::OneMonth);
    assert_eq!(query.resolution, Resolution::OneHour);
    assert_eq!(query.source, SentimentSource::All);
    assert_eq!(query.generation, 1);

    let host = orchestrator.host().expect("host owned");
    assert_eq!(host.inner.series_count(), 3);
    assert_eq!(host.inner.subscriber_count(), 1);
    assert_eq!(host.inner.primitive_count(), 1);
    assert_eq!(*calls.borrow(), vec!["attach", "subscribe"]);

    let (second, _) = SpyHost::new();
    assert!(orchestrator.initialize(second).is_none());
}

#[test]
fn only_the_latest_generation_is_applied() {
    let (mut orchestrator, first, _, _) = ready(ChartConfig::default());
    let second = orchestrator.set_time_range(TimeRange::OneWeek).expect("range changed");
    assert_eq!(second.generation, first.generation + 1);

    assert!(!orchestrator.apply_data(first.generation, hourly(3, Resolution::OneHour)));
    assert!(orchestrator.data().is_none());
    assert!(orchestrator.is_loading());

    assert!(orchestrator.apply_data(second.generation, hourly(5, Resolution::OneHour)));
    assert_eq!(orchestrator.data().map(|d| d.candles.len()), Some(5));
    assert!(!orchestrator.is_loading());
    assert_eq!(orchestrator.latest_close(), Some(102.0));
    assert_eq!(orchestrator.latest_sentiment(), Some(0.42));

    // A late error for the superseded request is ignored too.
    assert!(!orchestrator.apply_error(first.generation, ChartError::Network("timeout".into())));
    assert!(orchestrator.error().is_none());
}

#[test]
fn unchanged_selection_issues_no_request() {
    let (mut orchestrator, query, _, _) = ready(ChartConfig::default());
    assert!(orchestrator.set_time_range(TimeRange::OneMonth).is_none());
    assert!(orchestrator.set_source(SentimentSource::All).is_none());
    assert!(orchestrator.set_ticker(Ticker::from("spy")).is_none());
    assert_eq!(orchestrator.generation(), query.generation);

    let news = orchestrator.set_source(SentimentSource::News).expect("source changed");
    assert_eq!(news.source, SentimentSource::News);
    let aapl = orchestrator.set_ticker(Ticker::from("aapl")).expect("ticker changed");
    assert_eq!(aapl.ticker.value(), "AAPL");
    assert_eq!(aapl.source, SentimentSource::News);
}

#[test]
fn errors_wait_for_a_manual_retry() {
    let (mut orchestrator, query, _, _) = ready(ChartConfig::default());
    assert!(orchestrator.apply_error(query.generation, ChartError::Network("HTTP 503".into())));
    assert!(!orchestrator.is_loading());
    let error = orchestrator.error().expect("error recorded");
    assert!(error.is_retryable());
    assert_eq!(error.to_string(), "Network Error: HTTP 503");

    let retry = orchestrator.retry().expect("ready charts can retry");
    assert_eq!(retry.generation, query.generation + 1);
    assert!(orchestrator.error().is_none());
    assert!(orchestrator.is_loading());

    assert!(orchestrator.apply_data(retry.generation, hourly(2, Resolution::OneHour)));
    assert!(orchestrator.error().is_none());
}

#[test]
fn gaps_are_recomputed_for_each_dataset() {
    let (mut orchestrator, query, _, _) = ready(ChartConfig::default());
    let mut data = hourly(4, Resolution::OneHour);
    data.candles.push(bar(T0 + 20 * HOUR, 100.0, 101.0, 99.0, 100.0));
    assert!(orchestrator.apply_data(query.generation, data));
    let markers = orchestrator.gap_markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].time, Timestamp::from_secs(T0 + 20 * HOUR));
    assert_eq!(markers[0].index, 4);

    let next = orchestrator.set_time_range(TimeRange::OneDay).expect("range changed");
    assert!(orchestrator.apply_data(next.generation, hourly(4, Resolution::OneHour)));
    assert!(orchestrator.gap_markers().is_empty());
}

#[test]
fn tooltip_combines_price_and_sentiment() {
    let (mut orchestrator, query, _, _) = ready(ChartConfig::default());
    assert!(orchestrator.apply_data(query.generation, hourly(3, Resolution::OneHour)));

    let x = x_of(&orchestrator, T0 + HOUR);
    orchestrator.pointer_move(x, 120.0);
    let tooltip = orchestrator.tooltip().expect("bar under the pointer");
    assert_eq!(tooltip.time, Timestamp::from_secs(T0 + HOUR));
    assert_eq!((tooltip.x, tooltip.y), (x, 120.0));

    insta::assert_snapshot!(tooltip.formatted_text(), @r###"
    2024-01-01T01:00:00Z
    Open:   100.00
    High:   105.00
    Low:    95.00
    Close:  102.00 (+2.00%)
    Sentiment: +0.42 (Positive)
    "###);

    orchestrator.pointer_leave();
    assert!(orchestrator.tooltip().is_none());
}

#[test]
fn hidden_layers_drop_out_of_the_tooltip() {
    let (mut orchestrator, query, _, _) = ready(ChartConfig::default());
    assert!(orchestrator.apply_data(query.generation, hourly(3, Resolution::OneHour)));
    let x = x_of(&orchestrator, T0 + 2 * HOUR);

    orchestrator.set_layer_visible(Layer::Sentiment, false);
    assert!(!orchestrator.is_layer_visible(Layer::Sentiment));
    orchestrator.pointer_move(x, 50.0);
    let tooltip = orchestrator.tooltip().expect("price still visible");
    assert!(tooltip.price.is_some());
    assert!(tooltip.sentiment.is_none());

    orchestrator.set_layer_visible(Layer::Price, false);
    orchestrator.pointer_move(x, 50.0);
    assert!(orchestrator.tooltip().is_none(), "nothing visible under the pointer");

    orchestrator.set_layer_visible(Layer::Sentiment, true);
    orchestrator.pointer_move(x, 50.0);
    let tooltip = orchestrator.tooltip().expect("sentiment visible again");
    assert!(tooltip.price.is_none());
    assert_eq!(tooltip.sentiment.map(|s| s.score), Some(0.42));
}

#[test]
fn drag_writes_the_shared_scrub_store() {
    let (mut orchestrator, query, scrub, _) = ready(ChartConfig::default());
    assert!(orchestrator.apply_data(query.generation, hourly(4, Resolution::OneHour)));
    let x = x_of(&orchestrator, T0 + HOUR);

    orchestrator.pointer_move(x, 10.0);
    assert!(!scrub.snapshot().is_scrubbing, "hover alone does not scrub");

    orchestrator.pointer_down(x, 10.0);
    let state = scrub.snapshot();
    assert!(state.is_scrubbing);
    assert_eq!(state.position, x / 800.0 * 100.0);
    assert_eq!(state.value, Some(0.42));
    assert_eq!(state.timestamp.as_deref(), Some("2024-01-01T01:00:00Z"));

    orchestrator.pointer_up();
    let state = scrub.snapshot();
    assert!(!state.is_scrubbing);
    assert_eq!(state.value, None);
    assert_eq!(state.position, x / 800.0 * 100.0);
    assert!(orchestrator.tooltip().is_some(), "tooltip stays while hovering");
}

#[test]
fn drag_over_a_bar_without_sentiment_holds_the_last_sample() {
    let (mut orchestrator, query, scrub, _) = ready(ChartConfig::default());
    let mut data = hourly(4, Resolution::OneHour);
    data.sentiment.retain(|point| point.timestamp != Timestamp::from_secs(T0 + 2 * HOUR));
    assert!(orchestrator.apply_data(query.generation, data));
    let first = x_of(&orchestrator, T0 + HOUR);
    let sparse = x_of(&orchestrator, T0 + 2 * HOUR);

    orchestrator.pointer_down(first, 10.0);
    orchestrator.pointer_move(sparse, 10.0);
    let state = scrub.snapshot();
    assert!(state.is_scrubbing);
    assert_eq!(state.position, sparse / 800.0 * 100.0, "position follows the pointer");
    assert_eq!(state.value, Some(0.42));
    assert_eq!(state.timestamp.as_deref(), Some("2024-01-01T01:00:00Z"));
    assert!(state.is_consistent());
}

#[test]
fn price_scrubbing_carries_the_close() {
    let config = ChartConfig { scrub_series: ScrubSeries::Price, ..ChartConfig::default() };
    let (mut orchestrator, query, scrub, _) = ready(config);
    assert!(orchestrator.apply_data(query.generation, hourly(2, Resolution::OneHour)));
    let x = x_of(&orchestrator, T0);

    orchestrator.pointer_down(x, 10.0);
    assert_eq!(scrub.snapshot().value, Some(102.0));
}

#[test]
fn resize_reaches_the_host() {
    let (mut orchestrator, _, _, _) = ready(ChartConfig::default());
    orchestrator.resize(640.0, 320.0);
    let host = orchestrator.host().expect("host owned");
    assert_eq!((host.width(), host.height()), (640.0, 320.0));
}

#[test]
fn dispose_releases_everything_once() {
    let (mut orchestrator, query, scrub, calls) = ready(ChartConfig::default());
    assert!(orchestrator.apply_data(query.generation, hourly(3, Resolution::OneHour)));
    let x = x_of(&orchestrator, T0);
    orchestrator.pointer_down(x, 10.0);
    assert!(scrub.snapshot().is_scrubbing);

    orchestrator.dispose();
    assert_eq!(orchestrator.state(), OrchestratorState::Disposed);
    assert!(orchestrator.host().is_none());
    assert!(!scrub.snapshot().is_scrubbing, "an owned gesture ends with the chart");
    assert_eq!(*calls.borrow(), vec!["attach", "subscribe", "unsubscribe", "detach", "remove"]);

    orchestrator.dispose();
    assert_eq!(calls.borrow().len(), 5);

    assert!(!orchestrator.apply_data(query.generation, hourly(3, Resolution::OneHour)));
    assert!(orchestrator.set_time_range(TimeRange::OneYear).is_none());
    assert!(orchestrator.retry().is_none());
    orchestrator.pointer_down(x, 10.0);
    orchestrator.pointer_move(x, 10.0);
    orchestrator.set_layer_visible(Layer::Price, false);
    assert!(!scrub.snapshot().is_scrubbing);
    assert!(orchestrator.tooltip().is_none());
}

#[test]
fn calls_before_initialize_are_ignored() {
    let scrub = ScrubStore::new();
    let mut orchestrator: Orchestrator =
        ChartOrchestrator::new(ChartConfig::default(), MemoryPreferenceStore::new(), scrub);
    assert_eq!(orchestrator.state(), OrchestratorState::Uninitialized);
    assert!(orchestrator.set_time_range(TimeRange::OneWeek).is_none());
    assert_eq!(orchestrator.time_range(), TimeRange::OneWeek, "selection is kept for the first load");
    assert!(!orchestrator.apply_data(0, hourly(2, Resolution::OneHour)));
    orchestrator.pointer_down(10.0, 10.0);
    assert!(!scrub.snapshot().is_scrubbing);

    let (host, _) = SpyHost::new();
    let query = orchestrator.initialize(host).expect("initialize");
    assert_eq!(query.time_range, TimeRange::OneWeek);
}

struct FixedSource(ChartResult<ChartData>);

impl ChartDataSource for FixedSource {
    fn fetch(&self, _query: ChartQuery) -> LocalBoxFuture<'static, ChartResult<ChartData>> {
        futures::future::ready(self.0.clone()).boxed_local()
    }
}

#[test]
fn load_into_routes_results_by_generation() {
    let (orchestrator, query, _, _) = ready(ChartConfig::default());
    let orchestrator = Rc::new(RefCell::new(orchestrator));

    let source = FixedSource(Ok(hourly(6, Resolution::OneHour)));
    futures::executor::block_on(sentiment_chart_wasm::application::load_into(
        Rc::clone(&orchestrator),
        &source,
        query.clone(),
    ));
    assert_eq!(orchestrator.borrow().data().map(|d| d.candles.len()), Some(6));

    let next = orchestrator.borrow_mut().set_time_range(TimeRange::OneWeek).expect("range changed");
    let failing = FixedSource(Err(ChartError::Decode("unexpected token".into())));
    futures::executor::block_on(sentiment_chart_wasm::application::load_into(
        Rc::clone(&orchestrator),
        &failing,
        next,
    ));
    let orchestrator = orchestrator.borrow();
    assert_eq!(orchestrator.error(), Some(&ChartError::Decode("unexpected token".into())));
    assert_eq!(orchestrator.data().map(|d| d.candles.len()), Some(6), "previous data stays on screen");
}
