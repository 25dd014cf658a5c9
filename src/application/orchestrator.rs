use std::cell::RefCell;
use std::rc::Rc;

use derive_more::Display;
use strum::{EnumIter, IntoEnumIterator};

use crate::application::config::{ChartConfig, ScrubSeries};
use crate::domain::chart::{
    CrosshairEvent, GapMarker, HostChart, LinePoint, PriceScaleId, PrimitiveId, PrimitiveRef, SeriesData, SeriesId,
    SeriesOptions, SubscriptionId, TooltipData, detect_gaps,
};
use crate::domain::errors::ChartError;
use crate::domain::interaction::ScrubStore;
use crate::domain::logging::LogComponent;
use crate::domain::market_data::{
    ChartData, ChartDataSource, ChartQuery, Resolution, ResolutionPreference, SentimentSource, Ticker, TimeRange,
};
use crate::domain::sentiment::LabelStyle;
use crate::infrastructure::rendering::GapShadingPrimitive;
use crate::{log_debug, log_info, log_warn};

const SENTIMENT_COLOR: &str = "#2962ff";
const VOLATILITY_UP_COLOR: &str = "rgba(38, 166, 154, 0.5)";
const VOLATILITY_DOWN_COLOR: &str = "rgba(239, 83, 80, 0.5)";

/// Lifecycle of one mounted chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OrchestratorState {
    #[display(fmt = "uninitialized")]
    Uninitialized,
    #[display(fmt = "ready")]
    Ready,
    #[display(fmt = "disposed")]
    Disposed,
}

/// Independently toggleable chart layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Layer {
    #[display(fmt = "price")]
    Price,
    #[display(fmt = "sentiment")]
    Sentiment,
    #[display(fmt = "volatility")]
    Volatility,
}

#[derive(Debug, Clone, Copy)]
struct SeriesIds {
    price: SeriesId,
    sentiment: SeriesId,
    volatility: SeriesId,
}

impl SeriesIds {
    fn of(&self, layer: Layer) -> SeriesId {
        match layer {
            Layer::Price => self.price,
            Layer::Sentiment => self.sentiment,
            Layer::Volatility => self.volatility,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct LayerVisibility {
    price: bool,
    sentiment: bool,
    volatility: bool,
}

impl LayerVisibility {
    fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Price => self.price,
            Layer::Sentiment => self.sentiment,
            Layer::Volatility => self.volatility,
        }
    }

    fn set(&mut self, layer: Layer, visible: bool) {
        match layer {
            Layer::Price => self.price = visible,
            Layer::Sentiment => self.sentiment = visible,
            Layer::Volatility => self.volatility = visible,
        }
    }
}

/// Owns one host chart with a price and a sentiment axis over a shared time
/// axis, the range/resolution/source selection, and the pointer to scrub and
/// tooltip translation.
///
/// Fetching is driven from outside: selection changes return the
/// [`ChartQuery`] to load, results come back through [`apply_data`] or
/// [`apply_error`] tagged with the query's generation.
///
/// [`apply_data`]: ChartOrchestrator::apply_data
/// [`apply_error`]: ChartOrchestrator::apply_error
pub struct ChartOrchestrator<H: HostChart, P: ResolutionPreference> {
    config: ChartConfig,
    preferences: P,
    scrub: ScrubStore,
    label_style: LabelStyle,
    state: OrchestratorState,
    host: Option<H>,
    series: Option<SeriesIds>,
    subscription: Option<SubscriptionId>,
    gap_primitive: Rc<RefCell<GapShadingPrimitive>>,
    primitive_id: Option<PrimitiveId>,
    tooltip: Rc<RefCell<Option<TooltipData>>>,
    layers: LayerVisibility,

    ticker: Ticker,
    time_range: TimeRange,
    preferred_resolution: Resolution,
    source: SentimentSource,
    generation: u64,

    data: Option<ChartData>,
    effective_resolution: Option<Resolution>,
    advisory: Option<String>,
    error: Option<ChartError>,
    loading: bool,
    owns_scrub: bool,
}

impl<H: HostChart, P: ResolutionPreference> ChartOrchestrator<H, P> {
    /// Reads the stored resolution once; anything unusable means the
    /// configured default.
    pub fn new(config: ChartConfig, preferences: P, scrub: ScrubStore) -> Self {
        let preferred_resolution = preferences.load().unwrap_or(config.default_resolution);
        let mut gap_primitive = GapShadingPrimitive::new(config.height);
        gap_primitive.set_color(config.gap_color.clone());

        log_info!(
            LogComponent::Application("ChartOrchestrator"),
            "created for {} ({} / {})",
            config.ticker,
            config.default_time_range,
            preferred_resolution
        );

        Self {
            ticker: config.ticker.clone(),
            time_range: config.default_time_range,
            source: config.default_source,
            preferred_resolution,
            config,
            preferences,
            scrub,
            label_style: LabelStyle::default(),
            state: OrchestratorState::Uninitialized,
            host: None,
            series: None,
            subscription: None,
            gap_primitive: Rc::new(RefCell::new(gap_primitive)),
            primitive_id: None,
            tooltip: Rc::new(RefCell::new(None)),
            layers: LayerVisibility { price: true, sentiment: true, volatility: true },
            generation: 0,
            data: None,
            effective_resolution: None,
            advisory: None,
            error: None,
            loading: false,
            owns_scrub: false,
        }
    }

    pub fn with_label_style(mut self, style: LabelStyle) -> Self {
        self.label_style = style;
        self
    }

    /// Take ownership of a constructed host: add the three series, attach gap
    /// shading to the price series and subscribe to crosshair moves.
    /// Returns the first query to load.
    pub fn initialize(&mut self, mut host: H) -> Option<ChartQuery> {
        if self.state != OrchestratorState::Uninitialized {
            log_warn!(LogComponent::Application("ChartOrchestrator"), "initialize called while {}", self.state);
            return None;
        }

        let ids = SeriesIds {
            price: host.add_series(SeriesOptions::candlestick(self.ticker.value())),
            sentiment: host.add_series(SeriesOptions::line("Sentiment", SENTIMENT_COLOR, PriceScaleId::Right)),
            volatility: host.add_series(SeriesOptions::histogram("Volatility", VOLATILITY_UP_COLOR)),
        };
        for layer in Layer::iter() {
            host.set_series_visible(ids.of(layer), self.layers.get(layer));
        }

        let primitive: PrimitiveRef = self.gap_primitive.clone();
        self.primitive_id = host.attach_primitive(ids.price, primitive);
        self.gap_primitive.borrow_mut().set_chart_height(host.height());

        let tooltip = Rc::clone(&self.tooltip);
        let style = self.label_style;
        self.subscription = Some(host.subscribe_crosshair_move(Box::new(move |event: &CrosshairEvent| {
            *tooltip.borrow_mut() = compose_tooltip(event, ids, style);
        })));

        self.host = Some(host);
        self.series = Some(ids);
        self.state = OrchestratorState::Ready;
        log_debug!(LogComponent::Application("ChartOrchestrator"), "ready");
        Some(self.begin_request())
    }

    fn begin_request(&mut self) -> ChartQuery {
        self.generation += 1;
        self.loading = true;
        self.error = None;
        let expected = self.expected_resolution();
        if expected != self.preferred_resolution {
            log_debug!(
                LogComponent::Application("ChartOrchestrator"),
                "{} is not served for {}, expecting {}",
                self.preferred_resolution,
                self.time_range,
                expected
            );
        }
        self.current_query()
    }

    fn is_ready(&self) -> bool {
        self.state == OrchestratorState::Ready
    }

    /// Query for the current selection. The preferred resolution is always
    /// requested; the backend decides whether it has to fall back.
    pub fn current_query(&self) -> ChartQuery {
        ChartQuery {
            ticker: self.ticker.clone(),
            time_range: self.time_range,
            resolution: self.preferred_resolution,
            source: self.source,
            generation: self.generation,
        }
    }

    fn reselect(&mut self, changed: bool) -> Option<ChartQuery> {
        (changed && self.is_ready()).then(|| self.begin_request())
    }

    pub fn set_time_range(&mut self, range: TimeRange) -> Option<ChartQuery> {
        if self.state == OrchestratorState::Disposed {
            return None;
        }
        let changed = self.time_range != range;
        self.time_range = range;
        self.reselect(changed)
    }

    /// Explicit user choice: persisted for the session.
    pub fn set_resolution(&mut self, resolution: Resolution) -> Option<ChartQuery> {
        if self.state == OrchestratorState::Disposed {
            return None;
        }
        let changed = self.preferred_resolution != resolution;
        self.preferred_resolution = resolution;
        self.preferences.save(resolution);
        self.reselect(changed)
    }

    pub fn set_source(&mut self, source: SentimentSource) -> Option<ChartQuery> {
        if self.state == OrchestratorState::Disposed {
            return None;
        }
        let changed = self.source != source;
        self.source = source;
        self.reselect(changed)
    }

    pub fn set_ticker(&mut self, ticker: Ticker) -> Option<ChartQuery> {
        if self.state == OrchestratorState::Disposed {
            return None;
        }
        let changed = self.ticker != ticker;
        self.ticker = ticker;
        self.reselect(changed)
    }

    /// Manual retry after an error. Never called automatically.
    pub fn retry(&mut self) -> Option<ChartQuery> {
        self.is_ready().then(|| self.begin_request())
    }

    /// Push a fetch result into the chart. Results for anything but the latest
    /// generation are dropped, as is everything outside `Ready`.
    pub fn apply_data(&mut self, generation: u64, data: ChartData) -> bool {
        if !self.is_ready() {
            log_debug!(LogComponent::Application("ChartOrchestrator"), "ignoring data while {}", self.state);
            return false;
        }
        if generation != self.generation {
            log_debug!(
                LogComponent::Application("ChartOrchestrator"),
                "dropping stale response {} (current {})",
                generation,
                self.generation
            );
            return false;
        }
        let (Some(host), Some(ids)) = (self.host.as_mut(), self.series) else {
            return false;
        };

        let data = data.normalized();
        let volatility: Vec<LinePoint> = data
            .candles
            .iter()
            .map(|c| {
                let color = if c.is_bullish() { VOLATILITY_UP_COLOR } else { VOLATILITY_DOWN_COLOR };
                LinePoint::colored(c.timestamp, c.volatility(), color)
            })
            .collect();
        let sentiment: Vec<LinePoint> =
            data.sentiment.iter().map(|p| LinePoint::new(p.timestamp, p.score)).collect();

        host.set_series_data(ids.price, SeriesData::Bars(data.candles.clone()));
        host.set_series_data(ids.sentiment, SeriesData::Points(sentiment));
        host.set_series_data(ids.volatility, SeriesData::Points(volatility));

        let gaps = detect_gaps(&data.candles, data.resolution);
        {
            let mut primitive = self.gap_primitive.borrow_mut();
            primitive.set_chart_height(host.height());
            primitive.update_gaps(gaps);
        }
        host.fit_content();

        self.advisory = data.resolution_fallback.then(|| {
            data.fallback_message.clone().unwrap_or_else(|| {
                format!(
                    "{} bars are not available for {}; showing {} bars instead.",
                    self.preferred_resolution, self.time_range, data.resolution
                )
            })
        });
        self.effective_resolution = Some(data.resolution);
        self.loading = false;
        self.error = None;
        log_info!(
            LogComponent::Application("ChartOrchestrator"),
            "applied {} bars / {} sentiment points at {}{}",
            data.candles.len(),
            data.sentiment.len(),
            data.resolution,
            if data.resolution_fallback { " (fallback)" } else { "" }
        );
        self.data = Some(data);
        true
    }

    /// Record a fetch failure for the latest generation.
    pub fn apply_error(&mut self, generation: u64, error: ChartError) -> bool {
        if !self.is_ready() || generation != self.generation {
            return false;
        }
        log_warn!(LogComponent::Application("ChartOrchestrator"), "load failed: {}", error);
        self.error = Some(error);
        self.loading = false;
        true
    }

    pub fn set_layer_visible(&mut self, layer: Layer, visible: bool) {
        if self.state == OrchestratorState::Disposed {
            return;
        }
        self.layers.set(layer, visible);
        if let (Some(host), Some(ids)) = (self.host.as_mut(), self.series) {
            host.set_series_visible(ids.of(layer), visible);
        }
    }

    pub fn is_layer_visible(&self, layer: Layer) -> bool {
        self.layers.get(layer)
    }

    fn position_percent(&self, x: f64) -> f64 {
        match &self.host {
            Some(host) if host.width() > 0.0 => x / host.width() * 100.0,
            _ => 0.0,
        }
    }

    /// Gesture start: this chart becomes the scrub writer.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if !self.is_ready() {
            return;
        }
        self.owns_scrub = true;
        self.scrub.start_scrub(self.position_percent(x));
        self.pointer_move(x, y);
    }

    /// Hover or drag. The tooltip follows the pointer; the scrub store is only
    /// written while this chart owns the gesture.
    ///
    /// Over a bar without a sample for the scrubbed series (sentiment is
    /// sparser than candles) the position still follows the pointer and the
    /// last sampled value and timestamp are held.
    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if !self.is_ready() {
            return;
        }
        let position = self.position_percent(x);
        if let Some(host) = self.host.as_mut() {
            host.set_crosshair_position(x, y);
        }
        if !self.owns_scrub {
            return;
        }
        let sample = self.tooltip.borrow().as_ref().and_then(|tooltip| {
            let value = match self.config.scrub_series {
                ScrubSeries::Sentiment => tooltip.sentiment.as_ref().map(|s| s.score),
                ScrubSeries::Price => tooltip.price.as_ref().map(|p| p.close),
            };
            Some((value?, tooltip.timestamp_iso.clone()?))
        });
        let held = self.scrub.snapshot();
        match sample.or(held.value.zip(held.timestamp)) {
            Some((value, timestamp)) => self.scrub.update_scrub(position, value, timestamp),
            None => self.scrub.start_scrub(position),
        }
    }

    /// Gesture end. The tooltip stays while the pointer hovers.
    pub fn pointer_up(&mut self) {
        if self.owns_scrub {
            self.owns_scrub = false;
            self.scrub.end_scrub();
        }
    }

    /// Pointer left the plot or the gesture was cancelled.
    pub fn pointer_leave(&mut self) {
        self.pointer_up();
        if let Some(host) = self.host.as_mut() {
            host.clear_crosshair_position();
        }
        *self.tooltip.borrow_mut() = None;
    }

    pub fn tooltip(&self) -> Option<TooltipData> {
        self.tooltip.borrow().clone()
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        if !self.is_ready() {
            return;
        }
        if let Some(host) = self.host.as_mut() {
            host.resize(width, height);
            self.gap_primitive.borrow_mut().set_chart_height(host.height());
            host.request_redraw();
        }
    }

    /// Unsubscribe, detach the gap primitive and release the host. Repeated
    /// calls do nothing.
    pub fn dispose(&mut self) {
        if self.state == OrchestratorState::Disposed {
            return;
        }
        self.pointer_up();
        if let Some(mut host) = self.host.take() {
            if let Some(subscription) = self.subscription.take() {
                host.unsubscribe_crosshair_move(subscription);
            }
            if let Some(primitive) = self.primitive_id.take() {
                host.detach_primitive(primitive);
            }
            host.remove();
        }
        self.series = None;
        *self.tooltip.borrow_mut() = None;
        self.loading = false;
        self.state = OrchestratorState::Disposed;
        log_debug!(LogComponent::Application("ChartOrchestrator"), "disposed");
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn host(&self) -> Option<&H> {
        self.host.as_ref()
    }

    pub fn host_mut(&mut self) -> Option<&mut H> {
        self.host.as_mut()
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    pub fn preferred_resolution(&self) -> Resolution {
        self.preferred_resolution
    }

    /// Resolution the backend should serve for the current selection, from the
    /// client-side support table. The response stays authoritative.
    pub fn expected_resolution(&self) -> Resolution {
        self.preferred_resolution.fallback_for(self.time_range)
    }

    /// Resolution currently on screen; differs from the preferred one after a
    /// fallback.
    pub fn effective_resolution(&self) -> Option<Resolution> {
        self.effective_resolution
    }

    pub fn source(&self) -> SentimentSource {
        self.source
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn advisory(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn error(&self) -> Option<&ChartError> {
        self.error.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn gap_markers(&self) -> Vec<GapMarker> {
        self.gap_primitive.borrow().markers().to_vec()
    }

    pub fn data(&self) -> Option<&ChartData> {
        self.data.as_ref()
    }

    /// Most recent sentiment score, shown by widgets when nothing is scrubbed.
    pub fn latest_sentiment(&self) -> Option<f64> {
        self.data.as_ref()?.sentiment.last().map(|p| p.score)
    }

    pub fn latest_close(&self) -> Option<f64> {
        self.data.as_ref()?.candles.last().map(|c| c.ohlcv.close.value())
    }
}

fn compose_tooltip(event: &CrosshairEvent, ids: SeriesIds, style: LabelStyle) -> Option<TooltipData> {
    let point = event.point?;
    let time = event.time?;
    let price = event.value_of(ids.price).and_then(|value| value.as_bar());
    let sentiment = event.value_of(ids.sentiment).map(|value| value.primary());
    TooltipData::compose(time, point, price, sentiment, style)
}

/// Fetch `query` and hand the outcome to the orchestrator. The borrow is only
/// taken after the await, so pointer handlers keep working while loading.
pub async fn load_into<H, P, D>(orchestrator: Rc<RefCell<ChartOrchestrator<H, P>>>, source: &D, query: ChartQuery)
where
    H: HostChart,
    P: ResolutionPreference,
    D: ChartDataSource + ?Sized,
{
    let generation = query.generation;
    let result = source.fetch(query).await;
    let mut orchestrator = orchestrator.borrow_mut();
    match result {
        Ok(data) => {
            orchestrator.apply_data(generation, data);
        }
        Err(error) => {
            orchestrator.apply_error(generation, error);
        }
    }
}
