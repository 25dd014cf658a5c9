use chrono::{DateTime, SecondsFormat};
use derive_more::{Constructor, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// Value Object - Price
#[derive(Debug, Clone, Copy, PartialEq, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Price(f64);

impl Price {
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

/// Value Object - Volume
#[derive(Debug, Clone, Copy, PartialEq, From, Into, Deref, Constructor, Serialize, Deserialize)]
pub struct Volume(f64);

impl Volume {
    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Value Object - time-scale coordinate, UTC seconds since the epoch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Deref, Display, Serialize, Deserialize,
)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_secs(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// `2024-01-01T00:00:00Z`; `None` when outside chrono's range.
    pub fn to_iso8601(&self) -> Option<String> {
        DateTime::from_timestamp(self.0, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Value Object - OHLCV bar values
#[derive(Debug, Clone, Copy, PartialEq, Constructor, Serialize, Deserialize)]
pub struct OHLCV {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: Volume,
}

impl OHLCV {
    pub fn is_valid(&self) -> bool {
        self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close
            && self.volume.value() >= 0.0
    }

    /// Bar range as a percentage of the open; 0 for a zero or invalid open.
    pub fn range_percent(&self) -> f64 {
        let open = self.open.value();
        if open <= 0.0 || !open.is_finite() {
            return 0.0;
        }
        (self.high.value() - self.low.value()) / open * 100.0
    }
}

/// Value Object - Ticker symbol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref, Display, Serialize, Deserialize)]
#[display(fmt = "{}", _0)]
pub struct Ticker(String);

impl Ticker {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Ticker {
    fn from(value: &str) -> Self {
        Self(value.trim().to_uppercase())
    }
}

/// Sampling granularity for price bars, finest first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum Resolution {
    #[strum(serialize = "1m")]
    #[serde(rename = "1m")]
    OneMinute,

    #[strum(serialize = "5m")]
    #[serde(rename = "5m")]
    FiveMinutes,

    #[strum(serialize = "15m")]
    #[serde(rename = "15m")]
    FifteenMinutes,

    #[strum(serialize = "30m")]
    #[serde(rename = "30m")]
    ThirtyMinutes,

    #[strum(serialize = "1h")]
    #[serde(rename = "1h")]
    OneHour,

    #[strum(serialize = "4h")]
    #[serde(rename = "4h")]
    FourHours,

    #[strum(serialize = "1d")]
    #[serde(rename = "1d")]
    OneDay,
}

impl Resolution {
    pub fn duration_secs(&self) -> i64 {
        match self {
            Self::OneMinute => 60,
            Self::FiveMinutes => 5 * 60,
            Self::FifteenMinutes => 15 * 60,
            Self::ThirtyMinutes => 30 * 60,
            Self::OneHour => 60 * 60,
            Self::FourHours => 4 * 60 * 60,
            Self::OneDay => 24 * 60 * 60,
        }
    }

    /// Next coarser resolution, `None` for the coarsest.
    pub fn coarser(&self) -> Option<Self> {
        Self::iter().find(|candidate| candidate > self)
    }

    /// Finest resolution the backend serves for a range.
    pub fn finest_for(range: TimeRange) -> Self {
        match range {
            TimeRange::OneDay => Self::OneMinute,
            TimeRange::OneWeek => Self::FiveMinutes,
            TimeRange::OneMonth => Self::OneHour,
            TimeRange::ThreeMonths => Self::FourHours,
            TimeRange::SixMonths | TimeRange::OneYear => Self::OneDay,
        }
    }

    pub fn is_supported_for(&self, range: TimeRange) -> bool {
        *self >= Self::finest_for(range)
    }

    /// Nearest coarser resolution that the range supports (`self` if supported).
    pub fn fallback_for(&self, range: TimeRange) -> Self {
        let mut candidate = *self;
        while !candidate.is_supported_for(range) {
            match candidate.coarser() {
                Some(next) => candidate = next,
                None => break,
            }
        }
        candidate
    }

    /// Lenient parse used for persisted values; anything unknown is `None`.
    pub fn parse_stored(raw: &str) -> Option<Self> {
        raw.trim().trim_matches('"').parse().ok()
    }
}

/// Visible history window requested from the backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum TimeRange {
    #[strum(serialize = "1D")]
    #[serde(rename = "1D")]
    OneDay,

    #[strum(serialize = "1W")]
    #[serde(rename = "1W")]
    OneWeek,

    #[strum(serialize = "1M")]
    #[serde(rename = "1M")]
    OneMonth,

    #[strum(serialize = "3M")]
    #[serde(rename = "3M")]
    ThreeMonths,

    #[strum(serialize = "6M")]
    #[serde(rename = "6M")]
    SixMonths,

    #[strum(serialize = "1Y")]
    #[serde(rename = "1Y")]
    OneYear,
}

/// Origin of the sentiment series.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumIter,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
pub enum SentimentSource {
    #[strum(serialize = "all")]
    #[serde(rename = "all")]
    All,

    #[strum(serialize = "news")]
    #[serde(rename = "news")]
    News,

    #[strum(serialize = "social")]
    #[serde(rename = "social")]
    Social,
}
