pub mod limiter;
pub mod polygon;

use chrono::{Local, Months, NaiveDate};
use enum_map::Enum;
use serde::{Deserialize, Serialize};

use std::fmt;

pub use reqwest::StatusCode;

/// Stock symbol, stored inline so it stays `Copy` and cheap to key maps with.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticker {
    bytes: [u8; Ticker::MAX_LEN],
}

impl Ticker {
    pub const MAX_LEN: usize = 16;

    /// # Panics
    ///
    /// Will panic on symbols [`Ticker::parse`] would reject. Use `parse`
    /// for untrusted input.
    pub fn new(symbol: &str) -> Self {
        match Self::parse(symbol) {
            Ok(ticker) => ticker,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn parse(symbol: &str) -> Result<Self, InvalidTicker> {
        if symbol.is_empty() || symbol.len() > Self::MAX_LEN {
            return Err(InvalidTicker(symbol.to_string()));
        }
        if !symbol.as_bytes().iter().all(|&b| b.is_ascii_graphic()) {
            return Err(InvalidTicker(symbol.to_string()));
        }

        let mut bytes = [0u8; Self::MAX_LEN];
        bytes[..symbol.len()].copy_from_slice(symbol.as_bytes());
        Ok(Ticker { bytes })
    }

    #[inline]
    fn as_str(&self) -> &str {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(Self::MAX_LEN);
        std::str::from_utf8(&self.bytes[..end]).unwrap_or_default()
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticker({})", self.as_str())
    }
}

impl Serialize for Ticker {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ticker::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTicker(pub String);

impl fmt::Display for InvalidTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid ticker symbol (1-{} printable ASCII chars): {:?}",
            Ticker::MAX_LEN,
            self.0
        )
    }
}

impl std::error::Error for InvalidTicker {}

/// Which daily price component a chart projects.
///
/// Each variant maps to its own bar component; see [`PriceBar::field`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Enum)]
pub enum PriceField {
    Open,
    High,
    Low,
    #[default]
    Close,
}

impl PriceField {
    pub const ALL: [PriceField; 4] = [
        PriceField::Open,
        PriceField::High,
        PriceField::Low,
        PriceField::Close,
    ];
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
            PriceField::Close => "Close",
        })
    }
}

/// One daily OHLC observation, as Polygon serializes it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PriceBar {
    #[serde(rename = "t")]
    pub time: u64,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: Option<f64>,
}

impl PriceBar {
    pub fn field(&self, field: PriceField) -> f64 {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => self.close,
        }
    }
}

/// One row of the ticker directory. Optional descriptive fields are
/// simply absent for some listings and render blank downstream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stock {
    pub ticker: Ticker,
    pub name: String,
    #[serde(default)]
    pub primary_exchange: Option<String>,
    #[serde(default)]
    pub currency_name: Option<String>,
}

/// A directory page plus the opaque forward cursor, when there is one.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StockPage {
    #[serde(default)]
    pub results: Vec<Stock>,
    #[serde(default)]
    pub next_url: Option<String>,
}

/// The charted date window. `from` is strictly before `to`; both sit
/// inside the [`DateBounds`] the data plan allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn with_from(self, from: NaiveDate, bounds: &DateBounds) -> Result<Self, DateRangeError> {
        if from < bounds.min || from > bounds.max {
            return Err(DateRangeError::OutOfBounds);
        }
        if from >= self.to {
            return Err(DateRangeError::FromNotBeforeTo);
        }
        Ok(Self { from, to: self.to })
    }

    pub fn with_to(self, to: NaiveDate, bounds: &DateBounds) -> Result<Self, DateRangeError> {
        if to < bounds.min || to > bounds.max {
            return Err(DateRangeError::OutOfBounds);
        }
        if to <= self.from {
            return Err(DateRangeError::ToNotAfterFrom);
        }
        Ok(Self {
            from: self.from,
            to,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateRangeError {
    #[error("date is outside the available two-year window")]
    OutOfBounds,
    #[error("start date must be before the end date")]
    FromNotBeforeTo,
    #[error("end date must be after the start date")]
    ToNotAfterFrom,
}

/// Oldest and newest dates the data plan serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DateBounds {
    /// Historical aggregates only go back two years on the current plan.
    pub fn last_two_years() -> Self {
        let max = Local::now().date_naive();
        let min = max - Months::new(24);
        Self { min, max }
    }

    pub fn full_range(&self) -> DateRange {
        DateRange {
            from: self.min,
            to: self.max,
        }
    }
}

/// Failure classes for one REST round trip. No retries happen at this
/// layer; callers decide whether an error is worth another attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The server answered with a non-2xx status.
    #[error("HTTP error: status {0}")]
    Status(reqwest::StatusCode),
    /// The request went out but nothing usable came back.
    #[error("no response received: {0}")]
    NoResponse(String),
    /// The request never made it out (bad URL, builder failure).
    #[error("request setup failed: {0}")]
    Setup(String),
    /// A body arrived but did not decode.
    #[error("unparsable response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ProviderError::Status(status)
        } else if err.is_builder() {
            ProviderError::Setup(err.to_string())
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::NoResponse(err.to_string())
        }
    }
}
