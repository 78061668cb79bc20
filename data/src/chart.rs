use enum_map::EnumMap;
use provider::{PriceBar, PriceField, Ticker};

/// One charted observation: milliseconds since epoch and the value of
/// the projected price component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: u64,
    pub value: f64,
}

/// A named line on the chart: one ticker's points for one price field.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub ticker: Ticker,
    pub points: Vec<SeriesPoint>,
}

/// Projects bars onto `(time, value)` points for one price field,
/// preserving input order. Bars arrive time-ascending from the API and
/// stay that way.
pub fn transform(bars: &[PriceBar], field: PriceField) -> Vec<SeriesPoint> {
    bars.iter()
        .map(|bar| SeriesPoint {
            time: bar.time,
            value: bar.field(field),
        })
        .collect()
}

/// Per-price-field buckets of named series. Invariant: each bucket holds
/// at most one series per ticker.
#[derive(Debug, Clone, Default)]
pub struct SeriesCollection {
    buckets: EnumMap<PriceField, Vec<ChartSeries>>,
}

impl SeriesCollection {
    /// Transforms `bars` for all four price fields, replacing any series
    /// the ticker already had (a re-fetch never appends a duplicate).
    pub fn upsert(&mut self, ticker: Ticker, bars: &[PriceBar]) {
        self.remove(ticker);

        for field in PriceField::ALL {
            self.buckets[field].push(ChartSeries {
                ticker,
                points: transform(bars, field),
            });
        }
    }

    /// Drops the ticker's series from every bucket. No-op when absent.
    pub fn remove(&mut self, ticker: Ticker) {
        for bucket in self.buckets.values_mut() {
            bucket.retain(|series| series.ticker != ticker);
        }
    }

    pub fn series(&self, field: PriceField) -> &[ChartSeries] {
        &self.buckets[field]
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(Vec::is_empty)
    }
}
