use crate::chart::{ChartSeries, SeriesCollection};
use crate::selection::Selection;

use provider::{DateRange, PriceBar, PriceField, Ticker};
use rustc_hash::FxHashMap;

const GENERIC_FETCH_ERROR: &str = "Failed to fetch data";

/// Where one tracked ticker sits in its load cycle. `Loading` remembers
/// the generation its fetch was issued under; a completion stamped with
/// anything else is stale.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Loading { generation: u64 },
    Loaded,
    Failed,
}

/// A bars fetch the caller should issue. The completion must come back
/// through [`ChartSync::apply_bars`] carrying the same generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticker: Ticker,
    pub range: DateRange,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Committed,
    /// The dashboard moved on since the fetch was issued: the ticker was
    /// deselected, or a newer fetch superseded this one.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub ticker: Ticker,
    pub message: String,
}

/// What the presentation layer should draw.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartView<'a> {
    /// Nothing has ever finished loading and nothing has failed.
    Awaiting,
    /// Every loaded series for the active price field, alongside any
    /// per-ticker failures. Neither side ever hides the other.
    Ready {
        series: &'a [ChartSeries],
        failures: Vec<Failure>,
    },
}

/// Keeps chart series in step with the current selection and date range,
/// tracking each ticker's load independently so one failure never takes
/// down the rest of the chart.
#[derive(Debug, Default)]
pub struct ChartSync {
    phases: FxHashMap<Ticker, Phase>,
    series: SeriesCollection,
    errors: FxHashMap<Ticker, String>,
    generation: u64,
}

impl ChartSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aligns tracked tickers with the selection: deselected tickers lose
    /// their phase, series, and error entry; newly selected ones enter
    /// `Loading` and get a fetch request.
    pub fn reconcile(&mut self, selection: &Selection) -> Vec<FetchRequest> {
        let removed: Vec<Ticker> = self
            .phases
            .keys()
            .copied()
            .filter(|ticker| !selection.is_selected(*ticker))
            .collect();

        for ticker in removed {
            self.phases.remove(&ticker);
            self.series.remove(ticker);
            self.errors.remove(&ticker);
        }

        let added: Vec<Ticker> = selection
            .tickers()
            .iter()
            .copied()
            .filter(|ticker| !self.phases.contains_key(ticker))
            .collect();

        if added.is_empty() {
            return Vec::new();
        }
        self.issue(added, selection.range())
    }

    /// Restarts every selected ticker under a fresh generation, previous
    /// failures included. With nothing selected, nothing is fetched.
    pub fn refetch_all(&mut self, selection: &Selection) -> Vec<FetchRequest> {
        if selection.tickers().is_empty() {
            return Vec::new();
        }
        self.issue(selection.tickers().to_vec(), selection.range())
    }

    fn issue(&mut self, tickers: Vec<Ticker>, range: DateRange) -> Vec<FetchRequest> {
        self.generation += 1;
        let generation = self.generation;

        tickers
            .into_iter()
            .map(|ticker| {
                self.phases.insert(ticker, Phase::Loading { generation });
                FetchRequest {
                    ticker,
                    range,
                    generation,
                }
            })
            .collect()
    }

    /// Commits one completed fetch. On success the ticker's series is
    /// upserted for all four price fields and any previous error is
    /// cleared; on failure the message is recorded and no partial series
    /// is committed. Stale completions are discarded wholesale so a late
    /// response can never resurrect a removed series or overwrite a newer
    /// range's data.
    pub fn apply_bars(
        &mut self,
        ticker: Ticker,
        generation: u64,
        result: Result<Vec<PriceBar>, String>,
    ) -> Applied {
        match self.phases.get(&ticker) {
            Some(Phase::Loading {
                generation: current,
            }) if *current == generation => {}
            _ => return Applied::Stale,
        }

        match result {
            Ok(bars) => {
                self.series.upsert(ticker, &bars);
                self.errors.remove(&ticker);
                self.phases.insert(ticker, Phase::Loaded);
            }
            Err(message) => {
                let message = if message.trim().is_empty() {
                    GENERIC_FETCH_ERROR.to_string()
                } else {
                    message
                };
                self.errors.insert(ticker, message);
                self.phases.insert(ticker, Phase::Failed);
            }
        }

        Applied::Committed
    }

    pub fn is_loading(&self, ticker: Ticker) -> bool {
        matches!(self.phases.get(&ticker), Some(Phase::Loading { .. }))
    }

    pub fn series(&self) -> &SeriesCollection {
        &self.series
    }

    pub fn chart_view(&self, field: PriceField) -> ChartView<'_> {
        if self.series.is_empty() && self.errors.is_empty() {
            return ChartView::Awaiting;
        }

        let mut failures: Vec<Failure> = self
            .errors
            .iter()
            .map(|(ticker, message)| Failure {
                ticker: *ticker,
                message: message.clone(),
            })
            .collect();
        failures.sort_by_key(|failure| failure.ticker);

        ChartView::Ready {
            series: self.series.series(field),
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use chrono::NaiveDate;
    use provider::DateBounds;

    fn selection() -> Selection {
        Selection::new(DateBounds {
            min: NaiveDate::from_ymd_opt(2024, 8, 30).unwrap(),
            max: NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        })
    }

    fn bars() -> Vec<PriceBar> {
        vec![PriceBar {
            time: 1,
            open: 10.0,
            high: 12.0,
            low: 9.0,
            close: 11.0,
            volume: None,
        }]
    }

    fn select(sync: &mut ChartSync, selection: &mut Selection, symbol: &str) -> FetchRequest {
        selection.toggle(Ticker::new(symbol));
        let mut requests = sync.reconcile(selection);
        assert_eq!(requests.len(), 1);
        requests.remove(0)
    }

    #[test]
    fn successful_load_fills_all_fields_and_clears_error() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let request = select(&mut sync, &mut selection, "A");
        assert!(sync.is_loading(request.ticker));

        let applied = sync.apply_bars(request.ticker, request.generation, Ok(bars()));
        assert_eq!(applied, Applied::Committed);

        for field in PriceField::ALL {
            assert_eq!(sync.series().series(field).len(), 1);
        }
        match sync.chart_view(PriceField::Close) {
            ChartView::Ready { series, failures } => {
                assert_eq!(series.len(), 1);
                assert!(failures.is_empty());
            }
            ChartView::Awaiting => panic!("expected a ready chart"),
        }
    }

    #[test]
    fn one_failure_never_hides_another_tickers_series() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let req_a = select(&mut sync, &mut selection, "A");
        let req_aa = select(&mut sync, &mut selection, "AA");

        sync.apply_bars(
            req_a.ticker,
            req_a.generation,
            Err("HTTP error: status 403 Forbidden".to_string()),
        );
        sync.apply_bars(req_aa.ticker, req_aa.generation, Ok(bars()));

        match sync.chart_view(PriceField::Close) {
            ChartView::Ready { series, failures } => {
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].ticker, Ticker::new("AA"));
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].ticker, Ticker::new("A"));
                assert!(failures[0].message.contains("403"));
            }
            ChartView::Awaiting => panic!("expected a ready chart"),
        }
    }

    #[test]
    fn failure_commits_no_partial_series() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let request = select(&mut sync, &mut selection, "A");
        sync.apply_bars(request.ticker, request.generation, Err("boom".to_string()));

        assert!(sync.series().is_empty());
        assert!(matches!(
            sync.chart_view(PriceField::Close),
            ChartView::Ready { .. }
        ));
    }

    #[test]
    fn blank_failure_message_falls_back_to_generic() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let request = select(&mut sync, &mut selection, "A");
        sync.apply_bars(request.ticker, request.generation, Err("  ".to_string()));

        match sync.chart_view(PriceField::Close) {
            ChartView::Ready { failures, .. } => {
                assert_eq!(failures[0].message, GENERIC_FETCH_ERROR);
            }
            ChartView::Awaiting => panic!("expected a failure note"),
        }
    }

    #[test]
    fn deselection_returns_view_to_awaiting() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let request = select(&mut sync, &mut selection, "A");
        sync.apply_bars(request.ticker, request.generation, Ok(bars()));

        selection.toggle(Ticker::new("A"));
        let requests = sync.reconcile(&selection);

        assert!(requests.is_empty());
        assert!(sync.series().is_empty());
        assert_eq!(sync.chart_view(PriceField::Close), ChartView::Awaiting);
    }

    #[test]
    fn completion_after_deselection_is_discarded() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let request = select(&mut sync, &mut selection, "A");

        selection.toggle(Ticker::new("A"));
        sync.reconcile(&selection);

        let applied = sync.apply_bars(request.ticker, request.generation, Ok(bars()));
        assert_eq!(applied, Applied::Stale);
        assert!(sync.series().is_empty());
    }

    #[test]
    fn range_change_refetches_every_selected_ticker() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let req_a = select(&mut sync, &mut selection, "A");
        let req_aa = select(&mut sync, &mut selection, "AA");
        sync.apply_bars(req_a.ticker, req_a.generation, Ok(bars()));
        // "AA" previously failed; it is retried all the same.
        sync.apply_bars(req_aa.ticker, req_aa.generation, Err("boom".to_string()));

        let from = NaiveDate::from_ymd_opt(2025, 8, 30).unwrap();
        selection.set_from(from).unwrap();
        let requests = sync.refetch_all(&selection);

        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.range.from == from));
        assert!(sync.is_loading(Ticker::new("A")));
        assert!(sync.is_loading(Ticker::new("AA")));
    }

    #[test]
    fn range_change_with_empty_selection_fetches_nothing() {
        let selection = selection();
        let mut sync = ChartSync::new();

        assert!(sync.refetch_all(&selection).is_empty());
    }

    #[test]
    fn stale_generation_cannot_overwrite_newer_fetch() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let old = select(&mut sync, &mut selection, "A");

        // Range changes before the first fetch lands.
        let from = NaiveDate::from_ymd_opt(2025, 8, 30).unwrap();
        selection.set_from(from).unwrap();
        let fresh = sync.refetch_all(&selection).remove(0);
        assert!(fresh.generation > old.generation);

        // The superseded completion arrives late and is dropped.
        assert_eq!(
            sync.apply_bars(old.ticker, old.generation, Ok(bars())),
            Applied::Stale
        );
        assert!(sync.series().is_empty());
        assert!(sync.is_loading(old.ticker));

        // The fresh one commits.
        assert_eq!(
            sync.apply_bars(fresh.ticker, fresh.generation, Ok(bars())),
            Applied::Committed
        );
        assert_eq!(sync.series().series(PriceField::Close).len(), 1);
    }

    #[test]
    fn interleaved_completions_commit_independently() {
        let mut selection = selection();
        let mut sync = ChartSync::new();

        let req_a = select(&mut sync, &mut selection, "A");
        let req_aa = select(&mut sync, &mut selection, "AA");

        // "A" was issued first but completes last; both still commit.
        assert_eq!(
            sync.apply_bars(req_aa.ticker, req_aa.generation, Ok(bars())),
            Applied::Committed
        );
        assert_eq!(
            sync.apply_bars(req_a.ticker, req_a.generation, Ok(bars())),
            Applied::Committed
        );

        assert_eq!(sync.series().series(PriceField::Close).len(), 2);
    }
}
