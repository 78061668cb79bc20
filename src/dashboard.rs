use chrono::NaiveDate;
use data::selection::{Selection, Toggle};
use data::stock_list::{LoadStatus, PageCursor, PageRequest, StockListBrowser};
use data::sync::{Applied, ChartSync, ChartView, FetchRequest};
use provider::{
    DateBounds, DateRangeError, PriceBar, PriceField, ProviderError, Stock, StockPage, Ticker,
};

/// Everything that can happen to the dashboard: user interaction from
/// the (external) presentation layer, and fetch completions coming back
/// from the session's spawned tasks.
#[derive(Debug)]
pub enum Message {
    TickerToggled(Ticker),
    FromDateChanged(NaiveDate),
    ToDateChanged(NaiveDate),
    PriceFieldChanged(PriceField),
    OpenDirectory,
    NextPage,
    PrevPage,
    BarsFetched {
        ticker: Ticker,
        generation: u64,
        result: Result<Vec<PriceBar>, ProviderError>,
    },
    PageFetched {
        cursor: PageCursor,
        result: Result<StockPage, ProviderError>,
    },
}

/// Side effects `update` asks for; the session executes them and feeds
/// the completion back in as a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    FetchBars(FetchRequest),
    FetchPage(PageRequest),
}

/// The whole client-side state: selection, chart synchronization, and
/// the directory browser. `update` is a pure transition that emits the
/// fetches to run; all reads for rendering go through the accessors.
pub struct Dashboard {
    selection: Selection,
    sync: ChartSync,
    browser: StockListBrowser,
    date_error: Option<DateRangeError>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::with_bounds(DateBounds::last_two_years())
    }

    pub fn with_bounds(bounds: DateBounds) -> Self {
        Self {
            selection: Selection::new(bounds),
            sync: ChartSync::new(),
            browser: StockListBrowser::new(),
            date_error: None,
        }
    }

    pub fn update(&mut self, message: Message) -> Vec<Task> {
        match message {
            Message::TickerToggled(ticker) => match self.selection.toggle(ticker) {
                Toggle::Selected | Toggle::Deselected => self
                    .sync
                    .reconcile(&self.selection)
                    .into_iter()
                    .map(Task::FetchBars)
                    .collect(),
                Toggle::AtCapacity => Vec::new(),
            },
            Message::FromDateChanged(date) => {
                let result = self.selection.set_from(date);
                self.range_updated(result)
            }
            Message::ToDateChanged(date) => {
                let result = self.selection.set_to(date);
                self.range_updated(result)
            }
            Message::PriceFieldChanged(field) => {
                // Projection change only; the loaded series already hold
                // points for every field.
                self.selection.set_price_field(field);
                Vec::new()
            }
            Message::OpenDirectory => page_task(self.browser.open()),
            Message::NextPage => page_task(self.browser.next_page()),
            Message::PrevPage => page_task(self.browser.prev_page()),
            Message::BarsFetched {
                ticker,
                generation,
                result,
            } => {
                if let Err(err) = &result {
                    log::warn!("Bars fetch for {ticker} failed: {err}");
                }
                let result = result.map_err(|err| err.to_string());
                if self.sync.apply_bars(ticker, generation, result) == Applied::Stale {
                    log::debug!("Discarded stale bars for {ticker} (generation {generation})");
                }
                Vec::new()
            }
            Message::PageFetched { cursor, result } => {
                let result = result.map_err(|err| err.to_string());
                page_task(self.browser.apply_page(&cursor, result))
            }
        }
    }

    fn range_updated(&mut self, result: Result<(), DateRangeError>) -> Vec<Task> {
        match result {
            Ok(()) => {
                self.date_error = None;
                self.sync
                    .refetch_all(&self.selection)
                    .into_iter()
                    .map(Task::FetchBars)
                    .collect()
            }
            Err(err) => {
                self.date_error = Some(err);
                Vec::new()
            }
        }
    }

    pub fn chart_view(&self) -> ChartView<'_> {
        self.sync.chart_view(self.selection.price_field())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The inline message for the date controls, if the last edit was
    /// rejected. Cleared by the next accepted edit.
    pub fn date_error(&self) -> Option<DateRangeError> {
        self.date_error
    }

    pub fn directory_rows(&self) -> &[Stock] {
        self.browser.rows()
    }

    pub fn directory_status(&self) -> &LoadStatus {
        self.browser.status()
    }

    pub fn has_next_page(&self) -> bool {
        self.browser.has_next()
    }

    pub fn has_prev_page(&self) -> bool {
        self.browser.has_prev()
    }
}

fn page_task(request: Option<PageRequest>) -> Vec<Task> {
    request.map(Task::FetchPage).into_iter().collect()
}
