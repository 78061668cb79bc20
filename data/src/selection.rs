use chrono::NaiveDate;
use provider::{DateBounds, DateRange, DateRangeError, PriceField, Ticker};

pub const MAX_SELECTED: usize = 3;

/// What the user currently has in play: the picked tickers (at most
/// [`MAX_SELECTED`]), the charted date window, and which daily price
/// component is projected.
#[derive(Debug, Clone)]
pub struct Selection {
    tickers: Vec<Ticker>,
    range: DateRange,
    bounds: DateBounds,
    price_field: PriceField,
}

/// Outcome of a toggle, so callers know whether chart state needs work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Selected,
    Deselected,
    AtCapacity,
}

impl Selection {
    pub fn new(bounds: DateBounds) -> Self {
        Self {
            tickers: Vec::new(),
            range: bounds.full_range(),
            bounds,
            price_field: PriceField::default(),
        }
    }

    /// Select/deselect on repeat. A fourth distinct ticker is silently
    /// dropped: the UI disables the control at capacity, but the store
    /// rejects the mutation as well in case a control slips through.
    pub fn toggle(&mut self, ticker: Ticker) -> Toggle {
        if let Some(position) = self.tickers.iter().position(|t| *t == ticker) {
            self.tickers.remove(position);
            Toggle::Deselected
        } else if self.tickers.len() < MAX_SELECTED {
            self.tickers.push(ticker);
            Toggle::Selected
        } else {
            log::debug!("Ignoring selection of {ticker}: already at {MAX_SELECTED} tickers");
            Toggle::AtCapacity
        }
    }

    /// Rejection leaves the stored range untouched.
    pub fn set_from(&mut self, from: NaiveDate) -> Result<(), DateRangeError> {
        self.range = self.range.with_from(from, &self.bounds)?;
        Ok(())
    }

    pub fn set_to(&mut self, to: NaiveDate) -> Result<(), DateRangeError> {
        self.range = self.range.with_to(to, &self.bounds)?;
        Ok(())
    }

    pub fn set_price_field(&mut self, field: PriceField) {
        self.price_field = field;
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn is_selected(&self, ticker: Ticker) -> bool {
        self.tickers.contains(&ticker)
    }

    /// Checkbox contract: a row stays selectable while below capacity, or
    /// when it is the one already selected.
    pub fn can_select(&self, ticker: Ticker) -> bool {
        self.is_selected(ticker) || self.tickers.len() < MAX_SELECTED
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn bounds(&self) -> DateBounds {
        self.bounds
    }

    pub fn price_field(&self) -> PriceField {
        self.price_field
    }
}
