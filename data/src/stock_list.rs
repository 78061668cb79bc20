use provider::{Stock, StockPage};
use rustc_hash::FxHashMap;

/// Cursor identifying a directory page. `None` is the first page; every
/// other page is named by the opaque `next_url` that led to it.
pub type PageCursor = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Rejected(String),
}

/// A directory page the caller should fetch. Prefetches fill the cache
/// only; navigations also move the visible page once they land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: PageCursor,
    pub prefetch: bool,
}

#[derive(Debug, Clone, Default)]
struct CachedPage {
    rows: Vec<Stock>,
    next: PageCursor,
}

impl From<StockPage> for CachedPage {
    fn from(page: StockPage) -> Self {
        Self {
            rows: page.results,
            next: page.next_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Origin {
    Initial,
    Forward { from: PageCursor },
    Backward,
}

#[derive(Debug)]
struct Pending {
    cursor: PageCursor,
    origin: Origin,
}

/// Forward/backward pagination over the ticker directory.
///
/// The directory API only hands out forward cursors, so backward
/// navigation replays cursors already visited, kept on a history stack.
/// Visited and prefetched pages are memoized in memory and served
/// without a request.
#[derive(Debug, Default)]
pub struct StockListBrowser {
    rows: Vec<Stock>,
    current: PageCursor,
    next: PageCursor,
    history: Vec<PageCursor>,
    pending: Option<Pending>,
    cache: FxHashMap<PageCursor, CachedPage>,
    status: LoadStatus,
}

impl StockListBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kick off the initial directory load. Returns `None` once a page is
    /// visible or a load is in flight; a rejected load with nothing ever
    /// shown stays retryable.
    pub fn open(&mut self) -> Option<PageRequest> {
        let retryable = match self.status {
            LoadStatus::Idle => true,
            LoadStatus::Rejected(_) => self.rows.is_empty(),
            LoadStatus::Pending | LoadStatus::Succeeded => false,
        };
        if !retryable {
            return None;
        }
        self.navigate(None, Origin::Initial)
    }

    pub fn next_page(&mut self) -> Option<PageRequest> {
        if self.pending.is_some() {
            return None;
        }
        let next = self.next.clone()?;
        let from = self.current.clone();

        self.navigate(Some(next), Origin::Forward { from })
    }

    pub fn prev_page(&mut self) -> Option<PageRequest> {
        if self.pending.is_some() {
            return None;
        }
        let cursor = self.history.pop()?;

        self.navigate(cursor, Origin::Backward)
    }

    /// Routes a completed page fetch. A completion for anything other
    /// than the pending navigation only feeds the cache (prefetches, or
    /// a navigation the user has since moved past). Returns the prefetch
    /// request for the adjacent page when it is not cached yet.
    pub fn apply_page(
        &mut self,
        cursor: &PageCursor,
        result: Result<StockPage, String>,
    ) -> Option<PageRequest> {
        let is_pending = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.cursor == *cursor);

        if !is_pending {
            if let Ok(page) = result {
                self.cache.insert(cursor.clone(), CachedPage::from(page));
            }
            return None;
        }

        let Some(Pending { cursor, origin }) = self.pending.take() else {
            return None;
        };

        match result {
            Ok(page) => {
                let page = CachedPage::from(page);
                self.cache.insert(cursor.clone(), page.clone());
                self.commit(cursor, origin, page)
            }
            Err(message) => {
                log::error!("Directory page load failed: {message}");
                if origin == Origin::Backward {
                    // Keep the page reachable for a retry.
                    self.history.push(cursor);
                }
                self.status = LoadStatus::Rejected(message);
                None
            }
        }
    }

    fn navigate(&mut self, cursor: PageCursor, origin: Origin) -> Option<PageRequest> {
        if let Some(page) = self.cache.get(&cursor).cloned() {
            return self.commit(cursor, origin, page);
        }

        self.status = LoadStatus::Pending;
        self.pending = Some(Pending {
            cursor: cursor.clone(),
            origin,
        });
        Some(PageRequest {
            cursor,
            prefetch: false,
        })
    }

    fn commit(&mut self, cursor: PageCursor, origin: Origin, page: CachedPage) -> Option<PageRequest> {
        if let Origin::Forward { from } = origin {
            self.history.push(from);
        }

        self.rows = page.rows;
        self.next = page.next;
        self.current = cursor;
        self.status = LoadStatus::Succeeded;

        let adjacent = Some(self.next.clone()?);
        (!self.cache.contains_key(&adjacent)).then(|| PageRequest {
            cursor: adjacent,
            prefetch: true,
        })
    }

    pub fn rows(&self) -> &[Stock] {
        &self.rows
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_prev(&self) -> bool {
        !self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provider::Ticker;

    fn stock(symbol: &str) -> Stock {
        Stock {
            ticker: Ticker::new(symbol),
            name: format!("{symbol} Corp."),
            primary_exchange: Some("XNYS".to_string()),
            currency_name: None,
        }
    }

    fn page(symbols: &[&str], next: Option<&str>) -> StockPage {
        StockPage {
            results: symbols.iter().map(|s| stock(s)).collect(),
            next_url: next.map(str::to_string),
        }
    }

    #[test]
    fn open_loads_first_page_and_prefetches_second() {
        let mut browser = StockListBrowser::new();

        let request = browser.open().expect("initial load");
        assert_eq!(request.cursor, None);
        assert!(!request.prefetch);
        assert_eq!(*browser.status(), LoadStatus::Pending);
        // A second open while pending issues nothing.
        assert_eq!(browser.open(), None);

        let prefetch = browser
            .apply_page(&None, Ok(page(&["A", "AA"], Some("p2"))))
            .expect("prefetch of the adjacent page");
        assert_eq!(prefetch.cursor.as_deref(), Some("p2"));
        assert!(prefetch.prefetch);

        assert_eq!(browser.rows().len(), 2);
        assert_eq!(*browser.status(), LoadStatus::Succeeded);
        assert!(browser.has_next());
        assert!(!browser.has_prev());
    }

    #[test]
    fn prefetched_page_is_served_without_a_request() {
        let mut browser = StockListBrowser::new();
        browser.open();
        let prefetch = browser
            .apply_page(&None, Ok(page(&["A"], Some("p2"))))
            .unwrap();

        // Prefetch lands: cache only, visible rows untouched.
        browser.apply_page(&prefetch.cursor, Ok(page(&["AB"], Some("p3"))));
        assert_eq!(browser.rows()[0].ticker, Ticker::new("A"));

        // Navigating forward hits the cache; the only request that can
        // come out is a prefetch of the page after.
        let follow_up = browser.next_page().expect("prefetch of page three");
        assert!(follow_up.prefetch);
        assert_eq!(follow_up.cursor.as_deref(), Some("p3"));
        assert_eq!(browser.rows()[0].ticker, Ticker::new("AB"));
        assert!(browser.has_prev());
    }

    #[test]
    fn backward_navigation_replays_visited_cursors() {
        let mut browser = StockListBrowser::new();
        browser.open();
        browser.apply_page(&None, Ok(page(&["A"], Some("p2"))));

        let request = browser.next_page().expect("page two fetch");
        assert!(!request.prefetch);
        browser.apply_page(&request.cursor, Ok(page(&["AB"], None)));
        assert_eq!(browser.rows()[0].ticker, Ticker::new("AB"));
        assert!(!browser.has_next());

        // Back to page one, straight from the cache.
        assert_eq!(browser.prev_page(), None);
        assert_eq!(browser.rows()[0].ticker, Ticker::new("A"));
        assert!(!browser.has_prev());
        assert!(browser.has_next());
    }

    #[test]
    fn rejected_load_keeps_message_and_allows_retry() {
        let mut browser = StockListBrowser::new();
        browser.open();
        browser.apply_page(&None, Ok(page(&["A"], Some("p2"))));

        let request = browser.next_page().unwrap();
        browser.apply_page(&request.cursor, Err("HTTP error: status 500".to_string()));

        assert_eq!(
            *browser.status(),
            LoadStatus::Rejected("HTTP error: status 500".to_string())
        );
        // The visible page is still page one.
        assert_eq!(browser.rows()[0].ticker, Ticker::new("A"));
    }

    #[test]
    fn failed_initial_load_can_be_reopened() {
        let mut browser = StockListBrowser::new();
        browser.open();
        browser.apply_page(&None, Err("HTTP error: status 500".to_string()));

        assert!(matches!(browser.status(), LoadStatus::Rejected(_)));

        // Nothing was ever shown, so opening again issues a fresh fetch.
        let retry = browser.open().expect("retry of the initial load");
        assert_eq!(retry.cursor, None);
        assert!(!retry.prefetch);
        assert_eq!(*browser.status(), LoadStatus::Pending);

        browser.apply_page(&None, Ok(page(&["A"], None)));
        assert_eq!(browser.rows()[0].ticker, Ticker::new("A"));
        assert_eq!(*browser.status(), LoadStatus::Succeeded);

        // With a page visible, open is a no-op again.
        assert_eq!(browser.open(), None);
    }

    #[test]
    fn stale_page_completion_does_not_move_the_view() {
        let mut browser = StockListBrowser::new();
        browser.open();
        browser.apply_page(&None, Ok(page(&["A"], Some("p2"))));

        // A completion for a cursor nobody is waiting on: cache only.
        browser.apply_page(
            &Some("p9".to_string()),
            Ok(page(&["ZZ"], None)),
        );
        assert_eq!(browser.rows()[0].ticker, Ticker::new("A"));
    }

    #[test]
    fn failed_backward_navigation_stays_reachable() {
        let mut browser = StockListBrowser::new();
        browser.open();
        browser.apply_page(&None, Ok(page(&["A"], Some("p2"))));
        let request = browser.next_page().unwrap();
        browser.apply_page(&request.cursor, Ok(page(&["AB"], None)));

        // Force the cache miss path for the backward hop.
        browser.cache.clear();
        let back = browser.prev_page().expect("backward fetch");
        browser.apply_page(&back.cursor, Err("timed out".to_string()));

        assert!(matches!(browser.status(), LoadStatus::Rejected(_)));
        assert!(browser.has_prev());
    }
}
