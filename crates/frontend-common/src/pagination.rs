//! Paged views over a backend collection
//!
//! A [`PageController`] remembers the active page descriptor and re-runs its
//! loader whenever the page or the search text change. Every load is
//! stamped with a generation number; a response belonging to an older
//! generation is dropped so it cannot overwrite a newer page.

use crate::config::PageConfig;
use futures::future::LocalBoxFuture;
use pnc_http::{ClientError, Page, PageQuery, SortOrder};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::watch;

pub type PageFuture<T> = LocalBoxFuture<'static, Result<Page<T>, ClientError>>;
type PageLoader<T> = Rc<dyn Fn(PageQuery) -> PageFuture<T>>;

/// What became of a load request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response is now the displayed page
    Applied,
    /// A newer load started before this one finished; its response was dropped
    Superseded,
    /// Nothing to load, e.g. `next()` on the last page
    Skipped,
}

struct PageState<T> {
    index: u32,
    size: u32,
    search: String,
    sort: Option<SortOrder>,
    items: Vec<T>,
    total_pages: u32,
    generation: u64,
    loading: bool,
    error: Option<String>,
}

pub struct PageController<T> {
    state: Rc<RefCell<PageState<T>>>,
    loader: PageLoader<T>,
    changes: Rc<watch::Sender<()>>,
}

impl<T> Clone for PageController<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            loader: self.loader.clone(),
            changes: self.changes.clone(),
        }
    }
}

impl<T: Clone + 'static> PageController<T> {
    pub fn new(loader: impl Fn(PageQuery) -> PageFuture<T> + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(PageState {
                index: 0,
                size: PageConfig::DEFAULT_PAGE_SIZE,
                search: String::new(),
                sort: None,
                items: Vec::new(),
                total_pages: 0,
                generation: 0,
                loading: false,
                error: None,
            })),
            loader: Rc::new(loader),
            changes: Rc::new(watch::channel(()).0),
        }
    }

    pub fn with_sort(self, sort: SortOrder) -> Self {
        self.state.borrow_mut().sort = Some(sort);
        self
    }

    /// The page descriptor the next reload will send
    pub fn query(&self) -> PageQuery {
        let state = self.state.borrow();
        PageQuery {
            index: state.index,
            size: state.size,
            search: state.search.clone(),
            sort: state.sort.clone(),
        }
    }

    /// Re-run the query for the current page
    pub async fn reload(&self) -> Result<LoadOutcome, ClientError> {
        let generation = {
            let mut state = self.state.borrow_mut();
            state.generation += 1;
            state.loading = true;
            state.generation
        };
        let query = self.query();
        self.changes.send_replace(());

        let result = (self.loader)(query).await;

        let mut state = self.state.borrow_mut();
        if state.generation != generation {
            tracing::debug!(generation, current = state.generation, "dropping superseded page");
            return Ok(LoadOutcome::Superseded);
        }
        state.loading = false;
        let outcome = match result {
            Ok(page) => {
                state.items = page.content;
                state.total_pages = page.total_pages;
                state.error = None;
                Ok(LoadOutcome::Applied)
            }
            Err(error) => {
                state.error = Some(error.to_string());
                Err(error)
            }
        };
        drop(state);
        self.changes.send_replace(());
        outcome
    }

    pub async fn load_page(&self, index: u32) -> Result<LoadOutcome, ClientError> {
        self.state.borrow_mut().index = index;
        self.reload().await
    }

    pub async fn next(&self) -> Result<LoadOutcome, ClientError> {
        if !self.has_next() {
            return Ok(LoadOutcome::Skipped);
        }
        self.load_page(self.index() + 1).await
    }

    pub async fn previous(&self) -> Result<LoadOutcome, ClientError> {
        if !self.has_previous() {
            return Ok(LoadOutcome::Skipped);
        }
        self.load_page(self.index() - 1).await
    }

    /// Filter server side by `text`, starting again from the first page
    pub async fn search(&self, text: impl Into<String>) -> Result<LoadOutcome, ClientError> {
        {
            let mut state = self.state.borrow_mut();
            state.search = text.into();
            state.index = 0;
        }
        self.reload().await
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn index(&self) -> u32 {
        self.state.borrow().index
    }

    pub fn size(&self) -> u32 {
        self.state.borrow().size
    }

    pub fn search_text(&self) -> String {
        self.state.borrow().search.clone()
    }

    pub fn total_pages(&self) -> u32 {
        self.state.borrow().total_pages
    }

    pub fn has_next(&self) -> bool {
        let state = self.state.borrow();
        state.index + 1 < state.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.state.borrow().index > 0
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Message of the last failed load, cleared by the next successful one
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Changes whenever loading starts or a page arrives
    pub fn subscribe(&self) -> watch::Receiver<()> {
        self.changes.subscribe()
    }
}

impl<T> PartialEq for PageController<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::FutureExt;
    use std::collections::VecDeque;

    fn page(index: u32, total_pages: u32, content: Vec<u32>) -> Page<u32> {
        Page {
            page_index: index,
            page_size: 10,
            total_pages,
            content,
        }
    }

    /// Loader answering every query with a fixed page, recording the queries
    fn recording(
        total_pages: u32,
    ) -> (PageController<u32>, Rc<RefCell<Vec<PageQuery>>>) {
        let queries = Rc::new(RefCell::new(Vec::new()));
        let seen = queries.clone();
        let controller = PageController::new(move |query: PageQuery| {
            seen.borrow_mut().push(query.clone());
            async move { Ok(page(query.index, total_pages, vec![query.index])) }.boxed_local()
        });
        (controller, queries)
    }

    #[test]
    fn test_reload_uses_active_descriptor() {
        let (controller, queries) = recording(5);
        let controller = controller.with_sort(SortOrder::desc("id"));

        block_on(controller.load_page(2)).unwrap();
        block_on(controller.reload()).unwrap();

        let queries = queries.borrow();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].index, 2);
        assert_eq!(queries[1].size, PageConfig::DEFAULT_PAGE_SIZE);
        assert_eq!(queries[1].sort, Some(SortOrder::desc("id")));
        assert_eq!(controller.items(), vec![2]);
    }

    #[test]
    fn test_navigation_respects_bounds() {
        let (controller, queries) = recording(2);

        assert_eq!(block_on(controller.previous()).unwrap(), LoadOutcome::Skipped);
        block_on(controller.reload()).unwrap();
        assert!(controller.has_next());
        assert_eq!(block_on(controller.next()).unwrap(), LoadOutcome::Applied);
        assert_eq!(controller.index(), 1);
        assert_eq!(block_on(controller.next()).unwrap(), LoadOutcome::Skipped);
        assert_eq!(block_on(controller.previous()).unwrap(), LoadOutcome::Applied);
        assert_eq!(controller.index(), 0);
        assert_eq!(queries.borrow().len(), 3);
    }

    #[test]
    fn test_search_restarts_from_first_page() {
        let (controller, queries) = recording(4);
        block_on(controller.load_page(3)).unwrap();

        block_on(controller.search("kernel")).unwrap();

        let last = queries.borrow().last().cloned().unwrap();
        assert_eq!(last.index, 0);
        assert_eq!(last.search, "kernel");
        assert_eq!(controller.search_text(), "kernel");
    }

    #[test]
    fn test_stale_response_does_not_overwrite_newer_page() {
        let pending: Rc<RefCell<VecDeque<oneshot::Receiver<Page<u32>>>>> =
            Rc::new(RefCell::new(VecDeque::new()));
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        pending.borrow_mut().extend([first_rx, second_rx]);

        let queue = pending.clone();
        let controller = PageController::new(move |_query: PageQuery| {
            let receiver = queue.borrow_mut().pop_front();
            async move {
                let receiver = receiver.ok_or_else(|| ClientError::Configuration("no page".into()))?;
                receiver
                    .await
                    .map_err(|_| ClientError::Configuration("cancelled".into()))
            }
            .boxed_local()
        });

        second_tx.send(page(0, 1, vec![2])).unwrap();
        let older = controller.reload();
        let newer = async {
            let outcome = controller.reload().await;
            first_tx.send(page(0, 1, vec![1])).unwrap();
            outcome
        };

        let (older, newer) = block_on(futures::future::join(older, newer));
        assert_eq!(newer.unwrap(), LoadOutcome::Applied);
        assert_eq!(older.unwrap(), LoadOutcome::Superseded);
        assert_eq!(controller.items(), vec![2]);
        assert!(!controller.is_loading());
    }

    #[test]
    fn test_subscribers_see_loading_and_arrival() {
        let (controller, _queries) = recording(1);
        let mut changes = controller.subscribe();

        block_on(controller.reload()).unwrap();

        assert!(changes.has_changed().unwrap());
        let _ = changes.borrow_and_update();
        assert_eq!(controller.items(), vec![0]);
        assert!(!changes.has_changed().unwrap());
    }

    #[test]
    fn test_failed_load_keeps_previous_items() {
        let fail = Rc::new(RefCell::new(false));
        let toggle = fail.clone();
        let controller = PageController::new(move |_query: PageQuery| {
            let fail = *toggle.borrow();
            async move {
                if fail {
                    Err(ClientError::Configuration("offline".into()))
                } else {
                    Ok(page(0, 1, vec![7]))
                }
            }
            .boxed_local()
        });

        block_on(controller.reload()).unwrap();
        *fail.borrow_mut() = true;
        assert!(block_on(controller.reload()).is_err());

        assert_eq!(controller.items(), vec![7]);
        assert!(controller.error().is_some());
        assert!(!controller.is_loading());
    }
}
