//! Pagination
//!
//! [`Pages`] yields the items of the current page, then asks the adapter for
//! the next page's request arguments and fetches it, until the adapter has no
//! next page, a page is empty, or a limit is reached.
//!
//! ```rust,no_run
//! # async fn run(client: apiwrap::Client) -> apiwrap::ApiResult<()> {
//! use apiwrap::{PageLimits, RequestKwargs};
//!
//! let first = client.attr("users")?.call()?.get(RequestKwargs::new()).await?;
//! let mut pages = first.pages(PageLimits::new().max_items(50))?;
//! while let Some(user) = pages.next().await {
//!     println!("{}", user?.data());
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::{Client, Node};
use crate::error::ApiResult;
use crate::executor::Executor;
use serde_json::Value;
use tracing::debug;

/// Limits on a pagination run; `None` means unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLimits {
    /// Maximum number of pages to consume
    pub max_pages: Option<usize>,
    /// Maximum number of items to yield
    pub max_items: Option<usize>,
}

impl PageLimits {
    /// No limits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to cap the number of pages
    #[must_use]
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Builder-style method to cap the number of items
    #[must_use]
    pub fn max_items(mut self, max_items: usize) -> Self {
        self.max_items = Some(max_items);
        self
    }

    fn reached(&self, pages: usize, items: usize) -> bool {
        self.max_pages.is_some_and(|max| max <= pages)
            || self.max_items.is_some_and(|max| max <= items)
    }
}

/// Lazy, forward-only iterator over paginated items
pub struct Pages {
    origin: Executor,
    limits: PageLimits,
    page: Node,
    items: std::vec::IntoIter<Value>,
    page_count: usize,
    item_count: usize,
    done: bool,
}

impl Pages {
    pub(crate) fn new(origin: Executor, limits: PageLimits) -> Self {
        let page = origin.node().clone();
        let items = list_of(&page);
        Self {
            origin,
            limits,
            done: items.len() == 0,
            page,
            items,
            page_count: 0,
            item_count: 0,
        }
    }

    /// Pages consumed so far
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Items yielded so far
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// The next item. A failed page request is yielded once and ends the
    /// iteration.
    pub async fn next(&mut self) -> Option<ApiResult<Client>> {
        loop {
            if self.done || self.limits.reached(self.page_count, self.item_count) {
                self.done = true;
                return None;
            }

            if let Some(item) = self.items.next() {
                self.item_count += 1;
                return Some(Ok(Client::from_node(self.page.wrap(item))));
            }

            self.page_count += 1;
            if self.limits.reached(self.page_count, self.item_count) {
                self.done = true;
                return None;
            }

            let adapter = &self.page.ctx.adapter;
            let Some(kwargs) = adapter.get_iterator_next_request_kwargs(
                self.page.request_kwargs.as_ref(),
                &self.page.data,
                self.page.response.as_deref(),
            ) else {
                self.done = true;
                return None;
            };

            debug!(
                page = self.page_count + 1,
                items = self.item_count,
                url = kwargs.url.as_deref().unwrap_or_default(),
                "Fetching next page"
            );

            match self.origin.get(kwargs).await {
                Ok(client) => {
                    self.page = client.into_node();
                    self.items = list_of(&self.page);
                    self.done = self.items.len() == 0;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }

    /// Drain the remaining items, stopping at the first error
    pub async fn try_collect(mut self) -> ApiResult<Vec<Client>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }
}

fn list_of(page: &Node) -> std::vec::IntoIter<Value> {
    page.ctx
        .adapter
        .get_iterator_list(&page.data)
        .unwrap_or_default()
        .into_iter()
}
