//! Page-number paginator
//!
//! Drives a [`PageSource`] through the numbered pages of one endpoint. The
//! page count is read from the first page; later pages are requested one at a
//! time while the server reports a page below that count.

use super::types::{PageSize, PageSource, PagerLayout};
use crate::error::{Error, Result};
use crate::request::Params;
use crate::types::{JsonObject, JsonValue};
use futures::stream::{self, Stream, TryStreamExt};
use std::pin::Pin;
use tracing::{debug, info};

/// Lazy, single-pass sequence of pages
pub type PageStream<'a> = Pin<Box<dyn Stream<Item = Result<JsonValue>> + Send + 'a>>;

/// Reserved query parameter the caller may not set
const PAGING_PARAM: &str = "paging";

/// Paginator over one endpoint
pub struct Paginator<'a, S: PageSource + ?Sized> {
    source: &'a S,
    endpoint: String,
    params: Params,
    page_size: PageSize,
    layout: PagerLayout,
}

impl<'a, S: PageSource + ?Sized> Paginator<'a, S> {
    /// Create a paginator
    ///
    /// Fails with a client error when `params` already carries `paging`.
    pub fn new(
        source: &'a S,
        endpoint: impl Into<String>,
        page_size: PageSize,
        params: Option<Params>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        let mut params = params.unwrap_or_default();

        if params.contains_key(PAGING_PARAM) {
            return Err(Error::client(
                "Can't set paging manually in `params` when using `get_paged`",
            ));
        }

        params.set("pageSize", page_size);
        params.set("page", 1);
        params.set("totalPages", true);

        let layout = PagerLayout::for_endpoint(&endpoint);

        Ok(Self {
            source,
            endpoint,
            params,
            page_size,
            layout,
        })
    }

    /// The layout responses are read with
    pub fn layout(&self) -> &PagerLayout {
        &self.layout
    }

    /// The query parameters sent with the first page
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Fetch the first page and return the lazy page sequence
    ///
    /// Each further page is requested only when the stream is polled for it.
    /// The stream ends after the terminal page or after the first error.
    pub async fn pages(self) -> Result<PageStream<'a>> {
        let first = self.source.fetch_page(&self.endpoint, &self.params).await?;
        let pager = self.layout.pager(&first)?;

        debug!(
            "{}: page {}/{} (pageSize={})",
            self.endpoint, pager.page, pager.page_count, self.page_size
        );

        let state = PageState {
            source: self.source,
            endpoint: self.endpoint,
            params: self.params,
            layout: self.layout,
            page_count: pager.page_count,
            current: 1,
            last_seen: pager.page,
            first: Some(first),
        };

        Ok(Box::pin(stream::try_unfold(state, |state| next_page(state))))
    }

    /// Fetch every page and concatenate the item lists in fetch order
    ///
    /// Returns `{key: [...]}` with the collection key (or `rows`).
    pub async fn merge(self) -> Result<JsonValue> {
        let layout = self.layout.clone();
        let endpoint = self.endpoint.clone();
        let mut pages = self.pages().await?;

        let mut items = Vec::new();
        let mut fetched = 0usize;
        while let Some(page) = pages.try_next().await? {
            items.extend(layout.take_items(page)?);
            fetched += 1;
        }

        info!(
            "{}: merged {} items from {} pages",
            endpoint,
            items.len(),
            fetched
        );

        let mut merged = JsonObject::new();
        merged.insert(layout.key().to_string(), JsonValue::Array(items));
        Ok(JsonValue::Object(merged))
    }
}

struct PageState<'a, S: ?Sized> {
    source: &'a S,
    endpoint: String,
    params: Params,
    layout: PagerLayout,
    page_count: u32,
    current: u32,
    last_seen: u32,
    first: Option<JsonValue>,
}

async fn next_page<'a, S: PageSource + ?Sized>(
    mut state: PageState<'a, S>,
) -> Result<Option<(JsonValue, PageState<'a, S>)>> {
    if let Some(first) = state.first.take() {
        return Ok(Some((first, state)));
    }

    // The local counter is capped so a server repeating a page cannot loop
    if state.last_seen >= state.page_count || state.current >= state.page_count {
        return Ok(None);
    }

    state.current += 1;
    state.params.set("page", state.current);

    let page = state
        .source
        .fetch_page(&state.endpoint, &state.params)
        .await?;
    let pager = state.layout.pager(&page)?;
    state.last_seen = pager.page;

    debug!("{}: page {}/{}", state.endpoint, pager.page, state.page_count);

    Ok(Some((page, state)))
}
