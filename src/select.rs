//! Lazy, single-pass iteration over a paged listing.

use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::item::Item;
use crate::store::{AttributeStore, SelectRequest, SelectedItem};

#[derive(Debug)]
enum State {
    /// No remote call issued yet.
    Unstarted,
    /// Buffered rows of the latest page and the token for the next one.
    Holding {
        rows: VecDeque<SelectedItem>,
        next_token: Option<String>,
    },
    /// Last page was empty and carried no token.
    Exhausted,
}

/// Items matching a [`SelectRequest`], fetched a page at a time.
///
/// Nothing is fetched until the first [`has_next`](Select::has_next) or
/// [`next_item`](Select::next_item). Empty pages that still carry a
/// continuation token are skipped over. Once exhausted the selection never
/// calls the store again; build a new one to query again. Rows are not
/// deduplicated across pages.
#[derive(Debug)]
pub struct Select {
    store: Arc<dyn AttributeStore>,
    domain: String,
    request: SelectRequest,
    state: State,
}

impl Select {
    pub(crate) fn new(
        store: Arc<dyn AttributeStore>,
        domain: impl Into<String>,
        request: SelectRequest,
    ) -> Self {
        Self {
            store,
            domain: domain.into(),
            request,
            state: State::Unstarted,
        }
    }

    pub fn request(&self) -> &SelectRequest {
        &self.request
    }

    /// Reports whether another item is available, fetching pages as needed.
    ///
    /// A failed fetch leaves the selection where it was; calling again
    /// repeats the same request.
    pub async fn has_next(&mut self) -> Result<bool> {
        loop {
            let token = match &self.state {
                State::Exhausted => return Ok(false),
                State::Holding { rows, .. } if !rows.is_empty() => return Ok(true),
                State::Holding {
                    next_token: None, ..
                } => {
                    debug!("Selection on '{}' exhausted", self.domain);
                    self.state = State::Exhausted;
                    return Ok(false);
                }
                State::Holding {
                    next_token: Some(token),
                    ..
                } => Some(token.clone()),
                State::Unstarted => None,
            };

            let page = self
                .store
                .select(&self.domain, &self.request, token.as_deref())
                .await?;
            debug!(
                "Fetched {} row(s) from '{}', more: {}",
                page.items.len(),
                self.domain,
                page.next_token.is_some()
            );
            self.state = State::Holding {
                rows: page.items.into(),
                next_token: page.next_token,
            };
        }
    }

    /// Takes the next item, failing with [`Error::ExhaustedSequence`] when
    /// there is none.
    pub async fn next_item(&mut self) -> Result<Item> {
        if !self.has_next().await? {
            return Err(Error::ExhaustedSequence);
        }
        match &mut self.state {
            State::Holding { rows, .. } => rows
                .pop_front()
                .map(|row| Item::new(self.store.clone(), self.domain.clone(), row.name))
                .ok_or(Error::ExhaustedSequence),
            _ => Err(Error::ExhaustedSequence),
        }
    }

    /// Removal through the cursor is not supported; use [`Item::clear`].
    pub fn remove(&mut self) -> Result<()> {
        Err(Error::UnsupportedOperation("remove through a selection"))
    }

    /// Drains the remaining items.
    pub async fn collect_items(mut self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        while self.has_next().await? {
            items.push(self.next_item().await?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Attribute, SelectPage};
    use crate::testing::FakeStore;

    fn row(name: &str) -> SelectedItem {
        SelectedItem {
            name: name.to_string(),
            attributes: vec![Attribute::new("k", name)],
        }
    }

    fn page(names: &[&str], token: Option<&str>) -> SelectPage {
        SelectPage {
            items: names.iter().map(|n| row(n)).collect(),
            next_token: token.map(str::to_string),
        }
    }

    fn select_on(store: &Arc<FakeStore>) -> Select {
        Select::new(store.clone(), "t1", SelectRequest::new("SELECT * FROM t1"))
    }

    #[tokio::test]
    async fn test_skips_empty_pages_with_token() {
        let store = Arc::new(FakeStore::new());
        store
            .script_pages(vec![
                page(&["A", "B"], Some("t1")),
                page(&[], Some("t2")),
                page(&["C"], Some("t3")),
                page(&[], None),
            ])
            .await;

        let mut select = select_on(&store);
        let mut names = Vec::new();
        while select.has_next().await.unwrap() {
            names.push(select.next_item().await.unwrap().name().to_string());
        }

        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(store.calls("select"), 4);
        assert!(!select.has_next().await.unwrap());
        assert_eq!(store.calls("select"), 4);
        assert_eq!(
            store.tokens().await,
            vec![None, Some("t1".into()), Some("t2".into()), Some("t3".into())]
        );
    }

    #[tokio::test]
    async fn test_construction_is_lazy() {
        let store = Arc::new(FakeStore::new());
        let _select = select_on(&store);
        assert_eq!(store.calls("select"), 0);
    }

    #[tokio::test]
    async fn test_has_next_does_not_refetch_buffered_page() {
        let store = Arc::new(FakeStore::new());
        store.script_pages(vec![page(&["A", "B"], None)]).await;

        let mut select = select_on(&store);
        assert!(select.has_next().await.unwrap());
        assert!(select.has_next().await.unwrap());
        assert_eq!(store.calls("select"), 1);
    }

    #[tokio::test]
    async fn test_next_past_end_fails() {
        let store = Arc::new(FakeStore::new());
        store.script_pages(vec![page(&["A"], None)]).await;

        let mut select = select_on(&store);
        select.next_item().await.unwrap();
        assert!(matches!(
            select.next_item().await,
            Err(Error::ExhaustedSequence)
        ));
    }

    #[tokio::test]
    async fn test_empty_first_page_without_token_exhausts() {
        let store = Arc::new(FakeStore::new());
        store.script_pages(vec![page(&[], None)]).await;

        let mut select = select_on(&store);
        assert!(!select.has_next().await.unwrap());
        assert!(matches!(
            select.next_item().await,
            Err(Error::ExhaustedSequence)
        ));
        assert_eq!(store.calls("select"), 1);
    }

    #[tokio::test]
    async fn test_remove_is_unsupported() {
        let store = Arc::new(FakeStore::new());
        let mut select = select_on(&store);
        assert!(matches!(
            select.remove(),
            Err(Error::UnsupportedOperation(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_surfaced_and_repeatable() {
        let store = Arc::new(FakeStore::new());
        store.fail_next_select().await;
        store.script_pages(vec![page(&["A"], None)]).await;

        let mut select = select_on(&store);
        assert!(matches!(
            select.has_next().await,
            Err(Error::RemoteService { .. })
        ));
        let items = select.collect_items().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(store.tokens().await, vec![None, None]);
    }
}
