//! In-process attribute store for unit tests.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex as SyncMutex;
use tokio::sync::Mutex;

use crate::error::{Error, Result, NOT_FOUND_CODE};
use crate::store::{
    Attribute, AttributeStore, ReplaceableAttribute, SelectPage, SelectRequest, SelectedItem,
};

type Rows = HashMap<String, BTreeMap<String, String>>;

/// Key attribute the fake reserves, as a DynamoDB table would.
pub const KEY_ATTRIBUTE: &str = "itemName";

// The one filter the fake understands: `WHERE attr = 'value'`.
static EQUALITY_FILTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bwhere\s+"?([A-Za-z0-9_.-]+)"?\s*=\s*'([^']*)'"#).unwrap()
});

fn equality_filter(expression: &str) -> Option<(String, String)> {
    EQUALITY_FILTER
        .captures(expression)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
}

#[derive(Debug, Default)]
struct State {
    domains: HashMap<String, Rows>,
    pages: VecDeque<SelectPage>,
    tokens: Vec<Option<String>>,
    fail_next_select: bool,
}

/// Keeps domains in memory, counts calls per operation and replays
/// scripted select pages when any are queued.
///
/// Unscripted selects return every row matching an optional
/// `WHERE attr = 'value'` filter, sorted by item name.
#[derive(Debug, Default)]
pub struct FakeStore {
    state: Mutex<State>,
    calls: SyncMutex<HashMap<&'static str, usize>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with `domain` already created.
    pub async fn with_domain(domain: &str) -> Self {
        let store = Self::new();
        store
            .state
            .lock()
            .await
            .domains
            .insert(domain.to_string(), Rows::new());
        store
    }

    pub async fn script_pages(&self, pages: Vec<SelectPage>) {
        self.state.lock().await.pages.extend(pages);
    }

    pub async fn fail_next_select(&self) {
        self.state.lock().await.fail_next_select = true;
    }

    /// Continuation tokens passed to `select`, in call order.
    pub async fn tokens(&self) -> Vec<Option<String>> {
        self.state.lock().await.tokens.clone()
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub async fn domain_names(&self) -> HashSet<String> {
        self.state.lock().await.domains.keys().cloned().collect()
    }

    fn record(&self, operation: &'static str) {
        *self.calls.lock().unwrap().entry(operation).or_insert(0) += 1;
    }
}

fn not_found(operation: &'static str, domain: &str) -> Error {
    Error::remote(
        operation,
        Some(NOT_FOUND_CODE.to_string()),
        format!("Requested resource not found: {domain}"),
    )
}

fn rows_mut<'a>(
    state: &'a mut State,
    operation: &'static str,
    domain: &str,
) -> Result<&'a mut Rows> {
    state
        .domains
        .get_mut(domain)
        .ok_or_else(|| not_found(operation, domain))
}

#[async_trait]
impl AttributeStore for FakeStore {
    fn key_attribute(&self) -> Option<&str> {
        Some(KEY_ATTRIBUTE)
    }

    async fn create_domain(&self, domain: &str) -> Result<()> {
        self.record("create_domain");
        self.state
            .lock()
            .await
            .domains
            .entry(domain.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<()> {
        self.record("delete_domain");
        self.state.lock().await.domains.remove(domain);
        Ok(())
    }

    async fn get_attributes(
        &self,
        domain: &str,
        item: &str,
        _consistent_read: bool,
    ) -> Result<Vec<Attribute>> {
        self.record("get_attributes");
        let mut state = self.state.lock().await;
        let rows = rows_mut(&mut state, "GetItem", domain)?;
        Ok(rows
            .get(item)
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(name, value)| Attribute::new(name, value))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: Vec<ReplaceableAttribute>,
    ) -> Result<()> {
        self.record("put_attributes");
        let mut state = self.state.lock().await;
        let rows = rows_mut(&mut state, "UpdateItem", domain)?;
        let row = rows.entry(item.to_string()).or_default();
        for attr in attributes {
            if attr.replace || !row.contains_key(&attr.name) {
                row.insert(attr.name, attr.value);
            }
        }
        Ok(())
    }

    async fn delete_attributes(&self, domain: &str, item: &str, names: Vec<String>) -> Result<()> {
        self.record("delete_attributes");
        let mut state = self.state.lock().await;
        let rows = rows_mut(&mut state, "UpdateItem", domain)?;
        if names.is_empty() {
            rows.remove(item);
        } else if let Some(row) = rows.get_mut(item) {
            for name in names {
                row.remove(&name);
            }
            if row.is_empty() {
                rows.remove(item);
            }
        }
        Ok(())
    }

    async fn select(
        &self,
        domain: &str,
        request: &SelectRequest,
        next_token: Option<&str>,
    ) -> Result<SelectPage> {
        self.record("select");
        let mut state = self.state.lock().await;
        state.tokens.push(next_token.map(str::to_string));

        if state.fail_next_select {
            state.fail_next_select = false;
            return Err(Error::remote(
                "ExecuteStatement",
                Some("ThrottlingException".to_string()),
                "rate exceeded",
            ));
        }
        if let Some(page) = state.pages.pop_front() {
            return Ok(page);
        }

        let filter = equality_filter(request.expression());
        let rows = rows_mut(&mut state, "ExecuteStatement", domain)?;
        let mut items: Vec<SelectedItem> = rows
            .iter()
            .filter(|(_, attrs)| !attrs.is_empty())
            .filter(|(_, attrs)| match &filter {
                Some((name, value)) => attrs.get(name) == Some(value),
                None => true,
            })
            .map(|(name, attrs)| SelectedItem {
                name: name.clone(),
                attributes: attrs
                    .iter()
                    .map(|(k, v)| Attribute::new(k, v))
                    .collect(),
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(SelectPage {
            items,
            next_token: None,
        })
    }
}
