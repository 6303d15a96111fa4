use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{AttributeStore, ReplaceableAttribute};

/// One row of a domain, seen as a string-to-string map.
///
/// An `Item` holds only its identity (domain and item name). It never caches
/// attributes:
///
/// - every read fetches the whole row again with a consistent read
/// - every write is sent to the store before the call returns
///
/// The handle does not reflect its own writes; reading after a write is a
/// new round trip. A row with no attributes cannot be told apart from a row
/// that does not exist.
///
/// The store's key attribute (`itemName` on DynamoDB) is reserved: writing
/// or removing it fails with [`Error::UnsupportedOperation`].
///
/// # Example
///
/// ```rust,no_run
/// use dynamo_region::{Credentials, Region};
///
/// # async fn run() -> dynamo_region::Result<()> {
/// let region = Region::connect(&Credentials::from_env()?).await?;
/// let user = region.domain("users").item("bob");
/// let _before = user.put("email", "bob@example.com").await?;
/// assert_eq!(user.get("email").await?.as_deref(), Some("bob@example.com"));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Item {
    store: Arc<dyn AttributeStore>,
    domain: String,
    name: String,
}

impl Item {
    pub(crate) fn new(
        store: Arc<dyn AttributeStore>,
        domain: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            domain: domain.into(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the domain the item lives in.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Fetches all attributes of the row.
    pub async fn entries(&self) -> Result<HashMap<String, String>> {
        let attributes = self
            .store
            .get_attributes(&self.domain, &self.name, true)
            .await?;
        Ok(attributes
            .into_iter()
            .map(|attr| (attr.name, attr.value))
            .collect())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().await?.remove(key))
    }

    pub async fn contains_key(&self, key: &str) -> Result<bool> {
        Ok(self.entries().await?.contains_key(key))
    }

    pub async fn contains_value(&self, value: &str) -> Result<bool> {
        Ok(self.entries().await?.values().any(|v| v == value))
    }

    /// Attribute names of the row.
    pub async fn keys(&self) -> Result<HashSet<String>> {
        Ok(self.entries().await?.into_keys().collect())
    }

    pub async fn values(&self) -> Result<Vec<String>> {
        Ok(self.entries().await?.into_values().collect())
    }

    pub async fn size(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.entries().await?.is_empty())
    }

    /// Replaces one attribute and returns the value it had before.
    pub async fn put(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>> {
        let key = key.into();
        self.check_writable(&key)?;
        let before = self.get(&key).await?;
        self.put_all([(key, value.into())]).await?;
        Ok(before)
    }

    /// Replaces or creates all given attributes in one request.
    ///
    /// When a name appears more than once, the last value wins.
    pub async fn put_all<I, K, V>(&self, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attributes: HashMap<String, String> = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for name in attributes.keys() {
            self.check_writable(name)?;
        }
        let attributes: Vec<_> = attributes
            .into_iter()
            .map(|(k, v)| ReplaceableAttribute::replacing(k, v))
            .collect();
        debug!("Putting {} attribute(s) into {}", attributes.len(), self);
        self.store
            .put_attributes(&self.domain, &self.name, attributes)
            .await
    }

    /// Deletes one attribute and returns the value it had before.
    pub async fn remove(&self, key: &str) -> Result<Option<String>> {
        self.check_writable(key)?;
        let before = self.get(key).await?;
        self.store
            .delete_attributes(&self.domain, &self.name, vec![key.to_string()])
            .await?;
        Ok(before)
    }

    /// Deletes the whole row.
    pub async fn clear(&self) -> Result<()> {
        debug!("Clearing {}", self);
        self.store
            .delete_attributes(&self.domain, &self.name, Vec::new())
            .await
    }

    /// Reads the row into a struct whose fields are strings.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<T> {
        let item: HashMap<String, AttributeValue> = self
            .entries()
            .await?
            .into_iter()
            .map(|(k, v)| (k, AttributeValue::S(v)))
            .collect();
        Ok(serde_dynamo::aws_sdk_dynamodb_1::from_item(item)?)
    }

    /// Writes every field of `value` in one request.
    ///
    /// Fields must serialize to strings; `None` fields are left untouched.
    pub async fn store<T: Serialize>(&self, value: &T) -> Result<()> {
        let item: HashMap<String, AttributeValue> =
            serde_dynamo::aws_sdk_dynamodb_1::to_item(value)?;
        let mut attributes = Vec::with_capacity(item.len());
        for (name, value) in item {
            match value {
                AttributeValue::S(s) => attributes.push((name, s)),
                AttributeValue::Null(_) => {}
                _ => {
                    debug!("Attribute '{name}' of {self} is not a string");
                    return Err(Error::UnsupportedOperation("non-string attribute value"));
                }
            }
        }
        self.put_all(attributes).await
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if self.store.key_attribute() == Some(name) {
            debug!("Refusing to touch key attribute '{name}' of {self}");
            return Err(Error::UnsupportedOperation("key attribute"));
        }
        Ok(())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.name, self.domain)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("domain", &self.domain)
            .field("name", &self.name)
            .finish()
    }
}
