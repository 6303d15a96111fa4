//! # Attribute Store
//!
//! The remote boundary of the crate. Everything the object layer does is
//! expressed as one of the calls on [`AttributeStore`]:
//!
//! - `create_domain` / `delete_domain`: table lifecycle
//! - `get_attributes`: full read of one row
//! - `put_attributes`: replace or create attributes of one row in one request
//! - `delete_attributes`: remove named attributes, or the whole row
//! - `select`: one page of a listing, driven by a continuation token
//!
//! [`DynamoStore`] is the production implementation on top of DynamoDB.
//! Implementations must not cache: every call is a fresh round trip.

mod convert;
mod dynamo;

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::Result;

pub use dynamo::{DynamoStore, StoreOptions};

/// One attribute of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An attribute write.
///
/// With `replace` set the stored value is overwritten; without it an
/// existing value is kept and only a missing attribute is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceableAttribute {
    pub name: String,
    pub value: String,
    pub replace: bool,
}

impl ReplaceableAttribute {
    pub fn replacing(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            replace: true,
        }
    }
}

/// An immutable listing query: a select expression plus the read mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectRequest {
    expression: String,
    consistent_read: bool,
}

impl SelectRequest {
    /// Creates an eventually consistent request for `expression`.
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            consistent_read: false,
        }
    }

    pub fn consistent_read(mut self, consistent: bool) -> Self {
        self.consistent_read = consistent;
        self
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn is_consistent_read(&self) -> bool {
        self.consistent_read
    }
}

/// A row as returned by a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItem {
    pub name: String,
    pub attributes: Vec<Attribute>,
}

/// One page of a listing. An empty page may still carry a token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectPage {
    pub items: Vec<SelectedItem>,
    pub next_token: Option<String>,
}

/// Request/response API of the remote key-attribute store.
#[async_trait]
pub trait AttributeStore: Debug + Send + Sync {
    /// Attribute name the store keeps for itself, if any. It can be neither
    /// written nor removed as an ordinary attribute.
    fn key_attribute(&self) -> Option<&str> {
        None
    }

    async fn create_domain(&self, domain: &str) -> Result<()>;

    async fn delete_domain(&self, domain: &str) -> Result<()>;

    async fn get_attributes(
        &self,
        domain: &str,
        item: &str,
        consistent_read: bool,
    ) -> Result<Vec<Attribute>>;

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: Vec<ReplaceableAttribute>,
    ) -> Result<()>;

    /// Deletes the named attributes, or the whole row when `names` is empty.
    async fn delete_attributes(&self, domain: &str, item: &str, names: Vec<String>) -> Result<()>;

    async fn select(
        &self,
        domain: &str,
        request: &SelectRequest,
        next_token: Option<&str>,
    ) -> Result<SelectPage>;
}
