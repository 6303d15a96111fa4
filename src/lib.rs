//! # Dynamo Region
//!
//! A thin object layer over DynamoDB: regions hand out domains (tables),
//! domains hand out items (rows), and items behave like string-to-string
//! maps whose every read and write is a remote call.
//!
//! ## Components
//!
//! - `Credentials`: how to reach the store (static keys, ambient, custom endpoint).
//! - `Region`: a connected store; entry point for `Domain`s.
//! - `Domain`: create, drop, item lookup and select.
//! - `Item`: attribute map facade with no local cache.
//! - `Select`: lazy, paged iteration over query results.
//! - `AttributeStore`: the remote API; `DynamoStore` implements it.
//!
//! ## Usage
//!
//! `Credentials::from_env` reads the usual AWS variables:
//!
//! - `AWS_ACCESS_KEY_ID`: Your AWS access key ID.
//! - `AWS_SECRET_ACCESS_KEY`: Your AWS secret access key.
//! - `AWS_REGION`: The AWS region where your tables are located.
//! - `AWS_ENDPOINT_URL`: Optional custom endpoint (e.g., DynamoDB Local).
//!
//! ```rust,no_run
//! use dynamo_region::{Credentials, Region};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let region = Region::connect(&Credentials::from_env()?).await?;
//!     let users = region.domain("users");
//!     users.create().await?;
//!
//!     let bob = users.item("bob");
//!     bob.put_all([("name", "Bob"), ("email", "bob@example.com")]).await?;
//!     println!("{} has {} attributes", bob, bob.size().await?);
//!
//!     users.drop().await?;
//!     Ok(())
//! }
//! ```

mod credentials;
mod domain;
pub mod error;
mod item;
pub mod logging;
mod region;
mod select;
pub mod store;

#[cfg(test)]
mod testing;

pub use credentials::{AccessKeys, Credentials, DEFAULT_REGION};
pub use domain::Domain;
pub use error::{Error, Result};
pub use item::Item;
pub use region::Region;
pub use select::Select;
pub use store::{
    Attribute, AttributeStore, DynamoStore, ReplaceableAttribute, SelectPage, SelectRequest,
    SelectedItem, StoreOptions,
};
