use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::item::Item;
use crate::select::Select;
use crate::store::{AttributeStore, SelectRequest};

/// A named table of items.
///
/// The handle is only a name reference; it does not check that the table
/// exists. `create` and `drop` are as idempotent as the store makes them:
/// creating an existing table and dropping a missing one both succeed.
///
/// # Example
///
/// ```rust,no_run
/// use dynamo_region::{Credentials, Region, SelectRequest};
///
/// # async fn run() -> dynamo_region::Result<()> {
/// let region = Region::connect(&Credentials::from_env()?).await?;
/// let users = region.domain("users");
/// users.create().await?;
/// users.item("bob").put("name", "Bob").await?;
///
/// let mut bobs = users.select(
///     SelectRequest::new(r#"SELECT * FROM "users" WHERE "name" = 'Bob'"#).consistent_read(true),
/// );
/// while bobs.has_next().await? {
///     println!("{}", bobs.next_item().await?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Domain {
    store: Arc<dyn AttributeStore>,
    name: String,
}

impl Domain {
    pub(crate) fn new(store: Arc<dyn AttributeStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create(&self) -> Result<()> {
        info!("Creating domain '{}'", self.name);
        self.store.create_domain(&self.name).await
    }

    pub async fn drop(&self) -> Result<()> {
        info!("Dropping domain '{}'", self.name);
        self.store.delete_domain(&self.name).await
    }

    /// Handle for one item. Does not touch the network.
    pub fn item(&self, name: impl Into<String>) -> Item {
        Item::new(self.store.clone(), self.name.clone(), name)
    }

    /// Lazy selection of items. Nothing is fetched until it is consumed.
    pub fn select(&self, request: SelectRequest) -> Select {
        Select::new(self.store.clone(), self.name.clone(), request)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain").field("name", &self.name).finish()
    }
}
