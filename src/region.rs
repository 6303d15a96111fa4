use std::fmt;
use std::sync::Arc;

use crate::credentials::Credentials;
use crate::domain::Domain;
use crate::error::Result;
use crate::store::{AttributeStore, StoreOptions};

/// Entry point: a connected store from which domains are handed out.
///
/// Cloning is cheap; all clones share one store client.
#[derive(Clone)]
pub struct Region {
    store: Arc<dyn AttributeStore>,
}

impl Region {
    /// Wraps an existing store.
    pub fn new(store: Arc<dyn AttributeStore>) -> Self {
        Self { store }
    }

    /// Connects to DynamoDB with `credentials` and default options.
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        Self::connect_with(credentials, StoreOptions::default()).await
    }

    pub async fn connect_with(credentials: &Credentials, options: StoreOptions) -> Result<Self> {
        let store = credentials.connect_with(options).await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn store(&self) -> &Arc<dyn AttributeStore> {
        &self.store
    }

    pub fn domain(&self, name: impl Into<String>) -> Domain {
        Domain::new(self.store.clone(), name)
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region").field("store", &self.store).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SelectRequest;
    use crate::testing::FakeStore;

    #[tokio::test]
    async fn test_end_to_end() {
        let region = Region::new(Arc::new(FakeStore::new()));
        let table = region.domain("t1");

        table.create().await.unwrap();
        assert_eq!(table.item("r1").put("name", "Bob").await.unwrap(), None);
        table.item("r2").put("name", "Alice").await.unwrap();

        let found = table
            .select(SelectRequest::new("SELECT * FROM t1 WHERE name='Bob'").consistent_read(true))
            .collect_items()
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "r1");
        assert_eq!(found[0].get("name").await.unwrap(), Some("Bob".to_string()));

        let everyone = table
            .select(SelectRequest::new("SELECT * FROM t1"))
            .collect_items()
            .await
            .unwrap();
        assert_eq!(everyone.len(), 2);

        table.drop().await.unwrap();
        let err = table.item("r1").get("name").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_connect_with_test_credentials() {
        let region = Region::connect(&Credentials::test()).await.unwrap();
        assert_eq!(region.domain("t1").name(), "t1");
    }
}
