use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::ProvideErrorMetadata,
    operation::{
        create_table::CreateTableError, delete_table::DeleteTableError,
        update_item::UpdateItemError,
    },
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
        ReturnValue, ScalarAttributeType, TableStatus,
    },
    Client,
};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

use super::{
    convert, Attribute, AttributeStore, ReplaceableAttribute, SelectPage, SelectRequest,
};
use crate::error::{Error, Result};

/// Name of the hash key attribute holding the item name.
pub const DEFAULT_KEY_ATTRIBUTE: &str = "itemName";

/// Tunables for [`DynamoStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Hash key attribute of every domain table.
    pub key_attribute: String,
    /// Whether `create_domain` returns only once the table is `ACTIVE`.
    pub wait_for_active: bool,
    pub poll_interval: Duration,
    pub activation_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
            wait_for_active: true,
            poll_interval: Duration::from_secs(2),
            activation_timeout: Duration::from_secs(120),
        }
    }
}

/// DynamoDB implementation of [`AttributeStore`].
///
/// Each domain is a DynamoDB table keyed by a single string hash key
/// (`itemName` by default). Item attributes are the remaining top-level
/// attributes of the row; listings run as PartiQL `ExecuteStatement` calls.
///
/// # Operations
///
/// - **create_domain**: `CreateTable` (on-demand billing), then waits for `ACTIVE`
/// - **delete_domain**: `DeleteTable`
/// - **get_attributes**: `GetItem`
/// - **put_attributes**: `UpdateItem` with a `SET` expression
/// - **delete_attributes**: `UpdateItem` with a `REMOVE` expression, or `DeleteItem`;
///   a row left with only its key is deleted
/// - **select**: `ExecuteStatement`
///
/// # Example
///
/// ```rust,no_run
/// use dynamo_region::{AttributeStore, DynamoStore};
///
/// # async fn run() -> dynamo_region::Result<()> {
/// let config = aws_config::load_from_env().await;
/// let store = DynamoStore::new(&config);
/// store.check_auth().await?;
/// store.create_domain("users").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DynamoStore {
    client: Client,
    options: StoreOptions,
}

impl DynamoStore {
    /// Creates a new `DynamoStore` with default options.
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config), StoreOptions::default())
    }

    pub fn from_client(client: Client, options: StoreOptions) -> Self {
        Self { client, options }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Verifies authentication by attempting to list tables.
    pub async fn check_auth(&self) -> Result<()> {
        self.client.list_tables().send().await.map_err(|e| {
            error!("Authentication failed: {}", e);
            remote("ListTables", e.into_service_error())
        })?;
        info!("Authentication successful");
        Ok(())
    }

    async fn wait_until_active(&self, table_name: &str) -> Result<()> {
        let deadline = Instant::now() + self.options.activation_timeout;

        loop {
            let output = self
                .client
                .describe_table()
                .table_name(table_name)
                .send()
                .await
                .map_err(|e| remote("DescribeTable", e.into_service_error()))?;

            let status = output.table().and_then(|table| table.table_status());
            if status == Some(&TableStatus::Active) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(Error::ActivationTimeout {
                    domain: table_name.to_string(),
                });
            }
            debug!("Table '{table_name}' is {:?}, waiting", status);
            sleep(self.options.poll_interval).await;
        }
    }

    async fn delete_row(&self, domain: &str, item: &str) -> Result<()> {
        debug!("DeleteItem '{item}' from '{domain}'");
        let (key_name, key_value) = self.key(item);
        self.client
            .delete_item()
            .table_name(domain)
            .key(key_name, key_value)
            .send()
            .await
            .map_err(|e| remote("DeleteItem", e.into_service_error()))?;
        Ok(())
    }

    fn key(&self, item: &str) -> (String, AttributeValue) {
        (
            self.options.key_attribute.clone(),
            AttributeValue::S(item.to_string()),
        )
    }
}

#[async_trait]
impl AttributeStore for DynamoStore {
    fn key_attribute(&self) -> Option<&str> {
        Some(&self.options.key_attribute)
    }

    async fn create_domain(&self, domain: &str) -> Result<()> {
        let attribute_definition = AttributeDefinition::builder()
            .attribute_name(&self.options.key_attribute)
            .attribute_type(ScalarAttributeType::S)
            .build()?;

        let key_schema = KeySchemaElement::builder()
            .attribute_name(&self.options.key_attribute)
            .key_type(KeyType::Hash)
            .build()?;

        let created = self
            .client
            .create_table()
            .table_name(domain)
            .billing_mode(BillingMode::PayPerRequest)
            .attribute_definitions(attribute_definition)
            .key_schema(key_schema)
            .send()
            .await;

        match created {
            Ok(_) => info!("Table '{domain}' created"),
            Err(e) => match e.into_service_error() {
                CreateTableError::ResourceInUseException(_) => {
                    info!("Table '{domain}' exists");
                }
                err => return Err(remote("CreateTable", err)),
            },
        }

        if self.options.wait_for_active {
            self.wait_until_active(domain).await?;
        }
        Ok(())
    }

    async fn delete_domain(&self, domain: &str) -> Result<()> {
        let deleted = self.client.delete_table().table_name(domain).send().await;

        match deleted {
            Ok(_) => info!("Table '{domain}' deleted"),
            Err(e) => match e.into_service_error() {
                DeleteTableError::ResourceNotFoundException(_) => {
                    info!("Table '{domain}' does not exist");
                }
                err => return Err(remote("DeleteTable", err)),
            },
        }
        Ok(())
    }

    async fn get_attributes(
        &self,
        domain: &str,
        item: &str,
        consistent_read: bool,
    ) -> Result<Vec<Attribute>> {
        debug!("GetItem '{item}' from '{domain}'");
        let (key_name, key_value) = self.key(item);
        let response = self
            .client
            .get_item()
            .table_name(domain)
            .key(key_name, key_value)
            .consistent_read(consistent_read)
            .send()
            .await
            .map_err(|e| remote("GetItem", e.into_service_error()))?;

        Ok(response
            .item
            .map(|attrs| convert::item_to_attributes(attrs, &self.options.key_attribute))
            .unwrap_or_default())
    }

    async fn put_attributes(
        &self,
        domain: &str,
        item: &str,
        attributes: Vec<ReplaceableAttribute>,
    ) -> Result<()> {
        if attributes.is_empty() {
            debug!("No attributes to put into '{item}' in '{domain}'");
            return Ok(());
        }

        debug!(
            "UpdateItem '{item}' in '{domain}' with {} attribute(s)",
            attributes.len()
        );
        let parts = convert::set_expression(attributes);
        let (key_name, key_value) = self.key(item);
        self.client
            .update_item()
            .table_name(domain)
            .key(key_name, key_value)
            .update_expression(parts.expression)
            .set_expression_attribute_names(Some(parts.names))
            .set_expression_attribute_values(Some(parts.values))
            .send()
            .await
            .map_err(|e| remote("UpdateItem", e.into_service_error()))?;
        Ok(())
    }

    async fn delete_attributes(&self, domain: &str, item: &str, names: Vec<String>) -> Result<()> {
        if names.is_empty() {
            return self.delete_row(domain, item).await;
        }

        debug!("Removing {:?} from '{item}' in '{domain}'", names);
        let parts = convert::remove_expression(names, &self.options.key_attribute);
        let (key_name, key_value) = self.key(item);
        let removed = self
            .client
            .update_item()
            .table_name(domain)
            .key(key_name, key_value)
            .update_expression(parts.expression)
            .condition_expression("attribute_exists(#key)")
            .set_expression_attribute_names(Some(parts.names))
            .return_values(ReturnValue::AllNew)
            .send()
            .await;

        let output = match removed {
            Ok(output) => output,
            Err(e) => {
                return match e.into_service_error() {
                    // Nothing stored under this name.
                    UpdateItemError::ConditionalCheckFailedException(_) => Ok(()),
                    err => Err(remote("UpdateItem", err)),
                };
            }
        };

        // A row holding only its key does not exist.
        let key_only = output.attributes().map_or(true, |attrs| {
            convert::is_key_only(attrs, &self.options.key_attribute)
        });
        if key_only {
            self.delete_row(domain, item).await?;
        }
        Ok(())
    }

    async fn select(
        &self,
        domain: &str,
        request: &SelectRequest,
        next_token: Option<&str>,
    ) -> Result<SelectPage> {
        debug!(
            "ExecuteStatement on '{domain}' (token: {})",
            next_token.is_some()
        );
        let response = self
            .client
            .execute_statement()
            .statement(request.expression())
            .consistent_read(request.is_consistent_read())
            .set_next_token(next_token.map(str::to_owned))
            .send()
            .await
            .map_err(|e| remote("ExecuteStatement", e.into_service_error()))?;

        let items = response
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| convert::item_to_selected(item, &self.options.key_attribute))
            .collect();

        Ok(SelectPage {
            items,
            next_token: response.next_token,
        })
    }
}

fn remote<E>(operation: &'static str, err: E) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    Error::remote(operation, err.code().map(str::to_owned), err)
}
