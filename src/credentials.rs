//! # Credentials
//!
//! How to reach the attribute store. Three construction styles form a closed
//! set: static keys, the ambient credential chain of the host, and static
//! keys pointed at a custom endpoint (a local emulator, usually).
//!
//! Key material is validated when the value is built, so a malformed key
//! fails with [`Error::Configuration`] before any network call.

use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::{DynamoStore, StoreOptions};

/// Region used when none is given.
pub const DEFAULT_REGION: &str = "us-east-1";

static KEY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9]{20}$").unwrap());
static SECRET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9+/=]{40}$").unwrap());
static REGION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-z0-9]+$").unwrap());

/// A validated access key, secret and region.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessKeys {
    key: String,
    secret: String,
    region: String,
}

impl AccessKeys {
    /// Keys for the default region.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        Self::in_region(key, secret, DEFAULT_REGION)
    }

    pub fn in_region(
        key: impl Into<String>,
        secret: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self> {
        let key = key.into();
        if !KEY_RE.is_match(&key) {
            return Err(Error::Configuration(format!("Invalid AWS key '{key}'")));
        }
        let secret = secret.into();
        if !SECRET_RE.is_match(&secret) {
            return Err(Error::Configuration("Invalid AWS secret key".to_string()));
        }
        let region = validate_region(region.into())?;
        Ok(Self {
            key,
            secret,
            region,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn provider(&self) -> aws_sdk_dynamodb::config::Credentials {
        aws_sdk_dynamodb::config::Credentials::new(
            &self.key,
            &self.secret,
            None,
            None,
            "dynamo-region",
        )
    }
}

impl fmt::Display for AccessKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.key)
    }
}

impl fmt::Debug for AccessKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeys")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Authentication and endpoint settings for the attribute store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Credentials {
    /// Static keys.
    Simple(AccessKeys),
    /// Identity resolved by the hosting environment (instance role, profile, env).
    Assumed { region: String },
    /// Static keys sent to an explicit endpoint, signed for `us-east-1`.
    Direct { keys: AccessKeys, endpoint: String },
}

impl Credentials {
    pub fn simple(key: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        AccessKeys::new(key, secret).map(Self::Simple)
    }

    pub fn simple_in(
        key: impl Into<String>,
        secret: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self> {
        AccessKeys::in_region(key, secret, region).map(Self::Simple)
    }

    pub fn assumed() -> Self {
        Self::Assumed {
            region: DEFAULT_REGION.to_string(),
        }
    }

    pub fn assumed_in(region: impl Into<String>) -> Result<Self> {
        Ok(Self::Assumed {
            region: validate_region(region.into())?,
        })
    }

    pub fn direct(keys: AccessKeys, endpoint: impl Into<String>) -> Self {
        Self::Direct {
            keys,
            endpoint: endpoint.into(),
        }
    }

    /// Keys pointed at `http://localhost:{port}`.
    pub fn local(keys: AccessKeys, port: u16) -> Self {
        Self::direct(keys, format!("http://localhost:{port}"))
    }

    /// Well-formed dummy keys, for tests.
    pub fn test() -> Self {
        Self::Simple(AccessKeys {
            key: "AAAAAAAAAAAAAAAAAAAA".to_string(),
            secret: "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
            region: DEFAULT_REGION.to_string(),
        })
    }

    /// Reads the standard AWS environment variables.
    ///
    /// - `AWS_ACCESS_KEY_ID` + `AWS_SECRET_ACCESS_KEY` select static keys
    /// - `AWS_REGION` sets the region (default `us-east-1`)
    /// - `AWS_ENDPOINT_URL`, together with keys, selects a custom endpoint
    ///
    /// Without keys the ambient credential chain is used.
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let region = var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string());

        match (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
            (Some(key), Some(secret)) => {
                let keys = AccessKeys::in_region(key, secret, region)?;
                Ok(match var("AWS_ENDPOINT_URL") {
                    Some(endpoint) => Self::direct(keys, endpoint),
                    None => Self::Simple(keys),
                })
            }
            _ => Self::assumed_in(region),
        }
    }

    pub fn region(&self) -> &str {
        match self {
            Self::Simple(keys) => keys.region(),
            Self::Assumed { region } => region,
            Self::Direct { .. } => DEFAULT_REGION,
        }
    }

    /// Builds a connected store with default options.
    pub async fn connect(&self) -> Result<DynamoStore> {
        self.connect_with(StoreOptions::default()).await
    }

    pub async fn connect_with(&self, options: StoreOptions) -> Result<DynamoStore> {
        debug!("Connecting with {}", self);
        let client = match self {
            Self::Simple(keys) => {
                let config = aws_sdk_dynamodb::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(keys.region.clone()))
                    .credentials_provider(keys.provider())
                    .build();
                aws_sdk_dynamodb::Client::from_conf(config)
            }
            Self::Assumed { region } => {
                let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(aws_config::Region::new(region.clone()))
                    .load()
                    .await;
                aws_sdk_dynamodb::Client::new(&sdk_config)
            }
            Self::Direct { keys, endpoint } => {
                let config = aws_sdk_dynamodb::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(Region::new(DEFAULT_REGION))
                    .endpoint_url(endpoint)
                    .credentials_provider(keys.provider())
                    .build();
                aws_sdk_dynamodb::Client::from_conf(config)
            }
        };
        Ok(DynamoStore::from_client(client, options))
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(keys) => write!(f, "{keys}"),
            Self::Assumed { region } => write!(f, "{region}"),
            Self::Direct { keys, endpoint } => write!(f, "{keys} at {endpoint}"),
        }
    }
}

fn validate_region(region: String) -> Result<String> {
    if REGION_RE.is_match(&region) {
        Ok(region)
    } else {
        Err(Error::Configuration(format!(
            "Invalid AWS region name '{region}'"
        )))
    }
}
