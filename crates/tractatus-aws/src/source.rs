//! AWS data source

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use tractatus_inventory::{DataSource, InventoryError, ResourceInfo};

use crate::classify::{classify, is_eks_resource};
use crate::client::{TaggingApi, TaggingClient};
use crate::config::AccountConfig;

/// How the tagging client is obtained
enum ApiHandle {
    /// Build an SDK client on first collection
    Connect {
        account: AccountConfig,
        use_profile: bool,
    },
    /// Use an already constructed client
    Ready(Arc<dyn TaggingApi>),
}

/// Tagged compute resources of one AWS account
pub struct AwsDataSource {
    account_name: String,
    api: ApiHandle,
}

impl AwsDataSource {
    /// Create a source that connects with the account's settings
    pub fn new(account_name: impl Into<String>, account: AccountConfig, use_profile: bool) -> Self {
        Self {
            account_name: account_name.into(),
            api: ApiHandle::Connect {
                account,
                use_profile,
            },
        }
    }

    /// Create a source over an existing tagging client
    pub fn with_api(account_name: impl Into<String>, api: Arc<dyn TaggingApi>) -> Self {
        Self {
            account_name: account_name.into(),
            api: ApiHandle::Ready(api),
        }
    }

    async fn tagging_api(&self) -> Result<Arc<dyn TaggingApi>, InventoryError> {
        match &self.api {
            ApiHandle::Ready(api) => Ok(Arc::clone(api)),
            ApiHandle::Connect {
                account,
                use_profile,
            } => {
                let client = TaggingClient::connect(&self.account_name, account, *use_profile)
                    .await
                    .map_err(|e| e.into_inventory_error(&self.account_name))?;
                Ok(Arc::new(client))
            }
        }
    }
}

#[async_trait]
impl DataSource for AwsDataSource {
    fn name(&self) -> &str {
        "AWS"
    }

    fn target(&self) -> &str {
        &self.account_name
    }

    #[instrument(skip(self), fields(account = %self.account_name))]
    async fn collect(&self) -> Result<Vec<ResourceInfo>, InventoryError> {
        let api = self.tagging_api().await?;

        let raw = api
            .get_all_resources()
            .await
            .map_err(|e| e.into_inventory_error(&self.account_name))?;

        let mut resources = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for resource in &raw {
            if is_eks_resource(&resource.tags) {
                debug!(arn = %resource.arn, "skipping EKS resource");
                skipped += 1;
                continue;
            }
            resources.push(classify(resource, &self.account_name));
        }

        info!(
            resources = resources.len(),
            skipped_eks = skipped,
            "classified account resources"
        );

        Ok(resources)
    }
}
