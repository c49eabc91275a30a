//! Resource Groups Tagging API client

use std::collections::BTreeMap;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_resourcegroupstagging as tagging;
use tagging::config::Credentials;
use tagging::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tracing::{debug, instrument};

use crate::classify::RESOURCE_TYPES;
use crate::config::AccountConfig;
use crate::error::{AUTH_ERROR_CODES, AwsError};

/// Resources requested per page
const PAGE_SIZE: i32 = 100;

/// Attempts per request, including the first
const MAX_ATTEMPTS: u32 = 3;

/// A tagged resource as returned by the tagging API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResource {
    /// Resource ARN
    pub arn: String,
    /// Tag key/value pairs
    pub tags: BTreeMap<String, String>,
}

impl RawResource {
    /// Create a resource from an ARN and tag pairs
    pub fn new<K, V>(arn: impl Into<String>, tags: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            arn: arn.into(),
            tags: tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One page of tagging API results
#[derive(Debug, Clone, Default)]
pub struct TagPage {
    /// Resources on this page
    pub resources: Vec<RawResource>,
    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}

/// Paginated access to an account's tagged resources
#[async_trait]
pub trait TaggingApi: Send + Sync {
    /// Fetch one page, starting from `pagination_token`
    async fn get_resources_page(
        &self,
        pagination_token: Option<String>,
    ) -> Result<TagPage, AwsError>;

    /// Fetch every page until the backend stops returning a token
    async fn get_all_resources(&self) -> Result<Vec<RawResource>, AwsError> {
        let mut resources = Vec::new();
        let mut token = None;
        let mut pages = 0usize;

        loop {
            let page = self.get_resources_page(token.take()).await?;
            pages += 1;
            resources.extend(page.resources);

            match page.next_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        debug!(pages, resources = resources.len(), "fetched tagged resources");
        Ok(resources)
    }
}

/// SDK-backed tagging client for one account
#[derive(Debug, Clone)]
pub struct TaggingClient {
    client: tagging::Client,
    account_name: String,
}

impl TaggingClient {
    /// Build a client for an account
    ///
    /// With `use_profile` the shared credentials profile named after the
    /// account is used, otherwise the static keys from `account`.
    ///
    /// # Errors
    /// Returns `Config` if static keys are required but missing, or if no
    /// region can be resolved.
    #[instrument(skip(account))]
    pub async fn connect(
        account_name: &str,
        account: &AccountConfig,
        use_profile: bool,
    ) -> Result<Self, AwsError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS));

        if let Some(region) = account.region.as_ref().filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region.clone()));
        }

        if use_profile {
            loader = loader.profile_name(account_name);
        } else {
            let (key_id, secret) = account.static_keys().ok_or_else(|| {
                AwsError::Config(
                    "access_key_id and secret_access_key are required without profiles"
                        .to_string(),
                )
            })?;
            let session_token = account.session_token.clone().filter(|t| !t.is_empty());
            loader = loader.credentials_provider(Credentials::new(
                key_id,
                secret,
                session_token,
                None,
                "tractatus-config",
            ));
        }

        let conf = loader.load().await;
        if conf.region().is_none() {
            return Err(AwsError::Config("no region configured".to_string()));
        }

        debug!(region = ?conf.region(), "aws client ready");

        Ok(Self {
            client: tagging::Client::new(&conf),
            account_name: account_name.to_string(),
        })
    }

    /// Account this client queries
    #[must_use]
    pub fn account_name(&self) -> &str {
        &self.account_name
    }
}

#[async_trait]
impl TaggingApi for TaggingClient {
    #[instrument(skip(self), fields(account = %self.account_name))]
    async fn get_resources_page(
        &self,
        pagination_token: Option<String>,
    ) -> Result<TagPage, AwsError> {
        let resp = self
            .client
            .get_resources()
            .set_resource_type_filters(Some(
                RESOURCE_TYPES.iter().map(|t| (*t).to_string()).collect(),
            ))
            .resources_per_page(PAGE_SIZE)
            .set_pagination_token(pagination_token)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let resources = resp
            .resource_tag_mapping_list()
            .iter()
            .filter_map(|mapping| {
                let arn = mapping.resource_arn()?;
                Some(RawResource::new(
                    arn,
                    mapping.tags().iter().map(|t| (t.key(), t.value())),
                ))
            })
            .collect();

        Ok(TagPage {
            resources,
            next_token: resp
                .pagination_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }
}

/// Map an SDK failure onto connectivity, auth or API errors
fn map_sdk_error<E, R>(err: SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    let mentions_credentials = detail.to_lowercase().contains("credentials");

    match &err {
        SdkError::ServiceError(service) => {
            let code = service.err().code().unwrap_or("Unknown");
            if AUTH_ERROR_CODES.contains(&code) {
                AwsError::Authentication(detail)
            } else {
                AwsError::Api {
                    code: code.to_string(),
                    message: service.err().message().unwrap_or_default().to_string(),
                }
            }
        }
        SdkError::ConstructionFailure(_) if !mentions_credentials => AwsError::Config(detail),
        _ if mentions_credentials => AwsError::Authentication(detail),
        _ => AwsError::Connection(detail),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct PagedMock {
        pages: Vec<TagPage>,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl TaggingApi for PagedMock {
        async fn get_resources_page(
            &self,
            pagination_token: Option<String>,
        ) -> Result<TagPage, AwsError> {
            let index = match &pagination_token {
                None => 0,
                Some(t) => t.parse::<usize>().unwrap(),
            };
            self.seen_tokens.lock().unwrap().push(pagination_token);
            Ok(self.pages[index].clone())
        }
    }

    fn page(arns: &[&str], next: Option<&str>) -> TagPage {
        TagPage {
            resources: arns
                .iter()
                .map(|a| RawResource::new(*a, Vec::<(String, String)>::new()))
                .collect(),
            next_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_pagination_follows_tokens_in_order() {
        let mock = PagedMock {
            pages: vec![
                page(&["arn:aws:ec2:r:1:instance/a"], Some("1")),
                page(&["arn:aws:ec2:r:1:instance/b"], Some("2")),
                page(&["arn:aws:ec2:r:1:instance/c"], None),
            ],
            seen_tokens: Mutex::new(Vec::new()),
        };

        let all = mock.get_all_resources().await.unwrap();
        let arns: Vec<&str> = all.iter().map(|r| r.arn.as_str()).collect();
        assert_eq!(
            arns,
            [
                "arn:aws:ec2:r:1:instance/a",
                "arn:aws:ec2:r:1:instance/b",
                "arn:aws:ec2:r:1:instance/c"
            ]
        );
        assert_eq!(
            *mock.seen_tokens.lock().unwrap(),
            [None, Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_empty_token_ends_pagination() {
        let mock = PagedMock {
            pages: vec![page(&["arn:aws:lambda:r:1:function:f"], Some(""))],
            seen_tokens: Mutex::new(Vec::new()),
        };

        let all = mock.get_all_resources().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(mock.seen_tokens.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_static_credentials_required_without_profile() {
        let err = TaggingClient::connect("prod", &AccountConfig::with_region("us-east-1"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AwsError::Config(_)));
    }
}
