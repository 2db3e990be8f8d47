//! remote::http
//!
//! `ResourceService` implementation over the metadata service's HTTP API.
//!
//! # Endpoints
//!
//! - `GET  {base}/v1/accounts/{account}/resources/{id}` returns
//!   `{ "name", "type", "version" }`
//! - `POST {base}/v1/accounts/{account}/references/query` with
//!   `{ "filter": { "parentId", "parentVersion" } }` returns
//!   `{ "results": [ { "references": [ { "id" } ] } ] }`
//!
//! # Authentication
//!
//! Every request carries `Authorization: Bearer <api_token>`.
//!
//! # Retries
//!
//! This client makes exactly one request per call and classifies failures
//! with [`RemoteError::from_status`]. Retrying is layered on top by
//! [`crate::remote::ResilientClient`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{ReferenceQueryResponse, RemoteError, RemoteResource, ResourceService};
use crate::core::config::RemoteSettings;
use crate::core::types::ResourceId;

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "refgraph-cli";

/// HTTP client for the metadata service.
pub struct HttpResourceService {
    /// HTTP client for making requests
    client: Client,
    /// Parsed service base URL
    base_url: Url,
    /// Account the resources belong to
    account_id: String,
    /// Bearer token
    api_token: String,
}

// Custom Debug to avoid exposing api_token
impl std::fmt::Debug for HttpResourceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResourceService")
            .field("base_url", &self.base_url.as_str())
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Request body for the reference query.
#[derive(Serialize)]
struct QueryBody<'a> {
    filter: QueryFilter<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryFilter<'a> {
    parent_id: &'a str,
    parent_version: u64,
}

/// Error body returned by the service.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl HttpResourceService {
    /// Create a client for the given connection settings.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::InvalidRequest` if the base URL cannot be parsed.
    pub fn new(settings: &RemoteSettings) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&settings.base_url).map_err(|e| {
            RemoteError::InvalidRequest(format!("invalid base URL '{}': {}", settings.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidRequest(format!(
                "base URL '{}' cannot have path segments",
                settings.base_url
            )));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            account_id: settings.account_id.clone(),
            api_token: settings.api_token.clone(),
        })
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, RemoteError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.api_token))
            .map_err(|_| RemoteError::InvalidRequest("API token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// Build URL for an account-scoped endpoint. Segments are percent-encoded.
    fn account_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["v1", "accounts", self.account_id.as_str()])
                .extend(segments);
        }
        url
    }

    /// Decode a successful response or classify the failure.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, RemoteError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| RemoteError::InvalidResponse(format!("failed to parse response: {}", e)))
        } else {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            Err(RemoteError::from_status(status.as_u16(), message))
        }
    }
}

#[async_trait]
impl ResourceService for HttpResourceService {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_metadata(&self, id: &ResourceId) -> Result<RemoteResource, RemoteError> {
        let url = self.account_url(&["resources", id.as_str()]);
        debug!(%url, "fetching resource metadata");

        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn query_references(
        &self,
        id: &ResourceId,
        version: u64,
    ) -> Result<ReferenceQueryResponse, RemoteError> {
        let url = self.account_url(&["references", "query"]);
        debug!(%url, %id, version, "querying references");

        let body = QueryBody {
            filter: QueryFilter {
                parent_id: id.as_str(),
                parent_version: version,
            },
        };

        let response = self
            .client
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::NetworkError(e.to_string()))?;

        self.handle_response(response).await
    }
}
