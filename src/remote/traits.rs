//! remote::traits
//!
//! The `ResourceService` trait and the request/response types exchanged with
//! the remote metadata service.
//!
//! # Design
//!
//! The trait is async because every operation is network I/O. Responses are
//! modelled as optional-field structures: absent or `null` collections decode
//! as empty vectors, so callers never branch on missing data.
//!
//! # Error classification
//!
//! HTTP statuses map onto [`RemoteError`] in exactly one place,
//! [`RemoteError::from_status`]:
//!
//! | Status      | Variant        | Retried |
//! |-------------|----------------|---------|
//! | 400, 404    | `NotFound`     | no      |
//! | 401, 403    | `AuthFailed`   | no      |
//! | 429         | `RateLimited`  | no      |
//! | 503, 504    | `Unavailable`  | yes     |
//! | other       | `ApiError`     | no      |

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::types::ResourceId;

/// Errors from remote service operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// The resource does not exist or is not accessible.
    #[error("not found ({status}): {message}")]
    NotFound { status: u16, message: String },

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The service is throttling this client.
    #[error("rate limited")]
    RateLimited,

    /// The service is temporarily unavailable or overloaded.
    #[error("service unavailable: {status} - {message}")]
    Unavailable { status: u16, message: String },

    /// Any other non-success status.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Transport-level failure.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Transient failures persisted through every allowed attempt.
    #[error("retries exhausted after {attempts} attempts (last status {last_status})")]
    RetryExhausted { last_status: u16, attempts: u32 },
}

impl RemoteError {
    /// Classify a non-success HTTP status.
    ///
    /// # Example
    ///
    /// ```
    /// use refgraph::remote::RemoteError;
    ///
    /// assert!(RemoteError::from_status(503, "busy").is_transient());
    /// assert!(RemoteError::from_status(404, "gone").is_not_found());
    /// assert!(!RemoteError::from_status(500, "boom").is_transient());
    /// ```
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 | 404 => RemoteError::NotFound { status, message },
            401 | 403 => RemoteError::AuthFailed(message),
            429 => RemoteError::RateLimited,
            503 | 504 => RemoteError::Unavailable { status, message },
            _ => RemoteError::ApiError { status, message },
        }
    }

    /// Whether the failure is expected to clear after a short wait.
    pub fn is_transient(&self) -> bool {
        matches!(self, RemoteError::Unavailable { .. })
    }

    /// Whether the failure means the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }

    /// HTTP status associated with the failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::NotFound { status, .. }
            | RemoteError::Unavailable { status, .. }
            | RemoteError::ApiError { status, .. }
            | RemoteError::RetryExhausted {
                last_status: status,
                ..
            } => Some(*status),
            RemoteError::RateLimited => Some(429),
            _ => None,
        }
    }
}

/// Descriptive attributes returned by a metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    /// Display name
    pub name: String,
    /// Resource category
    #[serde(rename = "type")]
    pub category: String,
    /// Version to use for the reference query
    #[serde(default)]
    pub version: Option<u64>,
}

/// Response of a reference query: groups of referenced resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceQueryResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<ReferenceGroup>,
}

/// One group of references in a query response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGroup {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub references: Vec<ReferenceEntry>,
}

/// A single referenced resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: String,
}

impl ReferenceQueryResponse {
    /// Build a single-group response from raw ids.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            results: vec![ReferenceGroup {
                references: ids
                    .into_iter()
                    .map(|id| ReferenceEntry { id: id.into() })
                    .collect(),
            }],
        }
    }

    /// Iterate every referenced id across all groups, in response order.
    pub fn raw_ids(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .flat_map(|group| group.references.iter())
            .map(|entry| entry.id.as_str())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// The remote metadata service.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; discovery calls them from many
/// tasks at once.
///
/// # Error Handling
///
/// Implementations classify failures with [`RemoteError::from_status`].
/// Retrying is the caller's job (see [`crate::remote::ResilientClient`]).
#[async_trait]
pub trait ResourceService: Send + Sync {
    /// Service name for logs.
    fn name(&self) -> &'static str;

    /// Look up a resource's descriptive attributes.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the resource does not exist or is inaccessible
    /// - `Unavailable` for transient server failures
    async fn fetch_metadata(&self, id: &ResourceId) -> Result<RemoteResource, RemoteError>;

    /// Query the resources referenced by `id` at `version`.
    async fn query_references(
        &self,
        id: &ResourceId,
        version: u64,
    ) -> Result<ReferenceQueryResponse, RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(RemoteError::from_status(400, "").is_not_found());
        assert!(RemoteError::from_status(404, "").is_not_found());
        assert!(matches!(
            RemoteError::from_status(401, "x"),
            RemoteError::AuthFailed(_)
        ));
        assert!(matches!(
            RemoteError::from_status(403, "x"),
            RemoteError::AuthFailed(_)
        ));
        assert_eq!(RemoteError::from_status(429, "x"), RemoteError::RateLimited);
        assert!(RemoteError::from_status(503, "").is_transient());
        assert!(RemoteError::from_status(504, "").is_transient());
        assert!(!RemoteError::from_status(500, "").is_transient());
        assert!(!RemoteError::from_status(502, "").is_transient());
    }

    #[test]
    fn status_accessor() {
        assert_eq!(RemoteError::from_status(504, "").status(), Some(504));
        assert_eq!(
            RemoteError::RetryExhausted {
                last_status: 503,
                attempts: 5
            }
            .status(),
            Some(503)
        );
        assert_eq!(RemoteError::NetworkError("x".into()).status(), None);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            RemoteError::RetryExhausted {
                last_status: 503,
                attempts: 5
            }
            .to_string(),
            "retries exhausted after 5 attempts (last status 503)"
        );
        assert_eq!(
            RemoteError::from_status(404, "no such resource").to_string(),
            "not found (404): no such resource"
        );
    }

    #[test]
    fn metadata_decodes_type_as_category() {
        let json = r#"{"name": "Root", "type": "Process", "version": 1}"#;
        let res: RemoteResource = serde_json::from_str(json).unwrap();
        assert_eq!(res.category, "Process");
        assert_eq!(res.version, Some(1));
    }

    #[test]
    fn metadata_version_is_optional() {
        let json = r#"{"name": "Root", "type": "Process"}"#;
        let res: RemoteResource = serde_json::from_str(json).unwrap();
        assert_eq!(res.version, None);
    }

    mod reference_response {
        use super::*;

        #[test]
        fn flattens_groups_in_order() {
            let json = r#"{"results": [
                {"references": [{"id": "a"}, {"id": "b"}]},
                {"references": []},
                {"references": [{"id": "c"}]}
            ]}"#;
            let resp: ReferenceQueryResponse = serde_json::from_str(json).unwrap();
            assert_eq!(resp.raw_ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        }

        #[test]
        fn absent_results_is_empty() {
            let resp: ReferenceQueryResponse = serde_json::from_str("{}").unwrap();
            assert_eq!(resp.raw_ids().count(), 0);
        }

        #[test]
        fn null_results_is_empty() {
            let resp: ReferenceQueryResponse =
                serde_json::from_str(r#"{"results": null}"#).unwrap();
            assert!(resp.results.is_empty());
        }

        #[test]
        fn null_references_is_empty() {
            let resp: ReferenceQueryResponse =
                serde_json::from_str(r#"{"results": [{"references": null}, {}]}"#).unwrap();
            assert_eq!(resp.results.len(), 2);
            assert_eq!(resp.raw_ids().count(), 0);
        }

        #[test]
        fn from_ids_builds_single_group() {
            let resp = ReferenceQueryResponse::from_ids(["x", "y"]);
            assert_eq!(resp.results.len(), 1);
            assert_eq!(resp.raw_ids().collect::<Vec<_>>(), vec!["x", "y"]);
        }
    }
}
