//! Client capability for the SuperPlane API.
//!
//! Commands only see [`CanvasApi`]; [`HttpCanvasApi`] talks to a real server
//! and [`memory::MemoryCanvasApi`] backs tests.

mod http;
pub mod memory;

pub use http::HttpCanvasApi;

use crate::models::{
    Canvas, DescribeCanvasResponse, DescribeOrganizationResponse, DescribeSecretResponse,
    ListCanvasesResponse, ListEventsResponse, ListExecutionsResponse, ListQueueItemsResponse,
    ListSecretsResponse, Me, Secret, DOMAIN_TYPE_ORGANIZATION,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

/// Errors returned by API calls. Messages are surfaced to the user as is.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid API URL")]
    Url(#[from] url::ParseError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Paging parameters shared by the list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// `None` leaves the limit to the server.
    pub limit: Option<u32>,
    pub before: Option<DateTime<Utc>>,
}

impl ListOptions {
    /// Query pairs for the request; a zero limit is omitted.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit.filter(|limit| *limit > 0) {
            params.push(("limit", limit.to_string()));
        }
        if let Some(before) = self.before {
            params.push(("before", before.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        params
    }
}

/// Authorization domain a secret belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    pub domain_type: String,
    pub domain_id: String,
}

impl DomainScope {
    pub fn organization(organization_id: impl Into<String>) -> Self {
        Self {
            domain_type: DOMAIN_TYPE_ORGANIZATION.to_string(),
            domain_id: organization_id.into(),
        }
    }

    pub fn query(&self) -> [(&'static str, &str); 2] {
        [
            ("domainType", self.domain_type.as_str()),
            ("domainId", self.domain_id.as_str()),
        ]
    }
}

/// One method per remote operation the CLI uses.
#[async_trait]
pub trait CanvasApi: Send + Sync {
    async fn me(&self) -> ApiResult<Me>;

    async fn describe_organization(
        &self,
        organization_id: &str,
    ) -> ApiResult<DescribeOrganizationResponse>;

    async fn list_canvases(&self) -> ApiResult<ListCanvasesResponse>;

    async fn describe_canvas(&self, canvas_id: &str) -> ApiResult<DescribeCanvasResponse>;

    async fn create_canvas(&self, canvas: &Canvas) -> ApiResult<DescribeCanvasResponse>;

    async fn update_canvas(
        &self,
        canvas_id: &str,
        canvas: &Canvas,
    ) -> ApiResult<DescribeCanvasResponse>;

    async fn delete_canvas(&self, canvas_id: &str) -> ApiResult<Value>;

    async fn list_canvas_events(
        &self,
        canvas_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListEventsResponse>;

    async fn list_event_executions(
        &self,
        canvas_id: &str,
        event_id: &str,
    ) -> ApiResult<ListExecutionsResponse>;

    async fn list_node_events(
        &self,
        canvas_id: &str,
        node_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListEventsResponse>;

    async fn list_node_executions(
        &self,
        canvas_id: &str,
        node_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListExecutionsResponse>;

    async fn cancel_execution(&self, canvas_id: &str, execution_id: &str) -> ApiResult<Value>;

    async fn list_node_queue_items(
        &self,
        canvas_id: &str,
        node_id: &str,
    ) -> ApiResult<ListQueueItemsResponse>;

    async fn delete_node_queue_item(
        &self,
        canvas_id: &str,
        node_id: &str,
        item_id: &str,
    ) -> ApiResult<Value>;

    async fn list_secrets(&self, scope: &DomainScope) -> ApiResult<ListSecretsResponse>;

    async fn describe_secret(
        &self,
        scope: &DomainScope,
        id_or_name: &str,
    ) -> ApiResult<DescribeSecretResponse>;

    async fn create_secret(
        &self,
        scope: &DomainScope,
        secret: &Secret,
    ) -> ApiResult<DescribeSecretResponse>;

    async fn update_secret(
        &self,
        scope: &DomainScope,
        id_or_name: &str,
        secret: &Secret,
    ) -> ApiResult<DescribeSecretResponse>;

    async fn delete_secret(&self, scope: &DomainScope, id_or_name: &str) -> ApiResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_list_options_query() {
        assert!(ListOptions::default().query().is_empty());
        assert!(ListOptions {
            limit: Some(0),
            before: None
        }
        .query()
        .is_empty());

        let before = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let options = ListOptions {
            limit: Some(20),
            before: Some(before),
        };
        assert_eq!(
            options.query(),
            vec![
                ("limit", "20".to_string()),
                ("before", "2024-05-01T10:00:00Z".to_string())
            ]
        );
    }

    #[test]
    fn test_organization_scope() {
        let scope = DomainScope::organization("org-1");
        assert_eq!(
            scope.query(),
            [
                ("domainType", "DOMAIN_TYPE_ORGANIZATION"),
                ("domainId", "org-1")
            ]
        );
    }

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "server returned 401: unauthorized");
    }
}
