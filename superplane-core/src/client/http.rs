use super::{ApiError, ApiResult, CanvasApi, DomainScope, ListOptions};
use crate::config::normalize_base_url;
use crate::models::{
    Canvas, DescribeCanvasResponse, DescribeOrganizationResponse, DescribeSecretResponse,
    ListCanvasesResponse, ListEventsResponse, ListExecutionsResponse, ListQueueItemsResponse,
    ListSecretsResponse, Me, Secret,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use url::Url;

#[derive(Serialize)]
struct CanvasPayload<'a> {
    canvas: &'a Canvas,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretPayload<'a> {
    secret: &'a Secret,
    domain_type: &'a str,
    domain_id: &'a str,
}

/// [`CanvasApi`] over HTTP+JSON with bearer-token authentication.
#[derive(Clone)]
pub struct HttpCanvasApi {
    base_url: Url,
    api_token: String,
    client: Client,
}

impl fmt::Debug for HttpCanvasApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpCanvasApi")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpCanvasApi {
    pub fn new(base_url: &str, api_token: &str) -> ApiResult<Self> {
        let base_url = Url::parse(&normalize_base_url(base_url))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Url(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let client = Client::builder()
            .user_agent(concat!("superplane-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            api_token: api_token.trim().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request.bearer_auth(&self.api_token).send().await?;
        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "API response");

        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = if body.trim().is_empty() { "{}" } else { &body };
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        self.send(self.client.get(self.endpoint(segments))).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> ApiResult<T> {
        self.send(self.client.get(self.endpoint(segments)).query(query))
            .await
    }
}

#[async_trait]
impl CanvasApi for HttpCanvasApi {
    async fn me(&self) -> ApiResult<Me> {
        self.get(&["api", "v1", "me"]).await
    }

    async fn describe_organization(
        &self,
        organization_id: &str,
    ) -> ApiResult<DescribeOrganizationResponse> {
        self.get(&["api", "v1", "organizations", organization_id])
            .await
    }

    async fn list_canvases(&self) -> ApiResult<ListCanvasesResponse> {
        self.get(&["api", "v1", "canvases"]).await
    }

    async fn describe_canvas(&self, canvas_id: &str) -> ApiResult<DescribeCanvasResponse> {
        self.get(&["api", "v1", "canvases", canvas_id]).await
    }

    async fn create_canvas(&self, canvas: &Canvas) -> ApiResult<DescribeCanvasResponse> {
        let request = self
            .client
            .post(self.endpoint(&["api", "v1", "canvases"]))
            .json(&CanvasPayload { canvas });
        self.send(request).await
    }

    async fn update_canvas(
        &self,
        canvas_id: &str,
        canvas: &Canvas,
    ) -> ApiResult<DescribeCanvasResponse> {
        let request = self
            .client
            .put(self.endpoint(&["api", "v1", "canvases", canvas_id]))
            .json(&CanvasPayload { canvas });
        self.send(request).await
    }

    async fn delete_canvas(&self, canvas_id: &str) -> ApiResult<Value> {
        let request = self
            .client
            .delete(self.endpoint(&["api", "v1", "canvases", canvas_id]));
        self.send(request).await
    }

    async fn list_canvas_events(
        &self,
        canvas_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListEventsResponse> {
        self.get_with_query(
            &["api", "v1", "canvases", canvas_id, "events"],
            &options.query(),
        )
        .await
    }

    async fn list_event_executions(
        &self,
        canvas_id: &str,
        event_id: &str,
    ) -> ApiResult<ListExecutionsResponse> {
        self.get(&[
            "api",
            "v1",
            "canvases",
            canvas_id,
            "events",
            event_id,
            "executions",
        ])
        .await
    }

    async fn list_node_events(
        &self,
        canvas_id: &str,
        node_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListEventsResponse> {
        self.get_with_query(
            &["api", "v1", "canvases", canvas_id, "nodes", node_id, "events"],
            &options.query(),
        )
        .await
    }

    async fn list_node_executions(
        &self,
        canvas_id: &str,
        node_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListExecutionsResponse> {
        self.get_with_query(
            &[
                "api",
                "v1",
                "canvases",
                canvas_id,
                "nodes",
                node_id,
                "executions",
            ],
            &options.query(),
        )
        .await
    }

    async fn cancel_execution(&self, canvas_id: &str, execution_id: &str) -> ApiResult<Value> {
        let request = self
            .client
            .put(self.endpoint(&[
                "api",
                "v1",
                "canvases",
                canvas_id,
                "executions",
                execution_id,
                "cancel",
            ]))
            .json(&json!({}));
        self.send(request).await
    }

    async fn list_node_queue_items(
        &self,
        canvas_id: &str,
        node_id: &str,
    ) -> ApiResult<ListQueueItemsResponse> {
        self.get(&["api", "v1", "canvases", canvas_id, "nodes", node_id, "queue"])
            .await
    }

    async fn delete_node_queue_item(
        &self,
        canvas_id: &str,
        node_id: &str,
        item_id: &str,
    ) -> ApiResult<Value> {
        let request = self.client.delete(self.endpoint(&[
            "api", "v1", "canvases", canvas_id, "nodes", node_id, "queue", item_id,
        ]));
        self.send(request).await
    }

    async fn list_secrets(&self, scope: &DomainScope) -> ApiResult<ListSecretsResponse> {
        self.get_with_query(&["api", "v1", "secrets"], &scope.query())
            .await
    }

    async fn describe_secret(
        &self,
        scope: &DomainScope,
        id_or_name: &str,
    ) -> ApiResult<DescribeSecretResponse> {
        self.get_with_query(&["api", "v1", "secrets", id_or_name], &scope.query())
            .await
    }

    async fn create_secret(
        &self,
        scope: &DomainScope,
        secret: &Secret,
    ) -> ApiResult<DescribeSecretResponse> {
        let request = self
            .client
            .post(self.endpoint(&["api", "v1", "secrets"]))
            .json(&SecretPayload {
                secret,
                domain_type: &scope.domain_type,
                domain_id: &scope.domain_id,
            });
        self.send(request).await
    }

    async fn update_secret(
        &self,
        scope: &DomainScope,
        id_or_name: &str,
        secret: &Secret,
    ) -> ApiResult<DescribeSecretResponse> {
        let request = self
            .client
            .put(self.endpoint(&["api", "v1", "secrets", id_or_name]))
            .json(&SecretPayload {
                secret,
                domain_type: &scope.domain_type,
                domain_id: &scope.domain_id,
            });
        self.send(request).await
    }

    async fn delete_secret(&self, scope: &DomainScope, id_or_name: &str) -> ApiResult<Value> {
        let request = self
            .client
            .delete(self.endpoint(&["api", "v1", "secrets", id_or_name]))
            .query(&scope.query());
        self.send(request).await
    }
}
