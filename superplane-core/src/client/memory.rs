//! In-memory [`CanvasApi`] used by tests and offline runs.
//!
//! State is seeded through the `with_*` builders; every call is recorded so
//! tests can assert on what a command asked the server to do.

use super::{ApiError, ApiResult, CanvasApi, DomainScope, ListOptions};
use crate::models::{
    Canvas, CanvasEvent, DescribeCanvasResponse, DescribeOrganizationResponse,
    DescribeSecretResponse, ListCanvasesResponse, ListEventsResponse, ListExecutionsResponse,
    ListQueueItemsResponse, ListSecretsResponse, Me, NodeExecution, Organization,
    OrganizationMetadata, QueueItem, Secret,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct State {
    me: Option<Me>,
    organizations: BTreeMap<String, Organization>,
    canvases: Vec<Canvas>,
    events: BTreeMap<String, Vec<CanvasEvent>>,
    executions: BTreeMap<String, Vec<NodeExecution>>,
    queues: BTreeMap<(String, String), Vec<QueueItem>>,
    secrets: Vec<Secret>,
    cancelled: Vec<String>,
    calls: Vec<String>,
    next_id: u32,
}

impl State {
    fn allocate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

fn not_found(what: &str, id: &str) -> ApiError {
    ApiError::Status {
        status: 404,
        body: format!("{} {} not found", what, id),
    }
}

/// Fake server holding canvases, events, executions, queues and secrets in memory.
#[derive(Default)]
pub struct MemoryCanvasApi {
    state: Mutex<State>,
}

impl MemoryCanvasApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: impl Into<String>) -> MutexGuard<'_, State> {
        let mut state = self.state();
        state.calls.push(call.into());
        state
    }

    /// Authenticated user; also registers the organization under `organization_name`.
    pub fn with_user(self, user_id: &str, email: &str, organization: Option<(&str, &str)>) -> Self {
        {
            let mut state = self.state();
            state.me = Some(Me {
                id: user_id.to_string(),
                email: email.to_string(),
                organization_id: organization.map(|(id, _)| id.to_string()),
            });
            if let Some((id, name)) = organization {
                state.organizations.insert(
                    id.to_string(),
                    Organization {
                        metadata: OrganizationMetadata {
                            id: id.to_string(),
                            name: name.to_string(),
                            ..OrganizationMetadata::default()
                        },
                    },
                );
            }
        }
        self
    }

    pub fn with_canvas(self, id: &str, name: &str) -> Self {
        {
            let mut canvas = Canvas::empty(name);
            canvas.metadata.id = Some(id.to_string());
            self.state().canvases.push(canvas);
        }
        self
    }

    /// Event on `canvas_id`; its executions become visible through both
    /// the event and its node.
    pub fn with_event(self, canvas_id: &str, event: CanvasEvent) -> Self {
        {
            let mut state = self.state();
            for execution in &event.executions {
                state
                    .executions
                    .entry(format!("{}/{}", canvas_id, event.id))
                    .or_default()
                    .push(execution.clone());
                state
                    .executions
                    .entry(format!("{}/node/{}", canvas_id, execution.node_id))
                    .or_default()
                    .push(execution.clone());
            }
            state
                .events
                .entry(canvas_id.to_string())
                .or_default()
                .push(event);
        }
        self
    }

    pub fn with_queue_item(self, canvas_id: &str, node_id: &str, item: QueueItem) -> Self {
        self.state()
            .queues
            .entry((canvas_id.to_string(), node_id.to_string()))
            .or_default()
            .push(item);
        self
    }

    pub fn with_secret(self, secret: Secret) -> Self {
        self.state().secrets.push(secret);
        self
    }

    /// Calls made so far, e.g. `"describe_canvas c-1"`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn canvases(&self) -> Vec<Canvas> {
        self.state().canvases.clone()
    }

    pub fn secrets(&self) -> Vec<Secret> {
        self.state().secrets.clone()
    }

    pub fn cancelled_executions(&self) -> Vec<String> {
        self.state().cancelled.clone()
    }

    pub fn queue_items(&self, canvas_id: &str, node_id: &str) -> Vec<QueueItem> {
        self.state()
            .queues
            .get(&(canvas_id.to_string(), node_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

fn apply_limit<T>(mut items: Vec<T>, options: &ListOptions) -> Vec<T> {
    if let Some(limit) = options.limit.filter(|limit| *limit > 0) {
        items.truncate(limit as usize);
    }
    items
}

fn filter_before(events: Vec<CanvasEvent>, options: &ListOptions) -> Vec<CanvasEvent> {
    match options.before {
        Some(before) => events
            .into_iter()
            .filter(|event| event.created_at.map_or(true, |at| at < before))
            .collect(),
        None => events,
    }
}

fn secret_matches(secret: &Secret, id_or_name: &str) -> bool {
    secret.id() == id_or_name || secret.metadata.name == id_or_name
}

fn in_scope(secret: &Secret, scope: &DomainScope) -> bool {
    secret
        .metadata
        .domain_id
        .as_deref()
        .map_or(true, |id| id == scope.domain_id)
}

#[async_trait]
impl CanvasApi for MemoryCanvasApi {
    async fn me(&self) -> ApiResult<Me> {
        let state = self.record("me");
        state.me.clone().ok_or_else(|| ApiError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        })
    }

    async fn describe_organization(
        &self,
        organization_id: &str,
    ) -> ApiResult<DescribeOrganizationResponse> {
        let state = self.record(format!("describe_organization {}", organization_id));
        state
            .organizations
            .get(organization_id)
            .cloned()
            .map(|organization| DescribeOrganizationResponse { organization })
            .ok_or_else(|| not_found("organization", organization_id))
    }

    async fn list_canvases(&self) -> ApiResult<ListCanvasesResponse> {
        let state = self.record("list_canvases");
        Ok(ListCanvasesResponse {
            canvases: state.canvases.clone(),
        })
    }

    async fn describe_canvas(&self, canvas_id: &str) -> ApiResult<DescribeCanvasResponse> {
        let state = self.record(format!("describe_canvas {}", canvas_id));
        state
            .canvases
            .iter()
            .find(|canvas| canvas.id() == canvas_id)
            .cloned()
            .map(|canvas| DescribeCanvasResponse { canvas })
            .ok_or_else(|| not_found("canvas", canvas_id))
    }

    async fn create_canvas(&self, canvas: &Canvas) -> ApiResult<DescribeCanvasResponse> {
        let mut state = self.record(format!("create_canvas {}", canvas.metadata.name));
        let mut created = canvas.clone();
        created.metadata.id = Some(state.allocate_id("canvas"));
        state.canvases.push(created.clone());
        Ok(DescribeCanvasResponse { canvas: created })
    }

    async fn update_canvas(
        &self,
        canvas_id: &str,
        canvas: &Canvas,
    ) -> ApiResult<DescribeCanvasResponse> {
        let mut state = self.record(format!("update_canvas {}", canvas_id));
        let existing = state
            .canvases
            .iter_mut()
            .find(|existing| existing.id() == canvas_id)
            .ok_or_else(|| not_found("canvas", canvas_id))?;

        *existing = canvas.clone();
        existing.metadata.id = Some(canvas_id.to_string());
        Ok(DescribeCanvasResponse {
            canvas: existing.clone(),
        })
    }

    async fn delete_canvas(&self, canvas_id: &str) -> ApiResult<Value> {
        let mut state = self.record(format!("delete_canvas {}", canvas_id));
        let before = state.canvases.len();
        state.canvases.retain(|canvas| canvas.id() != canvas_id);
        if state.canvases.len() == before {
            return Err(not_found("canvas", canvas_id));
        }
        Ok(json!({}))
    }

    async fn list_canvas_events(
        &self,
        canvas_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListEventsResponse> {
        let state = self.record(format!("list_canvas_events {}", canvas_id));
        let events = state.events.get(canvas_id).cloned().unwrap_or_default();
        Ok(ListEventsResponse {
            events: apply_limit(filter_before(events, options), options),
        })
    }

    async fn list_event_executions(
        &self,
        canvas_id: &str,
        event_id: &str,
    ) -> ApiResult<ListExecutionsResponse> {
        let state = self.record(format!("list_event_executions {} {}", canvas_id, event_id));
        Ok(ListExecutionsResponse {
            executions: state
                .executions
                .get(&format!("{}/{}", canvas_id, event_id))
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn list_node_events(
        &self,
        canvas_id: &str,
        node_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListEventsResponse> {
        let state = self.record(format!("list_node_events {} {}", canvas_id, node_id));
        let events = state
            .events
            .get(canvas_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|event| event.node_id == node_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(ListEventsResponse {
            events: apply_limit(filter_before(events, options), options),
        })
    }

    async fn list_node_executions(
        &self,
        canvas_id: &str,
        node_id: &str,
        options: &ListOptions,
    ) -> ApiResult<ListExecutionsResponse> {
        let state = self.record(format!("list_node_executions {} {}", canvas_id, node_id));
        let executions = state
            .executions
            .get(&format!("{}/node/{}", canvas_id, node_id))
            .cloned()
            .unwrap_or_default();
        Ok(ListExecutionsResponse {
            executions: apply_limit(executions, options),
        })
    }

    async fn cancel_execution(&self, canvas_id: &str, execution_id: &str) -> ApiResult<Value> {
        let mut state = self.record(format!("cancel_execution {} {}", canvas_id, execution_id));
        state.cancelled.push(execution_id.to_string());
        Ok(json!({}))
    }

    async fn list_node_queue_items(
        &self,
        canvas_id: &str,
        node_id: &str,
    ) -> ApiResult<ListQueueItemsResponse> {
        let state = self.record(format!("list_node_queue_items {} {}", canvas_id, node_id));
        Ok(ListQueueItemsResponse {
            items: state
                .queues
                .get(&(canvas_id.to_string(), node_id.to_string()))
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn delete_node_queue_item(
        &self,
        canvas_id: &str,
        node_id: &str,
        item_id: &str,
    ) -> ApiResult<Value> {
        let mut state = self.record(format!(
            "delete_node_queue_item {} {} {}",
            canvas_id, node_id, item_id
        ));
        let queue = state
            .queues
            .get_mut(&(canvas_id.to_string(), node_id.to_string()))
            .ok_or_else(|| not_found("queue item", item_id))?;
        let before = queue.len();
        queue.retain(|item| item.id != item_id);
        if queue.len() == before {
            return Err(not_found("queue item", item_id));
        }
        Ok(json!({}))
    }

    async fn list_secrets(&self, scope: &DomainScope) -> ApiResult<ListSecretsResponse> {
        let state = self.record(format!("list_secrets {}", scope.domain_id));
        Ok(ListSecretsResponse {
            secrets: state
                .secrets
                .iter()
                .filter(|secret| in_scope(secret, scope))
                .cloned()
                .collect(),
        })
    }

    async fn describe_secret(
        &self,
        scope: &DomainScope,
        id_or_name: &str,
    ) -> ApiResult<DescribeSecretResponse> {
        let state = self.record(format!("describe_secret {}", id_or_name));
        state
            .secrets
            .iter()
            .find(|secret| in_scope(secret, scope) && secret_matches(secret, id_or_name))
            .cloned()
            .map(|secret| DescribeSecretResponse { secret })
            .ok_or_else(|| not_found("secret", id_or_name))
    }

    async fn create_secret(
        &self,
        scope: &DomainScope,
        secret: &Secret,
    ) -> ApiResult<DescribeSecretResponse> {
        let mut state = self.record(format!("create_secret {}", secret.metadata.name));
        let mut created = secret.clone();
        created.metadata.id = Some(state.allocate_id("secret"));
        created.metadata.domain_type = Some(scope.domain_type.clone());
        created.metadata.domain_id = Some(scope.domain_id.clone());
        state.secrets.push(created.clone());
        Ok(DescribeSecretResponse { secret: created })
    }

    async fn update_secret(
        &self,
        scope: &DomainScope,
        id_or_name: &str,
        secret: &Secret,
    ) -> ApiResult<DescribeSecretResponse> {
        let mut state = self.record(format!("update_secret {}", id_or_name));
        let existing = state
            .secrets
            .iter_mut()
            .find(|existing| in_scope(existing, scope) && secret_matches(existing, id_or_name))
            .ok_or_else(|| not_found("secret", id_or_name))?;

        let metadata = existing.metadata.clone();
        *existing = secret.clone();
        existing.metadata.id = metadata.id;
        existing.metadata.domain_type = metadata.domain_type;
        existing.metadata.domain_id = metadata.domain_id;
        Ok(DescribeSecretResponse {
            secret: existing.clone(),
        })
    }

    async fn delete_secret(&self, scope: &DomainScope, id_or_name: &str) -> ApiResult<Value> {
        let mut state = self.record(format!("delete_secret {}", id_or_name));
        let before = state.secrets.len();
        state
            .secrets
            .retain(|secret| !(in_scope(secret, scope) && secret_matches(secret, id_or_name)));
        if state.secrets.len() == before {
            return Err(not_found("secret", id_or_name));
        }
        Ok(json!({}))
    }
}
