//! Request-scoped telemetry context
//!
//! Each request carries a context map through the processing pipeline. The
//! first stage to see the request builds a [`TelemetryContext`] from it and
//! attaches it to the request, so later stages reuse the same values.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::LearnerResult;
use crate::keys;

/// Lookup of user records, used to resolve a requester's organisation
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a user record by id, `None` when the user does not exist
    async fn get_user_by_id(&self, user_id: &str) -> LearnerResult<Option<Map<String, Value>>>;
}

pub type BoxedUserDirectory = Arc<dyn UserDirectory>;

/// A request travelling through the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub request_id: String,

    /// Request body
    #[serde(default)]
    pub request: Map<String, Value>,

    /// Caller-supplied and pipeline-added context values
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl ActorRequest {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// String value of a context key, or "" when missing or not a string
    pub fn context_str(&self, key: &str) -> &str {
        self.context.get(key).and_then(Value::as_str).unwrap_or("")
    }

    /// Build the telemetry context if needed and attach it to the request
    pub async fn attach_telemetry(&mut self, env: &str, directory: &dyn UserDirectory) {
        let telemetry = TelemetryContext::initialize(self, env, directory).await;
        self.context
            .insert(keys::TELEMETRY_CONTEXT.to_string(), Value::Object(telemetry.into_map()));
    }
}

/// Telemetry values describing who made a request and from where
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TelemetryContext {
    values: Map<String, Value>,
}

impl TelemetryContext {
    /// Build the telemetry context for `request`.
    ///
    /// A context already attached by an earlier stage is returned as is.
    pub async fn initialize(
        request: &ActorRequest,
        env: &str,
        directory: &dyn UserDirectory,
    ) -> Self {
        if let Some(Value::Object(existing)) = request.context.get(keys::TELEMETRY_CONTEXT) {
            debug!(request_id = %request.request_id, "Reusing existing telemetry context");
            return Self {
                values: existing.clone(),
            };
        }

        let mut values = Map::new();
        for key in [keys::CHANNEL, keys::ACTOR_ID, keys::ACTOR_TYPE, keys::APP_ID] {
            values.insert(key.to_string(), request.context_str(key).into());
        }
        let env = if env.trim().is_empty() { "" } else { env };
        values.insert(keys::ENV.to_string(), env.into());
        values.insert(keys::REQUEST_TYPE.to_string(), keys::API_CALL.into());
        values.insert(keys::REQUEST_ID.to_string(), request.request_id.clone().into());
        values.insert(keys::DEVICE_ID.to_string(), request.context_str(keys::DEVICE_ID).into());

        let mut context = Self { values };
        if request.context_str(keys::ACTOR_TYPE).eq_ignore_ascii_case(keys::USER) {
            context.assign_user_rollup(request, directory).await;
        }
        context
    }

    async fn assign_user_rollup(&mut self, request: &ActorRequest, directory: &dyn UserDirectory) {
        if request
            .request
            .get(keys::REQUESTED_BY)
            .map_or(true, Value::is_null)
        {
            return;
        }
        let requested_by = match request.context.get(keys::REQUESTED_BY).and_then(Value::as_str) {
            Some(id) => id,
            None => match request.request.get(keys::REQUESTED_BY).and_then(Value::as_str) {
                Some(id) => id,
                None => return,
            },
        };

        match directory.get_user_by_id(requested_by).await {
            Ok(Some(user)) => {
                let root_org_id = user
                    .get(keys::ROOT_ORG_ID)
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if !root_org_id.trim().is_empty() {
                    let mut rollup = Map::new();
                    rollup.insert("l1".to_string(), root_org_id.into());
                    self.values
                        .insert(keys::ROLLUP.to_string(), Value::Object(rollup));
                }
            }
            Ok(None) => debug!("No user record for requester {}", requested_by),
            Err(e) => warn!("Failed to resolve rollup for requester {}: {}", requested_by, e),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Root organisation from the rollup, when one was resolved
    pub fn rollup_root(&self) -> Option<&str> {
        self.values
            .get(keys::ROLLUP)
            .and_then(|rollup| rollup.get("l1"))
            .and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LearnerError;
    use serde_json::json;

    struct StaticDirectory(Option<Value>);

    #[async_trait]
    impl UserDirectory for StaticDirectory {
        async fn get_user_by_id(&self, _user_id: &str) -> LearnerResult<Option<Map<String, Value>>> {
            Ok(self.0.as_ref().and_then(|v| v.as_object().cloned()))
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl UserDirectory for FailingDirectory {
        async fn get_user_by_id(&self, _user_id: &str) -> LearnerResult<Option<Map<String, Value>>> {
            Err(LearnerError::user_directory("directory offline"))
        }
    }

    fn user_request() -> ActorRequest {
        let mut request = ActorRequest::new("req-1");
        request.context = json!({
            "channel": "in.ekstep",
            "actorId": "user-42",
            "actorType": "User",
            "appId": "portal",
            "did": "device-9",
            "requestedBy": "user-42"
        })
        .as_object()
        .cloned()
        .unwrap();
        request.request = json!({"requestedBy": "user-42"}).as_object().cloned().unwrap();
        request
    }

    #[tokio::test]
    async fn test_builds_context_from_request() {
        let request = user_request();
        let directory = StaticDirectory(None);
        let context = TelemetryContext::initialize(&request, "course", &directory).await;

        assert_eq!(context.get(keys::CHANNEL), Some(&json!("in.ekstep")));
        assert_eq!(context.get(keys::ACTOR_ID), Some(&json!("user-42")));
        assert_eq!(context.get(keys::APP_ID), Some(&json!("portal")));
        assert_eq!(context.get(keys::ENV), Some(&json!("course")));
        assert_eq!(context.get(keys::REQUEST_TYPE), Some(&json!("API_CALL")));
        assert_eq!(context.get(keys::REQUEST_ID), Some(&json!("req-1")));
        assert_eq!(context.get(keys::DEVICE_ID), Some(&json!("device-9")));
        assert!(context.rollup_root().is_none());
    }

    #[tokio::test]
    async fn test_user_rollup_from_directory() {
        let request = user_request();
        let directory = StaticDirectory(Some(json!({"rootOrgId": "org-1"})));
        let context = TelemetryContext::initialize(&request, "course", &directory).await;
        assert_eq!(context.rollup_root(), Some("org-1"));
    }

    #[tokio::test]
    async fn test_directory_failure_is_ignored() {
        let request = user_request();
        let context = TelemetryContext::initialize(&request, "", &FailingDirectory).await;
        assert!(context.rollup_root().is_none());
        assert_eq!(context.get(keys::ENV), Some(&json!("")));
    }

    #[tokio::test]
    async fn test_non_user_actor_skips_lookup() {
        let mut request = user_request();
        request
            .context
            .insert(keys::ACTOR_TYPE.to_string(), json!("system"));
        let directory = StaticDirectory(Some(json!({"rootOrgId": "org-1"})));
        let context = TelemetryContext::initialize(&request, "course", &directory).await;
        assert!(context.rollup_root().is_none());
    }

    #[tokio::test]
    async fn test_existing_context_is_reused() {
        let mut request = user_request();
        request
            .context
            .insert(keys::TELEMETRY_CONTEXT.to_string(), json!({"channel": "preset"}));
        let directory = StaticDirectory(Some(json!({"rootOrgId": "org-1"})));
        let context = TelemetryContext::initialize(&request, "course", &directory).await;
        assert_eq!(context.as_map().len(), 1);
        assert_eq!(context.get(keys::CHANNEL), Some(&json!("preset")));
    }

    #[tokio::test]
    async fn test_attach_telemetry_stores_context_on_request() {
        let mut request = ActorRequest::new("req-2");
        request.attach_telemetry("course", &StaticDirectory(None)).await;
        let attached = request.context.get(keys::TELEMETRY_CONTEXT).unwrap();
        assert_eq!(attached.get(keys::REQUEST_ID), Some(&json!("req-2")));
        assert_eq!(attached.get(keys::CHANNEL), Some(&json!("")));
    }
}
