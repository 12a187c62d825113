//! HTTP implementation of the admin API
//!
//! Reads retry transient failures with exponential backoff. Writes are sent
//! exactly once: a failed save is reported to the caller, who keeps the local
//! edits and may retry by hand.

use std::time::Duration;

use async_trait::async_trait;
use plandesk_shared::types::{
    Character, CharacterAccessUpdate, CharacterQuery, DisplayFeature, DisplayFeatureUpdate, Plan,
    PlanFeatures, PlanId, SystemFeature, SystemFeatureUpdate, Tool, ToolAccessAssignment,
    ToolAccessUpdate,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::api::AdminApi;
use crate::config::Config;
use crate::error::{ClientError, ClientResult};

/// First retry waits ~100ms, then ~200ms, ~400ms...
const RETRY_BASE: u64 = 2;
const RETRY_FACTOR: u64 = 50;

/// Maximum backoff duration for retries (5 seconds)
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

/// HTTP admin API client
#[derive(Clone)]
pub struct HttpAdminApi {
    client: Client,
    base_url: String,
    api_token: String,
    max_retries: usize,
}

impl HttpAdminApi {
    pub fn new(config: &Config) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status.as_u16(), &body))
    }

    async fn get_once<Q: Serialize + ?Sized>(&self, url: &str, query: Option<&Q>) -> ClientResult<Value> {
        let mut request = self.client.get(url).bearer_auth(&self.api_token);
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = Self::check(request.send().await?).await?;

        // Some endpoints answer 204 or an empty body when there is nothing to list
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get_value<Q: Serialize + ?Sized>(&self, path: &str, query: Option<&Q>) -> ClientResult<Value> {
        let url = self.url(path);
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE)
            .factor(RETRY_FACTOR)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(self.max_retries);

        RetryIf::spawn(
            strategy,
            || self.get_once(&url, query),
            |e: &ClientError| {
                let transient = e.is_transient();
                if transient {
                    debug!(url = %url, error = %e, "Transient error - will retry");
                }
                transient
            },
        )
        .await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str, keys: &[&str]) -> ClientResult<Vec<T>> {
        let value = self.get_value::<()>(path, None).await?;
        decode_list(value, keys, path)
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &T,
    ) -> ClientResult<()> {
        let response = self
            .client
            .request(method, self.url(path))
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Accept either a bare array or an object wrapping the array under one of
/// `keys` (or `data`). Anything else is treated as an empty list.
pub(crate) fn decode_list<T: DeserializeOwned>(
    value: Value,
    keys: &[&str],
    path: &str,
) -> ClientResult<Vec<T>> {
    let items = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => {
            let found = keys
                .iter()
                .chain(std::iter::once(&"data"))
                .find_map(|key| map.remove(*key).filter(Value::is_array));
            match found {
                Some(items) => items,
                None => {
                    warn!(path, "Response has no list field, treating as empty");
                    return Ok(Vec::new());
                }
            }
        }
        Value::Null => return Ok(Vec::new()),
        _ => {
            warn!(path, "Unexpected response shape, treating as empty");
            return Ok(Vec::new());
        }
    };
    Ok(serde_json::from_value(items)?)
}

/// Plan features may arrive bare or wrapped in `data`
pub(crate) fn decode_plan_features(value: Value, path: &str) -> ClientResult<PlanFeatures> {
    match value {
        Value::Object(mut map) => {
            if let Some(inner @ Value::Object(_)) = map.remove("data") {
                return Ok(serde_json::from_value(inner)?);
            }
            Ok(serde_json::from_value(Value::Object(map))?)
        }
        _ => {
            warn!(path, "Plan features response is not an object, treating as empty");
            Ok(PlanFeatures::default())
        }
    }
}

#[async_trait]
impl AdminApi for HttpAdminApi {
    async fn get_plans(&self) -> ClientResult<Vec<Plan>> {
        self.get_list("admin/plans", &["plans"]).await
    }

    async fn get_display_features(&self) -> ClientResult<Vec<DisplayFeature>> {
        self.get_list("admin/features/display", &["features"]).await
    }

    async fn get_system_features(&self) -> ClientResult<Vec<SystemFeature>> {
        self.get_list("admin/features/system", &["features"]).await
    }

    async fn get_public_characters(&self, query: &CharacterQuery) -> ClientResult<Vec<Character>> {
        let path = "admin/characters/public";
        let value = self.get_value(path, Some(query)).await?;
        decode_list(value, &["characters"], path)
    }

    async fn get_tools(&self) -> ClientResult<Vec<Tool>> {
        self.get_list("admin/tools", &["tools"]).await
    }

    async fn get_plan_features(&self, plan_id: &PlanId) -> ClientResult<PlanFeatures> {
        let path = format!("admin/plans/{}/features", plan_id);
        let value = self.get_value::<()>(&path, None).await?;
        decode_plan_features(value, &path)
    }

    async fn update_plan_display_features(
        &self,
        plan_id: &PlanId,
        items: &[DisplayFeatureUpdate],
    ) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("admin/plans/{}/features/display", plan_id),
            &json!({ "features": items }),
        )
        .await
    }

    async fn update_plan_system_features(
        &self,
        plan_id: &PlanId,
        items: &[SystemFeatureUpdate],
    ) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("admin/plans/{}/features/system", plan_id),
            &json!({ "features": items }),
        )
        .await
    }

    async fn update_plan_character_access(
        &self,
        plan_id: &PlanId,
        items: &[CharacterAccessUpdate],
    ) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("admin/plans/{}/features/characters", plan_id),
            &json!({ "characters": items }),
        )
        .await
    }

    async fn get_plan_tool_access(&self, plan_id: &PlanId) -> ClientResult<Vec<ToolAccessAssignment>> {
        self.get_list(&format!("admin/plans/{}/tools", plan_id), &["tools"])
            .await
    }

    async fn update_plan_tool_access(
        &self,
        plan_id: &PlanId,
        items: &[ToolAccessUpdate],
    ) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("admin/plans/{}/tools", plan_id),
            &json!({ "tools": items }),
        )
        .await
    }

    async fn set_plan_active(&self, plan_id: &PlanId, active: bool) -> ClientResult<()> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("admin/plans/{}", plan_id),
            &json!({ "is_active": active }),
        )
        .await
    }
}
