//! Strategy admin API client.
//!
//! [`AdminApi`] is the abstract seam the engines work against; the remote
//! store owns all persisted state and is consumed strictly through it.
//! [`HttpAdminClient`] is the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::EngineError;
use crate::models::{AccountStockAllocation, ConfigTemplate, ConfigType, TemplateLevel};

use super::types::{AllocationFilter, ApiEnvelope, TemplateFilter};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Abstract remote admin service. All operations are request/response; the
/// engine imposes no locking and relies on the server for authoritative
/// uniqueness checks.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn list_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> Result<Vec<AccountStockAllocation>, EngineError>;

    async fn create_allocation(
        &self,
        allocation: &AccountStockAllocation,
    ) -> Result<(), EngineError>;

    async fn update_allocation(
        &self,
        id: &str,
        allocation: &AccountStockAllocation,
    ) -> Result<(), EngineError>;

    async fn delete_allocation(&self, id: &str) -> Result<(), EngineError>;

    async fn list_templates(
        &self,
        config_type: ConfigType,
        filter: &TemplateFilter,
    ) -> Result<Vec<ConfigTemplate>, EngineError>;

    /// Create a template. A duplicate identity surfaces as
    /// [`EngineError::Conflict`] unless `force_overwrite` is set.
    async fn create_template(
        &self,
        template: &ConfigTemplate,
        force_overwrite: bool,
    ) -> Result<(), EngineError>;

    async fn delete_template(&self, id: &str) -> Result<(), EngineError>;

    /// Apply a stored template onto target allocations, overwriting their
    /// fields. Conflicts follow the same overwrite protocol as creation.
    async fn apply_template(
        &self,
        template_id: &str,
        target_ids: &[String],
        force_overwrite: bool,
    ) -> Result<(), EngineError>;

    /// Resolve the template registered for `(strategy, stock, level)`.
    async fn find_level_template(
        &self,
        strategy_id: &str,
        stock_code: &str,
        level: TemplateLevel,
    ) -> Result<Option<ConfigTemplate>, EngineError>;
}

/// HTTP implementation of [`AdminApi`].
pub struct HttpAdminClient {
    client: Client,
    base_url: String,
}

impl HttpAdminClient {
    /// Create a client for the given base URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| EngineError::Transport(format!("failed to create HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, EngineError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| EngineError::Transport(err.to_string()))?;

        decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, EngineError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, method = %method, "request");

        let response = self
            .client
            .request(method, &url)
            .json(body)
            .send()
            .await
            .map_err(|err| EngineError::Transport(err.to_string()))?;

        decode(response).await
    }

    async fn delete(&self, path: &str) -> Result<(), EngineError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "DELETE");

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|err| EngineError::Transport(err.to_string()))?;

        decode::<serde_json::Value>(response).await.map(|_| ())
    }
}

/// Read the response body and run it through the envelope adapter.
///
/// Bodies that are not an envelope at all (a proxy error page, an empty 204)
/// are classified by status alone: 2xx with no body is success, 409 is a
/// conflict, anything else is a transport failure carrying the raw body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>, EngineError> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|err| EngineError::Transport(err.to_string()))?;

    match serde_json::from_str::<ApiEnvelope<T>>(&body) {
        Ok(envelope) => envelope.into_engine_result(status),
        Err(_) if body.trim().is_empty() && (200..300).contains(&status) => Ok(None),
        Err(_) if status == 409 => Err(EngineError::Conflict(body)),
        Err(_) if (200..300).contains(&status) => Err(EngineError::Transport(format!(
            "unexpected payload shape: {body}"
        ))),
        Err(_) => Err(EngineError::Transport(format!(
            "server returned {status}: {body}"
        ))),
    }
}

fn push_param(params: &mut Vec<String>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        params.push(format!("{key}={value}"));
    }
}

fn with_params(path: &str, params: Vec<String>) -> String {
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, params.join("&"))
    }
}

#[async_trait]
impl AdminApi for HttpAdminClient {
    async fn list_allocations(
        &self,
        filter: &AllocationFilter,
    ) -> Result<Vec<AccountStockAllocation>, EngineError> {
        let mut params = Vec::new();
        push_param(&mut params, "accountId", filter.account_id.as_deref());
        push_param(&mut params, "stockCode", filter.stock_code.as_deref());
        push_param(&mut params, "strategyId", filter.strategy_id.as_deref());

        let path = with_params("/api/allocations", params);
        Ok(self.get(&path).await?.unwrap_or_default())
    }

    async fn create_allocation(
        &self,
        allocation: &AccountStockAllocation,
    ) -> Result<(), EngineError> {
        self.send_json::<_, serde_json::Value>(reqwest::Method::POST, "/api/allocations", allocation)
            .await
            .map(|_| ())
    }

    async fn update_allocation(
        &self,
        id: &str,
        allocation: &AccountStockAllocation,
    ) -> Result<(), EngineError> {
        let path = format!("/api/allocations/{id}");
        self.send_json::<_, serde_json::Value>(reqwest::Method::PUT, &path, allocation)
            .await
            .map(|_| ())
    }

    async fn delete_allocation(&self, id: &str) -> Result<(), EngineError> {
        self.delete(&format!("/api/allocations/{id}")).await
    }

    async fn list_templates(
        &self,
        config_type: ConfigType,
        filter: &TemplateFilter,
    ) -> Result<Vec<ConfigTemplate>, EngineError> {
        let mut params = vec![format!("configType={}", config_type.as_str())];
        push_param(&mut params, "stockCode", filter.source_stock_code.as_deref());
        push_param(&mut params, "strategyId", filter.strategy_id.as_deref());

        let path = with_params("/api/templates", params);
        Ok(self.get(&path).await?.unwrap_or_default())
    }

    async fn create_template(
        &self,
        template: &ConfigTemplate,
        force_overwrite: bool,
    ) -> Result<(), EngineError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            #[serde(flatten)]
            template: &'a ConfigTemplate,
            force_overwrite: bool,
        }

        self.send_json::<_, serde_json::Value>(
            reqwest::Method::POST,
            "/api/templates",
            &Body {
                template,
                force_overwrite,
            },
        )
        .await
        .map(|_| ())
    }

    async fn delete_template(&self, id: &str) -> Result<(), EngineError> {
        self.delete(&format!("/api/templates/{id}")).await
    }

    async fn apply_template(
        &self,
        template_id: &str,
        target_ids: &[String],
        force_overwrite: bool,
    ) -> Result<(), EngineError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            target_ids: &'a [String],
            force_overwrite: bool,
        }

        let path = format!("/api/templates/{template_id}/apply");
        self.send_json::<_, serde_json::Value>(
            reqwest::Method::POST,
            &path,
            &Body {
                target_ids,
                force_overwrite,
            },
        )
        .await
        .map(|_| ())
    }

    async fn find_level_template(
        &self,
        strategy_id: &str,
        stock_code: &str,
        level: TemplateLevel,
    ) -> Result<Option<ConfigTemplate>, EngineError> {
        let params = vec![
            format!("strategyId={strategy_id}"),
            format!("stockCode={stock_code}"),
            format!("level={}", level.as_str()),
        ];
        let path = with_params("/api/templates/level", params);
        self.get(&path).await
    }
}
