// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DatastoreSettings;
use crate::domain::models::notification::{IntegrationToken, Notification};
use crate::domain::models::scan_job::{ScanJob, ScanStatus};
use crate::domain::models::webhook::{ScanEvent, WebhookSubscription};
use crate::domain::repositories::notification_repository::{
    IntegrationRepository, NotificationRepository,
};
use crate::domain::repositories::scan_repository::{
    CompletedScan, RepositoryError, ScanRepository,
};
use crate::domain::repositories::webhook_repository::WebhookRepository;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const SCANS: &str = "adsense_scans";
const SITES: &str = "sites";
const WEBHOOKS: &str = "webhooks";
const INTEGRATIONS: &str = "user_integrations";
const NOTIFICATIONS: &str = "notifications";

const JOB_COLUMNS: &str = "id,site_id,user_id,status";

#[derive(Deserialize)]
struct SiteRow {
    url: String,
}

#[derive(Deserialize)]
struct TrustPagesRow {
    #[serde(default)]
    trust_pages_data: Option<Value>,
}

/// REST 数据存储客户端
///
/// 通过 PostgREST 风格接口访问扫描记录、站点、Webhook 订阅、通知与第三方授权。
/// 每个请求同时携带 `apikey` 与 `Authorization: Bearer` 服务密钥。
#[derive(Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl RestStore {
    /// 创建新的数据存储客户端
    ///
    /// # 参数
    ///
    /// * `settings` - 数据存储配置；`url` 为项目根地址，表路径为 `/rest/v1/{table}`
    pub fn new(settings: &DatastoreSettings) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            service_key: settings.service_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn send(request: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RepositoryError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>, RepositoryError> {
        let body = Self::send(request).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn patch_scan(&self, id: Uuid, body: &Value) -> Result<(), RepositoryError> {
        let request = self
            .request(Method::PATCH, SCANS)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=minimal")
            .json(body);
        Self::send(request).await?;
        Ok(())
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, RepositoryError> {
    serde_json::to_value(value).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait]
impl ScanRepository for RestStore {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ScanJob>, RepositoryError> {
        let request = self.request(Method::GET, SCANS).query(&[
            ("select", JOB_COLUMNS.to_string()),
            ("status", "eq.pending".to_string()),
            ("order", "created_at.asc".to_string()),
            ("limit", limit.to_string()),
        ]);
        Self::rows(request).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError> {
        let request = self.request(Method::GET, SCANS).query(&[
            ("select", JOB_COLUMNS.to_string()),
            ("id", format!("eq.{}", id)),
        ]);
        Ok(Self::rows::<ScanJob>(request).await?.into_iter().next())
    }

    async fn find_site_url(&self, site_id: Uuid) -> Result<Option<String>, RepositoryError> {
        let request = self.request(Method::GET, SITES).query(&[
            ("select", "url".to_string()),
            ("id", format!("eq.{}", site_id)),
        ]);
        Ok(Self::rows::<SiteRow>(request)
            .await?
            .into_iter()
            .next()
            .map(|row| row.url))
    }

    async fn claim(&self, id: Uuid) -> Result<bool, RepositoryError> {
        // Conditional on status=pending so two pollers never both win
        let request = self
            .request(Method::PATCH, SCANS)
            .query(&[
                ("id", format!("eq.{}", id)),
                ("status", "eq.pending".to_string()),
                ("select", "id".to_string()),
            ])
            .header("Prefer", "return=representation")
            .json(&json!({ "status": ScanStatus::Running }));
        let claimed: Vec<Value> = Self::rows(request).await?;
        debug!("Claim of scan {} matched {} row(s)", id, claimed.len());
        Ok(!claimed.is_empty())
    }

    async fn update_status(&self, id: Uuid, status: ScanStatus) -> Result<(), RepositoryError> {
        self.patch_scan(id, &json!({ "status": status })).await
    }

    async fn save_completed(&self, id: Uuid, scan: &CompletedScan) -> Result<(), RepositoryError> {
        let body = json!({
            "status": ScanStatus::Completed,
            "overall_score": scan.overall_score,
            "approval_probability": scan.approval_probability,
            "core_scan_data": to_value(&scan.bundle.core)?,
            "trust_pages_data": to_value(&scan.bundle.trust_pages)?,
            "seo_indexing_data": to_value(&scan.bundle.seo_indexing)?,
            "security_data": to_value(&scan.bundle.security)?,
            "completed_at": scan.completed_at.to_rfc3339(),
        });
        self.patch_scan(id, &body).await
    }

    async fn find_trust_pages_data(&self, id: Uuid) -> Result<Option<Value>, RepositoryError> {
        let request = self.request(Method::GET, SCANS).query(&[
            ("select", "trust_pages_data".to_string()),
            ("id", format!("eq.{}", id)),
        ]);
        Ok(Self::rows::<TrustPagesRow>(request)
            .await?
            .into_iter()
            .next()
            .map(|row| row.trust_pages_data.unwrap_or(Value::Null)))
    }

    async fn save_trust_pages_data(&self, id: Uuid, data: &Value) -> Result<(), RepositoryError> {
        self.patch_scan(id, &json!({ "trust_pages_data": data })).await
    }
}

#[async_trait]
impl WebhookRepository for RestStore {
    async fn find_active(
        &self,
        user_id: Uuid,
        event: ScanEvent,
    ) -> Result<Vec<WebhookSubscription>, RepositoryError> {
        let request = self.request(Method::GET, WEBHOOKS).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("is_active", "eq.true".to_string()),
            ("events", format!("cs.{{{}}}", event.as_str())),
        ]);
        let subscriptions: Vec<WebhookSubscription> = Self::rows(request).await?;
        Ok(subscriptions
            .into_iter()
            .filter(|s| s.is_active && s.events.iter().any(|e| e == event.as_str()))
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for RestStore {
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError> {
        let request = self
            .request(Method::POST, NOTIFICATIONS)
            .header("Prefer", "return=minimal")
            .json(notification);
        Self::send(request).await?;
        Ok(())
    }
}

#[async_trait]
impl IntegrationRepository for RestStore {
    async fn find_token(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> Result<Option<IntegrationToken>, RepositoryError> {
        let request = self.request(Method::GET, INTEGRATIONS).query(&[
            ("select", "*".to_string()),
            ("user_id", format!("eq.{}", user_id)),
            ("provider", format!("eq.{}", provider)),
            ("limit", "1".to_string()),
        ]);
        Ok(Self::rows::<IntegrationToken>(request).await?.into_iter().next())
    }
}
