// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use adscan::config::settings::Settings;
use adscan::domain::models::notification::{IntegrationToken, Notification};
use adscan::domain::models::scan_job::{ScanJob, ScanStatus};
use adscan::domain::models::webhook::{ScanEvent, WebhookSubscription};
use adscan::domain::repositories::notification_repository::{
    IntegrationRepository, NotificationRepository,
};
use adscan::domain::repositories::scan_repository::{
    CompletedScan, RepositoryError, ScanRepository,
};
use adscan::domain::repositories::webhook_repository::WebhookRepository;
use async_trait::async_trait;
use axum::Router;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;

/// 内存仓库，实现全部仓库特质
#[derive(Default)]
pub struct InMemoryStore {
    pub jobs: Mutex<HashMap<Uuid, ScanJob>>,
    pub sites: Mutex<HashMap<Uuid, String>>,
    pub completed: Mutex<HashMap<Uuid, CompletedScan>>,
    pub trust_data: Mutex<HashMap<Uuid, Value>>,
    pub webhooks: Mutex<Vec<WebhookSubscription>>,
    pub notifications: Mutex<Vec<Notification>>,
    pub tokens: Mutex<Vec<IntegrationToken>>,
}

#[allow(dead_code)]
impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新建站点与待处理扫描
    pub fn seed_job(&self, site_url: Option<&str>, user_id: Option<Uuid>) -> ScanJob {
        let job = ScanJob::new(Uuid::new_v4(), Uuid::new_v4(), user_id);
        if let Some(url) = site_url {
            self.sites.lock().unwrap().insert(job.site_id, url.to_string());
        }
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        job
    }

    pub fn status(&self, id: Uuid) -> Option<ScanStatus> {
        self.jobs.lock().unwrap().get(&id).map(|job| job.status)
    }

    pub fn add_webhook(&self, user_id: Uuid, url: &str, secret: &str, events: &[&str]) {
        self.webhooks.lock().unwrap().push(WebhookSubscription {
            id: Uuid::new_v4(),
            user_id,
            url: url.to_string(),
            secret: secret.to_string(),
            events: events.iter().map(|e| e.to_string()).collect(),
            is_active: true,
        });
    }

    fn set_status(&self, id: Uuid, status: ScanStatus) -> Result<(), RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        job.status = status;
        Ok(())
    }
}

#[async_trait]
impl ScanRepository for InMemoryStore {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ScanJob>, RepositoryError> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|job| job.status == ScanStatus::Pending)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanJob>, RepositoryError> {
        Ok(self.jobs.lock().unwrap().get(&id).cloned())
    }

    async fn find_site_url(&self, site_id: Uuid) -> Result<Option<String>, RepositoryError> {
        Ok(self.sites.lock().unwrap().get(&site_id).cloned())
    }

    async fn claim(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(&id) {
            Some(job) if job.status == ScanStatus::Pending => {
                job.status = ScanStatus::Running;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_status(&self, id: Uuid, status: ScanStatus) -> Result<(), RepositoryError> {
        self.set_status(id, status)
    }

    async fn save_completed(&self, id: Uuid, scan: &CompletedScan) -> Result<(), RepositoryError> {
        self.set_status(id, ScanStatus::Completed)?;
        let trust = serde_json::to_value(&scan.bundle.trust_pages)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        self.trust_data.lock().unwrap().insert(id, trust);
        self.completed.lock().unwrap().insert(id, scan.clone());
        Ok(())
    }

    async fn find_trust_pages_data(&self, id: Uuid) -> Result<Option<Value>, RepositoryError> {
        if !self.jobs.lock().unwrap().contains_key(&id) {
            return Ok(None);
        }
        Ok(Some(
            self.trust_data
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .unwrap_or(Value::Null),
        ))
    }

    async fn save_trust_pages_data(&self, id: Uuid, data: &Value) -> Result<(), RepositoryError> {
        self.trust_data.lock().unwrap().insert(id, data.clone());
        Ok(())
    }
}

#[async_trait]
impl WebhookRepository for InMemoryStore {
    async fn find_active(
        &self,
        user_id: Uuid,
        event: ScanEvent,
    ) -> Result<Vec<WebhookSubscription>, RepositoryError> {
        Ok(self
            .webhooks
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id && s.is_active)
            .filter(|s| s.events.iter().any(|e| e == event.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError> {
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[async_trait]
impl IntegrationRepository for InMemoryStore {
    async fn find_token(
        &self,
        user_id: Uuid,
        provider: &str,
    ) -> Result<Option<IntegrationToken>, RepositoryError> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.user_id == user_id && t.provider == provider)
            .cloned())
    }
}

/// 在随机端口启动站点，返回 `http://127.0.0.1:{port}`
pub async fn spawn_site(app: Router) -> String {
    spawn_site_with(|_| app).await
}

/// 先绑定端口再构建路由，路由可引用站点自身的地址
pub async fn spawn_site_with<F>(build: F) -> String
where
    F: FnOnce(&str) -> Router,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let app = build(&base);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

/// 测试配置
///
/// 允许本地目标；所有提供方与 LLM 指向 `mock_base`，未挂载的路径返回 404 从而走回退来源
pub fn test_settings(mock_base: &str) -> Settings {
    Settings::builder_with_defaults()
        .unwrap()
        .set_override("datastore.url", mock_base)
        .unwrap()
        .set_override("datastore.service_key", "service-key")
        .unwrap()
        .set_override("scan.allow_private_targets", true)
        .unwrap()
        .set_override("scan.max_pages", 8)
        .unwrap()
        .set_override("scan.link_sample", 10)
        .unwrap()
        .set_override("scan.homepage_timeout_secs", 5)
        .unwrap()
        .set_override("scan.page_timeout_secs", 5)
        .unwrap()
        .set_override("scan.probe_timeout_secs", 2)
        .unwrap()
        .set_override("scan.poll_interval_secs", 1)
        .unwrap()
        .set_override("providers.pagespeed_url", format!("{}/pagespeed", mock_base))
        .unwrap()
        .set_override("providers.pagespeed_delay_ms", 0)
        .unwrap()
        .set_override("providers.safe_browsing_url", format!("{}/safe-browsing", mock_base))
        .unwrap()
        .set_override("providers.whois_url", format!("{}/whois", mock_base))
        .unwrap()
        .set_override("providers.rdap_url", format!("{}/rdap", mock_base))
        .unwrap()
        .set_override("providers.traffic_url", format!("{}/pagerank", mock_base))
        .unwrap()
        .set_override("providers.keyword_url", format!("{}/keywords", mock_base))
        .unwrap()
        .set_override("providers.social_url", format!("{}/brands", mock_base))
        .unwrap()
        .set_override("providers.search_console_url", mock_base)
        .unwrap()
        .set_override("llm.api_base_url", format!("{}/llm", mock_base))
        .unwrap()
        .set_override("llm.timeout_secs", 5)
        .unwrap()
        .set_override("metrics.enabled", false)
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

/// 生成指定词数的正文
pub fn words(count: usize) -> String {
    const VOCAB: [&str; 12] = [
        "garden", "harvest", "season", "compost", "tomato", "planting", "weather", "roots",
        "sunlight", "watering", "mulch", "seedling",
    ];
    (0..count)
        .map(|i| VOCAB[i % VOCAB.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// 轮询直到条件成立或超时，用于等待后台派发的通知
pub async fn eventually<F>(check: F) -> bool
where
    F: Fn() -> bool,
{
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
