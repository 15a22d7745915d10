// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use adscan::config::settings::Settings;
use adscan::domain::repositories::notification_repository::{
    IntegrationRepository, NotificationRepository,
};
use adscan::domain::repositories::scan_repository::ScanRepository;
use adscan::domain::repositories::webhook_repository::WebhookRepository;
use adscan::domain::services::generative_service::{GenerativeContent, GenerativeService};
use adscan::domain::services::notification_service::ScanNotifier;
use adscan::domain::services::scan_pipeline::ScanPipeline;
use adscan::infrastructure::repositories::rest_store::RestStore;
use adscan::infrastructure::services::llm_service::LLMService;
use adscan::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use adscan::presentation::routes;
use adscan::utils::telemetry;
use adscan::workers::manager::WorkerManager;
use adscan::workers::scan_worker::{ScanTrigger, ScanWorker};
use axum::Extension;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// HTTP 触发等待队列容量
const TRIGGER_QUEUE_CAPACITY: usize = 64;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting adscan...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    adscan::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Datastore and collaborators
    let store = Arc::new(RestStore::new(&settings.datastore)?);
    let scans: Arc<dyn ScanRepository> = store.clone();
    let webhooks: Arc<dyn WebhookRepository> = store.clone();
    let notifications: Arc<dyn NotificationRepository> = store.clone();
    let integrations: Arc<dyn IntegrationRepository> = store;

    let llm = LLMService::new(&settings.llm);
    if !llm.is_configured() {
        warn!("LLM API key not configured, generative features will return fallback content");
    }
    let generative = GenerativeService::new(Arc::new(llm));

    // 4. Scan pipeline and notifier
    let pipeline = Arc::new(ScanPipeline::new(
        settings.clone(),
        generative.clone(),
        integrations,
    )?);
    let notifier = Arc::new(ScanNotifier::new(
        notifications,
        webhooks,
        Arc::new(WebhookServiceImpl::new()),
    ));
    info!("Scan pipeline initialized");

    // 5. Start the poll loop
    let (trigger, trigger_rx) = ScanTrigger::channel(TRIGGER_QUEUE_CAPACITY);
    let worker = ScanWorker::new(
        scans.clone(),
        pipeline,
        notifier,
        settings.scan.poll_interval(),
        settings.scan.pending_batch,
    );
    let mut worker_manager = WorkerManager::new();
    worker_manager.start_scan_worker(worker, trigger_rx);

    // 6. Start HTTP server
    let app = routes::routes()
        .layer(Extension(scans))
        .layer(Extension(generative))
        .layer(Extension(trigger))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            worker_manager.wait_for_shutdown().await;
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
