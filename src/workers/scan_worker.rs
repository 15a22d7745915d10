// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scan_job::{ScanJob, ScanStatus};
use crate::domain::repositories::scan_repository::{CompletedScan, ScanRepository};
use crate::domain::services::notification_service::ScanNotifier;
use crate::domain::services::scan_pipeline::{ScanError, ScanOutput, ScanPipeline};
use crate::utils::url_utils;
use chrono::Utc;
use metrics::{counter, histogram};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 扫描触发错误
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Scan queue is full, try again later")]
    QueueFull,
    #[error("Scan worker is not running")]
    Closed,
}

/// HTTP 触发的扫描通过该通道交给轮询循环，与轮询到的任务共用同一条顺序执行路径
#[derive(Clone)]
pub struct ScanTrigger {
    tx: mpsc::Sender<Uuid>,
}

impl ScanTrigger {
    /// 创建触发通道
    ///
    /// # 参数
    ///
    /// * `capacity` - 等待执行的触发数上限，超出时触发请求被拒绝
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Uuid>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    pub fn trigger(&self, scan_id: Uuid) -> Result<(), TriggerError> {
        self.tx.try_send(scan_id).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TriggerError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TriggerError::Closed,
        })
    }
}

/// 单个任务的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed,
    /// 未能领取（已被领取或状态不是 pending）
    Skipped,
}

/// 扫描工作器
///
/// 单个协作式循环：一次只执行一个任务，任务内部的子请求并发执行
pub struct ScanWorker {
    scans: Arc<dyn ScanRepository>,
    pipeline: Arc<ScanPipeline>,
    notifier: Arc<ScanNotifier>,
    poll_interval: Duration,
    pending_batch: usize,
}

impl ScanWorker {
    /// 创建新的扫描工作器
    ///
    /// # 参数
    ///
    /// * `scans` - 扫描仓库
    /// * `pipeline` - 扫描流水线
    /// * `notifier` - 完成/失败通知
    /// * `poll_interval` - 轮询间隔
    /// * `pending_batch` - 每次轮询拉取的待处理任务数
    pub fn new(
        scans: Arc<dyn ScanRepository>,
        pipeline: Arc<ScanPipeline>,
        notifier: Arc<ScanNotifier>,
        poll_interval: Duration,
        pending_batch: usize,
    ) -> Self {
        Self {
            scans,
            pipeline,
            notifier,
            poll_interval,
            pending_batch,
        }
    }

    /// 运行轮询循环
    ///
    /// 优先处理 HTTP 触发的任务，否则按间隔拉取待处理任务；由关闭流程中止
    pub async fn run(self, mut triggers: mpsc::Receiver<Uuid>) {
        info!(
            "Scan worker started (poll every {:?}, batch {})",
            self.poll_interval, self.pending_batch
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                Some(scan_id) = triggers.recv() => {
                    self.process_triggered(scan_id).await;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        error!("Error polling pending scans: {}", e);
                    }
                }
            }
        }
    }

    /// 拉取并依次处理一批待处理任务
    ///
    /// # 返回值
    ///
    /// 本轮处理（完成或失败）的任务数
    pub async fn poll_once(&self) -> anyhow::Result<usize> {
        let jobs = self.scans.fetch_pending(self.pending_batch).await?;
        if jobs.is_empty() {
            return Ok(0);
        }
        debug!("Found {} pending scan(s)", jobs.len());

        let mut processed = 0;
        for job in jobs {
            if self.process(job).await != JobOutcome::Skipped {
                processed += 1;
            }
        }
        Ok(processed)
    }

    /// 处理一次 HTTP 触发
    pub async fn process_triggered(&self, scan_id: Uuid) -> JobOutcome {
        match self.scans.find_by_id(scan_id).await {
            Ok(Some(job)) if job.status == ScanStatus::Pending => self.process(job).await,
            Ok(Some(job)) => {
                debug!("Scan {} is already {}, ignoring trigger", scan_id, job.status);
                JobOutcome::Skipped
            }
            Ok(None) => {
                warn!("Triggered scan {} no longer exists", scan_id);
                JobOutcome::Skipped
            }
            Err(e) => {
                error!("Failed to load triggered scan {}: {}", scan_id, e);
                JobOutcome::Skipped
            }
        }
    }

    /// 领取并执行单个任务，持久化状态转换并发送通知
    pub async fn process(&self, job: ScanJob) -> JobOutcome {
        match self.scans.claim(job.id).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Scan {} was claimed elsewhere", job.id);
                return JobOutcome::Skipped;
            }
            Err(e) => {
                error!("Failed to claim scan {}: {}", job.id, e);
                return JobOutcome::Skipped;
            }
        }
        let job = match job.start() {
            Ok(job) => job,
            Err(e) => {
                warn!("Skipping scan: {}", e);
                return JobOutcome::Skipped;
            }
        };

        counter!("scan_jobs_started_total").increment(1);
        info!("Scan {} is running", job.id);
        let started = Instant::now();

        let site_url = match self.scans.find_site_url(job.site_id).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                let label = job.site_id.to_string();
                let err = ScanError::SiteNotFound(job.site_id);
                return self.fail(job, &label, err).await;
            }
            Err(e) => {
                let label = job.site_id.to_string();
                return self.fail(job, &label, e.into()).await;
            }
        };
        let label = display_domain(&site_url);

        let outcome = match self.execute(&job, &site_url).await {
            Ok(output) => self.complete(job, output).await,
            Err(e) => self.fail(job, &label, e).await,
        };
        histogram!("scan_duration_seconds").record(started.elapsed().as_secs_f64());
        outcome
    }

    /// 在独立任务中执行流水线，panic 也按流水线失败处理
    ///
    /// 工作循环被中止时，进行中的扫描任务随之中止
    async fn execute(&self, job: &ScanJob, site_url: &str) -> Result<ScanOutput, ScanError> {
        let pipeline = self.pipeline.clone();
        let job = job.clone();
        let site_url = site_url.to_string();
        spawn_scoped(async move { pipeline.run(&job, &site_url).await })
            .await
            .map_err(|e| ScanError::Pipeline(anyhow::anyhow!("scan task aborted: {}", e)))?
    }

    async fn complete(&self, job: ScanJob, output: ScanOutput) -> JobOutcome {
        let completed_job = match job.clone().complete() {
            Ok(completed_job) => completed_job,
            Err(e) => return self.fail(job, &output.domain, e.into()).await,
        };

        let completed = CompletedScan {
            overall_score: output.card.overall_score,
            approval_probability: output.card.approval_probability,
            bundle: output.bundle,
            completed_at: Utc::now(),
        };
        if let Err(e) = self.scans.save_completed(job.id, &completed).await {
            return self.fail(job, &output.domain, e.into()).await;
        }

        counter!("scan_jobs_completed_total").increment(1);
        info!(
            "Scan {} completed with score {}",
            job.id, output.card.overall_score
        );
        let notifier = self.notifier.clone();
        let (domain, card) = (output.domain, output.card);
        tokio::spawn(async move {
            notifier.scan_completed(&completed_job, &domain, &card).await;
        });
        JobOutcome::Completed
    }

    async fn fail(&self, job: ScanJob, domain: &str, err: ScanError) -> JobOutcome {
        error!("Scan {} failed: {}", job.id, err);
        if let Err(e) = self.scans.update_status(job.id, ScanStatus::Failed).await {
            error!("Failed to mark scan {} as failed: {}", job.id, e);
        }
        counter!("scan_jobs_failed_total").increment(1);

        let failed = ScanJob {
            status: ScanStatus::Failed,
            ..job
        };
        let notifier = self.notifier.clone();
        let domain = domain.to_string();
        tokio::spawn(async move {
            notifier.scan_failed(&failed, &domain).await;
        });
        JobOutcome::Failed
    }
}

/// 持有子任务句柄，被丢弃时中止子任务
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// 派生子任务并等待其结果；等待方被取消时子任务一并中止
async fn spawn_scoped<F>(future: F) -> Result<F::Output, JoinError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let mut task = AbortOnDrop(tokio::spawn(future));
    (&mut task.0).await
}

fn display_domain(site_url: &str) -> String {
    url_utils::normalize_site_url(site_url)
        .ok()
        .and_then(|url| url_utils::bare_host(&url))
        .unwrap_or_else(|| site_url.to_string())
}
