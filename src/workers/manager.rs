// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::scan_worker::ScanWorker;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

/// 工作管理器
///
/// 持有后台任务句柄，收到关闭信号时中止它们；进行中的扫描随轮询循环一起中止，
/// 其记录保持 `running` 状态以便排查
#[derive(Default)]
pub struct WorkerManager {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动扫描轮询循环
    ///
    /// 轮询循环只有一个，任务之间严格顺序执行
    ///
    /// # 参数
    ///
    /// * `worker` - 扫描工作器
    /// * `triggers` - HTTP 触发通道的接收端
    pub fn start_scan_worker(&mut self, worker: ScanWorker, triggers: mpsc::Receiver<Uuid>) {
        let handle = tokio::spawn(async move {
            worker.run(triggers).await;
        });
        self.handles.push(handle);
    }

    /// 正在运行的后台任务数
    pub fn running(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// 等待关闭信号并关闭工作进程
    ///
    /// 监听关闭信号并优雅地关闭所有工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }

    /// 中止所有后台任务
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }
}
