//! 优雅退出管理模块
//!
//! 监听 SIGINT/SIGTERM（Windows 下为 Ctrl+C），并把第一次收到的退出原因
//! 通知给等待方（`axum::serve(..).with_graceful_shutdown`）。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, info};

/// 优雅退出管理器
#[derive(Debug, Clone)]
pub struct ShutdownManager {
    inner: Arc<ShutdownInner>,
}

#[derive(Debug)]
struct ShutdownInner {
    notify: Notify,
    /// 第一次触发的退出原因（用于先触发后等待的场景）
    reason: Mutex<Option<ShutdownReason>>,
    shutting_down: AtomicBool,
}

/// 退出原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
    /// 应用请求退出
    Application,
}

/// 优雅退出错误类型
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("信号设置失败: {0}")]
    SignalSetup(String),
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownInner {
                notify: Notify::new(),
                reason: Mutex::new(None),
                shutting_down: AtomicBool::new(false),
            }),
        }
    }

    /// 等待退出信号，返回退出原因
    pub async fn wait_for_shutdown(&self) -> ShutdownReason {
        let notified = self.inner.notify.notified();
        if !self.is_shutting_down() {
            debug!("等待退出信号...");
            notified.await;
        }
        self.inner
            .reason
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .unwrap_or(ShutdownReason::Application)
    }

    /// 触发优雅退出；重复触发只保留第一次的原因
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        if self
            .inner
            .shutting_down
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("重复的退出信号被忽略: {:?}", reason);
            return;
        }

        info!("触发优雅退出: {:?}", reason);
        if let Ok(mut guard) = self.inner.reason.lock() {
            *guard = Some(reason);
        }
        self.inner.notify.notify_waiters();
    }

    /// 检查是否正在关闭
    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// 启动信号处理器
    pub fn start_signal_handler(&self) -> Result<(), ShutdownError> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigint = signal(SignalKind::interrupt())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;
            let mut sigterm = signal(SignalKind::terminate())
                .map_err(|e| ShutdownError::SignalSetup(e.to_string()))?;

            let manager = self.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = sigint.recv() => manager.trigger_shutdown(ShutdownReason::Interrupt),
                    _ = sigterm.recv() => manager.trigger_shutdown(ShutdownReason::Terminate),
                }
            });
        }

        #[cfg(not(unix))]
        {
            let manager = self.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => manager.trigger_shutdown(ShutdownReason::Interrupt),
                    Err(e) => tracing::error!("监听Ctrl+C信号失败: {}", e),
                }
            });
        }

        info!("信号处理器已启动");
        Ok(())
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
