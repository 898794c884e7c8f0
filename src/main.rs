use photo_capture::startup::run_startup_checks;
use photo_capture::{AppConfig, AppState, ShutdownManager, build_app};

#[tokio::main]
async fn main() {
    // 日志级别来自配置，因此先加载配置再初始化日志
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();

    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    let photo_store = match run_startup_checks(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Startup checks failed: {}", e);
            std::process::exit(1);
        }
    };

    let app = build_app(AppState::new(photo_store), &config);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        });

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Uploads: {:?}", config.upload_path());

    let shutdown_timeout = config.shutdown.timeout_duration();
    let shutdown_signal = {
        let manager = shutdown_manager.clone();
        async move {
            let reason = manager.wait_for_shutdown().await;
            tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);
    let server = tokio::spawn(async move { server.await });

    // 收到退出信号后，最多等待 shutdown_timeout 让在途请求结束
    let result = tokio::select! {
        res = server => res,
        _ = async {
            shutdown_manager.wait_for_shutdown().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!("优雅退出超时（{}秒），强制退出", shutdown_timeout.as_secs());
            std::process::exit(1);
        }
    };

    match result {
        Ok(Ok(())) => tracing::info!("服务器已优雅关闭"),
        Ok(Err(e)) => {
            tracing::error!("服务器运行错误: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("服务器任务异常退出: {}", e);
            std::process::exit(1);
        }
    }
}
