use crate::config::AppConfig;
use crate::error::AppError;
use crate::features::photo::PhotoStore;

/// 执行启动检查
///
/// 1. 检查并创建照片目录，返回打开的照片存储
/// 2. 检查静态文件目录（仅告警，不阻断启动）
pub async fn run_startup_checks(config: &AppConfig) -> Result<PhotoStore, AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    let store = ensure_upload_folder(config).await?;
    check_static_folder(config);

    tracing::info!("✅ 启动检查完成");
    Ok(store)
}

/// 确保照片目录存在
async fn ensure_upload_folder(config: &AppConfig) -> Result<PhotoStore, AppError> {
    let upload_path = config.upload_path();

    if !upload_path.exists() {
        tracing::warn!("📁 未找到照片目录，正在创建: {:?}", upload_path);
    }
    let store = PhotoStore::open(upload_path).await?;
    tracing::info!("✅ 照片目录就绪: {:?}", store.root());

    Ok(store)
}

/// 静态目录缺失时拍摄页面不可用，但列表/上传接口仍可工作
fn check_static_folder(config: &AppConfig) {
    let static_path = config.static_path();
    if !static_path.join("index.html").is_file() {
        tracing::warn!("⚠️ 静态目录 {:?} 中没有 index.html，拍摄页面将不可用", static_path);
    }
}
