use std::sync::Arc;

use crate::features::photo::PhotoStore;

/// 聚合的应用共享状态
///
/// 启动时构造一次，经由 Axum `State` 显式传给各处理函数。
#[derive(Clone)]
pub struct AppState {
    /// 照片存储服务
    pub photo_store: Arc<PhotoStore>,
}

impl AppState {
    pub fn new(photo_store: PhotoStore) -> Self {
        Self {
            photo_store: Arc::new(photo_store),
        }
    }
}
