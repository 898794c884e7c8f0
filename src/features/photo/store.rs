use chrono::{Local, NaiveDateTime};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::models::{PhotoEntry, is_png_name, is_safe_filename, photo_filename};
use crate::error::AppError;

/// 照片存储服务：单个扁平目录，目录列表即唯一数据源。
///
/// 文件名同时承担标识与拍摄时间两种含义（秒级精度）。同一秒内的两次上传
/// 会得到同一文件名，后写入者覆盖先写入者，不加锁。
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 打开存储目录，不存在时创建
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, AppError> {
        let store = Self::new(root);
        tokio::fs::create_dir_all(&store.root).await.map_err(|e| {
            AppError::Storage(format!("创建照片目录失败 {:?}: {e}", store.root))
        })?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 列出所有 PNG 照片，按文件名倒序（即拍摄时间从新到旧）。
    pub async fn list(&self) -> Result<Vec<PhotoEntry>, AppError> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("读取照片目录失败: {e}")))?;

        let mut names = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| AppError::Storage(format!("读取照片目录失败: {e}")))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_png_name(&name) {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => names.push(name),
                Ok(_) => {}
                Err(e) => tracing::debug!("跳过无法识别类型的条目 {}: {}", name, e),
            }
        }

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names.into_iter().map(PhotoEntry::from_filename).collect())
    }

    /// 以当前本地时间保存一张照片，返回生成的文件名
    pub async fn upload(&self, png: &[u8]) -> Result<String, AppError> {
        self.upload_at(png, Local::now().naive_local()).await
    }

    /// 以指定拍摄时间保存照片；同名文件直接覆盖
    pub async fn upload_at(
        &self,
        png: &[u8],
        captured_at: NaiveDateTime,
    ) -> Result<String, AppError> {
        let filename = photo_filename(captured_at);
        let path = self.root.join(&filename);

        match tokio::fs::try_exists(&path).await {
            Ok(true) => tracing::warn!("同一秒内重复上传，覆盖已有照片: {}", filename),
            Ok(false) => {}
            Err(e) => tracing::debug!("无法确认照片是否已存在 {}: {}", filename, e),
        }

        tokio::fs::write(&path, png)
            .await
            .map_err(|e| AppError::Storage(format!("保存照片失败 {filename}: {e}")))?;

        tracing::info!(filename = %filename, bytes = png.len(), "照片已保存");
        Ok(filename)
    }

    /// 删除照片（立即且不可恢复）
    pub async fn delete(&self, filename: &str) -> Result<(), AppError> {
        let path = self.resolve(filename)?;

        ensure_file(&path, filename).await?;

        // 检查与删除之间可能被并发删除，此时同样视为不存在
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(filename = %filename, "照片已删除");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(filename)),
            Err(e) => Err(AppError::Storage(format!("删除照片失败 {filename}: {e}"))),
        }
    }

    /// 读取照片原始字节
    pub async fn retrieve(&self, filename: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(filename)?;

        ensure_file(&path, filename).await?;

        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => not_found(filename),
            _ => AppError::Storage(format!("读取照片失败 {filename}: {e}")),
        })
    }

    /// 把外部传入的文件名限定在存储目录内
    fn resolve(&self, filename: &str) -> Result<PathBuf, AppError> {
        if !is_safe_filename(filename) {
            return Err(AppError::Validation(format!("非法文件名: {filename:?}")));
        }
        Ok(self.root.join(filename))
    }
}

/// 目标必须是已存在的普通文件（目录等视为不存在）
async fn ensure_file(path: &Path, filename: &str) -> Result<(), AppError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(not_found(filename)),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(filename)),
        Err(e) => Err(AppError::Storage(format!("读取文件信息失败: {e}"))),
    }
}

fn not_found(filename: &str) -> AppError {
    AppError::NotFound(filename.to_string())
}
