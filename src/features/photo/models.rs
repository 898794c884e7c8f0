use chrono::NaiveDateTime;
use std::path::{Component, Path};

/// 照片文件名前缀
pub const FILENAME_PREFIX: &str = "photo_";
/// 照片文件扩展名（含点）
pub const FILENAME_EXT: &str = ".png";
/// 文件名中时间戳部分的格式（秒级精度）
const FILENAME_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
/// 列表页展示的拍摄时间格式
const DISPLAY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// 照片描述（列表项）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhotoEntry {
    /// 文件名，同时作为照片的唯一标识
    #[schema(example = "photo_20240315_093012.png")]
    pub filename: String,
    /// 拍摄时间（由文件名解析）；文件名不符合命名规则时为空
    #[schema(example = "2024/03/15 09:30:12")]
    pub captured_at: Option<String>,
}

impl PhotoEntry {
    pub fn from_filename(filename: String) -> Self {
        let captured_at = parse_capture_time(&filename)
            .map(|t| t.format(DISPLAY_TIME_FORMAT).to_string());
        Self {
            filename,
            captured_at,
        }
    }
}

/// 照片列表响应
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct PhotoListResponse {
    /// 按文件名倒序（最新在前）
    pub items: Vec<PhotoEntry>,
    pub total: usize,
}

/// 上传成功响应
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "照片已保存")]
    pub message: String,
    #[schema(example = "photo_20240315_093012.png")]
    pub filename: String,
}

/// 删除成功响应
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "照片已删除")]
    pub message: String,
}

/// 由拍摄时间生成文件名：`photo_YYYYMMDD_HHMMSS.png`
pub fn photo_filename(captured_at: NaiveDateTime) -> String {
    format!(
        "{FILENAME_PREFIX}{}{FILENAME_EXT}",
        captured_at.format(FILENAME_TIME_FORMAT)
    )
}

/// 从文件名解析拍摄时间，不符合命名规则时返回 None
pub fn parse_capture_time(filename: &str) -> Option<NaiveDateTime> {
    let stamp = filename
        .strip_prefix(FILENAME_PREFIX)?
        .strip_suffix(FILENAME_EXT)?;
    NaiveDateTime::parse_from_str(stamp, FILENAME_TIME_FORMAT).ok()
}

/// 是否为列表应包含的图片文件
pub fn is_png_name(filename: &str) -> bool {
    filename.ends_with(FILENAME_EXT)
}

/// 文件名必须是单个普通路径分量，不能跳出存储目录。
pub fn is_safe_filename(filename: &str) -> bool {
    if filename.is_empty()
        || filename.len() > 255
        || filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
    {
        return false;
    }
    let mut components = Path::new(filename).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
