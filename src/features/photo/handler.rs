use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
};

use super::models::{DeleteResponse, PhotoListResponse, UploadResponse};
use super::page::render_photo_list;
use super::payload::{UploadForm, decode_image_data};
use crate::{error::AppError, state::AppState};

#[utoipa::path(
    get,
    path = "/",
    summary = "照片列表页",
    description = "服务端渲染的 HTML 页面，按拍摄时间从新到旧列出所有照片。",
    responses(
        (status = 200, description = "列表页", body = String, content_type = "text/html"),
        (status = 500, description = "读取照片目录失败", body = crate::error::ErrorBody)
    ),
    tag = "Photo"
)]
pub async fn list_page(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let photos = state.photo_store.list().await?;
    Ok(Html(render_photo_list(&photos)?))
}

#[utoipa::path(
    get,
    path = "/api/photos",
    summary = "照片列表（JSON）",
    description = "与列表页相同的数据，按文件名倒序（最新在前）。",
    responses(
        (status = 200, description = "查询成功", body = PhotoListResponse),
        (status = 500, description = "读取照片目录失败", body = crate::error::ErrorBody)
    ),
    tag = "Photo"
)]
pub async fn list_photos(
    State(state): State<AppState>,
) -> Result<Json<PhotoListResponse>, AppError> {
    let items = state.photo_store.list().await?;
    Ok(Json(PhotoListResponse {
        total: items.len(),
        items,
    }))
}

#[utoipa::path(
    post,
    path = "/upload",
    summary = "上传照片",
    description = "表单字段 `image` 为 base64 编码的 PNG（可带 `data:image/png;base64,` 前缀），\
                   支持 multipart/form-data 与 application/x-www-form-urlencoded。\
                   文件名由当前时间生成（秒级），同一秒内的重复上传会覆盖。",
    responses(
        (status = 200, description = "保存成功", body = UploadResponse),
        (status = 400, description = "缺少图片数据或数据无效", body = crate::error::ErrorBody),
        (status = 500, description = "写入失败", body = crate::error::ErrorBody)
    ),
    tag = "Photo"
)]
pub async fn upload_photo(
    State(state): State<AppState>,
    form: UploadForm,
) -> Result<Json<UploadResponse>, AppError> {
    let png = decode_image_data(form.image.as_deref())?;
    let filename = state.photo_store.upload(&png).await?;
    Ok(Json(UploadResponse {
        success: true,
        message: "照片已保存".to_string(),
        filename,
    }))
}

#[utoipa::path(
    delete,
    path = "/delete/{filename}",
    summary = "删除照片",
    description = "立即删除，不可恢复。",
    params(("filename" = String, Path, description = "照片文件名")),
    responses(
        (status = 200, description = "删除成功", body = DeleteResponse),
        (status = 400, description = "非法文件名", body = crate::error::ErrorBody),
        (status = 404, description = "文件不存在", body = crate::error::ErrorBody),
        (status = 500, description = "删除失败", body = crate::error::ErrorBody)
    ),
    tag = "Photo"
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.photo_store.delete(&filename).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "照片已删除".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/uploads/{filename}",
    summary = "获取照片",
    description = "返回照片原始字节。文件名限定在照片目录内，含路径分隔符或 `..` 的请求会被拒绝。",
    params(("filename" = String, Path, description = "照片文件名")),
    responses(
        (status = 200, description = "照片内容", body = Vec<u8>, content_type = "image/png"),
        (status = 400, description = "非法文件名", body = crate::error::ErrorBody),
        (status = 404, description = "文件不存在", body = crate::error::ErrorBody)
    ),
    tag = "Photo"
)]
pub async fn serve_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let bytes = state.photo_store.retrieve(&filename).await?;
    let content_type = if filename.ends_with(".png") {
        "image/png"
    } else {
        "application/octet-stream"
    };

    let mut res = bytes.into_response();
    let headers = res.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    // 同一秒重复上传会覆盖同名文件，不能长期缓存
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(res)
}

/// 照片相关路由；`max_upload_bytes` 只作用于上传接口
pub fn create_photo_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(list_page))
        .route("/api/photos", get(list_photos))
        .route(
            "/upload",
            post(upload_photo).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/delete/:filename", delete(delete_photo))
        .route("/uploads/:filename", get(serve_photo))
}
