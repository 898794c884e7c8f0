use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::Deserialize;

use crate::error::AppError;

/// 拍摄页面 `canvas.toDataURL('image/png')` 产生的前缀
pub const DATA_URL_PREFIX: &str = "data:image/png;base64,";
/// PNG 文件签名
const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
/// 上传表单中的图片字段名
const IMAGE_FIELD: &str = "image";

/// 上传表单。
///
/// 浏览器 `FormData` 以 `multipart/form-data` 提交，脚本/curl 常用
/// `application/x-www-form-urlencoded`，两者都只读取 `image` 字段。
#[derive(Debug, Default, Deserialize)]
pub struct UploadForm {
    pub image: Option<String>,
}

#[axum::async_trait]
impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            return match Form::<UploadForm>::from_request(req, state).await {
                Ok(Form(form)) => Ok(form),
                Err(e) => Err(AppError::Validation(format!("缺少图片数据（{e}）"))),
            };
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("multipart 解析失败: {e}")))?;

        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("multipart 解析失败: {e}")))?
        {
            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("读取图片字段失败: {e}")))?;
            form.image = Some(text);
            break;
        }
        Ok(form)
    }
}

/// 将上传的 base64 文本解码为 PNG 字节。
///
/// 去掉可选的 data URL 前缀；表单编码可能把 `+` 变成空格，这里还原。
pub fn decode_image_data(raw: Option<&str>) -> Result<Vec<u8>, AppError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| AppError::Validation("缺少图片数据".into()))?;

    let raw = raw.trim_start();
    let encoded = raw.strip_prefix(DATA_URL_PREFIX).unwrap_or(raw);
    let encoded = encoded.trim_end_matches(['\r', '\n']);
    // `=` 填充之后的空白是多余的空白；其余空格都按 `+` 还原
    let encoded = match encoded.trim_end() {
        padded if padded.ends_with('=') => padded,
        _ => encoded,
    };
    let encoded = encoded.replace(' ', "+");

    let bytes = BASE64_STANDARD.decode(encoded.as_bytes())?;
    if bytes.is_empty() {
        return Err(AppError::Validation("图片数据为空".into()));
    }
    if !bytes.starts_with(PNG_SIGNATURE) {
        return Err(AppError::Validation("图片数据不是 PNG 格式".into()));
    }
    Ok(bytes)
}
