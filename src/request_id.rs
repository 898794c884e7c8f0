use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// 请求头名称（小写，HTTP/2 要求）
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_CLIENT_ID_LEN: usize = 128;

/// 单次请求的追踪 ID，写入请求扩展、响应头以及错误响应体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// 新生成的 ID，形如 `req_<uuid>`
    pub fn generate() -> Self {
        Self(format!("req_{}", Uuid::new_v4().simple()))
    }

    /// 沿用客户端的 `X-Request-Id`；缺失或含非法字符时重新生成
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|raw| is_acceptable_client_id(raw))
            .map(|raw| Self(raw.to_string()))
            .unwrap_or_else(Self::generate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

tokio::task_local! {
    static CURRENT: RequestId;
}

/// 当前任务所处请求的 ID；不在请求上下文中时为 None
pub fn current_request_id() -> Option<String> {
    CURRENT.try_with(|id| id.0.clone()).ok()
}

fn is_acceptable_client_id(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_CLIENT_ID_LEN
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

/// 为每个请求绑定 request_id，并在 `request` span 下处理
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let id = RequestId::from_headers(req.headers());
    req.extensions_mut().insert(id.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %id.as_str(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    let header = HeaderValue::from_str(id.as_str()).ok();
    let mut res = CURRENT
        .scope(id, next.run(req))
        .instrument(span)
        .await;

    if let Some(value) = header {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
