use axum::http::{HeaderName, HeaderValue, Method};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::config::CorsConfig;

/// 配置项解析结果：是否包含通配符 "*"，以及其余合法取值
struct Parsed<T> {
    any: bool,
    values: Vec<T>,
}

/// 根据配置构建 CORS 中间件（同时处理 OPTIONS 预检）
pub fn build_cors_layer(cors: &CorsConfig) -> Option<CorsLayer> {
    if !cors.enabled {
        return None;
    }

    let origins = parse_list("allowed_origins", &cors.allowed_origins, |v| {
        HeaderValue::from_str(v).ok()
    });
    if !origins.any && origins.values.is_empty() {
        tracing::warn!("CORS 已启用但 allowed_origins 为空，已跳过启用");
        return None;
    }

    let methods = parse_list("allowed_methods", &cors.allowed_methods, |v| {
        Method::from_bytes(v.to_ascii_uppercase().as_bytes()).ok()
    });
    let headers = parse_list("allowed_headers", &cors.allowed_headers, parse_header_name);
    let expose = parse_list("expose_headers", &cors.expose_headers, parse_header_name);

    if cors.allow_credentials && (origins.any || methods.any || headers.any || expose.any) {
        tracing::error!("CORS 配置无效：allow_credentials=true 不能与 \"*\" 同时使用，已跳过启用");
        return None;
    }

    let mut layer = CorsLayer::new();

    layer = if origins.any {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins.values)
    };

    if methods.any {
        layer = layer.allow_methods(Any);
    } else if !methods.values.is_empty() {
        layer = layer.allow_methods(methods.values);
    }

    if headers.any {
        layer = layer.allow_headers(Any);
    } else if !headers.values.is_empty() {
        layer = layer.allow_headers(headers.values);
    }

    if expose.any {
        layer = layer.expose_headers(Any);
    } else if !expose.values.is_empty() {
        layer = layer.expose_headers(expose.values);
    }

    if cors.allow_credentials {
        layer = layer.allow_credentials(true);
    }

    if let Some(secs) = cors.max_age_secs
        && secs > 0
    {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}

fn parse_header_name(v: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(v.to_ascii_lowercase().as_bytes()).ok()
}

fn parse_list<T>(label: &str, raw: &[String], parse: impl Fn(&str) -> Option<T>) -> Parsed<T> {
    let mut out = Parsed {
        any: false,
        values: Vec::new(),
    };
    for value in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if value == "*" {
            out.any = true;
            continue;
        }
        match parse(value) {
            Some(v) => out.values.push(v),
            None => tracing::warn!("CORS {} 含无效值: {}", label, value),
        }
    }
    out
}
