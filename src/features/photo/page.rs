use std::sync::OnceLock;

use minijinja::{Environment, context};

use super::models::PhotoEntry;
use crate::error::AppError;

/// 列表页模板名（`.html` 后缀启用自动转义）
const LIST_TEMPLATE: &str = "photos.html";

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

fn get_template_env() -> Result<&'static Environment<'static>, AppError> {
    if let Some(env) = TEMPLATE_ENV.get() {
        return Ok(env);
    }
    let mut env = Environment::new();
    env.add_template(
        LIST_TEMPLATE,
        include_str!("../../../templates/photos.html.jinja"),
    )?;
    Ok(TEMPLATE_ENV.get_or_init(|| env))
}

/// 渲染照片列表页
pub fn render_photo_list(photos: &[PhotoEntry]) -> Result<String, AppError> {
    let tpl = get_template_env()?.get_template(LIST_TEMPLATE)?;
    Ok(tpl.render(context! { photos => photos })?)
}
