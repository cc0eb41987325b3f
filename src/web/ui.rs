use crate::profile::AppProfile;
use crate::utils::error::{ApiError, ClassifyError, WithRequestId};
use crate::web::{extractors::RequestId, AppState};
use crate::Result;
use axum::{extract::State, response::Html};

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// 首页处理器
pub async fn index_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
) -> std::result::Result<Html<String>, ApiError> {
    let html = render_index(&state.config.profile).with_request_id(&request_id)?;
    Ok(Html(html))
}

/// 用应用配置填充页面模板
pub fn render_index(profile: &AppProfile) -> Result<String> {
    // 嵌入 <script> 时避免提前闭合标签
    let profile_json = serde_json::to_string(profile)
        .map_err(|e| ClassifyError::Internal(format!("Failed to serialize app profile: {}", e)))?
        .replace("</", "<\\/");

    let html = INDEX_TEMPLATE
        .replace("{{page_title}}", &escape_html(profile.page_title))
        .replace("{{title}}", &escape_html(profile.title))
        .replace("{{intro}}", &escape_html(profile.intro.unwrap_or_default()))
        .replace("{{upload_label}}", &escape_html(profile.upload_label))
        .replace("{{action_label}}", &escape_html(profile.action_label))
        .replace("{{analyzing_message}}", &escape_html(profile.analyzing_message))
        .replace("{{disclaimer}}", &escape_html(profile.disclaimer.unwrap_or_default()))
        .replace("{{accent_color}}", profile.accent_color)
        .replace("{{preview_width}}", &profile.preview_width.to_string())
        .replace("{{profile_json}}", &profile_json);

    Ok(html)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
