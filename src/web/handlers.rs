use crate::{
    image::{ImageLoader, ImageSummary},
    presenter::{flow, Event, FlowState, Upload, Verdict},
    utils::error::{ApiError, ClassifyError, WithRequestId},
    web::{extractors::RequestId, extractors::ValidatedJson, AppState},
    Result,
};
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct PredictJsonRequest {
    /// Base64编码的图像数据，可带 data URL 前缀
    pub image: String,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 上传后的预览（Ready 状态）
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub state: &'static str,
    pub image: ImageSummary,
    /// PNG data URL
    pub preview: String,
    pub caption: &'static str,
}

/// 分析结果（Done 状态）
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub state: &'static str,
    pub verdict: Verdict,
    pub image: ImageSummary,
    /// 处理耗时（秒）
    pub processing_time: f32,
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// 上传图像并返回预览
pub async fn upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> ApiResult<Json<ApiResponse<PreviewResponse>>> {
    tracing::info!("Processing upload: request_id={}", request_id);

    let max_size = state.config.server_config.max_request_size;
    let bytes = read_upload(multipart, max_size).await.with_request_id(&request_id)?;
    let decoded = decode(&state, &bytes);

    let response = preview(&state, decoded).with_request_id(&request_id)?;

    Ok(Json(ApiResponse::success(response, request_id)))
}

/// Multipart文件上传并分析
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> ApiResult<Json<ApiResponse<PredictResponse>>> {
    let start_time = Instant::now();
    tracing::info!("Processing multipart prediction: request_id={}", request_id);

    let max_size = state.config.server_config.max_request_size;
    let bytes = read_upload(multipart, max_size).await.with_request_id(&request_id)?;
    let decoded = decode(&state, &bytes);

    let response = analyze(&state, decoded, start_time).with_request_id(&request_id)?;
    log_verdict(&request_id, &response);

    Ok(Json(ApiResponse::success(response, request_id)))
}

/// JSON base64上传并分析
pub async fn predict_json_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<PredictJsonRequest>,
) -> ApiResult<Json<ApiResponse<PredictResponse>>> {
    let start_time = Instant::now();
    tracing::info!("Processing JSON prediction: request_id={}", request_id);

    let decoded = ImageLoader::from_base64(&request.image, state.config.server_config.max_request_size)
        .map(|(image, summary)| Upload::new(image, summary));

    let response = analyze(&state, decoded, start_time).with_request_id(&request_id)?;
    log_verdict(&request_id, &response);

    Ok(Json(ApiResponse::success(response, request_id)))
}

fn decode(state: &AppState, bytes: &[u8]) -> Result<Upload> {
    ImageLoader::from_bytes(bytes, state.config.server_config.max_request_size)
        .map(|(image, summary)| Upload::new(image, summary))
}

/// 上传 → Ready，返回预览
fn preview(state: &AppState, decoded: Result<Upload>) -> Result<PreviewResponse> {
    let runner = state.runner();
    let (idle, _) = flow::init();

    match runner.dispatch(idle, Event::Uploaded(decoded)) {
        FlowState::Ready { upload } => {
            let profile = &state.config.profile;
            let preview = ImageLoader::preview_data_url(&upload.image, profile.preview_width * 2)?;

            Ok(PreviewResponse {
                state: "ready",
                image: upload.summary,
                preview,
                caption: profile.preview_caption,
            })
        }
        FlowState::Failed { error, .. } => Err(error),
        other => Err(unexpected_state(&other)),
    }
}

/// 上传 → 触发分析，返回最终结果
fn analyze(state: &AppState, decoded: Result<Upload>, start_time: Instant) -> Result<PredictResponse> {
    let runner = state.runner();
    let (idle, _) = flow::init();
    let ready = runner.dispatch(idle, Event::Uploaded(decoded));

    match runner.dispatch(ready, Event::AnalyzeTriggered) {
        FlowState::Done { upload, verdict } => Ok(PredictResponse {
            state: "done",
            verdict,
            image: upload.summary,
            processing_time: start_time.elapsed().as_secs_f32(),
        }),
        FlowState::Failed { error, .. } => Err(error),
        other => Err(unexpected_state(&other)),
    }
}

fn log_verdict(request_id: &str, response: &PredictResponse) {
    tracing::info!(
        "Prediction completed: request_id={}, label={}, confidence={}, time={:.3}s",
        request_id,
        response.verdict.label,
        response.verdict.confidence_text,
        response.processing_time
    );
}

fn unexpected_state(state: &FlowState) -> ClassifyError {
    ClassifyError::Internal(format!("Analysis ended in unexpected state '{}'", state.name()))
}

/// 读取multipart中的 `file` 字段
async fn read_upload(mut multipart: Multipart, max_size: usize) -> Result<Bytes> {
    let mut image_data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e, max_size))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                // 验证内容类型
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") && content_type != "application/octet-stream" {
                        return Err(ClassifyError::UnsupportedFormat(content_type.to_string()));
                    }
                }

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read file data", e, max_size))?;

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data);
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    image_data.ok_or_else(|| ClassifyError::InvalidInput("No image file provided".to_string()))
}

/// 超出请求体上限的分块上传在读取时才会失败
fn multipart_error(context: &str, err: MultipartError, max_size: usize) -> ClassifyError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ClassifyError::FileTooLarge(format!("request body exceeds {} bytes", max_size))
    } else {
        ClassifyError::InvalidInput(format!("{}: {}", context, err.body_text()))
    }
}
