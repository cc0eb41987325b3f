pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    image::ImagePreprocessor,
    models::{ModelManager, ModelState},
    presenter::{FlowContext, FlowRunner, DECISION_THRESHOLD},
    utils::error::ClassifyError,
    Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    middleware::from_fn,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
};

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub models: Arc<ModelManager>,
}

impl AppState {
    pub fn new(config: Config, models: Arc<ModelManager>) -> Self {
        Self {
            config: Arc::new(config),
            models,
        }
    }

    pub fn runner(&self) -> FlowRunner<'_> {
        FlowRunner::new(
            &self.models,
            FlowContext {
                profile: self.config.profile.clone(),
                ordering: self.config.output_ordering,
            },
        )
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 启动时加载一次模型，失败只禁用推理
    let models = ModelManager::init(&config);
    if let Err(e) = models.model() {
        tracing::warn!("Inference disabled: {}", e);
    }

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .map_err(|e| ClassifyError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e)))?;

    let app = create_app(AppState::new(config, models));

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /            - Web UI");
    tracing::info!("  POST /upload      - Multipart upload, returns preview");
    tracing::info!("  POST /predict     - Multipart upload, returns verdict");
    tracing::info!("  POST /api/predict - JSON base64 upload, returns verdict");
    tracing::info!("  GET  /health      - Health check");
    tracing::info!("  GET  /api/info    - Service information");

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ClassifyError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = state.config.server_config.clone();

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/upload", post(handlers::upload_handler))
        .route("/predict", post(handlers::predict_handler))
        .route("/api/predict", post(handlers::predict_json_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .layer(from_fn(middleware::security_headers))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .layer(from_fn(middleware::request_logging))
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}

/// 健康检查端点；模型不可用时进程仍然存活
async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let model = state.models.status();
    let status = if model.state == ModelState::Unavailable {
        "degraded"
    } else {
        "healthy"
    };

    Json(json!({
        "status": status,
        "model": model,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = &state.config;
    let input_dims = ImagePreprocessor::new(config.profile.input_size).input_dims();

    Json(json!({
        "service": "ONNX Classify Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "app": config.profile,
        "model": state.models.status(),
        "input_shape": input_dims,
        "threshold": DECISION_THRESHOLD,
        "output_ordering": config.output_ordering,
        "accepted_formats": ["image/jpeg", "image/png"],
    }))
}
