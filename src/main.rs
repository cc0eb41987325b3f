use anyhow::Result;
use clap::Parser;
use onnx_classify::{config::OutputOrdering, profile::AppKind, web::serve, Config};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onnx-classify")]
#[command(about = "Upload an image and get a binary classification verdict")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8501")]
    bind: String,

    /// Which classifier app to serve
    #[arg(long, value_enum, default_value = "brain-tumor")]
    app: AppKind,

    /// Directory containing the model file
    #[arg(long, default_value = ".")]
    models_dir: String,

    /// Explicit model file path (overrides --models-dir)
    #[arg(long)]
    model_path: Option<String>,

    /// Which class the model output probability refers to
    #[arg(long, value_enum, default_value = "positive-high")]
    output_ordering: OutputOrdering,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)))
        .with_target(false)
        .init();

    let config = Config::new(args.bind, args.models_dir, args.app, args.dev)?
        .with_model_path(args.model_path)
        .with_output_ordering(args.output_ordering);

    tracing::info!("Starting ONNX classify service...");
    tracing::info!("App: {}", config.profile.title);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Model path: {}", config.model_path().display());

    serve(config).await?;

    Ok(())
}
