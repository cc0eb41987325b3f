use crate::profile::{AppKind, AppProfile};
use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

/// 模型输出通道约定：输出值代表哪一类的概率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputOrdering {
    /// 0 = 负类, 1 = 正类
    #[default]
    PositiveHigh,
    /// 0 = 正类, 1 = 负类
    NegativeHigh,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// 服务器绑定地址
    pub bind_addr: String,

    /// 模型文件目录
    pub models_dir: PathBuf,

    /// 显式指定的模型文件（覆盖 models_dir + 配置文件名）
    pub model_override: Option<PathBuf>,

    /// 当前应用配置
    pub profile: AppProfile,

    pub output_ordering: OutputOrdering,

    /// ONNX Runtime配置
    pub onnx_config: OnnxConfig,

    /// 服务器配置
    pub server_config: ServerConfig,
}

#[derive(Debug, Clone)]
pub struct OnnxConfig {
    /// CPU线程数
    pub intra_threads: usize,

    /// 优化级别 (0-3)
    pub optimization_level: u8,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// 请求超时时间（秒）
    pub request_timeout: u64,

    /// 最大请求体大小（字节）
    pub max_request_size: usize,
}

impl Config {
    pub fn new(bind_addr: String, models_dir: String, app: AppKind, dev_mode: bool) -> Result<Self> {
        if bind_addr.trim().is_empty() {
            anyhow::bail!("bind address must not be empty");
        }

        let cpu_cores = num_cpus::get();

        let onnx_config = OnnxConfig {
            intra_threads: (cpu_cores * 3 / 4).max(1),
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 60 },
            max_request_size: 50 * 1024 * 1024, // 50MB
        };

        Ok(Self {
            bind_addr,
            models_dir: PathBuf::from(models_dir),
            model_override: None,
            profile: AppProfile::for_kind(app),
            output_ordering: OutputOrdering::default(),
            onnx_config,
            server_config,
        })
    }

    pub fn with_model_path(mut self, path: Option<String>) -> Self {
        self.model_override = path.map(PathBuf::from);
        self
    }

    pub fn with_output_ordering(mut self, ordering: OutputOrdering) -> Self {
        self.output_ordering = ordering;
        self
    }

    /// 获取分类模型路径
    pub fn model_path(&self) -> PathBuf {
        match &self.model_override {
            Some(path) => path.clone(),
            None => self.models_dir.join(self.profile.model_file),
        }
    }
}
