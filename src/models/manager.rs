use crate::models::{BinaryClassifier, OnnxClassifier};
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use once_cell::sync::OnceCell;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 已加载模型的共享句柄，加载后只读
pub type ModelHandle = Arc<dyn BinaryClassifier>;

type ModelLoader = Box<dyn Fn(&Path) -> Result<ModelHandle> + Send + Sync>;

/// 模型管理器：首次使用时加载，进程生命周期内缓存结果（包括失败）
pub struct ModelManager {
    model_path: PathBuf,
    loader: ModelLoader,
    slot: OnceCell<std::result::Result<ModelHandle, String>>,
}

static MODEL_MANAGER: OnceCell<Arc<ModelManager>> = OnceCell::new();

impl ModelManager {
    /// 使用 ONNX Runtime 加载配置中的模型文件
    pub fn new(config: &Config) -> Self {
        let onnx_config = config.onnx_config.clone();
        Self::with_loader(config.model_path(), move |path| {
            let classifier = OnnxClassifier::new(path, &onnx_config)?;
            Ok(Arc::new(classifier) as ModelHandle)
        })
    }

    pub fn with_loader<F>(model_path: PathBuf, loader: F) -> Self
    where
        F: Fn(&Path) -> Result<ModelHandle> + Send + Sync + 'static,
    {
        Self {
            model_path,
            loader: Box::new(loader),
            slot: OnceCell::new(),
        }
    }

    /// 初始化全局模型管理器；重复调用返回同一实例
    pub fn init(config: &Config) -> Arc<ModelManager> {
        MODEL_MANAGER
            .get_or_init(|| {
                tracing::info!("Initializing model manager...");
                Arc::new(ModelManager::new(config))
            })
            .clone()
    }

    /// 获取模型，首次调用时阻塞加载
    pub fn model(&self) -> Result<ModelHandle> {
        let slot = self.slot.get_or_init(|| match (self.loader)(&self.model_path) {
            Ok(model) => {
                tracing::info!("Classification model loaded successfully");
                Ok(model)
            }
            Err(e) => {
                tracing::error!("Model Load Error: {}", e);
                match e {
                    ClassifyError::ModelUnavailable(reason) => Err(reason),
                    other => Err(other.to_string()),
                }
            }
        });

        match slot {
            Ok(model) => Ok(Arc::clone(model)),
            Err(reason) => Err(ClassifyError::ModelUnavailable(reason.clone())),
        }
    }

    /// 当前模型状态，不触发加载
    pub fn status(&self) -> ModelStatus {
        let path = self.model_path.display().to_string();
        match self.slot.get() {
            None => ModelStatus {
                state: ModelState::NotLoaded,
                path,
                input_shape: None,
                error: None,
            },
            Some(Ok(model)) => ModelStatus {
                state: ModelState::Loaded,
                path,
                input_shape: Some(model.input_shape().to_string()),
                error: None,
            },
            Some(Err(reason)) => ModelStatus {
                state: ModelState::Unavailable,
                path,
                input_shape: None,
                error: Some(reason.clone()),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    NotLoaded,
    Loaded,
    Unavailable,
}

/// 模型状态信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
