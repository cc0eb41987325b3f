use crate::config::OnnxConfig;
use crate::utils::error::ClassifyError;
use crate::Result;
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::{Tensor, ValueType},
};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// 二分类模型接口：输入 (1, H, W, 3) 张量，输出单个概率
pub trait BinaryClassifier: Send + Sync {
    fn predict(&self, input: Array4<f32>) -> Result<f32>;

    fn input_shape(&self) -> &InputShape;
}

/// 模型声明的输入形状，`None` 表示动态维度
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputShape(pub Vec<Option<usize>>);

impl InputShape {
    pub fn from_onnx_dims(dims: &[i64]) -> Self {
        Self(
            dims.iter()
                .map(|&d| if d >= 0 { Some(d as usize) } else { None })
                .collect(),
        )
    }

    pub fn accepts(&self, dims: &[usize]) -> bool {
        self.0.len() == dims.len()
            && self
                .0
                .iter()
                .zip(dims)
                .all(|(expected, actual)| expected.map_or(true, |e| e == *actual))
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|d| d.map_or_else(|| "None".to_string(), |d| d.to_string()))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

pub fn format_dims(dims: &[usize]) -> String {
    let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// 在推理前校验输入张量形状
pub fn check_input_shape(expected: &InputShape, dims: &[usize]) -> Result<()> {
    if expected.accepts(dims) {
        Ok(())
    } else {
        Err(ClassifyError::ShapeMismatch {
            expected: expected.to_string(),
            actual: format_dims(dims),
        })
    }
}

/// 从模型输出中取出唯一的概率值
pub fn single_probability<'a>(values: impl IntoIterator<Item = &'a f32>, shape: &[usize]) -> Result<f32> {
    let mut iter = values.into_iter();
    match (iter.next(), iter.next()) {
        (Some(&p), None) => Ok(p),
        _ => Err(ClassifyError::inference(format!(
            "Expected a single probability, got output shape {}",
            format_dims(shape)
        ))),
    }
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
    input_shape: InputShape,
}

impl OnnxClassifier {
    pub fn new(model_path: &Path, onnx_config: &OnnxConfig) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifyError::ModelUnavailable(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classification model from: {}", model_path.display());

        let session = build_session(model_path, onnx_config)
            .map_err(|e| ClassifyError::ModelUnavailable(format!("{}: {}", model_path.display(), e)))?;

        let input = session.inputs.first().ok_or_else(|| {
            ClassifyError::ModelUnavailable("Classification model has no inputs".to_string())
        })?;

        let input_shape = match &input.input_type {
            ValueType::Tensor { shape, .. } => {
                let dims: Vec<i64> = shape.iter().copied().collect();
                InputShape::from_onnx_dims(&dims)
            }
            other => {
                return Err(ClassifyError::ModelUnavailable(format!(
                    "Model input '{}' is not a tensor: {:?}",
                    input.name, other
                )))
            }
        };
        let input_name = input.name.clone();

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::ModelUnavailable(
                    "Classification model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classification model ready: input '{}' {}, output '{}'",
            input_name,
            input_shape,
            output_name
        );

        // 记录所有可用输出用于调试
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("Classification output[{}]: '{}'", i, output.name);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_shape,
        })
    }

    fn inference_error(&self, message: String) -> ClassifyError {
        ClassifyError::Inference {
            message,
            input_shape: Some(self.input_shape.to_string()),
        }
    }
}

impl BinaryClassifier for OnnxClassifier {
    fn predict(&self, input: Array4<f32>) -> Result<f32> {
        check_input_shape(&self.input_shape, input.shape())?;

        let input_tensor = Tensor::from_array(input).map_err(|e| self.inference_error(e.to_string()))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| self.inference_error(e.to_string()))?;

        let output = match outputs.get(self.output_name.as_str()) {
            Some(output) => output,
            None => {
                let available_outputs: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                return Err(self.inference_error(format!(
                    "Classification output '{}' not found. Available outputs: {:?}",
                    self.output_name, available_outputs
                )));
            }
        };

        let predictions = output
            .try_extract_array::<f32>()
            .map_err(|e| self.inference_error(e.to_string()))?;

        let probability = single_probability(predictions.iter(), predictions.shape())?;
        Ok(probability)
    }

    fn input_shape(&self) -> &InputShape {
        &self.input_shape
    }
}

fn build_session(model_path: &Path, onnx_config: &OnnxConfig) -> ort::Result<Session> {
    let session = Session::builder()?
        .with_optimization_level(optimization_level(onnx_config.optimization_level))?
        .with_intra_threads(onnx_config.intra_threads)?
        .commit_from_file(model_path)?;

    Ok(session)
}

fn optimization_level(level: u8) -> GraphOptimizationLevel {
    match level {
        0 => GraphOptimizationLevel::Disable,
        1 => GraphOptimizationLevel::Level1,
        2 => GraphOptimizationLevel::Level2,
        _ => GraphOptimizationLevel::Level3,
    }
}
