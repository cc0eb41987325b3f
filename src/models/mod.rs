pub mod classifier;
pub mod manager;

pub use classifier::{BinaryClassifier, InputShape, OnnxClassifier};
pub use manager::{ModelHandle, ModelManager, ModelState, ModelStatus};

#[cfg(test)]
pub(crate) mod testing {
    use super::{BinaryClassifier, InputShape};
    use crate::models::classifier::check_input_shape;
    use crate::utils::error::ClassifyError;
    use crate::Result;
    use ndarray::Array4;
    use parking_lot::Mutex;

    /// 返回固定输出的测试分类器
    pub struct FixedClassifier {
        output: std::result::Result<f32, String>,
        input_shape: InputShape,
        pub seen_shapes: Mutex<Vec<Vec<usize>>>,
    }

    impl FixedClassifier {
        pub fn new(probability: f32) -> Self {
            Self {
                output: Ok(probability),
                input_shape: InputShape::from_onnx_dims(&[-1, 128, 128, 3]),
                seen_shapes: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                output: Err(message.to_string()),
                ..Self::new(0.0)
            }
        }

        pub fn with_input_shape(mut self, dims: &[i64]) -> Self {
            self.input_shape = InputShape::from_onnx_dims(dims);
            self
        }
    }

    impl BinaryClassifier for FixedClassifier {
        fn predict(&self, input: Array4<f32>) -> Result<f32> {
            self.seen_shapes.lock().push(input.shape().to_vec());
            check_input_shape(&self.input_shape, input.shape())?;
            self.output.clone().map_err(|message| ClassifyError::Inference {
                message,
                input_shape: Some(self.input_shape.to_string()),
            })
        }

        fn input_shape(&self) -> &InputShape {
            &self.input_shape
        }
    }
}
