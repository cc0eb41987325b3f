use serde::Serialize;

/// 内置应用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AppKind {
    BrainTumor,
    CatsVsDogs,
}

/// 结果展示语气，对应页面上的提示框样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeLabel {
    /// 简短类别名
    pub name: &'static str,
    /// 结果标题
    pub headline: &'static str,
    pub tone: Tone,
}

/// 单个演示应用的全部文案与模型参数
#[derive(Debug, Clone, Serialize)]
pub struct AppProfile {
    pub kind: AppKind,
    pub page_title: &'static str,
    pub title: &'static str,
    pub intro: Option<&'static str>,
    pub upload_label: &'static str,
    pub preview_caption: &'static str,
    pub action_label: &'static str,
    pub analyzing_message: &'static str,
    pub confidence_label: &'static str,
    pub positive: OutcomeLabel,
    pub negative: OutcomeLabel,
    pub model_file: &'static str,
    pub missing_model_message: &'static str,
    pub disclaimer: Option<&'static str>,
    pub accent_color: &'static str,
    pub preview_width: u32,
    /// (height, width)
    pub input_size: (u32, u32),
}

impl AppProfile {
    pub fn for_kind(kind: AppKind) -> Self {
        match kind {
            AppKind::BrainTumor => Self::brain_tumor(),
            AppKind::CatsVsDogs => Self::cats_vs_dogs(),
        }
    }

    pub fn brain_tumor() -> Self {
        Self {
            kind: AppKind::BrainTumor,
            page_title: "🧠 Brain Tumor Detection",
            title: "🧠 Brain Tumor Detection System",
            intro: Some("Upload an MRI scan below to analyze for the presence of a tumor."),
            upload_label: "Choose an MRI image...",
            preview_caption: "Uploaded MRI Scan",
            action_label: "Run Diagnostic Analysis",
            analyzing_message: "Analyzing MRI features...",
            confidence_label: "Probability",
            positive: OutcomeLabel {
                name: "Tumor",
                headline: "Tumor Detected ⚠️",
                tone: Tone::Error,
            },
            negative: OutcomeLabel {
                name: "No Tumor",
                headline: "No Tumor Detected ✅",
                tone: Tone::Success,
            },
            model_file: "Brain_Tumor_Detection_Model.onnx",
            missing_model_message: "Model file not found. Please ensure 'Brain_Tumor_Detection_Model.onnx' is in the directory.",
            disclaimer: Some(
                "Disclaimer: This is an AI-assisted tool and should not be used as a primary medical diagnosis. Please consult a professional radiologist.",
            ),
            accent_color: "#2E86C1",
            preview_width: 300,
            input_size: (128, 128),
        }
    }

    pub fn cats_vs_dogs() -> Self {
        Self {
            kind: AppKind::CatsVsDogs,
            page_title: "Cats vs Dogs Classifier",
            title: "🐱Cats vs 🐶Dogs Classifier",
            intro: None,
            upload_label: "Choose an image...",
            preview_caption: "Uploaded Image",
            action_label: "Identify Pet",
            analyzing_message: "Analyzing features...",
            confidence_label: "Confidence Level",
            positive: OutcomeLabel {
                name: "Dog",
                headline: "It's a Dog 🐶",
                tone: Tone::Info,
            },
            negative: OutcomeLabel {
                name: "Cat",
                headline: "It's a Cat 🐱",
                tone: Tone::Success,
            },
            model_file: "cats_vs_dogs_model_1.onnx",
            missing_model_message: "Model file not found. Please ensure 'cats_vs_dogs_model_1.onnx' is in the directory.",
            disclaimer: None,
            accent_color: "#4CAF50",
            preview_width: 250,
            input_size: (128, 128),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_profiles_use_128_square_input() {
        for kind in [AppKind::BrainTumor, AppKind::CatsVsDogs] {
            let profile = AppProfile::for_kind(kind);
            assert_eq!(profile.kind, kind);
            assert_eq!(profile.input_size, (128, 128));
            assert!(profile.missing_model_message.starts_with("Model file not found"));
            assert!(profile.missing_model_message.contains(profile.model_file));
        }
    }

    #[test]
    fn labels_follow_positive_high_convention() {
        let tumor = AppProfile::brain_tumor();
        assert_eq!(tumor.positive.name, "Tumor");
        assert_eq!(tumor.negative.name, "No Tumor");

        let pets = AppProfile::cats_vs_dogs();
        assert_eq!(pets.positive.name, "Dog");
        assert_eq!(pets.negative.name, "Cat");
    }
}
