use crate::config::OutputOrdering;
use crate::profile::{AppProfile, Tone};
use crate::utils::error::ClassifyError;
use crate::Result;
use serde::Serialize;

/// 固定判定阈值，严格大于时判为正类
pub const DECISION_THRESHOLD: f64 = 0.5;

/// 模型输出的概率，保证有限且在 [0, 1] 内
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Probability(f64);

impl Probability {
    pub fn new(value: f32) -> Result<Self> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(f64::from(value)))
        } else {
            Err(ClassifyError::inference(format!(
                "Model output {} is not a probability in [0, 1]",
                value
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub outcome: Outcome,
    pub label: &'static str,
    pub headline: &'static str,
    pub tone: Tone,
    /// 正类概率（已按输出约定换算）
    pub probability: f64,
    /// 获胜类别的置信度百分比，[50, 100]
    pub confidence: f64,
    pub confidence_label: &'static str,
    pub confidence_text: String,
}

impl Verdict {
    /// 另一类别的置信度，两者之和恒为 100
    pub fn complementary_confidence(&self) -> f64 {
        100.0 - self.confidence
    }
}

pub fn present(probability: Probability, ordering: OutputOrdering, profile: &AppProfile) -> Verdict {
    let p = match ordering {
        OutputOrdering::PositiveHigh => probability.value(),
        OutputOrdering::NegativeHigh => 1.0 - probability.value(),
    };

    let (outcome, label, confidence) = if p > DECISION_THRESHOLD {
        (Outcome::Positive, &profile.positive, p * 100.0)
    } else {
        (Outcome::Negative, &profile.negative, (1.0 - p) * 100.0)
    };

    Verdict {
        outcome,
        label: label.name,
        headline: label.headline,
        tone: label.tone,
        probability: p,
        confidence,
        confidence_label: profile.confidence_label,
        confidence_text: format!("{:.2}%", confidence),
    }
}
