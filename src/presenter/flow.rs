use crate::config::OutputOrdering;
use crate::image::ImageSummary;
use crate::presenter::verdict::{present, Probability, Verdict};
use crate::profile::AppProfile;
use crate::utils::error::ClassifyError;
use crate::Result;
use image::DynamicImage;
use std::fmt;
use std::sync::Arc;

/// 一次上传的已解码图像，仅在单个交互周期内存在
#[derive(Debug, Clone)]
pub struct Upload {
    pub image: Arc<DynamicImage>,
    pub summary: ImageSummary,
}

impl Upload {
    pub fn new(image: DynamicImage, summary: ImageSummary) -> Self {
        Self {
            image: Arc::new(image),
            summary,
        }
    }
}

pub struct FlowContext {
    pub profile: AppProfile,
    pub ordering: OutputOrdering,
}

#[derive(Debug)]
pub enum State {
    Idle,
    Ready {
        upload: Upload,
    },
    Analyzing {
        upload: Upload,
    },
    Done {
        upload: Upload,
        verdict: Verdict,
    },
    Failed {
        upload: Option<Upload>,
        error: ClassifyError,
    },
}

impl State {
    pub fn name(&self) -> &'static str {
        match self {
            State::Idle => "idle",
            State::Ready { .. } => "ready",
            State::Analyzing { .. } => "analyzing",
            State::Done { .. } => "done",
            State::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug)]
pub enum Event {
    /// 用户上传了文件（解码结果）
    Uploaded(Result<Upload>),
    /// 用户点击分析按钮
    AnalyzeTriggered,
    ClassifyDone(Result<f32>),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Uploaded(Ok(upload)) => {
                write!(f, "Uploaded({}x{})", upload.summary.width, upload.summary.height)
            }
            Event::Uploaded(Err(e)) => write!(f, "Uploaded(error: {})", e),
            Event::AnalyzeTriggered => write!(f, "AnalyzeTriggered"),
            Event::ClassifyDone(Ok(p)) => write!(f, "ClassifyDone({})", p),
            Event::ClassifyDone(Err(e)) => write!(f, "ClassifyDone(error: {})", e),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Effect {
    Classify { image: Arc<DynamicImage> },
}

pub fn init() -> (State, Vec<Effect>) {
    (State::Idle, vec![])
}

pub fn transition(context: &FlowContext, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        // 新上传总是重置流程
        (_, Event::Uploaded(Ok(upload))) => (State::Ready { upload }, vec![]),
        (_, Event::Uploaded(Err(error))) => (State::Failed { upload: None, error }, vec![]),

        (State::Ready { upload }, Event::AnalyzeTriggered)
        | (State::Done { upload, .. }, Event::AnalyzeTriggered)
        | (State::Failed { upload: Some(upload), .. }, Event::AnalyzeTriggered) => {
            let effect = Effect::Classify {
                image: Arc::clone(&upload.image),
            };
            (State::Analyzing { upload }, vec![effect])
        }

        (State::Analyzing { upload }, Event::ClassifyDone(result)) => {
            match result.and_then(Probability::new) {
                Ok(probability) => {
                    let verdict = present(probability, context.ordering, &context.profile);
                    (State::Done { upload, verdict }, vec![])
                }
                Err(error) => (
                    State::Failed {
                        upload: Some(upload),
                        error,
                    },
                    vec![],
                ),
            }
        }

        // 其余组合不改变状态（例如空闲时点击按钮、分析中重复点击）
        (state, event) => {
            tracing::debug!("Ignoring event {} in state {}", event, state.name());
            (state, vec![])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presenter::verdict::Outcome;
    use image::{ImageBuffer, Rgb};

    fn context() -> FlowContext {
        FlowContext {
            profile: AppProfile::brain_tumor(),
            ordering: OutputOrdering::PositiveHigh,
        }
    }

    fn upload() -> Upload {
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(4, 4, Rgb([1u8, 2, 3])));
        let summary = ImageSummary {
            width: 4,
            height: 4,
            color: "Rgb8".to_string(),
            format: "png",
        };
        Upload::new(image, summary)
    }

    #[test]
    fn starts_idle_without_effects() {
        let (state, effects) = init();
        assert!(matches!(state, State::Idle));
        assert!(effects.is_empty());
    }

    #[test]
    fn trigger_in_idle_is_ignored() {
        let (state, effects) = transition(&context(), State::Idle, Event::AnalyzeTriggered);
        assert!(matches!(state, State::Idle));
        assert!(effects.is_empty());
    }

    #[test]
    fn happy_path_reaches_done() {
        let ctx = context();

        let (state, effects) = transition(&ctx, State::Idle, Event::Uploaded(Ok(upload())));
        assert_eq!(state.name(), "ready");
        assert!(effects.is_empty());

        let (state, effects) = transition(&ctx, state, Event::AnalyzeTriggered);
        assert_eq!(state.name(), "analyzing");
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Classify { .. }));

        let (state, effects) = transition(&ctx, state, Event::ClassifyDone(Ok(0.8)));
        assert!(effects.is_empty());
        match state {
            State::Done { verdict, .. } => {
                assert_eq!(verdict.outcome, Outcome::Positive);
                assert_eq!(verdict.confidence_text, "80.00%");
            }
            other => panic!("unexpected state: {}", other.name()),
        }
    }

    #[test]
    fn decode_failure_goes_to_failed_without_image() {
        let error = ClassifyError::DecodeFailure("garbage".to_string());
        let (state, _) = transition(&context(), State::Idle, Event::Uploaded(Err(error)));

        assert!(matches!(
            state,
            State::Failed {
                upload: None,
                error: ClassifyError::DecodeFailure(_)
            }
        ));

        // 没有图像时无法重试
        let (state, effects) = transition(&context(), state, Event::AnalyzeTriggered);
        assert_eq!(state.name(), "failed");
        assert!(effects.is_empty());
    }

    #[test]
    fn inference_failure_keeps_image_for_retry() {
        let ctx = context();
        let (state, _) = transition(&ctx, State::Ready { upload: upload() }, Event::AnalyzeTriggered);
        let (state, _) = transition(
            &ctx,
            state,
            Event::ClassifyDone(Err(ClassifyError::ModelUnavailable("missing".into()))),
        );
        assert!(matches!(
            state,
            State::Failed {
                upload: Some(_),
                error: ClassifyError::ModelUnavailable(_)
            }
        ));

        let (state, effects) = transition(&ctx, state, Event::AnalyzeTriggered);
        assert_eq!(state.name(), "analyzing");
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn invalid_probability_fails_analysis() {
        let ctx = context();
        let state = State::Analyzing { upload: upload() };
        let (state, _) = transition(&ctx, state, Event::ClassifyDone(Ok(3.5)));

        assert!(matches!(
            state,
            State::Failed {
                error: ClassifyError::Inference { .. },
                ..
            }
        ));
    }

    #[test]
    fn repeated_trigger_while_analyzing_is_ignored() {
        let (state, effects) = transition(
            &context(),
            State::Analyzing { upload: upload() },
            Event::AnalyzeTriggered,
        );
        assert_eq!(state.name(), "analyzing");
        assert!(effects.is_empty());
    }

    #[test]
    fn new_upload_resets_done_state() {
        let ctx = context();
        let (state, _) = transition(&ctx, State::Analyzing { upload: upload() }, Event::ClassifyDone(Ok(0.1)));
        assert_eq!(state.name(), "done");

        let (state, _) = transition(&ctx, state, Event::Uploaded(Ok(upload())));
        assert_eq!(state.name(), "ready");
    }
}
