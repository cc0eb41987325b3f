use crate::image::ImagePreprocessor;
use crate::models::ModelManager;
use crate::presenter::flow::{transition, Effect, Event, FlowContext, State};
use crate::Result;
use image::DynamicImage;
use std::collections::VecDeque;

/// 同步执行状态机：每个事件处理完毕（包括其副作用）后才返回
pub struct FlowRunner<'a> {
    models: &'a ModelManager,
    preprocessor: ImagePreprocessor,
    context: FlowContext,
}

impl<'a> FlowRunner<'a> {
    pub fn new(models: &'a ModelManager, context: FlowContext) -> Self {
        Self {
            models,
            preprocessor: ImagePreprocessor::new(context.profile.input_size),
            context,
        }
    }

    pub fn dispatch(&self, state: State, event: Event) -> State {
        let mut queue = VecDeque::from([event]);
        let mut state = state;

        while let Some(event) = queue.pop_front() {
            let from = state.name();
            let event_name = event.to_string();
            let (next, effects) = transition(&self.context, state, event);
            tracing::debug!("Flow: {} --{}--> {}", from, event_name, next.name());

            state = next;
            queue.extend(effects.into_iter().map(|effect| self.run_effect(effect)));
        }

        state
    }

    fn run_effect(&self, effect: Effect) -> Event {
        match effect {
            Effect::Classify { image } => Event::ClassifyDone(self.classify(&image)),
        }
    }

    fn classify(&self, image: &DynamicImage) -> Result<f32> {
        let model = self.models.model()?;
        let input = self.preprocessor.to_input_tensor(image);
        model.predict(input)
    }
}
