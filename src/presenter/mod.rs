pub mod flow;
pub mod runner;
pub mod verdict;

pub use flow::{Event, FlowContext, State as FlowState, Upload};
pub use runner::FlowRunner;
pub use verdict::{present, Outcome, Probability, Verdict, DECISION_THRESHOLD};
