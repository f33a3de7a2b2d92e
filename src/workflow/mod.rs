pub mod answer_sheet;
pub mod breakdown;
pub mod evaluation_flow;
pub mod submission_ctx;

pub use answer_sheet::AnswerSheet;
pub use breakdown::{Breakdown, BreakdownItem};
pub use evaluation_flow::{EvaluationFlow, Evaluator};
pub use submission_ctx::SubmissionCtx;
