//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! batch_evaluator (处理 Vec<StudentSubmission>)
//!     ↓
//! workflow::EvaluationFlow (处理单份答卷)
//!     ↓
//! clients / services (能力层：后端 API / LLM)
//! ```
//!
//! 编排层只做调度和统计，不做具体业务判断

pub mod batch_evaluator;

pub use batch_evaluator::{run_guarded, select_pending, BatchEvaluator, BatchStats, EvalOutcome};
