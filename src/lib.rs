//! # ExamSpark
//!
//! 出卷、答题、评估与成绩统计的客户端核心库
//!
//! ## 架构设计
//!
//! ### ① 纯计算层
//! - `segmenter/` - 把试卷正文切分成题目（编号题 / 选择题）
//! - `services/analytics` - 教师看板与学生学科表现统计
//!
//! ### ② 能力层（Clients / Services）
//! - `ApiClient` - 后端 REST 接口
//! - `LlmService` - 直接调用大模型出卷和评分
//! - `SessionStore` - 本地会话持久化
//!
//! ### ③ 流程层（Workflow）
//! - `AnswerSheet` - 答题卡，生成提交请求
//! - `Breakdown` - 逐题成绩明细
//! - `EvaluationFlow` - 单份答卷：评估 → 回写
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_evaluator` - 并发批量评估

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod segmenter;
pub mod services;
pub mod session;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::ApiClient;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use segmenter::{segment_mcq, segment_numbered, McqQuestion, ParsedQuestion};
pub use session::{Session, SessionStore};
