//! 试卷文本切分
//!
//! 把 AI 生成（或手工录入）的自由文本试卷切分成结构化题目记录：
//!
//! - `numbered` - 按题号切分，题号风格不固定，支持多行题干和分值标注
//! - `mcq` - 按 "N. 题干 a) b) c) d)" 格式切分选择题
//!
//! 两个切分器都是纯函数，任意输入都不会报错

pub mod mcq;
pub mod numbered;

pub use mcq::{segment_mcq, McqQuestion};
pub use numbered::{segment_numbered, ParsedQuestion};
