//! 提交处理上下文
//!
//! 封装"我正在评估哪份试卷的哪份答卷"这一信息

use std::fmt::Display;

/// 提交处理上下文
#[derive(Debug, Clone)]
pub struct SubmissionCtx {
    /// 提交ID
    pub submission_id: String,

    /// 试卷ID
    pub paper_id: String,

    /// 批次内序号（仅用于日志显示，从1开始）
    pub index: usize,

    /// 学生姓名
    pub student_name: String,
}

impl SubmissionCtx {
    pub fn new(
        submission_id: String,
        paper_id: String,
        index: usize,
        student_name: String,
    ) -> Self {
        Self {
            submission_id,
            paper_id,
            index,
            student_name,
        }
    }
}

impl Display for SubmissionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[提交 #{} 试卷 #{} 学生 {}]",
            self.submission_id, self.paper_id, self.student_name
        )
    }
}
