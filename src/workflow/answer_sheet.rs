//! 答题卡
//!
//! 试卷正文经题号切分后，每道题对应一个以题号为键的答案

use std::collections::BTreeMap;

use crate::error::ValidationError;
use crate::models::{NewSubmission, User};
use crate::segmenter::{segment_numbered, ParsedQuestion};

#[derive(Debug, Clone)]
pub struct AnswerSheet {
    questions: Vec<ParsedQuestion>,
    answers: BTreeMap<String, String>,
}

impl AnswerSheet {
    /// 为试卷正文建立空白答题卡
    ///
    /// 重复题号共用同一个答案
    pub fn for_paper(content: &str) -> Self {
        let questions = segment_numbered(content);
        let answers = questions
            .iter()
            .map(|q| (q.number.clone(), String::new()))
            .collect();
        Self { questions, answers }
    }

    pub fn questions(&self) -> &[ParsedQuestion] {
        &self.questions
    }

    pub fn answer(&self, number: &str) -> Option<&str> {
        self.answers.get(number).map(String::as_str)
    }

    pub fn set_answer(&mut self, number: &str, text: impl Into<String>) -> Result<(), ValidationError> {
        match self.answers.get_mut(number) {
            Some(slot) => {
                *slot = text.into();
                Ok(())
            }
            None => Err(ValidationError::UnknownQuestion(number.to_string())),
        }
    }

    pub fn has_any_answer(&self) -> bool {
        self.answers.values().any(|a| !a.trim().is_empty())
    }

    /// 已作答题数
    pub fn answered_count(&self) -> usize {
        self.answers.values().filter(|a| !a.trim().is_empty()).count()
    }

    /// 生成提交请求体；全部为空时拒绝
    pub fn into_submission(self, paper_id: &str, student: &User) -> Result<NewSubmission, ValidationError> {
        if !self.has_any_answer() {
            return Err(ValidationError::EmptySubmission);
        }
        // BTreeMap<String, String> 序列化不会失败
        let answers = serde_json::to_string(&self.answers).unwrap_or_default();
        Ok(NewSubmission {
            question_paper_id: paper_id.to_string(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            answers,
        })
    }
}
