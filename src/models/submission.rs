use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{deserialize_id, deserialize_percentage, deserialize_text};
use super::grade::Grade;

/// AI 评估结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    #[serde(default, deserialize_with = "deserialize_percentage")]
    pub percentage: f64,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub grade: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub feedback: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub score_breakdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluated_at: Option<DateTime<Utc>>,
}

impl Evaluation {
    /// 模型返回无法解析时使用的默认评估
    pub fn fallback() -> Self {
        Self {
            percentage: 75.0,
            grade: Grade::BPlus.as_str().to_string(),
            feedback: "Answer evaluated. Please check the detailed response for specific feedback."
                .to_string(),
            score_breakdown: "Partial marks awarded based on content accuracy and completeness."
                .to_string(),
            evaluated_at: None,
        }
    }

    /// 标记评估时间
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.evaluated_at = Some(at);
        self
    }

    /// 等级：优先使用模型给出的等级，无法识别时按百分比换算
    pub fn letter_grade(&self) -> Grade {
        Grade::from_str(&self.grade).unwrap_or_else(|| Grade::from_percentage(self.percentage))
    }
}

/// 学生提交
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmission {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub question_paper_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    /// JSON 编码的答案表
    #[serde(default)]
    pub answers: String,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub evaluated: bool,
    #[serde(default)]
    pub evaluation: Option<Evaluation>,
}

impl StudentSubmission {
    /// 已评估且带有评估结果时返回分数
    pub fn score(&self) -> Option<f64> {
        if !self.evaluated {
            return None;
        }
        self.evaluation
            .as_ref()
            .map(|e| e.percentage)
            .filter(|p| p.is_finite())
    }

    /// 看板口径的分数：已评估但评估结果缺失或无法识别时记 0 分
    pub fn dashboard_score(&self) -> Option<f64> {
        self.evaluated.then(|| self.score().unwrap_or(0.0))
    }
}

/// `POST /submissions` 请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubmission {
    pub question_paper_id: String,
    pub student_id: String,
    pub student_name: String,
    pub answers: String,
}

/// `POST /evaluate-submission` 请求体
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub question: String,
    pub student_answer: String,
    pub max_marks: u32,
}

/// `PATCH /submissions/:id` 请求体
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationUpdate {
    pub evaluation: Evaluation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_from_backend() {
        let json = r#"{
            "id": 4, "questionPaperId": 7, "studentId": "12", "studentName": "Sam",
            "answers": "{\"1\":\"Paris\"}", "submittedAt": "2024-05-02T08:00:00",
            "evaluated": true,
            "evaluation": {"percentage": 82.5, "grade": "A", "feedback": "Good",
                           "scoreBreakdown": "Q1 full", "evaluatedAt": "2024-05-03T09:00:00.000Z"}
        }"#;
        let submission: StudentSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.question_paper_id, "7");
        assert_eq!(submission.student_id, "12");
        assert_eq!(submission.score(), Some(82.5));
        assert!(submission.evaluation.unwrap().evaluated_at.is_some());
    }

    #[test]
    fn test_pending_submission_has_no_score() {
        let json = r#"{"id": 1, "questionPaperId": 1, "studentId": 1, "evaluated": false, "evaluation": null}"#;
        let submission: StudentSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.score(), None);
    }

    #[test]
    fn test_loose_evaluation_payloads() {
        let json = r#"[
            {"id": 1, "questionPaperId": 1, "studentId": 1, "evaluated": true,
             "evaluation": {"percentage": "85", "grade": "A", "scoreBreakdown": {"q1": 5}}},
            {"id": 2, "questionPaperId": 1, "studentId": 1, "evaluated": true,
             "evaluation": {"percentage": "72.5%", "feedback": null}},
            {"id": 3, "questionPaperId": 1, "studentId": 1, "evaluated": true,
             "evaluation": {"percentage": null, "grade": null}}
        ]"#;
        let submissions: Vec<StudentSubmission> = serde_json::from_str(json).unwrap();

        assert_eq!(submissions[0].score(), Some(85.0));
        let breakdown = &submissions[0].evaluation.as_ref().unwrap().score_breakdown;
        assert_eq!(breakdown, r#"{"q1":5}"#);

        assert_eq!(submissions[1].score(), Some(72.5));
        assert_eq!(submissions[1].evaluation.as_ref().unwrap().feedback, "");

        assert_eq!(submissions[2].score(), None);
        assert_eq!(submissions[2].dashboard_score(), Some(0.0));
        assert_eq!(submissions[2].evaluation.as_ref().unwrap().grade, "");
    }

    #[test]
    fn test_dashboard_score() {
        let evaluated_without_result: StudentSubmission = serde_json::from_str(
            r#"{"id": 1, "questionPaperId": 1, "studentId": 1, "evaluated": true, "evaluation": null}"#,
        )
        .unwrap();
        assert_eq!(evaluated_without_result.score(), None);
        assert_eq!(evaluated_without_result.dashboard_score(), Some(0.0));

        let pending: StudentSubmission =
            serde_json::from_str(r#"{"id": 2, "questionPaperId": 1, "studentId": 1}"#).unwrap();
        assert_eq!(pending.dashboard_score(), None);
    }

    #[test]
    fn test_letter_grade_falls_back_to_percentage() {
        let mut evaluation = Evaluation::fallback();
        assert_eq!(evaluation.letter_grade(), Grade::BPlus);
        evaluation.grade = "excellent".to_string();
        evaluation.percentage = 91.0;
        assert_eq!(evaluation.letter_grade(), Grade::APlus);
    }

    #[test]
    fn test_evaluate_request_wire_format() {
        let body = serde_json::to_value(EvaluateRequest {
            question: "1. Q".to_string(),
            student_answer: "{}".to_string(),
            max_marks: 50,
        })
        .unwrap();
        assert_eq!(body["studentAnswer"], "{}");
        assert_eq!(body["maxMarks"], 50);
    }
}
