use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::de::deserialize_id;
use super::de::deserialize_opt_id;

/// 出卷模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperPattern {
    #[serde(rename = "Board Pattern")]
    BoardPattern,
    #[serde(rename = "MCQ")]
    Mcq,
    Mixed,
    Descriptive,
    Objective,
}

impl PaperPattern {
    pub fn label(self) -> &'static str {
        match self {
            PaperPattern::BoardPattern => "Board Pattern",
            PaperPattern::Mcq => "MCQ",
            PaperPattern::Mixed => "Mixed",
            PaperPattern::Descriptive => "Descriptive",
            PaperPattern::Objective => "Objective",
        }
    }

    /// 宽松解析（忽略大小写、空格和连字符）
    pub fn find(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "boardpattern" | "board" => Some(PaperPattern::BoardPattern),
            "mcq" => Some(PaperPattern::Mcq),
            "mixed" => Some(PaperPattern::Mixed),
            "descriptive" => Some(PaperPattern::Descriptive),
            "objective" => Some(PaperPattern::Objective),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaperPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 出卷参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperRequest {
    pub subject: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub total_marks: u32,
    pub difficulty: String,
    pub board: String,
    pub chapters: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub paper_pattern: PaperPattern,
}

/// 后端保存的试卷
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPaper {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub subject: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub total_marks: Option<u32>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub board: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub chapters: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl QuestionPaper {
    /// 评估时使用的满分，缺省为 100
    pub fn max_marks(&self) -> u32 {
        self.total_marks.filter(|m| *m > 0).unwrap_or(100)
    }
}

/// `POST /papers` 请求体（后端使用 snake_case）
#[derive(Debug, Clone, Serialize)]
pub struct NewQuestionPaper {
    pub subject: String,
    pub class_name: String,
    pub total_marks: u32,
    pub difficulty: String,
    pub board: String,
    pub content: String,
    pub chapters: Vec<String>,
    pub created_by: String,
}

impl NewQuestionPaper {
    pub fn from_request(request: &PaperRequest, content: String, created_by: impl Into<String>) -> Self {
        Self {
            subject: request.subject.clone(),
            class_name: request.class_name.clone(),
            total_marks: request.total_marks,
            difficulty: request.difficulty.clone(),
            board: request.board.clone(),
            content,
            chapters: request.chapters.clone(),
            created_by: created_by.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_request_wire_format() {
        let request = PaperRequest {
            subject: "Physics".to_string(),
            class_name: "10".to_string(),
            total_marks: 40,
            difficulty: "Medium".to_string(),
            board: "CBSE".to_string(),
            chapters: vec!["Motion".to_string()],
            specific_topic: None,
            instructions: Some("No calculators".to_string()),
            paper_pattern: PaperPattern::BoardPattern,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["class"], "10");
        assert_eq!(json["totalMarks"], 40);
        assert_eq!(json["paperPattern"], "Board Pattern");
        assert!(json.get("specificTopic").is_none());
    }

    #[test]
    fn test_question_paper_from_backend() {
        let json = r#"{
            "id": 7, "subject": "Biology", "class": "9", "totalMarks": 20,
            "difficulty": "Easy", "board": "ICSE", "content": "1. Cell?",
            "chapters": null, "createdBy": 3, "createdAt": "2024-05-01T10:20:30.123456"
        }"#;
        let paper: QuestionPaper = serde_json::from_str(json).unwrap();
        assert_eq!(paper.id, "7");
        assert_eq!(paper.created_by.as_deref(), Some("3"));
        assert!(paper.chapters.is_none());
        assert!(paper.created_at.is_some());
        assert_eq!(paper.max_marks(), 20);
    }

    #[test]
    fn test_max_marks_default() {
        let paper: QuestionPaper =
            serde_json::from_str(r#"{"id": "1", "subject": "Math", "class": "8", "totalMarks": null}"#).unwrap();
        assert_eq!(paper.max_marks(), 100);
    }

    #[test]
    fn test_pattern_find() {
        assert_eq!(PaperPattern::find("board pattern"), Some(PaperPattern::BoardPattern));
        assert_eq!(PaperPattern::find("mcq"), Some(PaperPattern::Mcq));
        assert_eq!(PaperPattern::find("essay"), None);
    }
}
