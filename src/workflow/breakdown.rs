//! 成绩明细视图
//!
//! 选择题切分结果与按位置（从 1 开始）保存的答案配对

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::segmenter::segment_mcq;

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownItem {
    /// 从 1 开始的位置
    pub position: usize,
    pub question: String,
    pub options: Vec<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Breakdown {
    Structured(Vec<BreakdownItem>),
    /// 无法切分出选择题时直接展示原文
    Raw(String),
}

impl Breakdown {
    pub fn build(content: &str, answers_json: &str) -> Self {
        let questions = segment_mcq(content);
        if questions.is_empty() {
            return Breakdown::Raw(content.to_string());
        }

        let mut answers = decode_answers(answers_json);
        let items = questions
            .into_iter()
            .enumerate()
            .map(|(i, q)| BreakdownItem {
                position: i + 1,
                question: q.question,
                options: q.options,
                answer: answers.remove(&(i + 1).to_string()),
            })
            .collect();
        Breakdown::Structured(items)
    }
}

/// 解码答案表；格式不对时视为没有答案
fn decode_answers(answers_json: &str) -> HashMap<String, String> {
    let Ok(map) = serde_json::from_str::<HashMap<String, Value>>(answers_json) else {
        return HashMap::new();
    };
    map.into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Null => return None,
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect()
}

impl fmt::Display for Breakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakdown::Raw(content) => write!(f, "{}", content),
            Breakdown::Structured(items) => {
                for item in items {
                    writeln!(f, "{}", item.question)?;
                    for option in &item.options {
                        writeln!(f, "    {}", option)?;
                    }
                    match item.answer.as_deref().filter(|a| !a.trim().is_empty()) {
                        Some(answer) => writeln!(f, "  → 作答: {}", answer)?,
                        None => writeln!(f, "  → 未作答")?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAPER: &str = "1. Capital of France? a) Paris b) London 2. 2+2=? a) 3 b) 4";

    #[test]
    fn test_pairs_answers_by_position() {
        let breakdown = Breakdown::build(PAPER, r#"{"1": "a) Paris", "2": "b"}"#);
        let Breakdown::Structured(items) = breakdown else {
            panic!("expected structured breakdown");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].answer.as_deref(), Some("a) Paris"));
        assert_eq!(items[1].position, 2);
        assert_eq!(items[1].options, vec!["a) 3", "b) 4"]);
    }

    #[test]
    fn test_missing_and_malformed_answers() {
        let Breakdown::Structured(items) = Breakdown::build(PAPER, "not json") else {
            panic!("expected structured breakdown");
        };
        assert!(items.iter().all(|item| item.answer.is_none()));

        let Breakdown::Structured(items) = Breakdown::build(PAPER, r#"{"2": 4}"#) else {
            panic!("expected structured breakdown");
        };
        assert_eq!(items[0].answer, None);
        assert_eq!(items[1].answer.as_deref(), Some("4"));
    }

    #[test]
    fn test_raw_fallback() {
        let content = "Describe gravity.\nName two planets.";
        assert_eq!(Breakdown::build(content, "{}"), Breakdown::Raw(content.to_string()));
    }

    #[test]
    fn test_display() {
        let text = Breakdown::build(PAPER, r#"{"1": "a"}"#).to_string();
        assert!(text.contains("1. Capital of France?"));
        assert!(text.contains("    b) London"));
        assert!(text.contains("作答: a"));
        assert!(text.contains("未作答"));
    }
}
