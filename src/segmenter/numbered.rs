//! 题号切分器
//!
//! 逐行分类后用两个状态推进：
//!
//! ```text
//! SeekQuestionStart --题号行--> AccumulatingBody --题号行--> (输出上一题) AccumulatingBody
//!        |                              |
//!      普通行: 丢弃                   普通行: 追加到题干
//! ```
//!
//! 整份文本没有任何题号行时，退化为"每个非空行一道题"

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 题号行：可选的 "Q" / "Question"，数字，然后是 `.` `:` `)` 或空白
static QUESTION_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:Q(?:uestion)?\s*)?([0-9]+)[.:)\s]").expect("题号正则无效")
});

static MARKS_BRACKET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\[([0-9]+)\s*marks?\]").expect("分值正则无效"));

static MARKS_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(([0-9]+)\s*marks?\)").expect("分值正则无效"));

/// 切分出的单道题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuestion {
    /// 原文中的题号（不保证连续或有序）
    pub number: String,
    /// 题目全文，续行以单个空格拼接
    pub text: String,
    /// 题号行上 `[N marks]` / `(N marks)` 中的分值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<String>,
}

impl ParsedQuestion {
    fn start(number: &str, line: &str) -> Self {
        Self {
            number: number.to_string(),
            text: line.to_string(),
            marks: scan_marks(line),
        }
    }

    fn append(&mut self, line: &str) {
        self.text.push(' ');
        self.text.push_str(line);
    }
}

/// 行分类结果
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    QuestionStart { number: &'a str },
    Body,
}

enum State {
    SeekQuestionStart,
    AccumulatingBody(ParsedQuestion),
}

fn classify(line: &str) -> LineKind<'_> {
    match QUESTION_START.captures(line).and_then(|caps| caps.get(1)) {
        Some(number) => LineKind::QuestionStart {
            number: number.as_str(),
        },
        None => LineKind::Body,
    }
}

fn scan_marks(line: &str) -> Option<String> {
    MARKS_BRACKET
        .captures(line)
        .or_else(|| MARKS_PAREN.captures(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// 按题号切分试卷文本
///
/// 保持原文顺序；重复或乱序的题号原样保留，不做重编号或去重。
/// 只要存在非空行，返回结果就不为空。
pub fn segment_numbered(content: &str) -> Vec<ParsedQuestion> {
    let lines: Vec<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut questions = Vec::new();
    let mut state = State::SeekQuestionStart;

    for line in &lines {
        state = match (state, classify(line)) {
            (State::SeekQuestionStart, LineKind::QuestionStart { number }) => {
                State::AccumulatingBody(ParsedQuestion::start(number, line))
            }
            // 第一个题号之前的内容（标题、说明等）不属于任何题目
            (State::SeekQuestionStart, LineKind::Body) => State::SeekQuestionStart,
            (State::AccumulatingBody(current), LineKind::QuestionStart { number }) => {
                questions.push(current);
                State::AccumulatingBody(ParsedQuestion::start(number, line))
            }
            (State::AccumulatingBody(mut current), LineKind::Body) => {
                current.append(line);
                State::AccumulatingBody(current)
            }
        };
    }

    if let State::AccumulatingBody(current) = state {
        questions.push(current);
    }

    if questions.is_empty() {
        return fallback_per_line(&lines);
    }

    questions
}

fn fallback_per_line(lines: &[&str]) -> Vec<ParsedQuestion> {
    lines
        .iter()
        .enumerate()
        .map(|(index, line)| ParsedQuestion {
            number: (index + 1).to_string(),
            text: line.to_string(),
            marks: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(number: &str, text: &str, marks: Option<&str>) -> ParsedQuestion {
        ParsedQuestion {
            number: number.to_string(),
            text: text.to_string(),
            marks: marks.map(str::to_string),
        }
    }

    #[test]
    fn test_two_questions_with_marks() {
        let result = segment_numbered("1. What is 2+2? [2 marks]\n2. Explain photosynthesis.");
        assert_eq!(
            result,
            vec![
                q("1", "1. What is 2+2? [2 marks]", Some("2")),
                q("2", "2. Explain photosynthesis.", None),
            ]
        );
    }

    #[test]
    fn test_fallback_without_numbering() {
        let result = segment_numbered("Describe gravity.\nName two planets.");
        assert_eq!(
            result,
            vec![
                q("1", "Describe gravity.", None),
                q("2", "Name two planets.", None),
            ]
        );
    }

    #[test]
    fn test_continuation_lines_joined() {
        let result = segment_numbered("3. Explain the water\ncycle in detail.");
        assert_eq!(result, vec![q("3", "3. Explain the water cycle in detail.", None)]);
    }

    #[test]
    fn test_numbering_styles() {
        let content = "Q1: First\nQuestion 2) Second\nq 3 Third\n4. Fourth";
        let numbers: Vec<String> = segment_numbered(content)
            .into_iter()
            .map(|q| q.number)
            .collect();
        assert_eq!(numbers, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_paren_marks_and_singular_mark() {
        let result = segment_numbered("1) Define force (5 Marks)\n2. Name a gas [1 mark]");
        assert_eq!(result[0].marks.as_deref(), Some("5"));
        assert_eq!(result[1].marks.as_deref(), Some("1"));
    }

    #[test]
    fn test_marks_only_on_start_line() {
        let result = segment_numbered("1. Explain inertia.\n[4 marks]");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].text, "1. Explain inertia. [4 marks]");
        assert_eq!(result[0].marks, None);
    }

    #[test]
    fn test_blank_lines_and_preamble_dropped() {
        let content = "# Science Paper\nTime: 2 hours\n\n1. First question\n   \n\nmore of first\n2. Second";
        let result = segment_numbered(content);
        assert_eq!(
            result,
            vec![
                q("1", "1. First question more of first", None),
                q("2", "2. Second", None),
            ]
        );
    }

    #[test]
    fn test_duplicate_and_out_of_order_numbers_preserved() {
        let numbers: Vec<String> = segment_numbered("5. a\n2. b\n2. c")
            .into_iter()
            .map(|q| q.number)
            .collect();
        assert_eq!(numbers, vec!["5", "2", "2"]);
    }

    #[test]
    fn test_bare_number_line_is_not_a_start() {
        // 题号后必须跟分隔符
        let result = segment_numbered("1. Start\n42\n2. Next");
        assert_eq!(result[0].text, "1. Start 42");
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_only_ascii_digits_number_questions() {
        // 全角和阿拉伯-印度数字不算题号，走逐行兜底
        let result = segment_numbered("１. Full width\n٢. Arabic-Indic [٣ marks]");
        assert_eq!(
            result,
            vec![
                q("1", "１. Full width", None),
                q("2", "٢. Arabic-Indic [٣ marks]", None),
            ]
        );
    }

    #[test]
    fn test_crlf_input() {
        let result = segment_numbered("1. A\r\nline two\r\n2. B\r\n");
        assert_eq!(result, vec![q("1", "1. A line two", None), q("2", "2. B", None)]);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_numbered("").is_empty());
        assert!(segment_numbered(" \n\t\n").is_empty());
    }

    #[test]
    fn test_non_empty_input_never_yields_empty() {
        for input in ["x", "1", "  hello  ", "a\nb\nc", "Q\n(2 marks)"] {
            assert!(!segment_numbered(input).is_empty(), "input: {:?}", input);
        }
    }

    #[test]
    fn test_idempotent() {
        let content = "1. A [3 marks]\ncontinued\n2) B";
        assert_eq!(segment_numbered(content), segment_numbered(content));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("12: x"), LineKind::QuestionStart { number: "12" });
        assert_eq!(classify("QUESTION 7. x"), LineKind::QuestionStart { number: "7" });
        assert_eq!(classify("Answer 7. x"), LineKind::Body);
        assert_eq!(classify("7"), LineKind::Body);
    }
}
