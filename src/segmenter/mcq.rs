//! 选择题切分器
//!
//! 适用于 "N. 题干 a) 选项 b) 选项 ..." 格式的试卷，用于成绩明细视图

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 题块起点："数字. "
static BLOCK_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+\. ").expect("题块正则无效"));

/// 选项标记：a-d（不区分大小写）后接 `)`
static OPTION_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-dA-D]\)").expect("选项正则无效"));

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("空白正则无效"));

/// 一道选择题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqQuestion {
    /// 题号 + 题干
    pub question: String,
    /// 选项，每项以自己的 "x)" 标记开头；可能为空
    pub options: Vec<String>,
}

/// 把文本切成原始题块
///
/// 每块从 "数字. " 开始，到下一个 "数字. " 之前（或文本末尾）结束；
/// 第一块之前的内容丢弃。
fn raw_blocks(content: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut pos = 0;

    while let Some(start) = BLOCK_START.find_at(content, pos) {
        let end = BLOCK_START
            .find_at(content, start.end())
            .map(|next| next.start())
            .unwrap_or(content.len());
        blocks.push(&content[start.start()..end]);
        pos = end;
    }

    blocks
}

fn split_options(remainder: &str) -> Vec<String> {
    let collapsed = WHITESPACE_RUN.replace_all(remainder, " ");
    let starts: Vec<usize> = OPTION_MARKER.find_iter(&collapsed).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(collapsed.len());
            collapsed[start..end].trim()
        })
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_block(block: &str) -> McqQuestion {
    match OPTION_MARKER.find(block) {
        Some(marker) => McqQuestion {
            question: block[..marker.start()].trim().to_string(),
            options: split_options(&block[marker.start()..]),
        },
        None => McqQuestion {
            question: block.trim().to_string(),
            options: Vec::new(),
        },
    }
}

/// 切分选择题试卷
///
/// 没有任何 "数字. " 题块时返回空列表，由调用方退化为显示原文。
pub fn segment_mcq(content: &str) -> Vec<McqQuestion> {
    raw_blocks(content).into_iter().map(parse_block).collect()
}
