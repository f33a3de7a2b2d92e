//! 成绩统计服务
//!
//! 纯计算，不做任何网络请求：输入试卷和提交列表，输出看板统计和学科表现

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{QuestionPaper, StudentSubmission};

/// 单份试卷的提交汇总
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperSummary {
    pub paper_id: String,
    pub subject: String,
    pub evaluated: usize,
    pub pending: usize,
    /// 已评估提交的平均分（四舍五入），没有已评估提交时为 `None`
    pub average: Option<u32>,
}

/// 教师看板统计
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub papers_created: usize,
    pub total_submissions: usize,
    pub evaluated_submissions: usize,
    pub average_score: u32,
    pub papers: Vec<PaperSummary>,
}

impl DashboardStats {
    pub fn compute(papers: &[QuestionPaper], submissions: &[StudentSubmission]) -> Self {
        let mut by_paper: HashMap<&str, Vec<&StudentSubmission>> = HashMap::new();
        for submission in submissions {
            by_paper
                .entry(submission.question_paper_id.as_str())
                .or_default()
                .push(submission);
        }

        // 已评估的提交都计入，缺失的评估结果记 0 分
        let paper_means: Vec<Option<f64>> = papers
            .iter()
            .map(|paper| {
                let scores: Vec<f64> = by_paper
                    .get(paper.id.as_str())
                    .into_iter()
                    .flatten()
                    .filter_map(|s| s.dashboard_score())
                    .collect();
                mean(&scores)
            })
            .collect();

        let summaries: Vec<PaperSummary> = papers
            .iter()
            .zip(&paper_means)
            .map(|(paper, paper_mean)| {
                let subs = by_paper.get(paper.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                PaperSummary {
                    paper_id: paper.id.clone(),
                    subject: paper.subject.clone(),
                    evaluated: subs.iter().filter(|s| s.evaluated).count(),
                    pending: subs.iter().filter(|s| !s.evaluated).count(),
                    average: paper_mean.map(round_score),
                }
            })
            .collect();

        // 各试卷平均分的平均值，而非所有提交的平均值
        let overall: Vec<f64> = paper_means.into_iter().flatten().collect();

        Self {
            papers_created: papers.len(),
            total_submissions: submissions.len(),
            evaluated_submissions: submissions.iter().filter(|s| s.evaluated).count(),
            average_score: mean(&overall).map(round_score).unwrap_or(0),
            papers: summaries,
        }
    }
}

/// 单个学科的成绩
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject: String,
    pub attempts: usize,
    pub average: f64,
    pub total: f64,
}

/// 成绩趋势点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDateTime,
    pub score: f64,
    pub subject: String,
}

/// 学生的学科表现
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectPerformance {
    /// 按学科名排序
    pub subjects: Vec<SubjectStats>,
    pub best_subject: Option<String>,
    pub weakest_subject: Option<String>,
    pub trend: Vec<TrendPoint>,
}

impl SubjectPerformance {
    /// 只统计已评估且能找到试卷的提交
    pub fn compute(submissions: &[StudentSubmission], papers: &[QuestionPaper]) -> Self {
        let subject_of: HashMap<&str, &str> = papers
            .iter()
            .map(|p| (p.id.as_str(), p.subject.as_str()))
            .collect();

        let mut totals: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        let mut trend = Vec::new();

        for submission in submissions {
            let Some(score) = submission.score() else {
                continue;
            };
            let Some(subject) = subject_of.get(submission.question_paper_id.as_str()) else {
                continue;
            };

            let entry = totals.entry(subject).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += score;

            let date = submission.submitted_at.or_else(|| {
                submission
                    .evaluation
                    .as_ref()
                    .and_then(|e| e.evaluated_at)
                    .map(|at| at.naive_utc())
            });
            if let Some(date) = date {
                trend.push(TrendPoint {
                    date,
                    score,
                    subject: subject.to_string(),
                });
            }
        }

        trend.sort_by_key(|p| p.date);

        let subjects: Vec<SubjectStats> = totals
            .into_iter()
            .map(|(subject, (attempts, total))| SubjectStats {
                subject: subject.to_string(),
                attempts,
                average: total / attempts as f64,
                total,
            })
            .collect();

        // 平均分相同时取排在前面的学科
        let best_subject = subjects
            .iter()
            .reduce(|best, s| if s.average > best.average { s } else { best })
            .map(|s| s.subject.clone());
        let weakest_subject = subjects
            .iter()
            .reduce(|weakest, s| if s.average < weakest.average { s } else { weakest })
            .map(|s| s.subject.clone());

        Self {
            subjects,
            best_subject,
            weakest_subject,
            trend,
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn round_score(value: f64) -> u32 {
    value.round().clamp(0.0, u32::MAX as f64) as u32
}
