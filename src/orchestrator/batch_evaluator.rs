//! 批量评估器 - 编排层
//!
//! ## 职责
//!
//! 1. **批量加载**：拉取试卷和提交列表，挑出待评估的答卷
//! 2. **并发控制**：使用 Semaphore 限制同时评估的数量
//! 3. **向下委托**：单份答卷交给 `EvaluationFlow`
//! 4. **全局统计**：汇总成功 / 失败数量
//!
//! 任一答卷报告会话过期时关闭 Semaphore：排队中的答卷不再发请求，
//! 整批以 `SessionError::Expired` 结束

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::clients::ApiClient;
use crate::config::Config;
use crate::error::{AppResult, SessionError};
use crate::models::{QuestionPaper, StudentSubmission};
use crate::session::Session;
use crate::utils::logging::{log_batch_start, print_final_stats};
use crate::workflow::{EvaluationFlow, Evaluator, SubmissionCtx};

/// 批量评估统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub failed: usize,
    /// 会话过期后未执行的答卷
    pub cancelled: usize,
    pub total: usize,
    pub session_expired: bool,
}

impl BatchStats {
    /// 汇总每份答卷的结果
    pub fn tally(outcomes: impl IntoIterator<Item = EvalOutcome>) -> Self {
        let mut stats = BatchStats::default();
        for outcome in outcomes {
            stats.total += 1;
            match outcome {
                EvalOutcome::Evaluated => stats.success += 1,
                EvalOutcome::Failed(_) => stats.failed += 1,
                EvalOutcome::Expired => {
                    stats.failed += 1;
                    stats.session_expired = true;
                }
                EvalOutcome::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// 会话过期时整批失败
    pub fn into_result(self) -> AppResult<Self> {
        if self.session_expired {
            return Err(SessionError::Expired.into());
        }
        Ok(self)
    }
}

/// 单份答卷的评估结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalOutcome {
    Evaluated,
    Failed(String),
    /// 会话过期，触发整批停止
    Expired,
    /// Semaphore 已关闭，没有执行
    Cancelled,
}

/// 拿到许可后执行 `task`
///
/// Semaphore 已关闭时不执行直接返回 `Cancelled`；`task` 报告会话过期时关闭 Semaphore
pub async fn run_guarded<F, T>(semaphore: Arc<Semaphore>, task: F) -> EvalOutcome
where
    F: Future<Output = AppResult<T>>,
{
    let Ok(_permit) = semaphore.clone().acquire_owned().await else {
        return EvalOutcome::Cancelled;
    };

    match task.await {
        Ok(_) => EvalOutcome::Evaluated,
        Err(e) if e.is_session_expired() => {
            semaphore.close();
            EvalOutcome::Expired
        }
        Err(e) => EvalOutcome::Failed(e.to_string()),
    }
}

/// 批量评估器
pub struct BatchEvaluator {
    api: ApiClient,
    flow: Arc<EvaluationFlow>,
    max_concurrent: usize,
}

impl BatchEvaluator {
    pub fn new(config: &Config, api: ApiClient, evaluator: Evaluator) -> Self {
        Self {
            flow: Arc::new(EvaluationFlow::new(api.clone(), evaluator)),
            api,
            max_concurrent: config.max_concurrent_evaluations.max(1),
        }
    }

    /// 评估所有待评估答卷；`paper_filter` 限定某份试卷
    pub async fn run(&self, session: &Session, paper_filter: Option<&str>) -> AppResult<BatchStats> {
        info!("\n📁 正在加载试卷和提交...");
        let papers = self.api.list_papers(session).await?;
        let submissions = self.api.list_submissions(session).await?;

        let pending = select_pending(submissions, &papers, paper_filter);
        if pending.is_empty() {
            warn!("⚠️ 没有待评估的答卷");
            return Ok(BatchStats::default());
        }

        log_batch_start(pending.len(), self.max_concurrent);
        let stats = self.evaluate_all(session, pending).await;
        print_final_stats(stats.success, stats.failed, stats.total);
        if stats.cancelled > 0 {
            warn!("⏹️ 会话过期，{} 份答卷未评估", stats.cancelled);
        }

        stats.into_result()
    }

    async fn evaluate_all(
        &self,
        session: &Session,
        pending: Vec<(StudentSubmission, QuestionPaper)>,
    ) -> BatchStats {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));

        let handles: Vec<_> = pending
            .into_iter()
            .enumerate()
            .map(|(idx, (submission, paper))| {
                let ctx = SubmissionCtx::new(
                    submission.id.clone(),
                    paper.id.clone(),
                    idx + 1,
                    submission.student_name.clone(),
                );
                let semaphore = semaphore.clone();
                let flow = self.flow.clone();
                let session = session.clone();

                tokio::spawn(async move {
                    let outcome =
                        run_guarded(semaphore, flow.run(&session, &paper, &submission, &ctx)).await;
                    match &outcome {
                        EvalOutcome::Failed(e) => error!("[答卷 {}] ❌ 评估失败: {}", ctx.index, e),
                        EvalOutcome::Expired => warn!("[答卷 {}] 🔒 会话已过期，停止剩余评估", ctx.index),
                        _ => {}
                    }
                    outcome
                })
            })
            .collect();

        let outcomes = join_all(handles).await.into_iter().map(|joined| {
            joined.unwrap_or_else(|e| {
                error!("评估任务执行失败: {}", e);
                EvalOutcome::Failed(e.to_string())
            })
        });

        BatchStats::tally(outcomes)
    }
}

/// 挑出待评估的答卷并配对试卷
///
/// 找不到试卷的答卷会被跳过
pub fn select_pending(
    submissions: Vec<StudentSubmission>,
    papers: &[QuestionPaper],
    paper_filter: Option<&str>,
) -> Vec<(StudentSubmission, QuestionPaper)> {
    let by_id: HashMap<&str, &QuestionPaper> = papers.iter().map(|p| (p.id.as_str(), p)).collect();

    submissions
        .into_iter()
        .filter(|s| !s.evaluated)
        .filter(|s| paper_filter.map_or(true, |id| s.question_paper_id == id))
        .filter_map(|s| match by_id.get(s.question_paper_id.as_str()) {
            Some(paper) => Some((s, (*paper).clone())),
            None => {
                warn!("⚠️ 提交 {} 对应的试卷 {} 不存在，跳过", s.id, s.question_paper_id);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ValidationError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn paper(id: &str) -> QuestionPaper {
        serde_json::from_value(serde_json::json!({
            "id": id, "subject": "Math", "class": "8", "content": "1. A?"
        }))
        .unwrap()
    }

    fn submission(id: &str, paper_id: &str, evaluated: bool) -> StudentSubmission {
        serde_json::from_value(serde_json::json!({
            "id": id, "questionPaperId": paper_id, "studentId": "1", "evaluated": evaluated
        }))
        .unwrap()
    }

    #[test]
    fn test_select_pending_skips_evaluated_and_orphans() {
        let papers = vec![paper("1"), paper("2")];
        let submissions = vec![
            submission("10", "1", false),
            submission("11", "1", true),
            submission("12", "2", false),
            submission("13", "99", false),
        ];

        let pending = select_pending(submissions, &papers, None);
        let ids: Vec<&str> = pending.iter().map(|(s, _)| s.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "12"]);
        assert_eq!(pending[1].1.id, "2");
    }

    #[test]
    fn test_tally_counts_outcomes() {
        let stats = BatchStats::tally(vec![
            EvalOutcome::Evaluated,
            EvalOutcome::Failed("timeout".to_string()),
            EvalOutcome::Evaluated,
        ]);
        assert_eq!(stats.success, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total, 3);
        assert!(stats.into_result().is_ok());
    }

    #[test]
    fn test_tally_with_expiry_fails_batch() {
        let stats = BatchStats::tally(vec![
            EvalOutcome::Evaluated,
            EvalOutcome::Expired,
            EvalOutcome::Cancelled,
            EvalOutcome::Cancelled,
        ]);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.cancelled, 2);

        let err = stats.into_result().unwrap_err();
        assert!(err.is_session_expired());
    }

    #[tokio::test]
    async fn test_expiry_cancels_queued_tasks() {
        let semaphore = Arc::new(Semaphore::new(1));
        let started = Arc::new(AtomicUsize::new(0));

        let expired = run_guarded(semaphore.clone(), async {
            Err::<(), AppError>(SessionError::Expired.into())
        })
        .await;
        assert_eq!(expired, EvalOutcome::Expired);

        let counter = started.clone();
        let queued = run_guarded(semaphore.clone(), async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<(), AppError>(())
        })
        .await;
        assert_eq!(queued, EvalOutcome::Cancelled);
        assert_eq!(started.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_errors_keep_batch_running() {
        let semaphore = Arc::new(Semaphore::new(2));

        let failed = run_guarded(semaphore.clone(), async {
            Err::<(), AppError>(ValidationError::EmptySubmission.into())
        })
        .await;
        assert!(matches!(failed, EvalOutcome::Failed(_)));

        let next = run_guarded(semaphore, async { Ok::<u8, AppError>(1) }).await;
        assert_eq!(next, EvalOutcome::Evaluated);
    }

    #[test]
    fn test_select_pending_with_filter() {
        let papers = vec![paper("1"), paper("2")];
        let submissions = vec![submission("10", "1", false), submission("12", "2", false)];

        let pending = select_pending(submissions, &papers, Some("2"));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0.id, "12");
    }
}
