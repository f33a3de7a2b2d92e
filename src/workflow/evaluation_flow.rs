//! 答卷评估流程 - 流程层
//!
//! 核心职责：定义"一份答卷"的完整评估流程
//!
//! 流程顺序：
//! 1. 评估（后端代理或直接调用大模型）
//! 2. 写入评估时间
//! 3. PATCH 回后端

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::clients::ApiClient;
use crate::error::AppResult;
use crate::models::{EvaluateRequest, Evaluation, QuestionPaper, StudentSubmission};
use crate::services::LlmService;
use crate::session::Session;
use crate::utils::truncate_text;
use crate::workflow::submission_ctx::SubmissionCtx;

/// 评估方式
#[derive(Clone)]
pub enum Evaluator {
    /// 调用后端 `/evaluate-submission`
    Backend,
    /// 本地直接调用大模型
    Direct(Arc<LlmService>),
}

/// 答卷评估流程
///
/// - 不持有会话，由调用方传入
/// - 只处理单份答卷
#[derive(Clone)]
pub struct EvaluationFlow {
    api: ApiClient,
    evaluator: Evaluator,
}

impl EvaluationFlow {
    pub fn new(api: ApiClient, evaluator: Evaluator) -> Self {
        Self { api, evaluator }
    }

    pub async fn run(
        &self,
        session: &Session,
        paper: &QuestionPaper,
        submission: &StudentSubmission,
        ctx: &SubmissionCtx,
    ) -> AppResult<Evaluation> {
        info!("[答卷 {}] {} 开始评估", ctx.index, ctx);
        debug!(
            "[答卷 {}] 答案: {}",
            ctx.index,
            truncate_text(&submission.answers, 80)
        );

        let evaluation = match &self.evaluator {
            Evaluator::Backend => {
                let request = EvaluateRequest {
                    question: paper.content.clone(),
                    student_answer: submission.answers.clone(),
                    max_marks: paper.max_marks(),
                };
                self.api.evaluate_submission(session, &request).await?
            }
            Evaluator::Direct(llm) => llm.evaluate_paper(paper, &submission.answers).await?,
        };

        let evaluation = evaluation.stamped(Utc::now());

        self.api
            .update_submission_evaluation(session, &ctx.submission_id, evaluation.clone())
            .await?;

        info!(
            "[答卷 {}] ✓ 评估完成: {:.1}% ({})",
            ctx.index, evaluation.percentage, evaluation.grade
        );

        Ok(evaluation)
    }
}
