//! 命令行层
//!
//! 只负责解析参数、装配客户端、打印结果；业务逻辑全部在库里

pub mod commands;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use exam_spark::error::AppError;
use exam_spark::models::{load_paper_file, NewQuestionPaper, PaperRequest, Role};
use exam_spark::orchestrator::BatchEvaluator;
use exam_spark::segmenter::{segment_mcq, segment_numbered};
use exam_spark::services::{DashboardStats, LlmService, SubjectPerformance};
use exam_spark::session::{Session, SessionStore};
use exam_spark::utils::{logging, truncate_text};
use exam_spark::workflow::{AnswerSheet, Breakdown, Evaluator};
use exam_spark::{ApiClient, Config};

use commands::{Commands, GenerateArgs, PaperCommands, SubmitArgs};

#[derive(Parser, Debug)]
#[command(name = "exam-spark", version, about = "ExamSpark 命令行客户端：出卷、答题、评估与成绩统计")]
pub struct Cli {
    /// 后端地址
    #[arg(long, global = true, env = "EXAM_SPARK_API_URL")]
    pub api_url: Option<String>,

    /// 显示详细日志
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 一次命令执行所需的上下文
struct Ctx {
    config: Config,
    api: ApiClient,
    store: SessionStore,
}

impl Ctx {
    async fn session(&self) -> Result<Session> {
        Ok(self.store.load().await?)
    }

    fn llm(&self) -> Result<LlmService> {
        if self.config.llm_api_key.is_empty() {
            bail!("未设置 LLM_API_KEY，无法直接调用大模型");
        }
        Ok(LlmService::new(&self.config))
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::from_env();
        if let Some(url) = &self.api_url {
            config = config.with_api_url(url);
        }
        logging::init(self.verbose || config.verbose_logging);

        let ctx = Ctx {
            api: ApiClient::new(&config)?,
            store: SessionStore::new(&config.session_file),
            config,
        };

        let result = dispatch(&ctx, self.command).await;

        if let Err(err) = &result {
            let expired = err
                .downcast_ref::<AppError>()
                .is_some_and(AppError::is_session_expired);
            if expired {
                ctx.store.clear().await?;
                warn!("🔒 会话已过期，本地会话已清除，请重新执行 login");
            }
        }

        result
    }
}

async fn dispatch(ctx: &Ctx, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            let auth = ctx.api.login(&email, &password).await?;
            let session = Session::from(auth);
            ctx.store.save(&session).await?;
            println!("✅ 已登录: {} ({})", session.user.name, session.user.role);
        }
        Commands::Signup {
            email,
            password,
            name,
            role,
        } => {
            let auth = ctx.api.signup(&email, &password, &name, role).await?;
            let session = Session::from(auth);
            ctx.store.save(&session).await?;
            println!("✅ 注册成功: {} ({})", session.user.name, session.user.role);
        }
        Commands::Logout => {
            ctx.store.clear().await?;
            println!("👋 已退出登录");
        }
        Commands::Generate(args) => run_generate(ctx, &args).await?,
        Commands::Papers(sub) => run_papers(ctx, sub).await?,
        Commands::Segment { file, mcq, json } => {
            let paper = load_paper_file(&file).await?;
            if mcq {
                let questions = segment_mcq(&paper.content);
                if json {
                    println!("{}", serde_json::to_string_pretty(&questions)?);
                } else {
                    for q in &questions {
                        println!("{}", q.question);
                        for option in &q.options {
                            println!("    {}", option);
                        }
                    }
                }
            } else {
                let questions = segment_numbered(&paper.content);
                if json {
                    println!("{}", serde_json::to_string_pretty(&questions)?);
                } else {
                    for q in &questions {
                        match &q.marks {
                            Some(marks) => println!("Q{} [{} 分] {}", q.number, marks, q.text),
                            None => println!("Q{} {}", q.number, q.text),
                        }
                    }
                }
            }
        }
        Commands::Submit(args) => run_submit(ctx, args).await?,
        Commands::Submissions { paper } => {
            let session = ctx.session().await?;
            let submissions = ctx.api.list_submissions(&session).await?;
            for s in submissions
                .iter()
                .filter(|s| paper.as_deref().map_or(true, |id| s.question_paper_id == id))
            {
                let status = match s.score() {
                    Some(score) => format!("{:.1}%", score),
                    None => "待评估".to_string(),
                };
                println!(
                    "#{:<5} 试卷 #{:<5} {:<16} {}",
                    s.id, s.question_paper_id, s.student_name, status
                );
            }
        }
        Commands::Evaluate { paper, direct } => {
            let session = ctx.session().await?;
            if !session.is_teacher() {
                bail!("只有教师可以批量评估");
            }
            let evaluator = if direct {
                Evaluator::Direct(Arc::new(ctx.llm()?))
            } else {
                Evaluator::Backend
            };
            let batch = BatchEvaluator::new(&ctx.config, ctx.api.clone(), evaluator);
            let stats = batch.run(&session, paper.as_deref()).await?;
            if stats.failed > 0 {
                bail!("{} 份答卷评估失败", stats.failed);
            }
        }
        Commands::Breakdown { submission_id } => {
            let session = ctx.session().await?;
            let submissions = ctx.api.list_submissions(&session).await?;
            let submission = submissions
                .into_iter()
                .find(|s| s.id == submission_id)
                .with_context(|| format!("提交 #{} 不存在", submission_id))?;
            let paper = ctx.api.get_paper(&session, &submission.question_paper_id).await?;

            println!("📄 {} / 班级 {}", paper.subject, paper.class_name);
            if let Some(evaluation) = &submission.evaluation {
                println!(
                    "得分: {:.1}% ({})\n{}\n",
                    evaluation.percentage,
                    evaluation.letter_grade(),
                    evaluation.feedback
                );
            }
            print!("{}", Breakdown::build(&paper.content, &submission.answers));
        }
        Commands::Stats { json } => run_stats(ctx, json).await?,
    }
    Ok(())
}

async fn run_generate(ctx: &Ctx, args: &GenerateArgs) -> Result<()> {
    let session = ctx.session().await?;
    if !session.is_teacher() {
        bail!("只有教师可以生成试卷");
    }

    let request = PaperRequest::from(args);
    info!("📝 正在生成 {} 试卷 ({})...", request.subject, request.paper_pattern);

    let content = if args.direct {
        ctx.llm()?.generate_paper(&request).await?
    } else {
        ctx.api.generate_paper(&session, &request).await?
    };
    println!("{}", content);

    if args.save {
        let paper = NewQuestionPaper::from_request(&request, content, session.user.id.clone());
        let paper_id = ctx.api.create_paper(&session, &paper).await?;
        println!("\n💾 已保存为试卷 #{}", paper_id);
    }
    Ok(())
}

async fn run_papers(ctx: &Ctx, sub: PaperCommands) -> Result<()> {
    let session = ctx.session().await?;
    match sub {
        PaperCommands::List => {
            for paper in ctx.api.list_papers(&session).await? {
                println!(
                    "#{:<5} {:<12} 班级 {:<4} {:>4} 分  {}",
                    paper.id,
                    paper.subject,
                    paper.class_name,
                    paper.max_marks(),
                    truncate_text(paper.content.lines().next().unwrap_or_default(), 40)
                );
            }
        }
        PaperCommands::Show { paper_id } => {
            let paper = ctx.api.get_paper(&session, &paper_id).await?;
            println!("{} / 班级 {} / {} 分\n", paper.subject, paper.class_name, paper.max_marks());
            println!("{}", paper.content);
        }
        PaperCommands::Delete { paper_id } => {
            if !session.is_teacher() {
                bail!("只有教师可以删除试卷");
            }
            ctx.api.delete_paper(&session, &paper_id).await?;
            println!("🗑️ 已删除试卷 #{}", paper_id);
        }
    }
    Ok(())
}

async fn run_submit(ctx: &Ctx, args: SubmitArgs) -> Result<()> {
    let session = ctx.session().await?;
    let paper = ctx.api.get_paper(&session, &args.paper_id).await?;
    let mut sheet = AnswerSheet::for_paper(&paper.content);

    if let Some(path) = &args.answers_file {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("读取答案文件失败: {}", path.display()))?;
        let answers: BTreeMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("答案文件不是有效的 JSON 答案表: {}", path.display()))?;
        for (number, text) in answers {
            sheet.set_answer(&number, text)?;
        }
    }
    for (number, text) in args.answers {
        sheet.set_answer(&number, text)?;
    }

    info!(
        "✏️ 已作答 {}/{} 题",
        sheet.answered_count(),
        sheet.questions().len()
    );

    let submission = sheet.into_submission(&paper.id, &session.user)?;
    let submission_id = ctx.api.create_submission(&session, &submission).await?;
    println!("📨 已提交，提交编号 #{}", submission_id);
    Ok(())
}

async fn run_stats(ctx: &Ctx, json: bool) -> Result<()> {
    let session = ctx.session().await?;
    let papers = ctx.api.list_papers(&session).await?;
    let submissions = ctx.api.list_submissions(&session).await?;

    match session.user.role {
        Role::Teacher => {
            let stats = DashboardStats::compute(&papers, &submissions);
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            println!("试卷数: {}", stats.papers_created);
            println!("提交数: {}（已评估 {}）", stats.total_submissions, stats.evaluated_submissions);
            println!("平均分: {}%", stats.average_score);
            for p in &stats.papers {
                let average = p.average.map_or("-".to_string(), |a| format!("{a}%"));
                println!(
                    "  #{:<5} {:<12} 已评估 {:<3} 待评估 {:<3} 平均 {}",
                    p.paper_id, p.subject, p.evaluated, p.pending, average
                );
            }
        }
        Role::Student => {
            let mine: Vec<_> = submissions
                .into_iter()
                .filter(|s| s.student_id == session.user.id)
                .collect();
            let perf = SubjectPerformance::compute(&mine, &papers);
            if json {
                println!("{}", serde_json::to_string_pretty(&perf)?);
                return Ok(());
            }
            for s in &perf.subjects {
                println!("{:<12} {} 次  平均 {:.1}%", s.subject, s.attempts, s.average);
            }
            if let (Some(best), Some(weakest)) = (&perf.best_subject, &perf.weakest_subject) {
                println!("最佳学科: {}  薄弱学科: {}", best, weakest);
            }
            for point in &perf.trend {
                println!("  {}  {:<12} {:.1}%", point.date.format("%Y-%m-%d"), point.subject, point.score);
            }
        }
    }
    Ok(())
}
