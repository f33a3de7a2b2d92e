//! LLM 服务 - 业务能力层
//!
//! 直接调用大模型出卷、评卷，不经过后端代理
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};
use crate::models::de::{percentage_of, text_of};
use crate::models::{Evaluation, Grade, PaperRequest, QuestionPaper};

/// 回复中第一个 `{` 到最后一个 `}`
static JSON_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("JSON正则无效"));

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 2048;
const EVALUATION_TEMPERATURE: f32 = 0.3;
const EVALUATION_MAX_TOKENS: u32 = 1024;

/// LLM 服务
///
/// 职责：
/// - 按出卷参数生成试卷正文
/// - 评估学生答案，输出百分比、等级和反馈
/// - 提供通用的 LLM 调用接口
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    /// - `temperature`: 采样温度
    /// - `max_tokens`: 最大输出长度
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（已去除首尾空白）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
        temperature: f32,
        max_tokens: u32,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let build_err = |e: async_openai::error::OpenAIError| LlmError::RequestBuild(e.to_string());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(build_err)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(build_err)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
            .map_err(build_err)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            AppError::llm_api_failed(&self.model_name, e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }

    /// 生成试卷（markdown 正文）
    pub async fn generate_paper(&self, params: &PaperRequest) -> AppResult<String> {
        let prompt = build_generation_prompt(params);
        self.send_to_llm(&prompt, None, GENERATION_TEMPERATURE, GENERATION_MAX_TOKENS)
            .await
    }

    /// 评估单个答案
    ///
    /// 模型回复无法解析时返回默认评估，不视为错误
    pub async fn evaluate_answer(
        &self,
        question: &str,
        expected_answer: &str,
        student_answer: &str,
        max_marks: u32,
    ) -> AppResult<Evaluation> {
        let prompt = build_evaluation_prompt(question, expected_answer, student_answer, max_marks);
        let response = self
            .send_to_llm(&prompt, None, EVALUATION_TEMPERATURE, EVALUATION_MAX_TOKENS)
            .await?;
        Ok(parse_evaluation(&response))
    }

    /// 把整份试卷当作一道题评估（没有参考答案）
    pub async fn evaluate_paper(&self, paper: &QuestionPaper, answers: &str) -> AppResult<Evaluation> {
        self.evaluate_answer(&paper.content, "N/A", answers, paper.max_marks())
            .await
    }
}

/// 构建出卷提示词
pub fn build_generation_prompt(params: &PaperRequest) -> String {
    let topic = params
        .specific_topic
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!("Specific Topic: {}\n", t))
        .unwrap_or_default();
    let instructions = params
        .instructions
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| format!("Special Instructions: {}\n", t))
        .unwrap_or_default();

    format!(
        r#"Generate a comprehensive question paper with the following specifications:

Subject: {subject}
Class: {class}
Total Marks: {marks}
Difficulty Level: {difficulty}
Board: {board}
Chapters: {chapters}
{topic}{instructions}Paper Pattern: {pattern}

Please create a well-structured question paper in markdown format with:
1. Header with subject, class, time duration, and marks
2. Clear instructions for students
3. Questions divided by marks (1, 2, 3, 5, 10 marks etc.)
4. Proper numbering and formatting
5. Include a mix of question types based on the pattern specified

Make sure the total marks add up to exactly {marks} marks."#,
        subject = params.subject,
        class = params.class_name,
        marks = params.total_marks,
        difficulty = params.difficulty,
        board = params.board,
        chapters = params.chapters.join(", "),
        topic = topic,
        instructions = instructions,
        pattern = params.paper_pattern,
    )
}

/// 构建评卷提示词
pub fn build_evaluation_prompt(
    question: &str,
    expected_answer: &str,
    student_answer: &str,
    max_marks: u32,
) -> String {
    format!(
        r#"Please evaluate the following student response carefully:

Question: {question}
Model/Expected Answer: {expected_answer}
Student Answer: {student_answer}
Maximum Marks: {max_marks}

Please provide a detailed evaluation in the following JSON format:
{{
  "percentage": [percentage score out of 100],
  "grade": "[A+/A/B+/B/C+/C/D/F based on percentage]",
  "feedback": "[detailed constructive feedback explaining what was correct, what was missing, and suggestions for improvement]",
  "scoreBreakdown": "[breakdown of marks awarded for different aspects of the answer]"
}}

Grading scale:
90-100%: A+
80-89%: A
70-79%: B+
60-69%: B
50-59%: C+
40-49%: C
30-39%: D
Below 30%: F

Be fair but constructive in your evaluation."#
    )
}

/// 解析模型返回的评估 JSON
///
/// 取回复中的 `{...}` 片段解析；百分比缺失或无法解析时返回 `Evaluation::fallback()`。
/// 百分比允许是数字或 "85%" 这样的字符串，结果限制在 0-100。
pub fn parse_evaluation(response: &str) -> Evaluation {
    let parsed = JSON_SPAN
        .find(response)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    let Some(value) = parsed else {
        warn!("无法从 LLM 响应中提取评估 JSON，使用默认评估");
        return Evaluation::fallback();
    };

    let Some(percentage) = value.get("percentage").and_then(percentage_of) else {
        warn!("评估 JSON 缺少有效的 percentage，使用默认评估");
        return Evaluation::fallback();
    };
    let percentage = percentage.clamp(0.0, 100.0);

    let grade = value
        .get("grade")
        .and_then(Value::as_str)
        .and_then(Grade::from_str)
        .unwrap_or_else(|| Grade::from_percentage(percentage));

    Evaluation {
        percentage,
        grade: grade.as_str().to_string(),
        feedback: text_of(value.get("feedback")),
        score_breakdown: text_of(value.get("scoreBreakdown")),
        evaluated_at: None,
    }
}
