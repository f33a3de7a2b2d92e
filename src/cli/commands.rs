//! 子命令与参数定义
//!
//! 这里只描述命令行长什么样，具体执行在 `cli/mod.rs`

use std::path::PathBuf;

use clap::{Args, Subcommand};
use exam_spark::models::{PaperPattern, PaperRequest, Role};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 登录并保存会话
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// 注册新账号并保存会话
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
        /// teacher 或 student
        #[arg(long, default_value = "student", value_parser = parse_role)]
        role: Role,
    },

    /// 清除本地会话
    Logout,

    /// 生成试卷（教师）
    Generate(GenerateArgs),

    /// 试卷管理
    #[command(subcommand)]
    Papers(PaperCommands),

    /// 切分本地试卷文件中的题目
    Segment {
        /// `.toml`、`.txt` 或 `.md` 试卷文件
        file: PathBuf,
        /// 按选择题格式切分
        #[arg(long)]
        mcq: bool,
        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },

    /// 提交答卷（学生）
    Submit(SubmitArgs),

    /// 列出提交记录
    Submissions {
        /// 只看某份试卷
        #[arg(long)]
        paper: Option<String>,
    },

    /// 批量评估未评估的提交（教师）
    Evaluate {
        /// 只评估某份试卷的提交
        #[arg(long)]
        paper: Option<String>,
        /// 本地直接调用大模型，而不是走后端评估接口
        #[arg(long)]
        direct: bool,
    },

    /// 查看某次提交的逐题明细
    Breakdown {
        submission_id: String,
    },

    /// 成绩统计：教师看板或学生学科表现
    Stats {
        /// 输出 JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PaperCommands {
    /// 列出所有试卷
    List,
    /// 显示试卷正文
    Show { paper_id: String },
    /// 删除试卷
    Delete { paper_id: String },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long)]
    pub subject: String,
    #[arg(long = "class")]
    pub class_name: String,
    #[arg(long, default_value_t = 100)]
    pub total_marks: u32,
    #[arg(long, default_value = "Medium")]
    pub difficulty: String,
    #[arg(long, default_value = "CBSE")]
    pub board: String,
    /// 逗号分隔的章节列表
    #[arg(long, value_delimiter = ',', required = true)]
    pub chapters: Vec<String>,
    #[arg(long)]
    pub topic: Option<String>,
    #[arg(long)]
    pub instructions: Option<String>,
    #[arg(long, default_value = "Board Pattern", value_parser = parse_pattern)]
    pub pattern: PaperPattern,
    /// 本地直接调用大模型
    #[arg(long)]
    pub direct: bool,
    /// 生成后保存到后端
    #[arg(long)]
    pub save: bool,
}

impl From<&GenerateArgs> for PaperRequest {
    fn from(a: &GenerateArgs) -> Self {
        PaperRequest {
            subject: a.subject.clone(),
            class_name: a.class_name.clone(),
            total_marks: a.total_marks,
            difficulty: a.difficulty.clone(),
            board: a.board.clone(),
            chapters: a
                .chapters
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            specific_topic: a.topic.clone(),
            instructions: a.instructions.clone(),
            paper_pattern: a.pattern,
        }
    }
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    pub paper_id: String,
    /// 形如 `3=答案` 的作答，可重复
    #[arg(long = "answer", short = 'a', value_parser = parse_answer)]
    pub answers: Vec<(String, String)>,
    /// JSON 答案表文件 `{"1": "...", "2": "..."}`
    #[arg(long)]
    pub answers_file: Option<PathBuf>,
}

fn parse_role(s: &str) -> Result<Role, String> {
    match s.trim().to_lowercase().as_str() {
        "teacher" => Ok(Role::Teacher),
        "student" => Ok(Role::Student),
        other => Err(format!("未知角色: {other}（可选 teacher / student）")),
    }
}

fn parse_pattern(s: &str) -> Result<PaperPattern, String> {
    PaperPattern::find(s).ok_or_else(|| format!("未知出卷模式: {s}"))
}

fn parse_answer(s: &str) -> Result<(String, String), String> {
    let (number, text) = s
        .split_once('=')
        .ok_or_else(|| format!("作答格式应为 题号=答案: {s}"))?;
    Ok((number.trim().to_string(), text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(
            parse_answer("3=x = 2").unwrap(),
            ("3".to_string(), "x = 2".to_string())
        );
        assert!(parse_answer("no separator").is_err());
    }

    #[test]
    fn test_parse_role_and_pattern() {
        assert_eq!(parse_role("Teacher").unwrap(), Role::Teacher);
        assert!(parse_role("admin").is_err());
        assert_eq!(parse_pattern("mcq").unwrap(), PaperPattern::Mcq);
    }
}
