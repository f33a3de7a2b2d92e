//! 错误类型
//!
//! 按来源分层：API / 会话 / LLM / 文件 / 配置 / 校验

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 后端 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 会话错误（未登录 / 已过期）
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 输入校验错误
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
}

/// 后端 API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 未授权（凭证无效）
    #[error("未授权 ({endpoint}): {message}")]
    Unauthorized { endpoint: String, message: String },
    /// 资源不存在
    #[error("资源不存在: {endpoint}")]
    NotFound { endpoint: String },
    /// 请求频率限制
    #[error("API请求频率限制 ({endpoint})，请稍后重试")]
    RateLimited { endpoint: String },
    /// 其他错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 会话错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 本地没有保存的会话
    #[error("尚未登录，请先执行 login")]
    NotLoggedIn,
    /// 后端报告令牌已过期
    #[error("会话已过期，请重新登录")]
    Expired,
    /// 会话文件损坏
    #[error("会话文件无法解析 ({path}): {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// 请求构建失败
    #[error("LLM请求构建失败: {0}")]
    RequestBuild(String),
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {message}")]
    ApiCallFailed { model: String, message: String },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// URL 不合法
    #[error("无效的 API 地址: {url}")]
    InvalidUrl { url: String },
    /// HTTP 客户端构建失败
    #[error("HTTP 客户端构建失败: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// 输入校验错误
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 邮箱格式不正确
    #[error("邮箱格式不正确: {0}")]
    InvalidEmail(String),
    /// 必填字段为空
    #[error("字段 {0} 不能为空")]
    MissingField(&'static str),
    /// 所有答案均为空
    #[error("提交前请至少回答一道题目")]
    EmptySubmission,
    /// 题号不存在于答题卡中
    #[error("答题卡中不存在题号 {0}")]
    UnknownQuestion(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(model: impl Into<String>, message: impl std::fmt::Display) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            message: message.to_string(),
        })
    }

    /// 是否为会话过期
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AppError::Session(SessionError::Expired))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_detection() {
        let err: AppError = SessionError::Expired.into();
        assert!(err.is_session_expired());

        let err: AppError = ValidationError::EmptySubmission.into();
        assert!(!err.is_session_expired());
    }

    #[test]
    fn test_display_includes_context() {
        let err: AppError = ApiError::BadResponse {
            endpoint: "/papers".to_string(),
            status: 422,
            message: Some("bad".to_string()),
        }
        .into();
        let text = err.to_string();
        assert!(text.contains("/papers"));
        assert!(text.contains("422"));
    }
}
