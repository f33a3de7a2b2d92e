/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 后端 API 地址（已规范化，以 `/api` 结尾）
    pub api_base_url: String,
    /// 会话文件路径
    pub session_file: String,
    /// 同时评估的提交数量
    pub max_concurrent_evaluations: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            session_file: ".exam-spark-session.json".to_string(),
            max_concurrent_evaluations: 4,
            verbose_logging: false,
            http_timeout_secs: 60,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            api_base_url: std::env::var("EXAM_SPARK_API_URL")
                .map(|v| normalize_api_url(&v))
                .unwrap_or(default.api_base_url),
            session_file: std::env::var("EXAM_SPARK_SESSION_FILE").unwrap_or(default.session_file),
            max_concurrent_evaluations: std::env::var("MAX_CONCURRENT_EVALUATIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(default.max_concurrent_evaluations),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.http_timeout_secs),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }

    /// 覆盖 API 地址（会重新规范化）
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_base_url = normalize_api_url(url);
        self
    }
}

/// 规范化后端地址：去掉末尾的 `/`，必要时补上 `/api`
pub fn normalize_api_url(url: &str) -> String {
    let normalized = url.trim().trim_end_matches('/');
    if normalized.ends_with("/api") {
        normalized.to_string()
    } else {
        format!("{}/api", normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_appends_api_prefix() {
        assert_eq!(normalize_api_url("https://host.example"), "https://host.example/api");
        assert_eq!(normalize_api_url("https://host.example///"), "https://host.example/api");
    }

    #[test]
    fn test_normalize_keeps_existing_prefix() {
        assert_eq!(normalize_api_url("http://localhost:5000/api/"), "http://localhost:5000/api");
        assert_eq!(normalize_api_url("http://localhost:5000/api"), "http://localhost:5000/api");
    }

    #[test]
    fn test_with_api_url_overrides() {
        let config = Config::default().with_api_url("http://10.0.0.2:8000");
        assert_eq!(config.api_base_url, "http://10.0.0.2:8000/api");
        assert_eq!(config.max_concurrent_evaluations, 4);
    }
}
