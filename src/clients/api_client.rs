/// ExamSpark 后端 API 客户端
///
/// 封装所有与后端 REST API 相关的调用逻辑；需要鉴权的调用显式接收 `&Session`
use crate::config::Config;
use crate::error::{ApiError, AppError, AppResult, ConfigError, SessionError, ValidationError};
use crate::models::de::deserialize_id;
use crate::models::{
    AuthResponse, EvaluateRequest, Evaluation, EvaluationUpdate, LoginRequest, NewQuestionPaper,
    NewSubmission, PaperRequest, QuestionPaper, Role, SignupRequest, StudentSubmission,
};
use crate::session::Session;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\-.]+@([\w-]+\.)+[\w-]{2,4}$").expect("邮箱正则无效"));

/// 后端报告令牌过期时的固定消息
const TOKEN_EXPIRED_MSG: &str = "Token has expired";

#[derive(Debug, Deserialize)]
struct GeneratedPaper {
    content: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPaper {
    #[serde(deserialize_with = "deserialize_id")]
    paper_id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedSubmission {
    #[serde(deserialize_with = "deserialize_id")]
    submission_id: String,
}

/// 后端 API 客户端
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// 创建新的 API 客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        if reqwest::Url::parse(&config.api_base_url).is_err() {
            return Err(ConfigError::InvalidUrl {
                url: config.api_base_url.clone(),
            }
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match session {
            Some(session) => builder.header(reqwest::header::AUTHORIZATION, session.bearer()),
            None => builder,
        }
    }

    /// 发送请求并按状态码映射错误
    async fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> AppResult<T> {
        debug!("调用后端 API: {}", endpoint);

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !status.is_success() {
            let err = map_error_status(endpoint, status, &body);
            warn!("后端 API 返回错误 ({}): {}", endpoint, err);
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|source| {
            ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            }
            .into()
        })
    }

    // ========== 认证 ==========

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let body = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.send("/auth/login", self.request(Method::POST, "/auth/login", None).json(&body))
            .await
    }

    /// 注册；发送请求前先校验输入
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: &str,
        role: Role,
    ) -> AppResult<AuthResponse> {
        validate_signup(email, password, name)?;
        let body = SignupRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            name: name.trim().to_string(),
            role,
        };
        self.send("/auth/signup", self.request(Method::POST, "/auth/signup", None).json(&body))
            .await
    }

    // ========== 试卷 ==========

    /// 通过后端代理生成试卷，返回试卷正文
    pub async fn generate_paper(&self, session: &Session, params: &PaperRequest) -> AppResult<String> {
        let generated: GeneratedPaper = self
            .send(
                "/generate-paper",
                self.request(Method::POST, "/generate-paper", Some(session)).json(params),
            )
            .await?;
        Ok(generated.content)
    }

    /// 保存试卷，返回新试卷 ID
    pub async fn create_paper(&self, session: &Session, paper: &NewQuestionPaper) -> AppResult<String> {
        let created: CreatedPaper = self
            .send("/papers", self.request(Method::POST, "/papers", Some(session)).json(paper))
            .await?;
        Ok(created.paper_id)
    }

    pub async fn list_papers(&self, session: &Session) -> AppResult<Vec<QuestionPaper>> {
        self.send("/papers", self.request(Method::GET, "/papers", Some(session)))
            .await
    }

    pub async fn get_paper(&self, session: &Session, paper_id: &str) -> AppResult<QuestionPaper> {
        let path = format!("/papers/{}", paper_id);
        self.send(&path, self.request(Method::GET, &path, Some(session)))
            .await
    }

    /// 删除试卷（后端会一并删除相关提交）
    pub async fn delete_paper(&self, session: &Session, paper_id: &str) -> AppResult<()> {
        let path = format!("/papers/{}", paper_id);
        let _: Value = self
            .send(&path, self.request(Method::DELETE, &path, Some(session)))
            .await?;
        Ok(())
    }

    // ========== 提交 ==========

    /// 保存学生提交，返回新提交 ID
    pub async fn create_submission(&self, session: &Session, submission: &NewSubmission) -> AppResult<String> {
        let created: CreatedSubmission = self
            .send(
                "/submissions",
                self.request(Method::POST, "/submissions", Some(session)).json(submission),
            )
            .await?;
        Ok(created.submission_id)
    }

    pub async fn list_submissions(&self, session: &Session) -> AppResult<Vec<StudentSubmission>> {
        self.send("/submissions", self.request(Method::GET, "/submissions", Some(session)))
            .await
    }

    pub async fn update_submission_evaluation(
        &self,
        session: &Session,
        submission_id: &str,
        evaluation: Evaluation,
    ) -> AppResult<()> {
        let path = format!("/submissions/{}", submission_id);
        let body = EvaluationUpdate { evaluation };
        let _: Value = self
            .send(&path, self.request(Method::PATCH, &path, Some(session)).json(&body))
            .await?;
        Ok(())
    }

    /// 请求后端用 AI 评估整份答卷
    pub async fn evaluate_submission(&self, session: &Session, request: &EvaluateRequest) -> AppResult<Evaluation> {
        self.send(
            "/evaluate-submission",
            self.request(Method::POST, "/evaluate-submission", Some(session)).json(request),
        )
        .await
    }
}

/// 从错误响应体里取 `error` 或 `msg`
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("msg"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// 把非 2xx 响应映射为错误
pub fn map_error_status(endpoint: &str, status: StatusCode, body: &str) -> AppError {
    let message = error_message(body);
    let endpoint = endpoint.to_string();

    match status {
        StatusCode::UNAUTHORIZED if message.as_deref() == Some(TOKEN_EXPIRED_MSG) => {
            SessionError::Expired.into()
        }
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized {
            endpoint,
            message: message.unwrap_or_else(|| "Unauthorized".to_string()),
        }
        .into(),
        StatusCode::NOT_FOUND => ApiError::NotFound { endpoint }.into(),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited { endpoint }.into(),
        _ => ApiError::BadResponse {
            endpoint,
            status: status.as_u16(),
            message,
        }
        .into(),
    }
}

/// 注册表单校验
pub fn validate_signup(email: &str, password: &str, name: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("email"));
    }
    if password.is_empty() {
        return Err(ValidationError::MissingField("password"));
    }
    if name.trim().is_empty() {
        return Err(ValidationError::MissingField("name"));
    }
    if !EMAIL.is_match(email.trim()) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_token_maps_to_session_error() {
        let err = map_error_status("/papers", StatusCode::UNAUTHORIZED, r#"{"msg": "Token has expired"}"#);
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_other_unauthorized() {
        let err = map_error_status(
            "/auth/login",
            StatusCode::UNAUTHORIZED,
            r#"{"error": "Invalid email or password"}"#,
        );
        match err {
            AppError::Api(ApiError::Unauthorized { message, .. }) => {
                assert_eq!(message, "Invalid email or password")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_error_status("/papers/9", StatusCode::NOT_FOUND, r#"{"error": "Paper not found"}"#),
            AppError::Api(ApiError::NotFound { .. })
        ));
        assert!(matches!(
            map_error_status("/evaluate-submission", StatusCode::TOO_MANY_REQUESTS, ""),
            AppError::Api(ApiError::RateLimited { .. })
        ));
        match map_error_status("/papers", StatusCode::UNPROCESSABLE_ENTITY, "<html>oops</html>") {
            AppError::Api(ApiError::BadResponse { status, message, .. }) => {
                assert_eq!(status, 422);
                assert_eq!(message, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_signup() {
        assert!(validate_signup("ann.lee@school.edu", "pw", "Ann").is_ok());
        assert!(matches!(
            validate_signup("not-an-email", "pw", "Ann"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_signup("a@b.com", "", "Ann"),
            Err(ValidationError::MissingField("password"))
        ));
        assert!(matches!(
            validate_signup("a@b.com", "pw", "  "),
            Err(ValidationError::MissingField("name"))
        ));
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            ApiClient::new(&config),
            Err(AppError::Config(ConfigError::InvalidUrl { .. }))
        ));
    }

    /// 需要本地运行后端：cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_login_against_local_backend() {
        let client = ApiClient::new(&Config::from_env()).unwrap();
        let email = std::env::var("EXAM_SPARK_TEST_EMAIL").unwrap();
        let password = std::env::var("EXAM_SPARK_TEST_PASSWORD").unwrap();
        let auth = client.login(&email, &password).await.unwrap();
        assert!(!auth.token.is_empty());
    }
}
