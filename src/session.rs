//! 会话上下文
//!
//! 登录后得到的令牌和用户信息保存在本地 JSON 文件里，
//! 每个需要鉴权的调用都显式接收 `&Session`。
//! 令牌过期表现为 `SessionError::Expired`，由调用方决定是否清理会话。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError, SessionError};
use crate::models::{AuthResponse, Role, User};

/// 已登录会话
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
            created_at: Utc::now(),
        }
    }

    /// `Authorization` 头的值
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn is_teacher(&self) -> bool {
        self.user.role == Role::Teacher
    }
}

impl From<AuthResponse> for Session {
    fn from(auth: AuthResponse) -> Self {
        Session::new(auth.token, auth.user)
    }
}

/// 会话文件存储
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取会话；文件不存在时返回 `NotLoggedIn`
    pub async fn load(&self) -> AppResult<Session> {
        let display = self.path.display().to_string();
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotLoggedIn.into());
            }
            Err(e) => return Err(AppError::file_read_failed(display, e)),
        };

        let session = serde_json::from_str(&raw)
            .map_err(|source| SessionError::Corrupted { path: display, source })?;
        debug!("已加载会话: {}", self.path.display());
        Ok(session)
    }

    pub async fn save(&self, session: &Session) -> AppResult<()> {
        let json = serde_json::to_string_pretty(session).map_err(|source| {
            SessionError::Corrupted {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        fs::write(&self.path, json)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: self.path.display().to_string(),
                source,
            })?;
        info!("✓ 会话已保存: {} ({})", session.user.name, session.user.role);
        Ok(())
    }

    /// 删除会话文件，文件不存在不算错误
    pub async fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("🗑️ 会话已清除");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(FileError::WriteFailed {
                path: self.path.display().to_string(),
                source,
            }
            .into()),
        }
    }
}
