use crate::error::{AppError, AppResult, FileError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 本地试卷文件
///
/// `.toml` 文件按结构解析，其他扩展名整个文件视为试卷正文
#[derive(Debug, Clone, Deserialize)]
pub struct PaperFile {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(skip)]
    pub file_path: Option<String>,
}

/// 从文件加载试卷
pub async fn load_paper_file(path: &Path) -> AppResult<PaperFile> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(&display, e))?;

    let mut paper = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str::<PaperFile>(&raw).map_err(|source| FileError::TomlParseFailed {
            path: display.clone(),
            source,
        })?
    } else {
        PaperFile {
            subject: None,
            title: path.file_stem().map(|s| s.to_string_lossy().to_string()),
            content: raw,
            file_path: None,
        }
    };

    paper.file_path = Some(display);
    Ok(paper)
}

/// 加载文件夹中所有 `.toml` / `.txt` / `.md` 试卷，无法解析的文件跳过
pub async fn load_all_paper_files(folder_path: &str) -> AppResult<Vec<PaperFile>> {
    let folder = PathBuf::from(folder_path);

    let mut entries = fs::read_dir(&folder)
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::file_read_failed(folder_path, e))?
    {
        let path = entry.path();
        if matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("toml") | Some("txt") | Some("md")
        ) {
            paths.push(path);
        }
    }
    // read_dir 顺序不稳定
    paths.sort();

    let mut papers = Vec::new();
    for path in paths {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        match load_paper_file(&path).await {
            Ok(paper) => papers.push(paper),
            Err(e) => tracing::warn!("加载文件失败 {}: {}", path.display(), e),
        }
    }

    Ok(papers)
}
