use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置加载错误
///
/// 在触碰任何仓库之前返回，由入口统一打印并以非零状态退出。
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件 {path} 解析失败: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Can't find {path} file with section {section}.")]
    MissingSection { path: PathBuf, section: String },

    #[error("Can't find {key} in section {section} of {path}")]
    MissingKey {
        path: PathBuf,
        section: String,
        key: String,
    },

    #[error("配置项 {key} 无效: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn missing_key(path: &Path, section: &str, key: &str) -> Self {
        ConfigError::MissingKey {
            path: path.to_path_buf(),
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// 单个仓库处理过程中的错误
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("git {operation} 失败: {message}")]
    Git { operation: String, message: String },

    #[error("超时错误: {operation} 超时 ({timeout_seconds}s)")]
    Timeout {
        operation: String,
        timeout_seconds: u64,
    },

    #[error("文件系统错误: {path}: {message}")]
    FileSystem { path: PathBuf, message: String },

    #[error("网络错误: {message}")]
    Network { message: String, url: Option<String> },

    #[error("解析错误: {message}")]
    Parsing { message: String, content_type: String },
}

impl BatchError {
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        BatchError::Git {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_seconds: u64) -> Self {
        BatchError::Timeout {
            operation: operation.into(),
            timeout_seconds,
        }
    }

    pub fn file_system(path: &Path, error: impl std::fmt::Display) -> Self {
        BatchError::FileSystem {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    pub fn network(message: impl Into<String>, url: Option<String>) -> Self {
        BatchError::Network {
            message: message.into(),
            url,
        }
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(error: serde_json::Error) -> Self {
        BatchError::Parsing {
            message: error.to_string(),
            content_type: "JSON".to_string(),
        }
    }
}

impl From<reqwest::Error> for BatchError {
    fn from(error: reqwest::Error) -> Self {
        BatchError::Network {
            message: error.to_string(),
            url: error.url().map(|u| u.to_string()),
        }
    }
}

pub type BatchResult<T> = Result<T, BatchError>;
