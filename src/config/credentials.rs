use super::properties::PropertySet;
use crate::infrastructure::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CREDENTIALS_SECTION: &str = "CREDENTIALS";
pub const DEFAULT_CREDENTIALS_FILE: &str = "bitbucket-credentials";

/// Bitbucket 凭据（username + appkey）
///
/// 每次运行只加载一次，所有仓库只读共享。
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("secret", &"***")
            .finish()
    }
}

/// 默认凭据文件：`~/bitbucket-credentials`
pub fn default_credentials_path() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_CREDENTIALS_FILE)
}

/// 从凭据文件读取 Bitbucket 凭据，`path` 为空时使用默认位置
pub fn load_credentials(path: Option<&Path>) -> Result<Credentials, ConfigError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_credentials_path);
    let props = PropertySet::load(&path)?;
    credentials_from(&props)
}

pub fn credentials_from(props: &PropertySet) -> Result<Credentials, ConfigError> {
    let section = props.require_section(CREDENTIALS_SECTION)?;
    let username = section.require("username")?;
    let appkey = section.require("appkey")?;
    Ok(Credentials::new(username, appkey))
}
