pub mod credentials;
pub mod properties;

pub use credentials::{default_credentials_path, load_credentials, Credentials};
pub use properties::{PropertySet, Section};

use crate::infrastructure::ConfigError;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PROPERTIES_SECTION: &str = "PROPERTIES";
pub const BITBUCKET_SECTION: &str = "BITBUCKET";
pub const DEFAULT_PROPERTIES_FILE: &str = "repositories.properties";
pub const DEFAULT_API_URL: &str = "https://api.bitbucket.org";

pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// 批处理配置
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub commit_message: String,
    pub search_text: String,
    pub replace_text: String,
    pub extensions: BTreeSet<String>,
    pub master_branch: String,
    pub stash_before: bool,
    pub checkout_master_before: bool,
    pub pull_before: bool,
    /// `not_create_pr = "yes"` 时即使存在 BITBUCKET 节也不创建 PR
    pub skip_review: bool,
    pub command_timeout: Duration,
    pub http_timeout: Duration,
}

/// 评审人来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewersSpec {
    /// 显式给出的 uuid 列表
    Explicit(Vec<String>),
    /// 预先导出的 reviewers.json
    File(PathBuf),
    /// 使用 workspace 中除自己以外的全部成员
    Workspace,
}

impl ReviewersSpec {
    /// 只有恰好一个以 `.json` 结尾的参数才视为文件
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match tokens.as_slice() {
            [] => ReviewersSpec::Workspace,
            [single] if single.ends_with(".json") => ReviewersSpec::File(PathBuf::from(single)),
            _ => ReviewersSpec::Explicit(tokens),
        }
    }
}

/// PR 相关配置，仅当属性文件包含 BITBUCKET 节时存在
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    pub workspace: String,
    pub branch: String,
    pub reviewers: ReviewersSpec,
    pub credentials_path: Option<PathBuf>,
    pub title: Option<String>,
}

impl ReviewConfig {
    /// PR 标题，未配置时使用 commit message
    pub fn title_or<'a>(&'a self, commit_message: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(commit_message)
    }
}

/// 一次批处理运行的完整配置
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub batch: BatchConfig,
    pub review: Option<ReviewConfig>,
}

impl BatchSettings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let props = PropertySet::load(path)?;
        Self::from_properties(&props)
    }

    pub fn from_properties(props: &PropertySet) -> Result<Self, ConfigError> {
        let section = props.require_section(PROPERTIES_SECTION)?;
        let batch = parse_batch_config(&section)?;
        let review = match props.section(BITBUCKET_SECTION) {
            Some(section) => Some(parse_review_config(&section)?),
            None => None,
        };
        Ok(Self { batch, review })
    }

    /// 实际生效的 PR 配置（考虑 `not_create_pr`）
    pub fn active_review(&self) -> Option<&ReviewConfig> {
        if self.batch.skip_review {
            None
        } else {
            self.review.as_ref()
        }
    }
}

fn parse_batch_config(section: &Section<'_>) -> Result<BatchConfig, ConfigError> {
    let extensions: BTreeSet<String> = section
        .list("extensions")
        .into_iter()
        .map(|ext| ext.trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect();
    if extensions.is_empty() {
        // 与其它必填项保持同样的报错形式
        section.require("extensions")?;
        return Err(ConfigError::invalid("extensions", "no usable extension given"));
    }

    Ok(BatchConfig {
        commit_message: section.require("commit_message")?.to_string(),
        search_text: section.require("str_to_find")?.to_string(),
        replace_text: section.require("str_to_repl")?.to_string(),
        extensions,
        master_branch: section.require("master")?.to_string(),
        stash_before: section.flag("stash_before_work"),
        checkout_master_before: section.flag("checkout_to_master_before_work"),
        pull_before: section.flag("pull_before_work"),
        skip_review: section.flag("not_create_pr"),
        command_timeout: Duration::from_secs(
            section
                .seconds("command_timeout_secs")?
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS),
        ),
        http_timeout: Duration::from_secs(
            section
                .seconds("http_timeout_secs")?
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        ),
    })
}

fn parse_review_config(section: &Section<'_>) -> Result<ReviewConfig, ConfigError> {
    Ok(ReviewConfig {
        workspace: section.require("workspace")?.to_string(),
        branch: section.require("branch")?.to_string(),
        reviewers: ReviewersSpec::from_tokens(section.list("reviewers")),
        credentials_path: section.get("bitbucket_credentials").map(PathBuf::from),
        title: section.get("prtitle").map(str::to_string),
    })
}

/// 运行环境：默认文件位置与 API 地址
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    pub properties_path: PathBuf,
    pub credentials_path: Option<PathBuf>,
    pub api_url: String,
}

impl RuntimeEnv {
    pub fn new() -> Self {
        let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let mut runtime = RuntimeEnv {
            properties_path: home.join(DEFAULT_PROPERTIES_FILE),
            credentials_path: None,
            api_url: DEFAULT_API_URL.to_string(),
        };

        // 加载 .env 文件
        #[cfg(not(test))]
        runtime.load_from_env_file(&home);
        // 环境变量覆盖默认值
        runtime.load_from_env();

        runtime
    }

    pub fn load_from_env_file(&mut self, home: &Path) {
        let user_env_path = home.join(".repo-batch").join(".env");
        if user_env_path.exists() {
            dotenvy::from_path(user_env_path).ok();
        }

        dotenvy::dotenv().ok();
    }

    pub fn load_from_env(&mut self) {
        if let Ok(path) = env::var("REPO_BATCH_PROPERTIES") {
            self.properties_path = PathBuf::from(path);
        }
        if let Ok(path) = env::var("REPO_BATCH_CREDENTIALS") {
            self.credentials_path = Some(PathBuf::from(path));
        }
        if let Ok(url) = env::var("REPO_BATCH_API_URL") {
            self.api_url = url.trim_end_matches('/').to_string();
        }
    }
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self::new()
    }
}
