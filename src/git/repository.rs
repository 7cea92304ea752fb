use crate::infrastructure::{BatchError, BatchResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// 单个工作副本上的版本控制操作
///
/// 每个操作要么完成，要么返回错误并终止该仓库本轮处理。
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// 工作副本目录
    fn path(&self) -> &Path;

    /// 仓库名（目录名），同时作为 Bitbucket 上的项目名
    fn name(&self) -> &str;

    async fn stash(&self) -> BatchResult<()>;

    async fn checkout(&self, reference: &str) -> BatchResult<()>;

    async fn pull(&self) -> BatchResult<()>;

    async fn create_and_checkout_branch(&self, name: &str) -> BatchResult<()>;

    /// 暂存给定路径；空列表表示暂存全部改动
    async fn add(&self, paths: &[PathBuf]) -> BatchResult<()>;

    async fn commit(&self, message: &str) -> BatchResult<()>;

    async fn push(&self, remote: &str, reference: &str) -> BatchResult<()>;

    async fn current_branch(&self) -> BatchResult<String>;
}

/// Git 仓库
#[derive(Debug, Clone)]
pub struct Repository {
    path: PathBuf,
    name: String,
    timeout: Duration,
}

impl Repository {
    /// 打开仓库，`path` 必须是工作副本的根目录
    pub async fn open(path: &Path, timeout: Duration) -> BatchResult<Self> {
        if !path.is_dir() {
            return Err(BatchError::git(
                "open",
                format!("{} does not exist or is not a directory", path.display()),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let repository = Self {
            path: path.to_path_buf(),
            name,
            timeout,
        };

        let toplevel = repository
            .run("rev-parse", &["rev-parse", "--show-toplevel"])
            .await
            .map_err(|e| match e {
                BatchError::Git { .. } => {
                    BatchError::git("open", format!("{} is not a git repository", path.display()))
                }
                other => other,
            })?;

        // 父目录是仓库时，子目录也能通过 rev-parse，这里要求必须是根目录
        let toplevel = PathBuf::from(toplevel.trim());
        if !same_directory(&toplevel, path) {
            return Err(BatchError::git(
                "open",
                format!(
                    "{} is inside the repository {}, not a repository root",
                    path.display(),
                    toplevel.display()
                ),
            ));
        }

        Ok(repository)
    }

    /// 执行 Git 命令并返回 stdout
    pub async fn run(&self, operation: &str, args: &[&str]) -> BatchResult<String> {
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(&self.path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true);

        tracing::debug!(repo = %self.name, args = ?args, "running git");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| BatchError::timeout(format!("git {}", operation), self.timeout.as_secs()))?
            .map_err(|e| BatchError::git(operation, format!("Failed to run git {}: {}", operation, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(BatchError::git(
                operation,
                format!("exit code {:?}: {}", output.status.code(), detail),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[async_trait]
impl VersionControl for Repository {
    fn path(&self) -> &Path {
        &self.path
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn stash(&self) -> BatchResult<()> {
        self.run("stash", &["stash", "push"]).await.map(|_| ())
    }

    async fn checkout(&self, reference: &str) -> BatchResult<()> {
        self.run("checkout", &["checkout", reference]).await.map(|_| ())
    }

    async fn pull(&self) -> BatchResult<()> {
        self.run("pull", &["pull", "--ff-only"]).await.map(|_| ())
    }

    async fn create_and_checkout_branch(&self, name: &str) -> BatchResult<()> {
        self.run("checkout -b", &["checkout", "-b", name]).await.map(|_| ())
    }

    async fn add(&self, paths: &[PathBuf]) -> BatchResult<()> {
        if paths.is_empty() {
            return self.run("add", &["add", "--all"]).await.map(|_| ());
        }

        let mut args: Vec<&str> = vec!["add", "--"];
        let rendered: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        args.extend(rendered.iter().map(String::as_str));
        self.run("add", &args).await.map(|_| ())
    }

    async fn commit(&self, message: &str) -> BatchResult<()> {
        self.run("commit", &["commit", "-m", message]).await.map(|_| ())
    }

    async fn push(&self, remote: &str, reference: &str) -> BatchResult<()> {
        self.run("push", &["push", remote, reference]).await.map(|_| ())
    }

    async fn current_branch(&self) -> BatchResult<String> {
        let branch = self
            .run("rev-parse", &["rev-parse", "--abbrev-ref", "HEAD"])
            .await?
            .trim()
            .to_string();
        if branch == "HEAD" {
            return Err(BatchError::git("rev-parse", "HEAD is detached, nothing to push"));
        }
        Ok(branch)
    }
}
