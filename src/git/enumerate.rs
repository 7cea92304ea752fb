use super::repository::{Repository, VersionControl};
use crate::infrastructure::BatchResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 把目录打开为工作副本
#[async_trait]
pub trait RepositoryOpener: Send + Sync {
    type Repo: VersionControl;

    async fn open(&self, path: &Path) -> BatchResult<Self::Repo>;
}

/// 基于 git 命令行的打开方式
#[derive(Debug, Clone)]
pub struct GitOpener {
    pub timeout: Duration,
}

impl GitOpener {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RepositoryOpener for GitOpener {
    type Repo = Repository;

    async fn open(&self, path: &Path) -> BatchResult<Repository> {
        Repository::open(path, self.timeout).await
    }
}

/// 无法作为工作副本打开的目录
#[derive(Debug, Clone)]
pub struct SkippedDirectory {
    pub path: PathBuf,
    pub reason: String,
}

/// 枚举结果
#[derive(Debug)]
pub struct Enumeration<R> {
    pub repositories: Vec<R>,
    pub skipped: Vec<SkippedDirectory>,
}

/// 列出 `root` 下的直接子目录（不递归），按名称排序
pub fn list_subdirectories(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// 枚举并打开 `root` 下的全部仓库
///
/// 打不开的目录记录诊断后跳过，不影响其它目录。
pub async fn enumerate<O: RepositoryOpener>(
    root: &Path,
    opener: &O,
) -> std::io::Result<Enumeration<O::Repo>> {
    let mut enumeration = Enumeration {
        repositories: Vec::new(),
        skipped: Vec::new(),
    };

    for dir in list_subdirectories(root)? {
        match opener.open(&dir).await {
            Ok(repo) => {
                tracing::debug!(path = %dir.display(), "opened working copy");
                enumeration.repositories.push(repo);
            }
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cant create repository instance, skipping");
                enumeration.skipped.push(SkippedDirectory {
                    path: dir,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(enumeration)
}
