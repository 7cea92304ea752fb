pub mod enumerate;
pub mod repository;

pub use enumerate::{enumerate, list_subdirectories, Enumeration, GitOpener, RepositoryOpener, SkippedDirectory};
pub use repository::{Repository, VersionControl};

use crate::config::BatchConfig;
use crate::infrastructure::BatchResult;

pub const DEFAULT_REMOTE: &str = "origin";

/// 同步到基线：stash -> checkout master -> pull，各步按配置开启
///
/// 顺序固定，先 pull 再 checkout 会拉错分支。
pub async fn sync_to_baseline<V>(repo: &V, config: &BatchConfig) -> BatchResult<()>
where
    V: VersionControl + ?Sized,
{
    if config.stash_before {
        tracing::debug!(repo = repo.name(), "stash");
        repo.stash().await?;
    }
    if config.checkout_master_before {
        tracing::debug!(repo = repo.name(), branch = %config.master_branch, "checkout");
        repo.checkout(&config.master_branch).await?;
    }
    if config.pull_before {
        tracing::debug!(repo = repo.name(), "pull");
        repo.pull().await?;
    }
    Ok(())
}
