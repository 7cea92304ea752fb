//! 多仓库批处理流水线
//!
//! 每个仓库依次经过：同步基线 -> 准备分支 -> 扫描 -> (无匹配 | 替换) -> 提交 -> 推送 -> (跳过 | 创建 PR)。
//! 仓库之间、仓库内部的步骤都严格串行；单个仓库失败不影响其它仓库。

pub mod report;

pub use report::{BatchReport, RepoOutcome, RepoReport, ReviewState, Stage};

use crate::config::{BatchConfig, ReviewConfig};
use crate::git::{self, RepositoryOpener, VersionControl, DEFAULT_REMOTE};
use crate::infrastructure::BatchResult;
use crate::mutator;
use crate::review::{build_payload, resolve_reviewers, ReviewOutcome, ReviewService, Reviewer};
use std::path::Path;
use tracing::Instrument;

/// 已解析好的 PR 计划，整个批次共用
pub struct ReviewPlan<'a, S: ?Sized> {
    pub workspace: String,
    pub title: String,
    pub reviewers: Vec<Reviewer>,
    pub service: &'a S,
}

impl<'a, S> ReviewPlan<'a, S>
where
    S: ReviewService + ?Sized,
{
    /// 解析评审人；失败时在触碰任何仓库之前返回
    pub async fn prepare(
        review: &ReviewConfig,
        commit_message: &str,
        service: &'a S,
    ) -> BatchResult<ReviewPlan<'a, S>> {
        let reviewers = resolve_reviewers(&review.reviewers, &review.workspace, service).await?;
        tracing::info!(count = reviewers.len(), workspace = %review.workspace, "resolved reviewers");
        Ok(ReviewPlan {
            workspace: review.workspace.clone(),
            title: review.title_or(commit_message).to_string(),
            reviewers,
            service,
        })
    }
}

/// 批处理执行器
pub struct BatchRunner<'a, S: ?Sized> {
    config: &'a BatchConfig,
    branch: Option<&'a str>,
    review: Option<ReviewPlan<'a, S>>,
}

impl<'a, S> BatchRunner<'a, S>
where
    S: ReviewService + ?Sized,
{
    pub fn new(config: &'a BatchConfig) -> Self {
        Self {
            config,
            branch: None,
            review: None,
        }
    }

    /// 每个仓库都在该新分支上工作
    pub fn with_branch(mut self, branch: Option<&'a str>) -> Self {
        self.branch = branch;
        self
    }

    pub fn with_review(mut self, plan: Option<ReviewPlan<'a, S>>) -> Self {
        self.review = plan;
        self
    }

    /// 处理 `root` 下的全部仓库
    ///
    /// 只有列目录失败才返回错误；单个仓库的问题都记录在报告里。
    pub async fn run<O>(&self, root: &Path, opener: &O) -> std::io::Result<BatchReport>
    where
        O: RepositoryOpener,
    {
        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("batch", run_id = %run_id, root = %root.display());

        async {
            let enumeration = git::enumerate(root, opener).await?;
            tracing::info!(
                repositories = enumeration.repositories.len(),
                skipped = enumeration.skipped.len(),
                "enumerated working copies"
            );

            let mut report = BatchReport::new(enumeration.skipped);
            for repo in &enumeration.repositories {
                let outcome = self.process(repo).await;
                report.push(RepoReport {
                    name: repo.name().to_string(),
                    path: repo.path().to_path_buf(),
                    outcome,
                });
            }

            tracing::info!(
                pushed = report.pushed(),
                no_match = report.no_match(),
                failed = report.failed(),
                skipped = report.skipped.len(),
                "batch finished"
            );
            Ok::<_, std::io::Error>(report)
        }
        .instrument(span)
        .await
    }

    /// 对单个仓库执行完整流程
    pub async fn process<V>(&self, repo: &V) -> RepoOutcome
    where
        V: VersionControl + ?Sized,
    {
        let span = tracing::info_span!("repo", repo = repo.name());
        self.process_inner(repo).instrument(span).await
    }

    async fn process_inner<V>(&self, repo: &V) -> RepoOutcome
    where
        V: VersionControl + ?Sized,
    {
        let config = self.config;

        // Enumerated -> SyncedToBaseline
        if let Err(e) = git::sync_to_baseline(repo, config).await {
            return fail(Stage::Baseline, e);
        }

        // SyncedToBaseline -> BranchReady
        if let Some(branch) = self.branch {
            if let Err(e) = repo.create_and_checkout_branch(branch).await {
                return fail(Stage::Branch, e);
            }
        }

        // BranchReady -> Scanned
        let matches = match mutator::scan(repo.path(), &config.extensions)
            .and_then(|files| mutator::filter_containing(&files, &config.search_text))
        {
            Ok(matches) => matches,
            Err(e) => return fail(Stage::Scan, e),
        };

        if matches.is_empty() {
            tracing::info!(search = %config.search_text, "no file contains the search text, skipping");
            return RepoOutcome::NoMatch;
        }

        // Scanned -> Mutated
        let replacements =
            match mutator::rewrite(&matches, &config.search_text, &config.replace_text) {
                Ok(count) => count,
                Err(e) => return fail(Stage::Rewrite, e),
            };
        tracing::info!(files = matches.len(), replacements, "rewrote matching files");

        // Mutated -> Committed
        if let Err(e) = repo.add(&matches).await {
            return fail(Stage::Commit, e);
        }
        if let Err(e) = repo.commit(&config.commit_message).await {
            return fail(Stage::Commit, e);
        }

        // Committed -> Pushed
        let branch = match self.branch {
            Some(branch) => branch.to_string(),
            None => match repo.current_branch().await {
                Ok(branch) => branch,
                Err(e) => return fail(Stage::Push, e),
            },
        };
        if let Err(e) = repo.push(DEFAULT_REMOTE, &branch).await {
            return fail(Stage::Push, e);
        }
        tracing::info!(branch = %branch, "pushed");

        // Pushed -> ReviewSkipped | ReviewRequested
        let review = match &self.review {
            Some(plan) => self.request_review(plan, repo.name(), &branch).await,
            None => ReviewState::Skipped,
        };

        RepoOutcome::Pushed {
            branch,
            files: matches.len(),
            replacements,
            review,
        }
    }

    async fn request_review(&self, plan: &ReviewPlan<'a, S>, project: &str, branch: &str) -> ReviewState {
        let payload = build_payload(branch, plan.reviewers.clone(), &plan.title);
        match plan.service.submit(&payload, &plan.workspace, project).await {
            Ok(ReviewOutcome::Created) => {
                tracing::info!("pull request created successfully");
                ReviewState::Requested(ReviewOutcome::Created)
            }
            Ok(ReviewOutcome::Rejected { status, body }) => {
                tracing::warn!(status, body = %body, "cant create pr!");
                ReviewState::Requested(ReviewOutcome::Rejected { status, body })
            }
            Err(e) => {
                tracing::error!(error = %e, "pull request request failed");
                ReviewState::Failed(e.to_string())
            }
        }
    }
}

fn fail(stage: Stage, error: crate::infrastructure::BatchError) -> RepoOutcome {
    tracing::error!(stage = %stage, error = %error, "repository pass aborted");
    RepoOutcome::Failed {
        stage,
        error: error.to_string(),
    }
}
