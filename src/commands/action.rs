use crate::batch::ReviewPlan;
use crate::cli::{ActionArgs, ActionServer, BitbucketArgs};
use crate::config::{
    load_credentials, ReviewConfig, ReviewersSpec, RuntimeEnv, DEFAULT_COMMAND_TIMEOUT_SECS,
    DEFAULT_HTTP_TIMEOUT_SECS,
};
use crate::git::{Repository, VersionControl, DEFAULT_REMOTE};
use crate::review::{build_payload, BitbucketClient, ReviewOutcome, ReviewService};
use anyhow::Context;
use std::time::Duration;

/// 在单个仓库上执行 add/commit/push，按需创建 PR
pub async fn handle_action(args: &ActionArgs, runtime: &RuntimeEnv) -> anyhow::Result<()> {
    let directory = super::resolve_directory(args.directory.as_deref())?;

    let bitbucket = match &args.server {
        Some(ActionServer::Bitbucket(bb)) => Some(bitbucket_review(bb, args)),
        None => None,
    };

    // 凭据在修改仓库之前加载
    let client = match &bitbucket {
        Some(review) => {
            let credentials = load_credentials(
                review
                    .credentials_path
                    .as_deref()
                    .or(runtime.credentials_path.as_deref()),
            )?;
            Some(BitbucketClient::with_base_url(
                &runtime.api_url,
                credentials,
                Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            )?)
        }
        None => None,
    };

    let plan = match (&bitbucket, client.as_ref()) {
        (Some(review), Some(client)) => Some(
            ReviewPlan::prepare(review, &args.commit_message, client)
                .await
                .context("failed to resolve reviewers")?,
        ),
        _ => None,
    };

    let repo = Repository::open(&directory, Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS)).await?;

    let branch = match &args.new_branch {
        Some(branch) => {
            repo.create_and_checkout_branch(branch).await?;
            branch.clone()
        }
        None => {
            if plan.is_some() {
                tracing::warn!("You should add newbranch argument when you would like to create PR");
            }
            repo.current_branch().await?
        }
    };

    repo.add(&args.add).await?;
    repo.commit(&args.commit_message).await?;
    repo.push(DEFAULT_REMOTE, &branch).await?;
    println!("✓ Pushed {} to {}/{}", repo.name(), DEFAULT_REMOTE, branch);

    // 推送已经完成，PR 失败只报告不影响退出码
    if let Some(plan) = plan {
        let payload = build_payload(&branch, plan.reviewers.clone(), &plan.title);
        match plan.service.submit(&payload, &plan.workspace, repo.name()).await {
            Ok(ReviewOutcome::Created) => println!("✓ pull request created successfully"),
            Ok(ReviewOutcome::Rejected { status, body }) => {
                tracing::warn!(status, body = %body, "cant create pr!");
                eprintln!("cant create pr! ({}) {}", status, body)
            }
            Err(e) => {
                tracing::error!(error = %e, "pull request request failed");
                eprintln!("cant create pr! {}", e)
            }
        }
    }

    Ok(())
}

fn bitbucket_review(bb: &BitbucketArgs, args: &ActionArgs) -> ReviewConfig {
    ReviewConfig {
        workspace: bb.workspace.clone(),
        branch: args.new_branch.clone().unwrap_or_default(),
        reviewers: ReviewersSpec::from_tokens(bb.reviewers.iter().cloned()),
        credentials_path: bb.credentials.clone(),
        title: bb.pr_title.clone(),
    }
}
