use crate::batch::{BatchReport, BatchRunner, ReviewPlan};
use crate::cli::BatchArgs;
use crate::config::{load_credentials, BatchSettings, RuntimeEnv};
use crate::git::GitOpener;
use crate::review::BitbucketClient;
use anyhow::Context;

/// 执行批处理：加载配置和凭据、解析评审人，然后逐个处理仓库
///
/// 配置、凭据或评审人解析失败都在修改任何仓库之前返回。
pub async fn handle_batch(args: &BatchArgs, runtime: &RuntimeEnv) -> anyhow::Result<BatchReport> {
    let properties = args
        .properties
        .clone()
        .unwrap_or_else(|| runtime.properties_path.clone());
    let settings = BatchSettings::load(&properties)?;
    let root = super::resolve_directory(args.directory.as_deref())?;

    let client = match settings.active_review() {
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
                settings.batch.http_timeout,
            )?)
        }
        None => None,
    };

    let plan = match (settings.active_review(), client.as_ref()) {
        (Some(review), Some(client)) => Some(
            ReviewPlan::prepare(review, &settings.batch.commit_message, client)
                .await
                .context("failed to resolve reviewers")?,
        ),
        _ => None,
    };

    let runner = BatchRunner::new(&settings.batch)
        .with_branch(settings.review.as_ref().map(|r| r.branch.as_str()))
        .with_review(plan);

    tracing::info!(root = %root.display(), properties = %properties.display(), "starting batch");
    let report = runner
        .run(&root, &GitOpener::new(settings.batch.command_timeout))
        .await
        .with_context(|| format!("failed to list repositories under {}", root.display()))?;

    println!("{}", report);
    Ok(report)
}
