use crate::cli::ExportArgs;
use crate::config::{load_credentials, RuntimeEnv, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::review::{workspace_reviewers, write_reviewer_files, BitbucketClient, ExportedFiles};
use anyhow::Context;
use std::time::Duration;

/// 导出 workspace 成员（不含当前用户）到两个 JSON 文件
pub async fn handle_export(args: &ExportArgs, runtime: &RuntimeEnv) -> anyhow::Result<ExportedFiles> {
    let credentials = load_credentials(
        args.credentials
            .as_deref()
            .or(runtime.credentials_path.as_deref()),
    )?;
    let client = BitbucketClient::with_base_url(
        &runtime.api_url,
        credentials,
        Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
    )?;

    let members = workspace_reviewers(&client, &args.workspace)
        .await
        .with_context(|| format!("failed to fetch members of workspace {}", args.workspace))?;
    let files = write_reviewer_files(&members, args.directory.as_deref())?;

    println!(
        "✓ Exported {} reviewer(s) to {} and {}",
        members.len(),
        files.users_map.display(),
        files.reviewers.display()
    );
    Ok(files)
}
