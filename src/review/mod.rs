pub mod bitbucket;
pub mod export;
pub mod payload;

pub use bitbucket::{BitbucketClient, ReviewOutcome, ReviewService, WorkspaceMember};
pub use export::{write_reviewer_files, ExportedFiles};
pub use payload::{
    build_payload, map_users_to_json_array, read_reviewers_file, resolve_reviewers, ReviewPayload,
    Reviewer,
};

use crate::infrastructure::BatchResult;

/// workspace 中除当前用户以外的成员，保持服务端返回的顺序
pub async fn workspace_reviewers<S>(service: &S, workspace: &str) -> BatchResult<Vec<WorkspaceMember>>
where
    S: ReviewService + ?Sized,
{
    let members = service.workspace_members(workspace).await?;
    let me = service.current_user_uuid().await?;
    Ok(members.into_iter().filter(|m| m.uuid != me).collect())
}
