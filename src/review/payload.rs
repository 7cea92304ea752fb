use super::bitbucket::ReviewService;
use crate::config::ReviewersSpec;
use crate::infrastructure::{BatchError, BatchResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// PR 评审人条目
///
/// 由 uuid 生成时为 `{"uuid": ...}`；从文件读取时原样保留。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reviewer(pub Map<String, Value>);

impl Reviewer {
    pub fn from_uuid(uuid: impl Into<String>) -> Self {
        let mut entry = Map::new();
        entry.insert("uuid".to_string(), Value::String(uuid.into()));
        Reviewer(entry)
    }

    pub fn uuid(&self) -> Option<&str> {
        self.0.get("uuid").and_then(Value::as_str)
    }
}

/// 把 uuid 列表转换成 Bitbucket API 期望的格式，顺序保持不变
pub fn map_users_to_json_array<I, S>(uuids: I) -> Vec<Reviewer>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    uuids.into_iter().map(Reviewer::from_uuid).collect()
}

/// 读取 reviewers.json（对象数组），内容原样使用
pub fn read_reviewers_file(path: &Path) -> BatchResult<Vec<Reviewer>> {
    let content = std::fs::read_to_string(path).map_err(|e| BatchError::file_system(path, e))?;
    let reviewers: Vec<Reviewer> = serde_json::from_str(&content)?;
    Ok(reviewers)
}

/// 按配置确定评审人
pub async fn resolve_reviewers<S>(
    spec: &ReviewersSpec,
    workspace: &str,
    service: &S,
) -> BatchResult<Vec<Reviewer>>
where
    S: ReviewService + ?Sized,
{
    match spec {
        ReviewersSpec::Explicit(uuids) => Ok(map_users_to_json_array(uuids.iter().cloned())),
        ReviewersSpec::File(path) => read_reviewers_file(path),
        ReviewersSpec::Workspace => {
            let members = super::workspace_reviewers(service, workspace).await?;
            Ok(map_users_to_json_array(members.into_iter().map(|m| m.uuid)))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub branch: BranchRef,
}

/// 创建 PR 的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub title: String,
    pub source: SourceRef,
    pub reviewers: Vec<Reviewer>,
}

/// 构造 PR 请求体，无副作用
pub fn build_payload(branch: &str, reviewers: Vec<Reviewer>, title: &str) -> ReviewPayload {
    ReviewPayload {
        title: title.to_string(),
        source: SourceRef {
            branch: BranchRef {
                name: branch.to_string(),
            },
        },
        reviewers,
    }
}
