use super::bitbucket::WorkspaceMember;
use super::payload::map_users_to_json_array;
use crate::infrastructure::{BatchError, BatchResult};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const USERS_MAP_FILE: &str = "usersMap.json";
pub const REVIEWERS_FILE: &str = "reviewers.json";

/// 导出的两个文件
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub users_map: PathBuf,
    pub reviewers: PathBuf,
}

/// 写出 `usersMap.json`（uuid -> 显示名）和 `reviewers.json`（PR 可直接使用的数组）
///
/// `directory` 为空时在调用时解析为当前目录。
pub fn write_reviewer_files(
    members: &[WorkspaceMember],
    directory: Option<&Path>,
) -> BatchResult<ExportedFiles> {
    let directory = match directory {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().map_err(|e| BatchError::file_system(Path::new("."), e))?,
    };

    let users_map: Map<String, Value> = members
        .iter()
        .map(|m| (m.uuid.clone(), Value::String(m.display_name.clone())))
        .collect();
    let reviewers = map_users_to_json_array(members.iter().map(|m| m.uuid.clone()));

    let files = ExportedFiles {
        users_map: directory.join(USERS_MAP_FILE),
        reviewers: directory.join(REVIEWERS_FILE),
    };

    write_json(&files.users_map, &users_map)?;
    write_json(&files.reviewers, &reviewers)?;

    Ok(files)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> BatchResult<()> {
    let content = serde_json::to_string(value)?;
    std::fs::write(path, content).map_err(|e| BatchError::file_system(path, e))
}
