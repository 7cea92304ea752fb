pub mod action;
pub mod batch;
pub mod export;

pub use action::handle_action;
pub use batch::handle_batch;
pub use export::handle_export;

use crate::cli::{Args, Command};
use crate::config::RuntimeEnv;
use std::path::{Path, PathBuf};

/// 命令路由器
pub async fn route_command(args: &Args, runtime: &RuntimeEnv) -> anyhow::Result<()> {
    match &args.command {
        Command::Batch(batch) => handle_batch(batch, runtime).await.map(|_| ()),
        Command::Action(action) => handle_action(action, runtime).await,
        Command::ExportReviewers(export) => handle_export(export, runtime).await.map(|_| ()),
    }
}

/// 未指定目录时在调用时解析为当前目录
pub fn resolve_directory(directory: Option<&Path>) -> std::io::Result<PathBuf> {
    match directory {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir(),
    }
}
