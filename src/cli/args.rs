use crate::infrastructure::LogFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "repo-batch",
    version,
    about = "批量修改多个 Git 仓库：同步、查找替换、提交推送并可选创建 Bitbucket PR",
    long_about = "repo-batch 对工作目录下的每个 Git 仓库执行 stash/checkout/pull，按扩展名查找并替换字符串，提交并推送改动，按配置在 Bitbucket 上创建 Pull Request。单个仓库失败不会中断整个批处理。"
)]
pub struct Args {
    /// 日志格式 (pretty, compact, json)
    #[arg(long = "log-format", global = true, default_value = "compact")]
    pub log_format: LogFormat,

    /// 输出更详细的日志（可重复，如 -vv）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 对目录下的所有仓库执行批量替换
    Batch(BatchArgs),

    /// 在单个仓库上提交并推送，可选创建 PR
    Action(ActionArgs),

    /// 导出 workspace 的评审人到 usersMap.json 和 reviewers.json
    ExportReviewers(ExportArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct BatchArgs {
    /// 属性文件（默认 ~/repositories.properties）
    #[arg(short = 'p', long, value_name = "FILE")]
    pub properties: Option<PathBuf>,

    /// 包含仓库的工作目录（默认当前目录）
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ActionArgs {
    /// 需要 git add 的路径，不指定时添加全部改动
    #[arg(short = 'a', long = "add", value_name = "PATH", num_args = 1..)]
    pub add: Vec<PathBuf>,

    /// commit message
    #[arg(short = 'm', long = "commit-message")]
    pub commit_message: String,

    /// 创建并切换到新分支
    #[arg(short = 'b', long = "new-branch", value_name = "BRANCH")]
    pub new_branch: Option<String>,

    /// 仓库目录（默认当前目录）
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    #[command(subcommand)]
    pub server: Option<ActionServer>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ActionServer {
    /// 推送后在 Bitbucket 上创建 PR
    Bitbucket(BitbucketArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct BitbucketArgs {
    /// PR 标题，默认与 commit message 相同
    #[arg(long = "pr", value_name = "TITLE")]
    pub pr_title: Option<String>,

    /// 评审人 uuid 列表，或单个 reviewers.json 文件；不指定时使用 workspace 全部成员
    #[arg(short = 'r', long = "reviewers", value_name = "UUID|FILE", num_args = 1..)]
    pub reviewers: Vec<String>,

    /// Bitbucket workspace
    #[arg(short = 'w', long)]
    pub workspace: String,

    /// 凭据文件（默认 ~/bitbucket-credentials）
    #[arg(short = 'c', long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// 输出目录（默认当前目录）
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// 要导出成员的 Bitbucket workspace
    #[arg(short = 'w', long)]
    pub workspace: String,

    /// 凭据文件（默认 ~/bitbucket-credentials）
    #[arg(short = 'c', long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,
}
