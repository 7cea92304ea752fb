use clap::Parser;
use repo_batch::cli::Args;
use repo_batch::commands;
use repo_batch::config::RuntimeEnv;
use repo_batch::infrastructure::{setup_logging, LoggingConfig};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    // 先加载 .env，RUST_LOG 也可以写在里面
    let runtime = RuntimeEnv::new();

    let logging = LoggingConfig::default()
        .with_verbosity(args.verbose)
        .with_format(args.log_format);
    if let Err(e) = setup_logging(logging) {
        eprintln!("日志初始化失败: {}", e);
    }

    // 配置或凭据错误在修改任何仓库之前返回，这里统一以非零状态退出
    if let Err(e) = commands::route_command(&args, &runtime).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
