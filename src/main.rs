use add_basket_items::app::App;
use add_basket_items::config::Config;
use add_basket_items::models::Platform;
use add_basket_items::utils::logging;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "add_basket_items", version, about = "把购物清单自动加入超市 App 的购物篮")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// 启动 HTTP / WebSocket 服务（默认）
    Serve,
    /// 直接运行一个购物清单文件
    Run {
        /// 购物清单（TOML）
        list: PathBuf,
        /// 覆盖清单和环境变量中的平台
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// 检查 Appium 服务是否可用
    Check {
        /// 同时尝试建立该平台的设备会话
        #[arg(long)]
        device: Option<Platform>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging, Some(&config.output_log_file));

    let cli = Cli::parse();
    let app = App::initialize(config)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => app.serve().await,
        Command::Run { list, platform } => app.run_list(&list, platform).await,
        Command::Check { device } => app.check(device).await,
    }
}
