//! Admin Notify CLI
//!
//! 轮询管理员通知，在终端显示新通知并标记已读

use admin_notify::notification::{ConsoleAlerts, Muted, TerminalBell, UnavailableAlerts};
use admin_notify::{
    AlertCapability, CredentialStore, JsonFileStore, MemoryStore, NotificationId,
    NotificationPoller, PollerConfig, SoundCue, SyncState,
};
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "adnotify")]
#[command(about = "Admin Notify - 轮询管理员通知并触发本地提醒")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/admin-notify/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// 直接指定 bearer token（不读取凭据文件）
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 持续轮询并在终端显示新通知（Ctrl+C 停止）
    Watch {
        /// 轮询间隔（秒），覆盖配置
        #[arg(long, short)]
        interval: Option<u64>,
        /// 不显示本地提醒
        #[arg(long)]
        no_alerts: bool,
        /// 不响铃
        #[arg(long)]
        mute: bool,
    },
    /// 轮询一次并输出结果
    Check {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 标记一条通知为已读
    Read {
        /// 通知 ID
        id: String,
    },
    /// 标记所有通知为已读
    ReadAll,
}

fn load_config(path: Option<&PathBuf>) -> Result<PollerConfig> {
    match path {
        Some(path) => Ok(PollerConfig::load(path)?.with_env_overrides()),
        None => PollerConfig::auto_load(),
    }
}

fn credentials(token: Option<String>) -> Arc<dyn CredentialStore> {
    match token {
        Some(token) => Arc::new(MemoryStore::new().with("token", token)),
        None => Arc::new(JsonFileStore::default()),
    }
}

fn print_state(state: &SyncState) {
    println!("未读: {} / 共 {} 条", state.unread_count, state.notifications.len());
    for item in &state.notifications {
        let mark = if item.read { " " } else { "●" };
        println!("  {} [{}] {} - {}", mark, item.id, item.title, item.body);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("admin_notify=info,adnotify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    let credentials = credentials(cli.token);

    match cli.command {
        Commands::Watch { interval, no_alerts, mute } => {
            if let Some(secs) = interval {
                config.poll_interval_secs = secs.max(1);
            }
            let alerts: Arc<dyn AlertCapability> = if no_alerts {
                Arc::new(UnavailableAlerts)
            } else {
                Arc::new(ConsoleAlerts::new())
            };
            let sound: Arc<dyn SoundCue> = if mute { Arc::new(Muted) } else { Arc::new(TerminalBell) };

            let mut poller = NotificationPoller::with_http(config, credentials, alerts, sound)?;
            let mut updates = poller.subscribe();
            poller.activate();
            println!("🔍 开始轮询管理员通知 (间隔: {}秒)...", poller.engine().config().poll_interval_secs);
            println!("按 Ctrl+C 停止\n");

            let mut last_unread = None;
            let mut last_error = None;
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let state = updates.borrow_and_update().clone();
                        if state.is_loading {
                            continue;
                        }
                        if last_unread != Some(state.unread_count) && state.last_checked.is_some() {
                            println!("📬 未读通知: {}", state.unread_count);
                            last_unread = Some(state.unread_count);
                        }
                        let message = state.error.as_ref().map(|e| e.message.clone());
                        if message.is_some() && message != last_error {
                            eprintln!("⚠️  {}", message.as_deref().unwrap_or_default());
                        }
                        last_error = message;
                    }
                }
            }

            poller.deactivate();
            info!("Polling stopped");
        }
        Commands::Check { json } => {
            let poller = NotificationPoller::with_http(
                config,
                credentials,
                Arc::new(UnavailableAlerts),
                Arc::new(Muted),
            )?;
            poller.refresh().await;

            if let Some(error) = poller.error() {
                if json {
                    println!("{}", serde_json::to_string_pretty(&error)?);
                }
                return Err(anyhow!(error.message));
            }

            let state = poller.state();
            if json {
                println!("{}", serde_json::to_string_pretty(&state)?);
            } else {
                print_state(&state);
            }
        }
        Commands::Read { id } => {
            let poller = NotificationPoller::with_http(
                config,
                credentials,
                Arc::new(UnavailableAlerts),
                Arc::new(Muted),
            )?;
            poller.refresh().await;
            if let Some(error) = poller.error() {
                return Err(anyhow!(error.message));
            }

            let id = NotificationId::new(id);
            if !poller.mark_as_read(&id).await {
                return Err(anyhow!("标记失败: {}", id));
            }
            println!("✅ 已标记为已读: {}", id);
        }
        Commands::ReadAll => {
            let poller = NotificationPoller::with_http(
                config,
                credentials,
                Arc::new(UnavailableAlerts),
                Arc::new(Muted),
            )?;
            poller.refresh().await;
            if let Some(error) = poller.error() {
                return Err(anyhow!(error.message));
            }

            let pending = poller.state().unread().count();
            poller.mark_all_as_read().await;
            println!("✅ 已标记 {} 条通知为已读", pending);
        }
    }

    Ok(())
}
