//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use chrono::Local;

use crate::artifact::ArtifactLocator;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::notify::{ConsoleMessenger, Messenger, TelegramMessenger};
use crate::orchestrator::{CycleReport, CycleTarget, Orchestrator};
use crate::registry::{Device, DeviceRegistry};
use crate::schedule::{self, ScheduleStore};
use crate::session::{BackupExecutor, SshBackupClient};

use super::args::{ArtifactAction, Cli, Command, DeviceAction, HistoryAction, ScheduleAction};
use super::errors::CliResult;

/// Dispatches one parsed invocation.
pub async fn dispatch(cli: Cli) -> CliResult<()> {
    if let Command::Init = cli.command {
        return init(&cli.config);
    }

    let config = Config::load(&cli.config)?;
    match cli.command {
        Command::Init => unreachable!("handled above"),
        Command::Run { device, scheduled } => run_cycle(&config, device, scheduled).await,
        Command::Serve => serve(&config).await,
        Command::Device { action } => device_command(&config, action).await,
        Command::Artifact { action } => artifact_command(&config, action),
        Command::History { action } => history_command(&config, action),
        Command::Schedule { action } => schedule_command(&config, action).await,
    }
}

fn init(path: &Path) -> CliResult<()> {
    Config::write_default(path)?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}

fn build_messenger(config: &Config) -> Arc<dyn Messenger> {
    match &config.telegram_token {
        Some(token) => Arc::new(TelegramMessenger::new(token.clone())),
        None => Arc::new(ConsoleMessenger),
    }
}

fn build_orchestrator(config: &Config) -> Arc<Orchestrator> {
    let executor: Arc<dyn BackupExecutor> = Arc::new(SshBackupClient::new(
        config.backup_dir.clone(),
        config.connect_timeout(),
    ));
    Arc::new(Orchestrator::new(
        Arc::new(DeviceRegistry::open(&config.data_dir)),
        Arc::new(HistoryStore::open(&config.data_dir)),
        executor,
        build_messenger(config),
        config.chat_id,
        config.failure_alert_threshold,
    ))
}

async fn run_cycle(config: &Config, device: Option<String>, scheduled: bool) -> CliResult<()> {
    let orchestrator = build_orchestrator(config);
    let target = match device {
        Some(name) => CycleTarget::Device(name),
        None => CycleTarget::All,
    };

    match orchestrator.run_cycle(target, scheduled).await? {
        CycleReport::NoDevices => println!("no devices registered"),
        CycleReport::UnknownDevice(name) => println!("device '{name}' is not registered"),
        CycleReport::Completed(summary) => {
            for outcome in &summary.outcomes {
                if outcome.success {
                    let delivery = if outcome.delivery_errors.is_empty() {
                        String::new()
                    } else {
                        format!(" (delivery: {})", outcome.delivery_errors.join("; "))
                    };
                    println!("{}: ok{delivery}", outcome.name);
                } else {
                    println!(
                        "{}: failed - {}",
                        outcome.name,
                        outcome.error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
            println!(
                "backup finished: {} succeeded, {} failed",
                summary.success, summary.failed
            );
        }
    }
    Ok(())
}

async fn serve(config: &Config) -> CliResult<()> {
    let orchestrator = build_orchestrator(config);
    let store = Arc::new(ScheduleStore::open(&config.data_dir));
    schedule::run_scheduler(orchestrator, store, config.default_schedule.clone()).await?;
    Ok(())
}

async fn device_command(config: &Config, action: DeviceAction) -> CliResult<()> {
    let registry = DeviceRegistry::open(&config.data_dir);

    match action {
        DeviceAction::Add {
            name,
            host,
            username,
            password,
            port,
        } => {
            let device = registry
                .add(Device {
                    name,
                    host,
                    username,
                    password,
                    port,
                })
                .await?;
            println!("registered '{}' ({}:{})", device.name, device.host, device.port);
        }
        DeviceAction::Remove { name } => {
            let device = registry.remove(&name).await?;
            println!("removed '{}'", device.name);
        }
        DeviceAction::List => {
            let devices = registry.list()?;
            if devices.is_empty() {
                println!("no devices registered");
            }
            for device in devices {
                println!(
                    "{}\t{}:{}\t{}",
                    device.name, device.host, device.port, device.username
                );
            }
        }
        DeviceAction::Test { name } => {
            let Some(device) = registry.find(&name)? else {
                println!("device '{name}' is not registered");
                return Ok(());
            };
            let client =
                SshBackupClient::new(config.backup_dir.clone(), config.connect_timeout());
            match client.test_connection(&device).await {
                Ok(()) => println!("{}: reachable", device.name),
                Err(e) => println!("{}: {}", device.name, e),
            }
        }
    }
    Ok(())
}

fn artifact_command(config: &Config, action: ArtifactAction) -> CliResult<()> {
    let locator = ArtifactLocator::new(config.backup_dir.clone());

    match action {
        ArtifactAction::List { device } => {
            let files = locator.list(device.as_deref())?;
            if files.is_empty() {
                println!("no artifacts found");
            }
            for file in files {
                println!(
                    "{}\t{}\t{} bytes",
                    file.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    file.path.display(),
                    file.size
                );
            }
        }
        ArtifactAction::Delete { path } => {
            for deleted in locator.delete_pair(&path)? {
                println!("deleted {}", deleted.display());
            }
        }
    }
    Ok(())
}

fn history_command(config: &Config, action: HistoryAction) -> CliResult<()> {
    let history = HistoryStore::open(&config.data_dir);

    match action {
        HistoryAction::List { limit } => {
            let records = history.list()?;
            if records.is_empty() {
                println!("no runs recorded");
            }
            for record in records.iter().take(limit) {
                let trigger = if record.triggered_by_schedule {
                    "scheduled"
                } else {
                    "manual"
                };
                let success = record.routers.iter().filter(|r| r.success).count();
                println!(
                    "{}\t{}\t{} ok / {} failed",
                    record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    trigger,
                    success,
                    record.routers.len() - success
                );
            }
        }
        HistoryAction::Stats { device } => match device {
            Some(name) => {
                let stats = history.stats_for_device(&name)?;
                println!("runs: {}", stats.total);
                println!("success: {} ({:.0}%)", stats.success, stats.success_rate * 100.0);
                println!("failed: {}", stats.failed);
                println!("consecutive failures: {}", stats.consecutive_failures);
                match stats.last_successful_run {
                    Some(t) => println!("last success: {}", t.format("%Y-%m-%d %H:%M:%S")),
                    None => println!("last success: never"),
                }
            }
            None => {
                let stats = history.stats_overall()?;
                println!("runs: {}", stats.total_runs);
                println!("device backups: {}", stats.total);
                println!("success: {} ({:.0}%)", stats.success, stats.success_rate * 100.0);
                println!("failed: {}", stats.failed);
            }
        },
    }
    Ok(())
}

async fn schedule_command(config: &Config, action: ScheduleAction) -> CliResult<()> {
    let store = ScheduleStore::open(&config.data_dir);

    match action {
        ScheduleAction::Show => {
            let effective = store.effective(&config.default_schedule)?;
            let origin = match store.get()? {
                Some(_) => "override",
                None => "default",
            };
            println!("schedule: {effective} ({origin})");
            match schedule::next_fire_time(&effective, Local::now())? {
                Some(next) => println!("next run: {}", next.format("%Y-%m-%d %H:%M:%S")),
                None => println!("next run: never"),
            }
        }
        ScheduleAction::Set { expression } => {
            store.set(&expression).await?;
            println!("schedule override set to '{}'", expression.trim());
        }
        ScheduleAction::Clear => {
            store.clear().await?;
            println!("schedule override cleared, using '{}'", config.default_schedule);
        }
    }
    Ok(())
}
