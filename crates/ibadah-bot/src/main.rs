mod adapters;
mod discussion;
mod dispatcher;
mod keyboards;
mod notifications;
mod onboarding;
mod texts;
mod worship;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use ibadah_ai::AnthropicClient;
use ibadah_api::MyQuranApi;
use ibadah_db::IbadahDb;
use ibadah_notify::Notifier;
use ibadah_telegram::types::{BotCommand, SetMyCommandsParams};
use ibadah_telegram::{TelegramApi, run_polling_loop};

use adapters::{AiMotivator, MyQuranSchedules, TelegramTransport};
use dispatcher::Bot;

#[derive(Parser)]
#[command(name = "ibadah-bot", about = "Telegram devotional assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot (long-polling until Ctrl-C)
    Run,
    /// Check configuration and database health
    Health,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run())
        }
        Commands::Health => {
            let config = ibadah_config::load_config()?;
            match config.validate() {
                Ok(()) => println!("config: ok"),
                Err(e) => println!("config: {e}"),
            }
            let db_path = config.resolve_db_path()?;
            println!("database: {}", db_path.display());
            IbadahDb::open(&db_path).context("database open failed")?;
            println!("database: ok");
            println!(
                "anthropic key: {}",
                if config.anthropic_api_key.is_some() { "set" } else { "missing (AI fallbacks active)" }
            );
            Ok(())
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ibadah_config::load_config().context("configuration load failed")?;
    config.validate()?;

    let db_path = config.resolve_db_path()?;
    let db = IbadahDb::open(&db_path)?;

    let api = Arc::new(TelegramApi::new(&config.telegram_token));
    let me = api.get_me().await.context("bot token verification failed")?;
    info!(
        bot = me.username.as_deref().unwrap_or("unknown"),
        "Telegram bot authenticated"
    );

    let quran = Arc::new(MyQuranApi::new());
    let ai = Arc::new(AnthropicClient::new(config.anthropic_api_key.clone()));

    let notifier = Notifier::new(
        db.clone(),
        Arc::new(TelegramTransport::new(api.clone())),
        Arc::new(MyQuranSchedules::new(quran.clone())),
        Arc::new(AiMotivator::new(ai.clone(), quran.clone())),
    );
    notifier.reconcile().await?;

    register_commands(&api).await;

    let bot = Arc::new(Bot::new(
        api.clone(),
        db,
        quran,
        ai,
        notifier,
        config.admin_user_id,
    ));

    let (tx, mut rx) = mpsc::channel(64);
    let cancel = CancellationToken::new();
    let poll_cancel = cancel.child_token();
    let poll_api = api.clone();
    let poller = tokio::spawn(async move {
        run_polling_loop(&poll_api, tx, poll_cancel).await;
    });

    info!("ibadah-bot running");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                cancel.cancel();
                break;
            }
            event = rx.recv() => match event {
                Some(event) => {
                    let bot = bot.clone();
                    tokio::spawn(async move { bot.dispatch(event).await });
                }
                None => break,
            }
        }
    }

    poller.await?;
    info!("ibadah-bot stopped");
    Ok(())
}

async fn register_commands(api: &TelegramApi) {
    let commands = SetMyCommandsParams {
        commands: vec![
            BotCommand {
                command: "start".into(),
                description: "Mulai / daftar".into(),
            },
            BotCommand {
                command: "notifikasi".into(),
                description: "Pengaturan notifikasi".into(),
            },
            BotCommand {
                command: "selesai".into(),
                description: "Akhiri diskusi".into(),
            },
            BotCommand {
                command: "cancel".into(),
                description: "Batalkan aksi berjalan".into(),
            },
        ],
    };
    if let Err(e) = api.set_my_commands(&commands).await {
        warn!("setMyCommands failed: {e:#}");
    }
}
