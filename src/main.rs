use std::time::Duration;

use aetronics_bot::bot::supervisor::wait_for_shutdown;
use aetronics_bot::client::console::stdin_input;
use aetronics_bot::{health, AppContext, BotConfig, ConsoleClientFactory, SessionArtifact, Supervisor};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::sync::watch;

/// WhatsApp auto-responder for the Aetronics support menu.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Port of the health server.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Path to the JSON session file.
    #[arg(long, default_value = "./session.json")]
    session_file: String,

    /// Device name shown on the phone.
    #[arg(long, default_value = "aetronics-bot")]
    device_name: String,

    /// Pause before and after the typing indicator, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    typing_delay_ms: u64,

    /// Wait before restarting after a disconnect, in seconds.
    #[arg(long, default_value_t = 5)]
    reconnect_delay_secs: u64,

    /// Wait before retrying a failed start, in seconds.
    #[arg(long, default_value_t = 10)]
    init_retry_delay_secs: u64,

    /// Give up after this many restarts. Retries forever when omitted.
    #[arg(long)]
    max_restarts: Option<u32>,

    /// URL to ping periodically so the host keeps the process alive.
    #[arg(long, env = "KEEPALIVE_URL")]
    keepalive_url: Option<String>,

    /// Seconds between keep-alive pings.
    #[arg(long, default_value_t = 300)]
    keepalive_interval_secs: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bot (default).
    Run,
    /// Forget the stored session so the next run asks for a new QR scan.
    Logout,
    /// Print the effective configuration.
    ShowConfig,
}

impl Cli {
    fn config(&self) -> BotConfig {
        let mut config = BotConfig::default()
            .with_port(self.port)
            .with_session_path(self.session_file.clone())
            .with_device_name(self.device_name.clone())
            .with_typing_delay(Duration::from_millis(self.typing_delay_ms))
            .with_reconnect_delay(Duration::from_secs(self.reconnect_delay_secs))
            .with_init_retry_delay(Duration::from_secs(self.init_retry_delay_secs))
            .with_max_restarts(self.max_restarts);

        if let Some(url) = &self.keepalive_url {
            config = config.with_keepalive(
                url.clone(),
                Duration::from_secs(self.keepalive_interval_secs),
            );
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let config = cli.config();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let code = match run(config).await {
                Ok(()) => 0,
                Err(e) => {
                    error!("Bot stopped: {}", e);
                    1
                }
            };
            // The stdin reader holds a blocking thread the runtime would wait on.
            std::process::exit(code);
        }
        Commands::Logout => {
            SessionArtifact::remove(&config.session_path)?;
            println!("Session removed: {}", config.session_path);
        }
        Commands::ShowConfig => {
            println!("Config: {:?}", config);
            match SessionArtifact::load(&config.session_path)? {
                Some(artifact) => println!(
                    "Session: linked to {} since {}",
                    artifact.jid, artifact.linked_at
                ),
                None => println!("Session: not linked"),
            }
        }
    }

    Ok(())
}

async fn run(config: BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("🚀 Bot iniciado, aguardando conexão com WhatsApp...");

    let ctx = AppContext::new(config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        info!("Ctrl-C received, shutting down");
        let _ = shutdown_tx.send(true);
    });

    let mut server_shutdown = shutdown_rx.clone();
    let server = tokio::spawn(health::serve(ctx.clone(), async move {
        wait_for_shutdown(&mut server_shutdown).await;
    }));

    let keepalive = ctx
        .config
        .keepalive_url
        .clone()
        .map(|url| health::spawn_keepalive(url, ctx.config.keepalive_interval()));

    let factory = ConsoleClientFactory::new(
        ctx.config.session_path.clone(),
        ctx.config.device_name.clone(),
        stdin_input(),
    );
    let outcome = Supervisor::new(factory, ctx.clone(), shutdown_rx).run().await;

    if let Some(handle) = keepalive {
        handle.abort();
    }
    server.abort();
    match server.await {
        Ok(Err(e)) => error!("Health server stopped: {}", e),
        Ok(Ok(())) | Err(_) => {}
    }

    outcome?;
    Ok(())
}
