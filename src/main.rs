//! Binary entrypoint for the Incarnadine CLI.
//!
//! Commands:
//! - `start` - run the engine with a local terminal session attached
//! - `init` - create a starter `config.toml`
//! - `status` - print store statistics and the leaderboard
//! - `passwd <player>` - interactively reset a player's password (argon2 hashed)
//!
//! The bundled `start` transport is a single stdin/stdout session for local
//! play and smoke testing; networked transports embed the library crate and
//! drive [`incarnadine::game::Dispatcher`] themselves.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use incarnadine::config::Config;
use incarnadine::game::{
    DispatchOutcome, Dispatcher, Engine, Envelope, EventBus, PlayerStore, Scope,
};

#[derive(Parser)]
#[command(name = "incarnadine")]
#[command(about = "A multi-user dungeon engine for the Castle of 144,000 Doors")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine with a local terminal session
    Start,
    /// Initialize a new configuration file
    Init,
    /// Show store statistics and the leaderboard
    Status,
    /// Set or reset a player's password
    Passwd {
        /// Registered player name
        player: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Start => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting Incarnadine v{}", env!("CARGO_PKG_VERSION"));
            run_server(config).await?;
        }
        Commands::Init => {
            info!("Initializing new configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let store = PlayerStore::open(&config.storage.data_dir)?;
            println!("{}", config.server.name);
            println!("Registered players: {}", store.player_count());
            let top = store.top_players(10)?;
            if !top.is_empty() {
                println!("--- Top players ---");
                for (i, record) in top.iter().enumerate() {
                    println!(
                        "{}. {} - Lvl {} ({} XP) | {}g",
                        i + 1,
                        record.username,
                        record.level,
                        record.xp,
                        record.gold
                    );
                }
            }
        }
        Commands::Passwd { player } => {
            let config = match pre_config {
                Some(config) => config,
                None => Config::load(&cli.config).await?,
            };
            let store = PlayerStore::open(&config.storage.data_dir)?;
            let mut record = store.get_player(&player)?;
            println!("Setting password for '{}'.", record.username);
            let pass1 = rpassword::prompt_password("New password: ")?;
            if pass1.len() < 4 {
                println!("Error: password too short (min 4).");
                return Ok(());
            }
            let pass2 = rpassword::prompt_password("Confirm password: ")?;
            if pass1 != pass2 {
                println!("Error: passwords do not match.");
                return Ok(());
            }
            record.password_hash = incarnadine::game::hash_password(&pass1)?;
            store.put_player(record)?;
            println!("Password updated successfully.");
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    let store = PlayerStore::open(&config.storage.data_dir)?;
    let (bus, mut outbox) = EventBus::new();
    let engine = Engine::new(&config, store, bus)?;
    let _background = engine.start_background_tasks();
    let dispatcher = Dispatcher::new(engine.clone());

    let session_id = engine.connect().await?;
    info!("local session attached: {}", session_id);

    // Render events addressed to the local session.
    let printer_engine = engine.clone();
    let printer_sid = session_id.clone();
    let printer = tokio::spawn(async move {
        while let Some(envelope) = outbox.recv().await {
            if deliver_locally(&printer_engine, &printer_sid, &envelope).await {
                println!("{}", envelope.event.render());
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match dispatcher.dispatch(&session_id, &line).await {
            Ok(DispatchOutcome::Disconnect) => break,
            Ok(DispatchOutcome::Continue) => {}
            Err(e) => warn!("dispatch error: {}", e),
        }
    }
    engine.disconnect(&session_id).await?;
    printer.abort();
    info!("shutdown complete");
    Ok(())
}

/// Scope resolution for the single local session: does this envelope reach it?
async fn deliver_locally(engine: &Engine, session_id: &str, envelope: &Envelope) -> bool {
    match &envelope.scope {
        Scope::Session(sid) => sid == session_id,
        Scope::Broadcast => true,
        Scope::Room { room_id, exclude } => {
            if exclude.iter().any(|sid| sid == session_id) {
                return false;
            }
            let Some(session) = engine.sessions.get(session_id).await else {
                return false;
            };
            let player = session.player.lock().await;
            player.location == *room_id
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level.
    let level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    if let Some(file) = config.as_ref().and_then(|c| c.logging.file.clone()) {
        if let Ok(f) = std::fs::OpenOptions::new().create(true).append(true).open(&file) {
            let sink = std::sync::Mutex::new(f);
            builder.format(move |_, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                if let Ok(mut guard) = sink.lock() {
                    let _ = writeln!(guard, "{} [{}] {}", ts, record.level(), record.args());
                }
                Ok(())
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
