use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use waypoint::commands::{CommandRegistry, CommandResult, SessionInfo};
use waypoint::config::{Config, KNOWN_KEYS, Settings};
use waypoint::console::{self, BannerInfo, print_banner, print_session_summary};
use waypoint::consts::default_db_path;
use waypoint::events::EventBus;
use waypoint::logging;
use waypoint::nav::{self, HistoryPolicy, Navigator};
use waypoint::store::SessionStore;
use waypoint::store::sqlite::SqliteStore;

#[derive(Parser)]
#[command(
    name = "waypoint",
    version,
    about = "Drive the navigation state machine from a console."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// SQLite database for config and saved sessions (use :memory: for ephemeral)
    #[arg(short, long)]
    db: Option<String>,

    /// History policy for repeated navigation: dedup or append
    #[arg(short, long)]
    policy: Option<HistoryPolicy>,

    /// Session name to restore and save
    #[arg(short, long)]
    session: Option<String>,

    /// Tracing filter, overrides RUST_LOG
    #[arg(long)]
    log_filter: Option<String>,

    /// Write logs to daily files in this directory instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Neither restore nor save the session
    #[arg(long, default_value_t = false)]
    no_autosave: bool,

    /// Run `;`-separated console commands and exit (non-interactive)
    #[arg(short, long)]
    run: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Show or change a stored setting
    Config {
        /// Setting name
        key: Option<String>,
        /// New value; omit to show the current one
        value: Option<String>,
    },
    /// Delete a saved session
    Forget {
        /// Session name
        session: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logging = logging::init(cli.log_filter.as_deref(), cli.log_dir.as_deref())?;

    let db = match &cli.db {
        Some(db) => db.clone(),
        None => {
            let path = default_db_path()?;
            ensure_parent(&path)?;
            path.to_string_lossy().into_owned()
        }
    };
    let config = Config::open(&db)?;

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Command::Config { key, value } => {
                handle_config(&config, key.as_deref(), value.as_deref())
            }
            Command::Forget { session } => handle_forget(&db, session).await,
        };
    }

    let mut settings = Settings::load(&config)?;
    if let Some(policy) = cli.policy {
        settings.history_policy = policy;
    }
    if let Some(session) = cli.session {
        settings.session = session;
    }
    if cli.no_autosave {
        settings.autosave = false;
    }

    let bus = EventBus::new();
    let navigator = Rc::new(RefCell::new(Navigator::new(settings.history_policy)));
    nav::attach(&bus, &navigator)?;
    console::attach(&bus)?;

    let store = SqliteStore::new(&db)?;

    let db_label = if db == ":memory:" { "ephemeral" } else { &db };
    print_banner(&BannerInfo {
        database: db_label,
        session: &settings.session,
        policy: &settings.history_policy.to_string(),
        autosave: settings.autosave,
    });

    if settings.autosave {
        match store.load(&settings.session).await {
            Ok(Some(snapshot)) if snapshot.is_empty() => {
                tracing::debug!(session = %settings.session, "saved session has no contexts");
            }
            Ok(Some(snapshot)) => {
                let events = navigator.borrow_mut().restore(snapshot);
                for event in &events {
                    bus.dispatch(event);
                }
            }
            Ok(None) => tracing::debug!(session = %settings.session, "nothing to restore"),
            Err(e) => eprintln!("warning: could not restore session: {e:#}"),
        }
    }

    let registry = CommandRegistry::new();
    let info = SessionInfo {
        bus: &bus,
        navigator: &navigator,
        store: Some(&store),
        session: &settings.session,
    };

    // Scripted mode
    if let Some(script) = &cli.run {
        for line in script.split(';').map(str::trim).filter(|l| !l.is_empty()) {
            println!("waypoint> {line}");
            match registry.dispatch(line, &info).await {
                CommandResult::Quit => break,
                CommandResult::NotACommand => eprintln!("  unknown command: {line}"),
                CommandResult::Handled => {}
            }
        }
    } else {
        repl(&registry, &info).await?;
    }

    if settings.autosave {
        let snapshot = navigator.borrow().snapshot();
        if let Err(e) = store.save(&settings.session, &snapshot).await {
            eprintln!("warning: could not save session: {e:#}");
        }
    }

    print_session_summary(&bus, &navigator);
    Ok(())
}

/// Async stdin so Ctrl+C is caught at the prompt too.
async fn repl(registry: &CommandRegistry, info: &SessionInfo<'_>) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("\nwaypoint> ");
        io::stdout().flush()?;

        let line = tokio::select! {
            result = lines.next_line() => {
                match result {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        // Ctrl+D (EOF)
                        println!();
                        break;
                    }
                    Err(e) => {
                        eprintln!("input error: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match registry.dispatch(input, info).await {
            CommandResult::Quit => break,
            CommandResult::NotACommand => {
                eprintln!("  unknown command: {input} (try `help`)");
            }
            CommandResult::Handled => {}
        }
    }
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn handle_config(config: &Config, key: Option<&str>, value: Option<&str>) -> anyhow::Result<()> {
    match (key, value) {
        (None, _) => {
            for key in KNOWN_KEYS {
                let value = config.get(key)?.unwrap_or_else(|| "(default)".to_string());
                println!("{key} = {value}");
            }
        }
        (Some(key), None) => {
            anyhow::ensure!(
                KNOWN_KEYS.contains(&key),
                "unknown config key {key:?} (known: {})",
                KNOWN_KEYS.join(", ")
            );
            match config.get(key)? {
                Some(value) => println!("{key} = {value}"),
                None => println!("{key} is not set"),
            }
        }
        (Some(key), Some(value)) => {
            Settings::check(key, value)?;
            config.set(key, value)?;
            println!("✓ {key} = {value}");
        }
    }
    Ok(())
}

async fn handle_forget(db: &str, session: &str) -> anyhow::Result<()> {
    let store = SqliteStore::new(db)?;
    if store.remove(session).await? {
        println!("✓ forgot session {session:?}");
    } else {
        println!("no saved session {session:?}");
    }
    Ok(())
}
