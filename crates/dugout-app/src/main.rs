// Roster manager entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (log to file, stdout carries command output)
// 3. Load config
// 4. Open database
// 5. Run the command

use anyhow::Context;
use clap::Parser;
use dugout_app::cli::Cli;
use dugout_app::commands::App;
use dugout_baseball::store::TeamStore;
use dugout_core::config;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;
    info!("dugout starting: {:?}", cli.command);

    let (base_dir, config) = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded from {}: league={}, active limit {}",
        base_dir.display(),
        config.league.name,
        config.league.roster.active_limit
    );

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => base_dir.join(&config.db_path),
    };
    let db_path = db_path.to_string_lossy().into_owned();
    let store = TeamStore::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    let app = App::new(base_dir, config, store);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app.run(cli.command, &mut out)
}

/// Initialize tracing to log to a file so stdout stays clean for output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("dugout.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dugout=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
