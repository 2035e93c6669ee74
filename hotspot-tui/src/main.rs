/*!
 * Hotspot Connector
 * Join a Wi-Fi network by name and passphrase from the terminal
 */

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use hotspot_core::config::AppConfig;
use hotspot_core::network_info::fetch_connected_wifi_info;
use hotspot_core::platform::{
    CaptiveNetwork, HotspotConfigurationManager, MockPlatform, NetworkManagerPlatform,
};
use hotspot_core::ConnectScreen;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::time::{interval, Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod ui;

use app::App;
use ui::render_ui;

#[derive(Parser)]
#[command(name = "hotspot")]
#[command(about = "Join a Wi-Fi hotspot by name and passphrase")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "/etc/hotspot-connector/hotspot.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Use the simulated platform instead of NetworkManager
    #[arg(long)]
    mock: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the connect screen
    Connect,
    /// Print what the platform reports about the current network
    Info {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

type Platform = (Arc<dyn HotspotConfigurationManager>, Arc<dyn CaptiveNetwork>);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;

    match cli.command.unwrap_or(Commands::Connect) {
        Commands::Connect => {
            let log = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("opening log file {}", config.log_file.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(cli.debug))
                .with_writer(Mutex::new(log))
                .with_ansi(false)
                .init();

            let platform = platform(cli.mock, &config).await?;
            run_screen(platform).await
        }
        Commands::Info { json } => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(cli.debug))
                .with_writer(io::stderr)
                .init();

            let platform = platform(cli.mock, &config).await?;
            print_info(platform, json).await
        }
    }
}

fn env_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hotspot={level},hotspot_core={level}")))
}

async fn platform(mock: bool, config: &AppConfig) -> Result<Platform> {
    if mock {
        info!("Using the simulated platform");
        let platform = Arc::new(MockPlatform::demo());
        let pair: Platform = (platform.clone(), platform);
        return Ok(pair);
    }

    let platform = Arc::new(
        NetworkManagerPlatform::new(config.network_manager.clone())
            .await
            .context("connecting to NetworkManager")?,
    );
    let pair: Platform = (platform.clone(), platform);
    Ok(pair)
}

async fn run_screen((manager, network): Platform) -> Result<()> {
    info!("Hotspot Connector starting");

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(ConnectScreen::new(manager, network));

    // Create ticker for UI updates
    let mut ticker = interval(Duration::from_millis(100));

    let result: Result<()> = async {
        while !app.should_quit {
            while event::poll(Duration::from_millis(0))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key);
                    }
                }
            }

            ticker.tick().await;
            app.on_tick();

            terminal.draw(|f| render_ui(f, &app))?;
        }
        Ok(())
    }
    .await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Hotspot Connector closed");
    result
}

async fn print_info((_, network): Platform, json: bool) -> Result<()> {
    let Some(info) = fetch_connected_wifi_info(network.as_ref()).await else {
        if json {
            println!("null");
        } else {
            println!("Not associated with a wireless network");
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        for (key, value) in info.iter() {
            println!("{key} {value}");
        }
    }
    Ok(())
}
