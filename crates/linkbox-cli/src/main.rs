//! LinkBox CLI
//!
//! Command-line interface for LinkBox - live-synced bookmark collections.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linkbox_core::Config;

mod commands;
mod output;
mod prompt;

use commands::profile::ProfileChanges;
use commands::App;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "linkbox")]
#[command(about = "LinkBox - Save, tag and find your links")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a user, or anonymously
    Login {
        /// User id to sign in as
        #[arg(required_unless_present = "anonymous")]
        uid: Option<String>,
        /// Email address for the profile
        #[arg(long, conflicts_with = "anonymous")]
        email: Option<String>,
        /// Sign in with a fresh anonymous identity
        #[arg(long, conflicts_with = "uid")]
        anonymous: bool,
    },
    /// Sign out
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// Manage links
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show session and storage status
    Status,
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Save a new link
    Add {
        /// URL to save
        url: String,
        /// Title (defaults to "Untitled")
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Tags, separated by spaces or commas
        #[arg(short, long)]
        tags: Option<String>,
        /// Mark as favorite
        #[arg(short, long)]
        favorite: bool,
    },
    /// List all links, newest first
    #[command(alias = "ls")]
    List,
    /// List the most recent links
    Recent {
        /// Number of links (defaults to recent_limit)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
    /// List favorite links
    #[command(alias = "favs")]
    Favorites,
    /// Search link titles
    Search {
        /// Text to look for in titles
        term: String,
    },
    /// Show link details
    Show {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Mark a link as favorite
    Fav {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Remove a link from favorites
    Unfav {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Delete a link
    #[command(alias = "rm")]
    Delete {
        /// Link ID (full or prefix)
        id: String,
    },
    /// Open a link in the browser
    Open {
        /// Link ID (full or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields
    Set {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        website: Option<String>,
        #[arg(long, conflicts_with = "edit_bio")]
        bio: Option<String>,
        /// Edit the bio in $EDITOR
        #[arg(long)]
        edit_bio: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, recent_limit, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work even with a broken config file
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key.clone(), value.clone(), config_path, &output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    match cli.command {
        Commands::Login {
            uid,
            email,
            anonymous,
        } => commands::session::login(&config, uid, email, anonymous, &output),
        Commands::Logout => commands::session::logout(&config, &output),
        Commands::Whoami => commands::session::whoami(&config, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
        command => {
            let app = App::open(config).await?;
            let result = run_with_app(command, &app, &output).await;
            app.close().await;
            result
        }
    }
}

async fn run_with_app(command: Commands, app: &App, output: &Output) -> Result<()> {
    match command {
        Commands::Link { command } => handle_link_command(command, app, output).await,
        Commands::Profile { command } => handle_profile_command(command, app, output).await,
        Commands::Status => commands::status::show(app, output),
        Commands::Login { .. } | Commands::Logout | Commands::Whoami | Commands::Config { .. } => {
            unreachable!() // Handled in main
        }
    }
}

async fn handle_link_command(command: LinkCommands, app: &App, output: &Output) -> Result<()> {
    match command {
        LinkCommands::Add {
            url,
            title,
            tags,
            favorite,
        } => commands::link::add(app, url, title, tags, favorite, output).await,
        LinkCommands::List => commands::link::list(app, output),
        LinkCommands::Recent { count } => commands::link::recent(app, count, output),
        LinkCommands::Favorites => commands::link::favorites(app, output),
        LinkCommands::Search { term } => commands::link::search(app, term, output),
        LinkCommands::Show { id } => commands::link::show(app, id, output),
        LinkCommands::Fav { id } => commands::link::set_favorite(app, id, true, output).await,
        LinkCommands::Unfav { id } => commands::link::set_favorite(app, id, false, output).await,
        LinkCommands::Delete { id } => commands::link::delete(app, id, output).await,
        LinkCommands::Open { id } => commands::link::open(app, id, output),
    }
}

async fn handle_profile_command(
    command: Option<ProfileCommands>,
    app: &App,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ProfileCommands::Show) | None => commands::profile::show(app, output).await,
        Some(ProfileCommands::Set {
            username,
            website,
            bio,
            edit_bio,
        }) => {
            let changes = ProfileChanges {
                username,
                website,
                bio,
                edit_bio,
            };
            commands::profile::set(app, changes, output).await
        }
    }
}

/// Initialize file logging when LINKBOX_LOG is set
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LINKBOX_LOG") else {
        return;
    };

    let log_path = config.log_path();
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "linkbox_core={},linkbox_cli={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
