mod commands;
mod config;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::FileSettingsStore;

#[derive(Parser)]
#[command(name = "quickadd")]
#[command(about = "Redirect Google Calendar quick-add links to your own event endpoint")]
struct Cli {
    /// Log more (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where a navigation to this URL would be redirected
    Rewrite {
        /// Navigation target (e.g. a calendar.google.com/calendar/render link)
        url: String,

        /// Frame the navigation happens in (0 is the top-level frame)
        #[arg(long, default_value_t = 0)]
        frame: i64,
    },
    /// Run the chooser for an intercepted quick-add link
    Choose {
        /// The intercepted quick-add link
        url: String,

        /// Pass the link through the handoff channel instead of the page URL
        #[arg(long)]
        via_handoff: bool,
    },
    /// Show or change the redirect settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
    /// Print the event a quick-add link describes, as JSON
    Parse {
        /// Quick-add link, or a handler URL with an `original` parameter
        url: String,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Validate and save new settings
    Set {
        /// Where quick-add links are redirected (http or https URL)
        #[arg(long)]
        redirect_origin: String,

        /// Turn interception on or off (unchanged if omitted)
        #[arg(long)]
        enabled: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = Arc::new(FileSettingsStore::open_default()?);

    match cli.command {
        Commands::Rewrite { url, frame } => commands::rewrite::run(store, &url, frame).await,
        Commands::Choose { url, via_handoff } => {
            commands::choose::run(store, &url, via_handoff).await
        }
        Commands::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => commands::settings::show(store).await,
            SettingsAction::Set {
                redirect_origin,
                enabled,
            } => commands::settings::set(store, redirect_origin, enabled).await,
        },
        Commands::Parse { url } => commands::parse::run(&url),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
