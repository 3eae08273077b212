mod search;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::search::{FilterArgs, PositionArgs};

#[derive(Debug, Parser)]
#[command(name = "carefind")]
#[command(about = "Find nearby healthcare facilities and triage symptoms")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for healthcare facilities near a position
    Find {
        #[command(flatten)]
        position: PositionArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Classify symptom text without searching
    Classify {
        /// Free-text symptom description
        text: String,
        /// Locale tag for keywords and advice (en, hi, es)
        #[arg(long, default_value = "en")]
        locale: String,
    },
    /// Classify symptoms, then search for facilities that fit them
    Triage {
        /// Free-text symptom description
        text: String,
        /// Locale tag for keywords and advice (en, hi, es)
        #[arg(long, default_value = "en")]
        locale: String,
        #[command(flatten)]
        position: PositionArgs,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Print the current position
    Locate {
        #[command(flatten)]
        position: PositionArgs,
        /// Keep watching and print this many position updates
        #[arg(long)]
        watch: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = carefind_core::load_engine_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Find { position, filters } => {
            search::run_find(config, &position, &filters).await?;
        }
        Commands::Classify { text, locale } => search::run_classify(&config, &text, &locale)?,
        Commands::Triage {
            text,
            locale,
            position,
            filters,
        } => search::run_triage(config, &text, &locale, &position, &filters).await?,
        Commands::Locate { position, watch } => {
            search::run_locate(config, &position, watch).await?;
        }
    }

    Ok(())
}
