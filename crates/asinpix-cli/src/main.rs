mod download;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::download::DownloadArgs;

#[derive(Debug, Parser)]
#[command(name = "asinpix")]
#[command(about = "Download product gallery images from regional Amazon storefronts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every identifier's gallery on the selected storefronts and save the images
    Download {
        /// Text file with one identifier (ASIN) per line
        #[arg(long, short)]
        input: PathBuf,

        /// Base directory; one `images_<suffix>` subdirectory is created per storefront
        #[arg(long, short)]
        output: PathBuf,

        /// Storefront domain suffix or label (e.g. `com`, `co.uk`); repeatable
        #[arg(long = "storefront", short = 's', value_name = "KEY")]
        storefronts: Vec<String>,

        /// Select every storefront in the catalog
        #[arg(long, conflicts_with = "storefronts")]
        all_storefronts: bool,

        /// Identifiers processed at once (overrides ASINPIX_MAX_CONCURRENT_JOBS)
        #[arg(long, value_parser = parse_concurrency)]
        concurrency: Option<usize>,

        /// Gallery extraction strategy
        #[arg(long, value_enum, default_value_t = ExtractorKind::Regex)]
        extractor: ExtractorKind,

        /// Print the run summary as JSON on stdout; progress goes to stderr
        #[arg(long)]
        json: bool,
    },
    /// List the storefronts that can be selected
    Storefronts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ExtractorKind {
    /// Pattern-match gallery entries on the default image host
    Regex,
    /// Parse the gallery payload as JSON
    Json,
}

fn parse_concurrency(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Also loads `.env`.
    let config = asinpix_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Download {
            input,
            output,
            storefronts,
            all_storefronts,
            concurrency,
            extractor,
            json,
        }) => {
            let args = DownloadArgs {
                input,
                output,
                storefronts,
                all_storefronts,
                concurrency,
                extractor,
                json,
            };
            download::run_download(&config, args).await
        }
        Some(Commands::Storefronts) => {
            for line in report::catalog_lines() {
                println!("{line}");
            }
            Ok(())
        }
        None => {
            println!("asinpix: run `asinpix --help` for usage");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;
