//! CLI entry point for the gtd-seed bulk loader.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use gtd_core::AppConfig;
use gtd_graph::{GraphClient, MemoryStore, NodeStore};

use gtd_seed::{SeedOptions, SeedReport, Seeder};

#[derive(Parser)]
#[command(name = "gtd-seed")]
#[command(about = "Seed the GTD graph from a JSON export of the incident spreadsheet")]
struct Cli {
    /// Config file prefix (default: gtd).
    #[arg(short, long, default_value = "gtd")]
    config: String,

    /// Seed file, overriding `seed.data_file`.
    #[arg(short, long)]
    data: Option<String>,

    /// Load into a throwaway in-memory store instead of Neo4j.
    #[arg(long)]
    memory: bool,

    /// Seed even when the store already holds Targets.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    let mut options = SeedOptions::from(&config.seed).with_force(cli.force);
    if let Some(path) = cli.data {
        options = options.with_data_file(path);
    }

    let report = if cli.memory {
        seed(MemoryStore::new(), &options).await?
    } else {
        seed(GraphClient::open(&config.neo4j).await?, &options).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn seed<S>(store: S, options: &SeedOptions) -> anyhow::Result<SeedReport>
where
    S: NodeStore + Clone,
{
    Ok(Seeder::new(store).run(options).await?)
}
