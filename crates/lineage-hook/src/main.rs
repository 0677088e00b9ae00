//! CLI entry point: replay a captured query's lineage through the hook.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use lineage_core::GraphBuilder;
use lineage_hook::config::load_config;
use lineage_hook::{read_query, LineageHook, SinkRegistry};

#[derive(Parser)]
#[command(name = "lineage-hook")]
#[command(about = "Build column lineage for a query and write it to the configured sinks")]
struct Cli {
    /// Query lineage document (JSON). Use `-` for stdin.
    #[arg(short, long)]
    input: String,

    /// Config file prefix (default: lineage).
    #[arg(short, long, default_value = "lineage")]
    config: String,

    /// Override the query id attached to every edge.
    #[arg(long)]
    sql_id: Option<String>,

    /// Print the built edges as JSON instead of dispatching them.
    #[arg(long)]
    print: bool,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;
    if let Some(sql_id) = cli.sql_id {
        config.sql_id = sql_id;
    }

    let query = read_query(&cli.input)?;

    if cli.print {
        let edges = GraphBuilder::new(config.sql_id.as_str()).build(&query);
        println!("{}", serde_json::to_string_pretty(&edges)?);
        return Ok(());
    }

    let registry = SinkRegistry::default();
    let hook = LineageHook::from_config(config, &registry);
    tracing::info!(sinks = hook.sinks().len(), "Lineage hook ready");

    let outcome = hook.run(&query);
    tracing::info!(outcome = ?outcome, "Lineage hook finished");
    outcome.into_result()?;

    Ok(())
}
