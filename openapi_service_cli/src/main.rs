mod commands;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use openapi_service::StaticSchema;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "openapi-call")]
#[command(about = "Call the operations of a JSON operation catalogue")]
struct Cli {
    /// Path to the operation catalogue (JSON)
    #[arg(long, global = true, default_value = "catalogue.json")]
    schema: PathBuf,

    /// Output format for listings: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call one operation and print the resulting resource
    Call(commands::call::CallArgs),
    /// List the operations of the catalogue
    Operations,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("openapi_service=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    let schema = load_schema(&cli.schema)?;

    match &cli.command {
        Commands::Call(args) => commands::call::run(args, schema).await?,
        Commands::Operations => commands::operations::run(&schema, &format),
    }

    Ok(())
}

fn load_schema(path: &Path) -> Result<StaticSchema> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalogue {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse catalogue {}", path.display()))
}
