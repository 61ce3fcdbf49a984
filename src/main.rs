mod archive;
mod cli;
mod commands;
mod error;
mod mcp;
mod naming;
mod pdf;
mod plan;
mod split;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, ModeArgs};
use plan::PartitionRequest;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Split {
            path,
            pages_per_split,
            output,
        } => {
            let request = PartitionRequest::FixedSize {
                page_size: pages_per_split,
            };
            commands::split::run(&path, &request, output.as_deref())?;
        }
        Commands::SplitAt {
            path,
            cut_points,
            output,
        } => {
            let request = PartitionRequest::Boundaries { cut_points };
            commands::split::run(&path, &request, output.as_deref())?;
        }
        Commands::SplitRanges {
            path,
            parts,
            output,
        } => {
            let items = commands::split::read_parts(&parts)?;
            let request = PartitionRequest::NamedRanges { items };
            commands::split::run(&path, &request, output.as_deref())?;
        }
        Commands::Ranges { path, mode } => {
            let request = request_from_mode(mode)?;
            commands::ranges::run(&path, &request)?;
        }
    }

    Ok(())
}

// Logs go to stderr; stdout carries command output and the MCP transport.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn request_from_mode(mode: ModeArgs) -> Result<PartitionRequest> {
    let request = match (mode.pages_per_split, mode.cut_points, mode.parts) {
        (Some(page_size), _, _) => PartitionRequest::FixedSize { page_size },
        (_, Some(cut_points), _) => PartitionRequest::Boundaries { cut_points },
        (_, _, Some(parts)) => PartitionRequest::NamedRanges {
            items: commands::split::read_parts(&parts)?,
        },
        (None, None, None) => anyhow::bail!("No split mode given"),
    };
    Ok(request)
}
