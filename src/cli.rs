use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::plan::DEFAULT_PAGES_PER_SPLIT;

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(about = "Split a PDF into parts packed in a ZIP archive, with MCP server support")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Split into chunks of a fixed number of pages
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Pages per output file
        #[arg(
            short = 'n',
            long,
            env = "PDFSPLIT_PAGES_PER_SPLIT",
            default_value_t = DEFAULT_PAGES_PER_SPLIT
        )]
        pages_per_split: u32,

        /// Archive file or directory (default: <name>-split.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split between consecutive cut points (e.g. "1,10,20" gives 1-10 and 10-20)
    SplitAt {
        /// PDF file to split
        path: PathBuf,

        /// Page cut points
        #[arg(required = true, num_args = 1.., value_delimiter = ',')]
        cut_points: Vec<u32>,

        /// Archive file or directory (default: <name>-split.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Split into titled page ranges
    SplitRanges {
        /// PDF file to split
        path: PathBuf,

        /// JSON array of {title, startPage, endPage}, or @FILE to read it from a file
        #[arg(short, long)]
        parts: String,

        /// Archive file or directory (default: <name>-split.zip)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the parts a split would produce without writing anything
    Ranges {
        /// PDF file to inspect
        path: PathBuf,

        #[command(flatten)]
        mode: ModeArgs,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ModeArgs {
    /// Fixed number of pages per part
    #[arg(short = 'n', long)]
    pub pages_per_split: Option<u32>,

    /// Page cut points (e.g. "1,10,20")
    #[arg(short, long, num_args = 1.., value_delimiter = ',')]
    pub cut_points: Option<Vec<u32>>,

    /// JSON array of {title, startPage, endPage}, or @FILE
    #[arg(short, long)]
    pub parts: Option<String>,
}
