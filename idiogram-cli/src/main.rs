use anyhow::Result;
use clap::{Parser, Subcommand};
use idiogram_core::{GenomicPos, IdiogramConfig};
use std::path::PathBuf;

mod commands;
mod error;
mod input;

use commands::render::ViewArgs;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "idiogram")]
#[command(about = "Chromosome idiogram layout and coordinate engine")]
#[command(version)]
#[command(long_about = "
Builds a genome from a cytoband table, resolves genomic coordinates and lays
out idiogram geometry (bands, arm clips, centromeres, highlights) as JSON.

Examples:
  idiogram genome --bands cytoBand.txt
  idiogram position --bands cytoBand.txt 150000000 1600000000
  idiogram position --bands cytoBand.txt --chromosome chr7 5000000
  idiogram render --bands cytoBand.txt --highlight 'chr1 100000 chr1 2000000' --zoom-range chr1
  idiogram config --example > idiogram.toml
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the chromosomes built from a band table
    Genome {
        /// Band table (UCSC cytoBand text, or a .json array of rows)
        #[arg(long, required = true)]
        bands: PathBuf,

        /// Include band names for each chromosome
        #[arg(long)]
        with_bands: bool,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Resolve base pairs to chromosome positions
    Position {
        /// Band table (UCSC cytoBand text, or a .json array of rows)
        #[arg(long, required = true)]
        bands: PathBuf,

        /// Treat positions as relative to this chromosome
        #[arg(long)]
        chromosome: Option<String>,

        /// Base pairs to resolve
        #[arg(allow_negative_numbers = true)]
        positions: Vec<GenomicPos>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Lay out the idiogram and print frame geometry
    Render {
        /// Band table (UCSC cytoBand text, or a .json array of rows)
        #[arg(long, required = true)]
        bands: PathBuf,

        /// Range to highlight, e.g. 'chr1', 'chr1 p36.33', 'chr1 100 chr2 200' (repeatable)
        #[arg(long)]
        highlight: Vec<String>,

        /// Highlight color
        #[arg(long)]
        color: Option<String>,

        /// Highlight opacity in [0, 1]
        #[arg(long)]
        opacity: Option<f64>,

        /// Fit this range to the plot width
        #[arg(long)]
        zoom_range: Option<String>,

        /// Zoom factor
        #[arg(long)]
        zoom: Option<f64>,

        /// Base pair held fixed while zooming (viewport centre if omitted)
        #[arg(long, requires = "zoom")]
        pivot: Option<f64>,

        /// Pan by this many whole base pairs (positive moves the view left)
        #[arg(long, allow_negative_numbers = true)]
        pan: Option<f64>,

        /// Simulate clicks at these plot x coordinates and report positions
        #[arg(long)]
        click: Vec<f64>,

        /// Total drawing width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or generate configuration
    Config {
        /// Print an example configuration file
        #[arg(long)]
        example: bool,

        /// Save the effective configuration to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) -> Result<()> {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet)?;

    let config = IdiogramConfig::load(cli.config.as_deref()).map_err(CliError::from)?;

    match cli.command {
        Commands::Genome {
            bands,
            with_bands,
            out,
        } => {
            commands::genome::execute(bands, with_bands, out)?;
        }

        Commands::Position {
            bands,
            chromosome,
            positions,
            out,
        } => {
            commands::position::execute(&config, bands, chromosome, positions, out)?;
        }

        Commands::Render {
            bands,
            highlight,
            color,
            opacity,
            zoom_range,
            zoom,
            pivot,
            pan,
            click,
            width,
            out,
        } => {
            let config = match width {
                Some(width) => config.with_width(width),
                None => config,
            };
            config.validate().map_err(CliError::from)?;
            let view = ViewArgs {
                zoom_range,
                zoom,
                pivot,
                pan,
                clicks: click,
            };
            commands::render::execute(&config, bands, highlight, color, opacity, view, out)?;
        }

        Commands::Config { example, save } => {
            commands::config::execute(&config, example, save)?;
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<CliError>() {
            Some(cli_err) => {
                log::debug!("{:#}", err);
                print_error_and_exit(cli_err)
            }
            None => {
                eprintln!("Error: {:#}", err);
                std::process::exit(1);
            }
        }
    }
}
