use std::path::PathBuf;

use clap::{Parser, Subcommand};
use kumiawase_core::cluster::ClusterId;
use kumiawase_core::codec::write_event_frame;
use kumiawase_core::generator::{generate_definitions, scatter, PuzzleLayout};
use kumiawase_core::geometry::{Bounds, Point};
use kumiawase_core::grid::{plan_choices, plan_grid, FALLBACK_GRID};
use kumiawase_core::input::{InputController, PointerId, Release};
use kumiawase_core::manager::ClusterManager;
use kumiawase_core::piece::PieceId;
use kumiawase_core::rules::SnapRules;
use kumiawase_core::settle::CommitStep;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod bot;

const BOT_POINTER: PointerId = PointerId(1);

#[derive(Parser)]
#[command(name = "kumiawase-cli", version, about = "Headless tools for kumiawase puzzles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists grid choices for an image size.
    Plan {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Plans only this piece count instead of the standard list.
        #[arg(long)]
        target: Option<u32>,
    },
    /// Scatters a puzzle and lets a bot solve it through the pointer API.
    Solve(bot::SolveArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            width,
            height,
            target,
        } => {
            match target {
                Some(target) => {
                    let plan = plan_grid(width, height, target).unwrap_or_else(|| {
                        warn!(width, height, target, "no grid fits, using fallback");
                        FALLBACK_GRID
                    });
                    println!("{}", plan.label());
                }
                None => {
                    let choices = plan_choices(width, height);
                    if choices.is_empty() {
                        println!("{} (fallback)", FALLBACK_GRID.label());
                    }
                    for plan in choices {
                        println!("{}", plan.label());
                    }
                }
            }
            Ok(())
        }
        Commands::Solve(args) => {
            println!("{}", bot::run(args)?);
            Ok(())
        }
    }
}

fn err_msg(message: impl Into<String>) -> Box<dyn std::error::Error> {
    let message: String = message.into();
    message.into()
}

fn parse_seed_arg(raw: &str) -> Result<u32, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    let value = if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)?
    } else {
        trimmed.parse::<u32>()?
    };
    Ok(value)
}
