//! Strata CLI — command-line front end for the optimizer bridge.
//!
//! `strata map` reads a JSON design, runs the flatten → optimize → splice
//! pipeline against an external combinational optimizer, and writes the
//! mapped design back out. `strata reint` is the decoupled second phase:
//! it re-derives the flattened state and splices results from the work
//! directories a previous `strata map --no-reint` run left behind.

#![warn(missing_docs)]

mod map;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

const SCRIPT_HELP: &str = "\
Default scripts (--fast variants in parentheses):

  library:  strash; ifraig; scorr; dc2; dretime; strash; &get -n; &dch -f;
            &nf {D}; &put
            (strash; dretime; map {D})
  + constr: ... followed by: buffer; upsize {D}; dnsize {D}; stime -p
  LUT:      strash; ifraig; scorr; dc2; dretime; strash; dch -f; if; mfs2
            (strash; dretime; if)
  SOP:      strash; ifraig; scorr; dc2; dretime; strash; dch -f;
            cover {I} {P}
            (strash; dretime; cover {I} {P})

{D}, {I}, {P}, {S} expand from --delay, --sop-inputs, --sop-products, and
--lut-shared. With a delay target, every `dretime` also retimes:
`dretime; retime -o {D}`.";

/// Strata — bridge a gate-level design to an external combinational
/// optimizer.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata optimizer bridge")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Map a design through the external optimizer.
    Map(Box<MapArgs>),
    /// Reintegrate results from an earlier `map --no-reint` run.
    Reint(ReintArgs),
}

/// Arguments for the `strata map` subcommand.
#[derive(Parser, Debug)]
#[command(after_help = SCRIPT_HELP)]
pub struct MapArgs {
    /// Input design (JSON).
    pub design: PathBuf,

    /// Output path for the mapped design (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Optimizer executable name or path.
    #[arg(long, default_value = "abc")]
    pub exe: String,

    /// Script override: a file path, or `+cmd,cmd` inline commands.
    #[arg(long)]
    pub script: Option<String>,

    /// Liberty library file (repeatable).
    #[arg(long)]
    pub liberty: Vec<PathBuf>,

    /// Genlib library file (repeatable).
    #[arg(long)]
    pub genlib: Vec<PathBuf>,

    /// Timing constraints file (requires a library).
    #[arg(long)]
    pub constr: Option<PathBuf>,

    /// Delay target for the mapped circuit.
    #[arg(short = 'D', long)]
    pub delay: Option<u32>,

    /// Maximum inputs per sum-of-products cover.
    #[arg(short = 'I', long)]
    pub sop_inputs: Option<u32>,

    /// Maximum products per sum-of-products cover.
    #[arg(short = 'P', long)]
    pub sop_products: Option<u32>,

    /// Shared LUT inputs for `lutpack`.
    #[arg(short = 'S', long)]
    pub lut_shared: Option<u32>,

    /// Map to LUTs: width `W`, or `W1:W2` with doubling costs above `W1`.
    #[arg(long, conflicts_with_all = ["liberty", "genlib"])]
    pub lut: Option<String>,

    /// Map to LUTs with an explicit cost list (`cost,cost,size:cost,...`).
    #[arg(long, conflicts_with_all = ["lut", "liberty", "genlib"])]
    pub luts: Option<String>,

    /// Map to sum-of-products covers.
    #[arg(long)]
    pub sop: bool,

    /// Gate set for the generated library: names and aliases (simple,
    /// cmos2, cmos3, cmos4, cmos, gates, aig, all), `-NAME` removes.
    #[arg(long)]
    pub gates: Option<String>,

    /// Use the fast single-pass scripts.
    #[arg(long)]
    pub fast: bool,

    /// Map flip-flops too, partitioning each module into clock domains.
    #[arg(long)]
    pub dff: bool,

    /// Restrict flip-flop mapping to one domain: `[!]clk[,[!]en]`.
    #[arg(long, default_value = "")]
    pub clk: String,

    /// Mark flip-flop output wires with the keep attribute.
    #[arg(long)]
    pub keepff: bool,

    /// Append the name-reconciliation command to the script.
    #[arg(long)]
    pub dress: bool,

    /// Offer a 4-to-1 mux in the generated library.
    #[arg(long)]
    pub mux4: bool,

    /// Offer an 8-to-1 mux in the generated library.
    #[arg(long)]
    pub mux8: bool,

    /// Offer a 16-to-1 mux in the generated library.
    #[arg(long)]
    pub mux16: bool,

    /// Root directory for per-pass work directories.
    #[arg(long, default_value = "strata_work")]
    pub work_dir: PathBuf,

    /// Show work-directory paths in relayed optimizer output.
    #[arg(long)]
    pub show_tempdir: bool,

    /// Run the optimizer but skip splicing results back; a later
    /// `strata reint` picks up the work directories.
    #[arg(long)]
    pub no_reint: bool,
}

/// Arguments for the `strata reint` subcommand.
#[derive(Parser, Debug)]
pub struct ReintArgs {
    /// Input design (JSON) — the same design the map phase was given.
    pub design: PathBuf,

    /// Output path for the mapped design (stdout if omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Liberty library file (repeatable); must match the map phase.
    #[arg(long)]
    pub liberty: Vec<PathBuf>,

    /// Genlib library file (repeatable); must match the map phase.
    #[arg(long)]
    pub genlib: Vec<PathBuf>,

    /// Map flip-flops too; must match the map phase.
    #[arg(long)]
    pub dff: bool,

    /// Clock domain restriction; must match the map phase.
    #[arg(long, default_value = "")]
    pub clk: String,

    /// Keep flip-flop output wires; must match the map phase.
    #[arg(long)]
    pub keepff: bool,

    /// Root directory holding the map phase's work directories.
    #[arg(long, default_value = "strata_work")]
    pub work_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let result = match cli.command {
        Command::Map(ref args) => map::run(args),
        Command::Reint(ref args) => map::run_reint(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_map_defaults() {
        let cli = Cli::parse_from(["strata", "map", "design.json"]);
        match cli.command {
            Command::Map(args) => {
                assert_eq!(args.exe, "abc");
                assert!(!args.dff);
                assert!(args.clk.is_empty());
                assert_eq!(args.work_dir, PathBuf::from("strata_work"));
                assert!(!args.no_reint);
            }
            _ => panic!("expected map command"),
        }
    }

    #[test]
    fn parse_map_lut_and_clock() {
        let cli = Cli::parse_from([
            "strata", "map", "design.json", "--lut", "2:6", "--clk", "!clk,en", "--fast",
        ]);
        match cli.command {
            Command::Map(args) => {
                assert_eq!(args.lut.as_deref(), Some("2:6"));
                assert_eq!(args.clk, "!clk,en");
                assert!(args.fast);
            }
            _ => panic!("expected map command"),
        }
    }

    #[test]
    fn lut_conflicts_with_library() {
        let result = Cli::try_parse_from([
            "strata", "map", "design.json", "--lut", "4", "--liberty", "cells.lib",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_reint() {
        let cli = Cli::parse_from([
            "strata", "reint", "design.json", "--dff", "--work-dir", "out/work", "--liberty",
            "cells.lib",
        ]);
        match cli.command {
            Command::Reint(args) => {
                assert!(args.dff);
                assert_eq!(args.work_dir, PathBuf::from("out/work"));
                assert_eq!(args.liberty, [PathBuf::from("cells.lib")]);
            }
            _ => panic!("expected reint command"),
        }
    }
}
