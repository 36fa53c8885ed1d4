//! # rusty-scan
//!
//! Command-line front end for the conversion core.
//!
//! ```bash
//! # Convert instrument scans and write one CSV per dataset
//! rusty-scan convert 012345.dat 012346.dat --export out/
//!
//! # Read a trajectory, keeping every 101st frame
//! rusty-scan moldyn XDATCAR --frameskip 100
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use log::error;

use rusty_scan::config::Config;
use rusty_scan::data::Dataset;
use rusty_scan::export::write_csv_file;
use rusty_scan::trajectory::MolDyn;
use rusty_scan::workspace::Workspace;

/// Exit status for every failure, `-1` as seen by the shell.
const EXIT_FAILURE: u8 = 255;

/// rusty-scan - instrument scan and trajectory converter
#[derive(Parser)]
#[command(name = "rusty-scan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert instrument data files into per-channel datasets
    Convert {
        /// Instrument data files
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Load role settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Fail instead of guessing scan axis or counter columns
        #[arg(long)]
        strict: bool,

        /// Number of interleaved polarisation channels (overrides the file)
        #[arg(long, value_name = "N")]
        channels: Option<usize>,

        /// Write `<ident>.csv` per dataset into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Read a molecular dynamics trajectory
    Moldyn {
        /// Trajectory file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Frames to drop after each kept frame
        #[arg(short = 's', long, value_name = "N")]
        frameskip: Option<usize>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            files,
            config,
            strict,
            channels,
            export,
        } => run_convert(&files, config.as_deref(), strict, channels, export.as_deref()),
        Commands::Moldyn {
            file,
            frameskip,
            config,
        } => run_moldyn(&file, frameskip, config.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    path.map(Config::from_file).transpose().map(Option::unwrap_or_default)
}

fn run_convert(
    files: &[PathBuf],
    config: Option<&Path>,
    strict: bool,
    channels: Option<usize>,
    export: Option<&Path>,
) -> Result<()> {
    let mut roles = load_config(config)?.roles;
    roles.strict |= strict;
    if channels.is_some() {
        roles.pol_channels = channels;
    }

    let mut workspace = Workspace::new(roles);
    workspace.receive_files(files);

    for (ident, dataset) in workspace.iter() {
        print_summary(ident, dataset);
    }

    if let Some(dir) = export {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating export directory {}", dir.display()))?;
        for (ident, dataset) in workspace.iter() {
            let path = dir.join(format!("{ident}.csv"));
            write_csv_file(dataset, &path).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
    }

    if workspace.failures.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} file(s) could not be converted", workspace.failures.len())
    }
}

fn print_summary(ident: &str, dataset: &Dataset) {
    println!("{ident}: {} channel(s)", dataset.num_channels());
    for (ch, data) in dataset.channels().iter().enumerate() {
        let axes: Vec<&str> = data.axes().iter().map(|a| a.name.as_str()).collect();
        println!(
            "  channel {ch}: {} point(s), axes [{}], {} counter(s), {} monitor(s)",
            data.num_points(),
            axes.join(", "),
            data.num_counters(),
            data.num_monitors()
        );
    }
}

fn run_moldyn(file: &Path, frameskip: Option<usize>, config: Option<&Path>) -> Result<()> {
    let frameskip = frameskip
        .or(load_config(config)?.trajectory.frameskip)
        .unwrap_or(0);

    let mut mol = MolDyn::new();
    let loaded = mol.load_file(file, frameskip);

    println!("System: {}", mol.name());
    let [a, b, c] = mol.base_vectors();
    println!("Base vectors: a = {a:?}, b = {b:?}, c = {c:?}");
    for t in mol.atom_types() {
        println!("  {}: {} atom(s)", t.name, t.count);
    }

    let stats = loaded.with_context(|| {
        format!(
            "reading {} ({} frame(s) kept before the error)",
            file.display(),
            mol.frame_count()
        )
    })?;
    println!(
        "Frames: {} kept of {} read ({} line(s))",
        stats.frames_kept, stats.frames_read, stats.lines
    );
    Ok(())
}
