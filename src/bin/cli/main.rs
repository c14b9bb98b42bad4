//! CLI tool for inspecting and patching binary files with hexlay.

mod commands;
mod exit_codes;
mod output;
mod progress;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use commands::{EditArg, parse_edit, parse_offset};
use exit_codes::ExitCode;
use hexlay::config::DEFAULT_MAX_CHUNK_SIZE;

/// Inspect, search and patch binary files in place
#[derive(Parser)]
#[command(name = "hexlay")]
#[command(author, version, about = "Inspect, search and patch binary files in place", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Edit overlay strategy
    #[arg(long, value_enum, default_value = "log", env = "HEXLAY_OVERLAY", global = true)]
    overlay: OverlayArg,

    /// Maximum bytes moved by a single read or write
    #[arg(long, default_value_t = DEFAULT_MAX_CHUNK_SIZE, env = "HEXLAY_CHUNK_SIZE", global = true)]
    chunk_size: usize,

    /// Byte order for multi-byte values
    #[arg(long, value_enum, default_value = "big", env = "HEXLAY_ENDIAN", global = true)]
    endian: EndianArg,

    /// Reject ranges whose start is after their end instead of swapping them
    #[arg(long, env = "HEXLAY_STRICT_RANGES", global = true)]
    strict_ranges: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a hex dump of part of a file (alias: d)
    #[command(alias = "d")]
    Dump {
        /// File to read
        file: PathBuf,

        /// Offset to start at (decimal or 0x-prefixed hex)
        #[arg(short = 's', long, default_value = "0", value_parser = parse_offset)]
        offset: u64,

        /// Number of bytes to show
        #[arg(short = 'n', long, default_value = "256")]
        length: usize,

        /// Bytes per row
        #[arg(short = 'w', long, default_value = "16")]
        width: usize,
    },

    /// Show the bytes at an offset as every numeric type (alias: i)
    #[command(alias = "i")]
    Inspect {
        /// File to read
        file: PathBuf,

        /// Offset to decode (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_offset)]
        offset: u64,
    },

    /// Find every occurrence of a string or byte pattern (alias: s)
    #[command(alias = "s")]
    Search {
        /// File to search
        file: PathBuf,

        /// Text to find, or hex bytes with --hex
        pattern: String,

        /// Treat the pattern as hex bytes such as "DE AD BE EF"
        #[arg(short = 'x', long)]
        hex: bool,

        /// Ignore ASCII case in text patterns
        #[arg(short = 'i', long, conflicts_with = "hex")]
        ignore_case: bool,

        /// Stop after this many matches
        #[arg(short = 'l', long)]
        limit: Option<usize>,
    },

    /// Patch bytes in place (alias: e)
    ///
    /// Each edit is OFFSET=HEX to write bytes starting at OFFSET, or
    /// START..END=HH to fill an inclusive range with one byte.
    #[command(alias = "e")]
    Edit {
        /// File to modify
        file: PathBuf,

        /// Edits to apply, in order
        #[arg(required = true, value_parser = parse_edit)]
        edits: Vec<EditArg>,

        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,

        /// Skip compacting pending edits before saving
        #[arg(long)]
        no_optimize: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OverlayArg {
    Log,
    Map,
}

impl From<OverlayArg> for hexlay::OverlayKind {
    fn from(arg: OverlayArg) -> Self {
        match arg {
            OverlayArg::Log => hexlay::OverlayKind::Log,
            OverlayArg::Map => hexlay::OverlayKind::Map,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum EndianArg {
    Big,
    Little,
}

impl From<EndianArg> for hexlay::Endian {
    fn from(arg: EndianArg) -> Self {
        match arg {
            EndianArg::Big => hexlay::Endian::Big,
            EndianArg::Little => hexlay::Endian::Little,
        }
    }
}

fn main() {
    // Set up Ctrl+C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let cli = Cli::parse();

    let config = commands::build_config(
        cli.overlay.into(),
        cli.chunk_size,
        cli.endian.into(),
        cli.strict_ranges,
    );

    let exit_code = match cli.command {
        Commands::Dump {
            file,
            offset,
            length,
            width,
        } => commands::dump(&file, config, offset, length, width, cli.format),

        Commands::Inspect { file, offset } => {
            commands::inspect(&file, config, offset, cli.format)
        }

        Commands::Search {
            file,
            pattern,
            hex,
            ignore_case,
            limit,
        } => commands::search(
            &commands::SearchConfig {
                path: &file,
                pattern: &pattern,
                hex,
                ignore_case,
                limit,
                format: cli.format,
            },
            config,
        ),

        Commands::Edit {
            file,
            edits,
            yes,
            no_optimize,
        } => commands::edit(
            &commands::EditConfig {
                path: &file,
                edits: &edits,
                yes,
                optimize: !no_optimize,
                format: cli.format,
                quiet: cli.quiet,
            },
            config,
        ),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
