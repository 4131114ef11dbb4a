//! CPRO CLI - single-file compression with interchangeable codecs.

mod commands;

use clap::{ArgAction, Parser, Subcommand};
use cpro_container::CompressorId;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cpro")]
#[command(author, version, about = "Pure Rust compression with interchangeable codecs")]
#[command(long_about = "
CPRO compresses one file at a time into a self-describing container.
Algorithms: null, rle, huffman, lz77, deflate, bwt

Examples:
  cpro compress notes.txt notes.cpro -a bwt
  cpro decompress notes.cpro notes.txt
  cpro info notes.cpro --json
  cpro test notes.cpro
")]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file
    #[command(alias = "c")]
    Compress {
        /// File to compress
        input: PathBuf,

        /// Compressed output file
        output: PathBuf,

        /// Algorithm (null, rle, huffman, lz77, deflate, bwt)
        #[arg(short, long, default_value = "deflate")]
        algorithm: CompressorId,
    },

    /// Decompress a file
    #[command(alias = "d")]
    Decompress {
        /// Compressed file
        input: PathBuf,

        /// Decompressed output file
        output: PathBuf,
    },

    /// Show the header of a compressed file
    #[command(alias = "i")]
    Info {
        /// Compressed file to inspect
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },

    /// Verify a compressed file decodes and matches its checksum
    #[command(alias = "t")]
    Test {
        /// Compressed file to test
        file: PathBuf,
    },
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = TermLogger::init(
        log_level(cli.verbose),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    let result = match cli.command {
        Commands::Compress {
            input,
            output,
            algorithm,
        } => commands::cmd_compress(&input, &output, algorithm),
        Commands::Decompress { input, output } => commands::cmd_decompress(&input, &output),
        Commands::Info { file, json } => commands::cmd_info(&file, json),
        Commands::Test { file } => commands::cmd_test(&file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
