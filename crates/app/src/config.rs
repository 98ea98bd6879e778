//! Configuration for the huffc command-line tool.
//!
//! Arguments are parsed with clap and resolved into a `Config`. Every
//! resolved value can be printed with `--print-config`, including the seed
//! chosen for `sample` when none was given, so runs are reproducible.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

/// Lossless text compression with Huffman coding.
#[derive(Debug, Parser)]
#[command(name = "huffc", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: Level,

    /// Print resolved configuration
    #[arg(long, global = true)]
    pub print_config: bool,

    /// Don't print the metrics summary
    #[arg(long, global = true)]
    pub no_metrics: bool,

    /// How to print metrics
    #[arg(long, global = true, value_enum, default_value_t = MetricsFormat::Summary)]
    pub metrics_format: MetricsFormat,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compress a UTF-8 text file
    Encode {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "encoded_file")]
        output: PathBuf,

        /// Decode the result in memory and compare checksums
        #[arg(long)]
        verify: bool,
    },

    /// Restore a file produced by `encode`
    Decode {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "decoded_file")]
        output: PathBuf,
    },

    /// Write a reproducible sample text file
    Sample {
        /// Output file
        #[arg(short, long, default_value = "sample.txt")]
        output: PathBuf,

        /// Size in bytes
        #[arg(long, default_value_t = 65536)]
        size: usize,

        /// Random seed (default: time-based, printed with --print-config)
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Output style for run metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MetricsFormat {
    /// Human-readable report
    Summary,
    /// `key=value` lines, one per metric
    Text,
}

/// What a run does, with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Encode {
        input: PathBuf,
        output: PathBuf,
        verify: bool,
    },
    Decode {
        input: PathBuf,
        output: PathBuf,
    },
    Sample {
        output: PathBuf,
        size: usize,
        seed: u64,
    },
}

/// Complete configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub task: Task,

    // === Behavior ===
    pub log_level: Level,

    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,

    pub metrics_format: MetricsFormat,

    /// Suppress status lines and summaries
    pub quiet: bool,
}

impl Config {
    /// Resolve parsed arguments into a configuration.
    pub fn from_cli(cli: Cli) -> Self {
        let task = match cli.command {
            Command::Encode {
                input,
                output,
                verify,
            } => Task::Encode {
                input,
                output,
                verify,
            },
            Command::Decode { input, output } => Task::Decode { input, output },
            Command::Sample { output, size, seed } => Task::Sample {
                output,
                size,
                seed: seed.unwrap_or_else(time_seed),
            },
        };

        Config {
            task,
            log_level: cli.log_level,
            print_config: cli.print_config,
            print_metrics: !cli.no_metrics,
            metrics_format: cli.metrics_format,
            quiet: cli.quiet,
        }
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.task {
            Task::Encode {
                input,
                output,
                verify,
            } => {
                println!("Command:     encode");
                println!("Input file:  {}", input.display());
                println!("Output file: {}", output.display());
                println!("Verify:      {verify}");
            }
            Task::Decode { input, output } => {
                println!("Command:     decode");
                println!("Input file:  {}", input.display());
                println!("Output file: {}", output.display());
            }
            Task::Sample { output, size, seed } => {
                println!("Command:     sample");
                println!("Output file: {}", output.display());
                println!("Size:        {size} bytes ({} KiB)", size / 1024);
                println!("Seed:        {seed}");
            }
        }
        println!("Log level:   {}", self.log_level);
        println!("Metrics:     {} ({:?})", self.print_metrics, self.metrics_format);
        println!();
    }
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
