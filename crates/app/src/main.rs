//! huffc: Huffman file compressor
//!
//! ## Usage
//!
//! ```bash
//! # Compress a text file (writes ./encoded_file)
//! huffc encode -i book.txt
//!
//! # Compress and check the result decodes back to the input
//! huffc encode -i book.txt -o book.huf --verify
//!
//! # Restore it
//! huffc decode -i book.huf -o book.txt
//!
//! # Generate reproducible test input
//! huffc sample -o sample.txt --size 1048576 --seed 7
//!
//! # Machine-readable metrics
//! huffc encode -i book.txt --metrics-format text
//! ```

mod config;
mod input_gen;

use std::process::ExitCode;

use clap::Parser;
use huffc_core::metrics::{Metrics, Operation};
use huffc_core::pipeline;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{Cli, Config, MetricsFormat, Task};

fn main() -> ExitCode {
    let config = Config::from_cli(Cli::parse());

    init_tracing(&config);

    if config.print_config && !config.quiet {
        config.print();
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr. RUST_LOG, when set, replaces `--log-level`.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {err}");
    }
}

fn run(config: &Config) -> huffc_core::Result<()> {
    match &config.task {
        Task::Encode {
            input,
            output,
            verify,
        } => {
            status(config, "Encoding...");
            status(config, &format!("Input file: {}", input.display()));
            status(config, &format!("Output file: {}", output.display()));

            let mut metrics = Metrics::new(Operation::Encode);
            let stats = pipeline::encode_file(input, output)?;
            metrics.record(&stats);

            if *verify {
                let result = pipeline::verify_file(output, &stats);
                metrics.verified = Some(result.is_ok());
                if result.is_err() {
                    metrics.complete();
                    report(config, &metrics);
                }
                result?;
            }

            metrics.complete();
            report(config, &metrics);
        }

        Task::Decode { input, output } => {
            status(config, "Decoding...");
            status(config, &format!("Input file: {}", input.display()));
            status(config, &format!("Output file: {}", output.display()));

            let mut metrics = Metrics::new(Operation::Decode);
            let stats = pipeline::decode_file(input, output)?;
            metrics.record(&stats);
            metrics.complete();
            report(config, &metrics);
        }

        Task::Sample { output, size, seed } => {
            info!(size, seed, "generating sample text");
            input_gen::write_sample_file(output, *seed, *size)?;
            status(
                config,
                &format!("Wrote {size} bytes to {} (seed {seed})", output.display()),
            );
        }
    }

    Ok(())
}

fn status(config: &Config, line: &str) {
    if !config.quiet {
        println!("{line}");
    }
}

fn report(config: &Config, metrics: &Metrics) {
    if config.quiet {
        return;
    }
    match (config.print_metrics, config.metrics_format) {
        (false, _) => metrics.print_result(),
        (true, MetricsFormat::Summary) => metrics.print_summary(),
        (true, MetricsFormat::Text) => print!("{}", metrics.export_text()),
    }
}
