mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command};
use commands::hex_utils::parse_hex_offset;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (info unless RUST_LOG says otherwise)
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("romtext=info,romtext_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = args.config.as_deref();
    match args.command {
        Command::Dump {
            rom,
            output,
            mode,
            report,
        } => commands::dump::run(&rom, &output, config, mode, report.as_deref()),
        Command::Repack {
            rom,
            text,
            output,
            free_start,
            free_end,
            report,
        } => {
            let free_start = free_start.as_deref().map(parse_hex_offset).transpose()?;
            let free_end = free_end.as_deref().map(parse_hex_offset).transpose()?;
            let options = commands::repack::RepackOptions {
                free_start,
                free_end,
                report,
            };
            commands::repack::run(&rom, &text, &output, config, &options)
        }
        Command::Hexdump {
            rom,
            offset,
            size,
            ascii,
        } => {
            let offset = parse_hex_offset(&offset)?;
            commands::hexdump::run(&rom, offset, size, ascii)
        }
        Command::Inspect { rom, offset } => {
            let offset = parse_hex_offset(&offset)?;
            commands::inspect::run(&rom, offset, config)
        }
    }
}
