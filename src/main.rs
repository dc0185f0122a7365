use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::debug!("nkhdf5 {} (hdf5 support: {})", nkhdf5::version(), nkhdf5::hdf5_enabled());

    let exit_code = match cli.command {
        cli::Command::Catalog(args) => commands::catalog::execute(args),
        cli::Command::Convert(args) => commands::convert::execute(args),
        cli::Command::Concat(args) => commands::concat::execute(args),
        cli::Command::Dedup(args) => commands::dedup::execute(args),
        cli::Command::Inspect(args) => commands::inspect::execute(args),
    };

    std::process::exit(exit_code);
}
