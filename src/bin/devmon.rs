use clap::{Parser, Subcommand};
use devmon::{
    cli::{list, serial_monitor, ListArgs, MonitorArgs, SystemDevices},
    logging::initialize_logger,
    Config,
};
use log::{debug, LevelFilter};
use miette::Result;

#[derive(Debug, Parser)]
#[command(about, max_term_width = 100, propagate_version = true, version)]
struct Cli {
    #[command(subcommand)]
    subcommand: Commands,

    /// Verbosity of the log output
    #[arg(
        long,
        global = true,
        default_value = "info",
        env = "DEVMON_LOG_LEVEL",
        value_parser = clap::value_parser!(LevelFilter)
    )]
    log_level: LevelFilter,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List serial ports, logical devices or multicast DNS services
    List(ListArgs),
    /// Open a serial monitor session with the terminal engine
    Monitor(MonitorArgs),
}

fn main() -> Result<()> {
    miette::set_panic_hook();

    // Attempt to parse any provided command-line arguments, or print the help
    // message and terminate if the invocation is not correct.
    let cli = Cli::parse();
    initialize_logger(cli.log_level);
    debug!("{:#?}", cli.subcommand);

    // Load any user configuration, if present.
    let config = Config::load()?;

    match cli.subcommand {
        Commands::List(args) => list(args, &SystemDevices),
        Commands::Monitor(args) => serial_monitor(args, &config),
    }
}
