//! idpake CLI - enrollment and key-exchange tools for CHIP, CRISP and OPAQUE

#![forbid(unsafe_code)]

mod cli;
mod commands;
mod exit_codes;
mod logging;
mod timing;

use clap::Parser;
use cli::{ChipCommand, Cli, Commands, CrispCommand, OpaqueCommand};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.quiet) {
        eprintln!("failed to initialize logging: {}", e);
        std::process::exit(exit_codes::ERROR);
    }

    let result = match cli.command {
        Commands::Chip(ChipCommand::Enroll(args)) => commands::chip::enroll(args),
        Commands::Chip(ChipCommand::Exchange(args)) => commands::chip::exchange(args).await,
        Commands::Crisp(CrispCommand::Enroll(args)) => commands::crisp::enroll(args),
        Commands::Crisp(CrispCommand::Exchange(args)) => commands::crisp::exchange(args).await,
        Commands::Opaque(OpaqueCommand::Enroll(args)) => commands::opaque::enroll(args),
        Commands::Opaque(OpaqueCommand::Client(args)) => commands::opaque::client(args).await,
        Commands::Opaque(OpaqueCommand::Server(args)) => commands::opaque::server(args).await,
    };

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("error: {:#}", e);
            std::process::exit(exit_codes::for_error(&e));
        }
    }
}
