use clap::{CommandFactory, Parser};
use std::process;
use transcript_reconciler::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    // Without a subcommand, show help and exit cleanly
    if args.command.is_none() {
        if let Err(e) = Args::command().print_help() {
            eprintln!("Failed to print help: {}", e);
            process::exit(1);
        }
        println!();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    // Import watches for Ctrl-C itself so the open run is never committed
    let result = runtime.block_on(commands::run(args));

    match result {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", anyhow::Error::from(error));
            process::exit(1);
        }
    }
}
