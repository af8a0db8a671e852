use clap::Parser;
use luv_core::LuvError;
use std::io::Write;
use std::process::ExitCode;

mod commands;

use commands::Commands;

#[derive(Parser)]
#[command(name = "luv")]
#[command(version, about = "luv - LaTeX Universal Virtualizer", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Progress goes through `log`; info lines read as plain output.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| match record.level() {
            log::Level::Info => writeln!(buf, "{}", record.args()),
            log::Level::Warn => writeln!(buf, "Warning: {}", record.args()),
            level => writeln!(buf, "{}: {}", level, record.args()),
        })
        .init();
}

fn report_error(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<LuvError>() {
        Some(luv) => eprintln!("Error: {}", luv),
        None => eprintln!("Unexpected error: {:#}", err),
    }
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    // The signal branch is polled first so its handler is registered before
    // any command work starts.
    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nOperation cancelled.");
            // Exit without waiting for blocking tasks still running tools.
            std::process::exit(1);
        }
        result = cli.command.execute() => match result {
            Ok(code) => code,
            Err(e) => report_error(&e),
        },
    }
}
