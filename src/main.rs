mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use passrot::error::JsonError;

const LOG_ENV: &str = "PASSROT_LOG";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let result = match &cli.command {
        Commands::Init {
            generate_keyfile,
            passphrase,
        } => cli::init::run(passphrase.clone(), generate_keyfile.clone()),

        Commands::Item { command } => cli::item::run(command, json),

        Commands::Rotate => cli::rotate::run(json),

        Commands::Schedule { command } => cli::schedule::run(command, json),

        Commands::Daemon { poll } => cli::daemon::run(*poll),

        Commands::Audit { command } => cli::audit::run(command, json),

        Commands::Config { command } => cli::config::run(command),
    };

    if let Err(e) = result {
        if json {
            let body = JsonError::from_error(&e);
            match serde_json::to_string(&body) {
                Ok(s) => eprintln!("{}", s),
                Err(_) => eprintln!("Error: {}", e),
            }
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(e.exit_code());
    }
}
