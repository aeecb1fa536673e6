use passrot::config::Config;
use passrot::error::{PassrotError, Result};
use passrot::store;

use crate::cli::ConfigCommands;

pub fn run(cmd: &ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(),
    }
}

fn show() -> Result<()> {
    let config = Config::load(&store::config_path()?)?;
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| PassrotError::Other(format!("Config serialize error: {}", e)))?;
    println!("{}", toml_str);
    Ok(())
}
