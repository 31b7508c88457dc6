//! Config command implementation.

use anyhow::Result;

use shopfront_core::config::Config;

use super::{ConfigAction, ConfigArgs};

/// Run the config command.
pub fn run(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load()?;

    match args.action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(v) => println!("{}: {}", key, v),
            None => println!(
                "Unknown configuration key: {}\nKnown keys: {}",
                key,
                Config::KEYS.join(", ")
            ),
        },

        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }

        ConfigAction::Show => {
            println!();
            println!("Shopfront Configuration");
            println!("{}", "─".repeat(50));
            println!();
            println!("[api]");
            println!("  base_url = \"{}\"", config.api.base_url);
            println!("  timeout = \"{}s\"", config.api.timeout.as_secs());
            println!("  user_agent = \"{}\"", config.api.user_agent);
            println!();
            println!("[storage]");
            println!("  session_file = \"{}\"", config.session_path().display());
            println!();
            println!("[display]");
            println!("  currency_symbol = \"{}\"", config.display.currency_symbol);
            println!("  json = {}", config.display.json);
            println!();
        }

        ConfigAction::Path => {
            println!("Config:  {}", Config::config_path().display());
            println!("Session: {}", config.session_path().display());
        }

        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("Configuration reset to defaults.");
        }
    }

    Ok(())
}
