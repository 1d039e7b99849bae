use anyhow::Result;

use dns_manager::infrastructure::config::{Config, ConfigStore};

use super::GlobalArgs;

/// Write a config file from the defaults and the connection flags given.
pub fn execute(args: &GlobalArgs, force: bool) -> Result<()> {
    let store = match &args.config {
        Some(path) => ConfigStore::at(path),
        None => ConfigStore::new()?,
    };

    if store.path().exists() && !force {
        println!("Config file already exists: {}", store.path().display());
        println!("\nRun with --force to overwrite it.");
        return Ok(());
    }

    let mut config = Config::default();
    if let Some(host) = &args.host {
        config.connection.host = Some(host.clone());
    }
    if let Some(user) = &args.user {
        config.connection.user = user.clone();
    }
    if let Some(port) = args.port {
        config.connection.port = port;
    }
    if let Some(identity) = &args.identity {
        config.connection.identity_file = Some(identity.clone());
    }

    store.save(&config)?;
    println!("Created config file: {}", store.path().display());
    if config.connection.host.is_none() {
        println!("\nSet connection.host in it, or pass --host to each command.");
    }
    Ok(())
}
