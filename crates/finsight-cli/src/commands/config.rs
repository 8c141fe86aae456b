//! Effective configuration display

use anyhow::Result;
use finsight_core::config::default_config_path;
use finsight_core::{AIBackend, AIClient, Config};

pub fn cmd_config(config: &Config) -> Result<()> {
    println!("⚙️  Finsight configuration");
    println!("   Data directory: {}", config.data_dir().display());
    match default_config_path() {
        Some(path) if path.exists() => println!("   Config file: {}", path.display()),
        Some(path) => println!("   Config file: {} (not present, using defaults)", path.display()),
        None => println!("   Config file: (no platform data directory)"),
    }
    match AIClient::from_config(&config.ai) {
        Some(client) => println!(
            "   AI backend: {} at {} (model: {})",
            client.backend_name(),
            client.host(),
            client.model()
        ),
        None => println!("   AI backend: not configured"),
    }
    println!();
    print!("{}", config.to_display_toml()?);

    Ok(())
}
