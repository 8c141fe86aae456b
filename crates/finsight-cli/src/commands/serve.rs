//! Server command implementation

use anyhow::Result;
use finsight_core::Config;
use finsight_server::ServerConfig;

use super::open_store;

/// Server settings for `serve`; `--no-auth` wins over configured keys
pub fn server_config(config: &Config, no_auth: bool) -> ServerConfig {
    let mut server_config = ServerConfig::from_config(config);
    if no_auth {
        server_config.require_auth = false;
    }
    server_config
}

pub async fn cmd_serve(config: &Config, no_auth: bool) -> Result<()> {
    let data_dir = config.data_dir();
    let server_config = server_config(config, no_auth);

    println!("🚀 Starting Finsight web server...");
    println!("   Data: {}", data_dir.display());
    println!(
        "   Listening: http://{}:{}",
        config.server.host, config.server.port
    );

    if !server_config.require_auth {
        println!();
        if no_auth {
            println!("   ⚠️  Authentication DISABLED - do not expose to network!");
        } else {
            println!("   ⚠️  No API keys configured (FINSIGHT_API_KEYS) - authentication is off");
        }
    } else {
        println!(
            "   🔑 API keys: {} configured (FINSIGHT_API_KEYS)",
            server_config.api_keys.len()
        );
    }
    if !server_config.allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {}",
            server_config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let store = open_store(config)?;
    finsight_server::serve(store, config, server_config).await?;

    Ok(())
}
