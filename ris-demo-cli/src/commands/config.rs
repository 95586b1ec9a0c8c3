//! Config command - show the environment configuration

use anyhow::Result;
use ris_lib::RisConfig;

use crate::ui;

pub fn run() -> Result<()> {
    let config = match RisConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            ui::fail(&e.to_string());
            ui::hint("Set RIS_URL, RIS_API_KEY and RIS_CONFIG_KEY, or the RIS_PF_* gateway settings");
            return Err(e.into());
        }
    };

    ui::section("RIS Configuration");
    if config.migration_mode_enabled {
        ui::field("Mode", "gateway (bearer token)");
        ui::field("Endpoint", &config.gateway.api_endpoint);
        ui::field("Auth endpoint", &config.gateway.auth_endpoint);
        ui::field("Client id", &config.gateway.client_id);
    } else {
        ui::field("Mode", "direct (API key)");
        ui::field("Endpoint", &config.ris_url);
    }

    config.khash()?;
    ui::ok("Configuration key verified");
    ui::field(
        "Key fingerprint",
        &config.config_key_fingerprint.to_lowercase(),
    );

    ui::section("Connection Pool");
    ui::field("Charset", if config.force_utf8 { "UTF-8" } else { "ISO-8859-1" });
    ui::field("Connect timeout", &format!("{}ms", config.pool.connect_timeout_ms));
    ui::field("Read timeout", &format!("{}ms", config.pool.read_timeout_ms));
    ui::field(
        "Connections",
        &format!(
            "{} total, {} per route",
            config.pool.max_connections, config.pool.max_connections_per_route
        ),
    );
    Ok(())
}

