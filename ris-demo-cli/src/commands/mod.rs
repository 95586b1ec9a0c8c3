//! Command implementations

pub mod config;
pub mod inquiry;
pub mod khash;
pub mod update;

use anyhow::{Context, Result};
use ris_lib::{Response, RisClient, RisConfig};

use crate::ui;

/// Build a client from `RIS_*` environment variables.
pub fn load_client() -> Result<RisClient> {
    let config = RisConfig::from_env().context("Failed to load RIS configuration")?;
    let client = RisClient::new(config).context("Failed to create RIS client")?;
    tracing::debug!(mode = client.mode().name(), "Loaded RIS client");
    Ok(client)
}

/// Print a response as a summary or as JSON.
pub fn print_response(response: &Response, json: bool) -> Result<()> {
    if json {
        ui::json(&serde_json::to_value(response.fields())?);
        return Ok(());
    }

    ui::section("RIS Response");
    if let Some(code) = response.auto() {
        ui::decision(code);
    }
    let summary = [
        ("Mode", response.mode()),
        ("Transaction", response.transaction_id()),
        ("Session", response.session_id()),
        ("Score", response.score()),
        ("Omniscore", response.omniscore()),
        ("Reason", response.reason_code()),
    ];
    for (label, value) in summary {
        if let Some(value) = value {
            ui::field(label, value);
        }
    }

    let rules = response.rules_triggered();
    if !rules.is_empty() {
        ui::section("Rules Triggered");
        for rule in &rules {
            ui::field(&rule.id, &rule.description);
        }
    }

    for warning in response.warnings() {
        ui::reported("WARNING", &warning);
    }
    for error in response.errors() {
        ui::reported("ERROR", &error);
    }
    Ok(())
}
