//! show-config command - print the effective configuration

use super::CommandContext;
use anyhow::{Context, Result};
use verity_core::VerityConfig;

pub fn execute(ctx: &CommandContext) -> Result<bool> {
    let rendered = if ctx.is_json() {
        serde_json::to_string_pretty(&ctx.config)?
    } else {
        render_toml(&ctx.config)?
    };
    println!("{}", rendered);

    if let Err(e) = ctx.config.directory.validate() {
        eprintln!("warning: {}", e);
        return Ok(false);
    }
    Ok(true)
}

fn render_toml(config: &VerityConfig) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render configuration")
}
