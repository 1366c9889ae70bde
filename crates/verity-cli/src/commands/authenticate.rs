//! authenticate command - check a user's credentials

use super::CommandContext;
use anyhow::{Context, Result};
use std::io::BufRead;
use verity_auth::build_authenticator;

pub async fn execute(ctx: &CommandContext, identifier: &str, password: Option<String>) -> Result<bool> {
    let password = match password {
        Some(password) => password,
        None => read_password(std::io::stdin().lock())?,
    };

    let authenticator = build_authenticator(&ctx.config.directory).await?;

    match authenticator.authenticate(identifier, &password).await {
        Some(verdict) => {
            if ctx.is_json() {
                println!("{}", serde_json::to_string_pretty(&verdict)?);
            } else {
                println!("{}: authenticated", verdict.identifier);
                println!("  Display name: {}", verdict.display_name);
                println!("  Group: {}", verdict.group);
            }
            Ok(true)
        }
        None => {
            if ctx.is_json() {
                println!("null");
            } else {
                println!("{}: no verdict", identifier);
            }
            Ok(false)
        }
    }
}

/// First line of `input`, without the line ending
fn read_password(mut input: impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
