//! fetch-user command - look a user up over an anonymous bind

use super::CommandContext;
use anyhow::Result;
use verity_auth::build_authenticator;
use verity_core::types::AuthenticatedIdentity;

pub async fn execute(ctx: &CommandContext, identifier: &str) -> Result<bool> {
    let authenticator = build_authenticator(&ctx.config.directory).await?;

    match authenticator.fetch_user(identifier).await {
        Some(identity) => {
            if ctx.is_json() {
                println!("{}", serde_json::to_string_pretty(&identity)?);
            } else {
                print!("{}", render(&identity));
            }
            Ok(true)
        }
        None => {
            if ctx.is_json() {
                println!("null");
            } else {
                println!("{}: not found", identifier);
            }
            Ok(false)
        }
    }
}

fn render(identity: &AuthenticatedIdentity) -> String {
    format!(
        "{}\n  Display name: {}\n  Group: {}\n  Auth method: {}\n",
        identity.identifier, identity.display_name, identity.group, identity.auth_method
    )
}
