//! probe command - show configured and usable directory servers

use super::CommandContext;
use anyhow::Result;
use verity_auth::{build_authenticator, PoolStatus};

pub async fn execute(ctx: &CommandContext) -> Result<bool> {
    let authenticator = build_authenticator(&ctx.config.directory).await?;
    let status = authenticator.status();

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render(&status));
    }

    Ok(!status.usable.is_empty())
}

fn render(status: &PoolStatus) -> String {
    let mut out = format!("{} ({:?})\n", status.label, status.mode);

    for server in &status.configured {
        let mark = if status.usable.contains(server) {
            "usable"
        } else {
            "unusable"
        };
        out.push_str(&format!("  {:<40} {}\n", server, mark));
    }

    out.push_str(&format!(
        "{} of {} server(s) usable\n",
        status.usable.len(),
        status.configured.len()
    ));
    if let Some(at) = status.probed_at {
        out.push_str(&format!("Probed at {}\n", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    out
}
