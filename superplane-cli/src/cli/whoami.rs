//! `superplane whoami`

use anyhow::Result;
use async_trait::async_trait;
use superplane_core::command::{Command, CommandContext};

pub struct WhoamiCommand;

#[async_trait]
impl Command for WhoamiCommand {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let me = ctx.api()?.me().await?;

        if ctx.renderer.is_text() {
            ctx.renderer.render_text(|out| {
                writeln!(out, "ID: {}", me.id)?;
                writeln!(out, "Email: {}", me.email)?;
                writeln!(
                    out,
                    "Organization: {}",
                    me.organization_id.as_deref().unwrap_or("")
                )
            })?;
        } else {
            ctx.renderer.render(&me)?;
        }

        Ok(())
    }
}
