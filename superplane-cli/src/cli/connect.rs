//! `superplane connect`

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use superplane_core::command::{Command, CommandContext};
use superplane_core::config::{normalize_base_url, ConfigContext};
use superplane_core::CliError;

/// Validates a token against a server and saves the organization as the current context.
pub struct ConnectCommand {
    pub base_url: String,
    pub api_token: String,
}

/// Connection summary; never carries the token.
#[derive(Debug, Serialize)]
struct Connected<'a> {
    organization: &'a str,
    url: &'a str,
}

#[async_trait]
impl Command for ConnectCommand {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let base_url = normalize_base_url(&self.base_url);
        let api_token = self.api_token.trim();
        if base_url.is_empty() {
            return Err(CliError::validation("base URL is required").into());
        }
        if api_token.is_empty() {
            return Err(CliError::validation("API token is required").into());
        }

        let api = ctx.connect(&base_url, api_token)?;
        let me = api
            .me()
            .await
            .context("failed to authenticate with the provided token")?;

        let organization_id = me
            .organization_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CliError::not_found("organization id not found for authenticated user"))?;

        let organization = api
            .describe_organization(organization_id)
            .await
            .with_context(|| format!("failed to describe organization {}", organization_id))?
            .organization;

        let saved = ctx.store()?.upsert_context(ConfigContext::new(
            base_url,
            organization.metadata.name,
            api_token,
        ))?;
        tracing::info!(context = %saved.selector(), "connected");

        let summary = Connected {
            organization: &saved.organization,
            url: &saved.url,
        };
        if ctx.renderer.is_text() {
            ctx.renderer.render_text(|out| {
                writeln!(out, "Connected to {:?} ({})", summary.organization, summary.url)
            })?;
        } else {
            ctx.renderer.render(&summary)?;
        }

        Ok(())
    }
}
