//! `superplane secrets ...`
//!
//! Secrets live in the organization of the authenticated user. Values are
//! sent to the server on create and update but never printed back.

use crate::cli::output::{timestamp, write_table};
use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Subcommand;
use serde::Serialize;
use std::path::{Path, PathBuf};
use superplane_core::client::{CanvasApi, DomainScope};
use superplane_core::command::{Command, CommandContext};
use superplane_core::models::{Secret, SecretMetadata};
use superplane_core::resource::{read_resource_file, SecretResource};
use superplane_core::CliError;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SecretCommands {
    /// List secrets
    List,

    /// Show a secret's metadata and key names
    Get {
        /// Secret ID or name
        id_or_name: String,
    },

    /// Create a secret from a resource file
    Create {
        /// Secret resource file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Update a secret from a resource file
    Update {
        /// Secret resource file; metadata.id or metadata.name selects the secret
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Delete a secret
    Delete {
        /// Secret ID or name
        id_or_name: String,
    },
}

impl SecretCommands {
    pub fn into_command(self) -> (&'static str, Box<dyn Command>) {
        match self {
            SecretCommands::List => ("list", Box::new(ListSecrets)),
            SecretCommands::Get { id_or_name } => ("get", Box::new(GetSecret { id_or_name })),
            SecretCommands::Create { file } => ("create", Box::new(CreateSecret { file })),
            SecretCommands::Update { file } => ("update", Box::new(UpdateSecret { file })),
            SecretCommands::Delete { id_or_name } => {
                ("delete", Box::new(DeleteSecret { id_or_name }))
            }
        }
    }
}

/// Structured form of a secret with the values left out.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretView<'a> {
    metadata: &'a SecretMetadata,
    provider: &'a str,
    keys: Vec<String>,
}

impl<'a> From<&'a Secret> for SecretView<'a> {
    fn from(secret: &'a Secret) -> Self {
        SecretView {
            metadata: &secret.metadata,
            provider: &secret.spec.provider,
            keys: secret.key_names(),
        }
    }
}

async fn organization_scope(api: &dyn CanvasApi) -> Result<DomainScope> {
    let me = api.me().await?;
    match me.organization_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Ok(DomainScope::organization(id)),
        _ => Err(CliError::not_found("organization id not found for authenticated user").into()),
    }
}

fn load_secret_resource(path: &Path) -> Result<SecretResource> {
    let raw = read_resource_file(path)?;
    Ok(SecretResource::parse(&raw)?)
}

fn write_secret(out: &mut dyn std::io::Write, secret: &Secret) -> std::io::Result<()> {
    let metadata = &secret.metadata;
    writeln!(out, "ID: {}", secret.id())?;
    writeln!(out, "Name: {}", metadata.name)?;
    writeln!(out, "Provider: {}", secret.spec.provider)?;
    writeln!(out, "Domain type: {}", metadata.domain_type.as_deref().unwrap_or(""))?;
    writeln!(out, "Domain ID: {}", metadata.domain_id.as_deref().unwrap_or(""))?;
    if metadata.created_at.is_some() {
        writeln!(out, "Created at: {}", timestamp(metadata.created_at))?;
    }
    writeln!(out, "Keys:")?;
    for key in secret.key_names() {
        writeln!(out, "- {}", key)?;
    }
    Ok(())
}

pub struct ListSecrets;

#[async_trait]
impl Command for ListSecrets {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let api = ctx.api()?;
        let scope = organization_scope(api.as_ref()).await?;
        let secrets = api.list_secrets(&scope).await?.secrets;

        if !ctx.renderer.is_text() {
            let views: Vec<SecretView> = secrets.iter().map(SecretView::from).collect();
            ctx.renderer
                .render(&serde_json::json!({ "secrets": views }))?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            write_table(
                out,
                &["ID", "NAME", "PROVIDER", "KEYS", "CREATED_AT"],
                secrets.iter().map(|secret| {
                    vec![
                        secret.id().to_string(),
                        secret.metadata.name.clone(),
                        secret.spec.provider.clone(),
                        secret.key_names().len().to_string(),
                        timestamp(secret.metadata.created_at),
                    ]
                }),
            )
        })?;
        Ok(())
    }
}

pub struct GetSecret {
    pub id_or_name: String,
}

#[async_trait]
impl Command for GetSecret {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let api = ctx.api()?;
        let scope = organization_scope(api.as_ref()).await?;
        let secret = api
            .describe_secret(&scope, self.id_or_name.trim())
            .await?
            .secret;

        if ctx.renderer.is_text() {
            ctx.renderer.render_text(|out| write_secret(out, &secret))?;
        } else {
            ctx.renderer.render(&SecretView::from(&secret))?;
        }
        Ok(())
    }
}

pub struct CreateSecret {
    pub file: PathBuf,
}

#[async_trait]
impl Command for CreateSecret {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let secret = load_secret_resource(&self.file)?.into_secret();
        let api = ctx.api()?;
        let scope = organization_scope(api.as_ref()).await?;

        let created = api
            .create_secret(&scope, &secret)
            .await
            .with_context(|| format!("failed to create secret {:?}", secret.metadata.name))?
            .secret;

        if ctx.renderer.is_text() {
            ctx.renderer.render_text(|out| {
                writeln!(
                    out,
                    "Secret created: {} ({})",
                    created.metadata.name,
                    created.id()
                )
            })?;
        } else {
            ctx.renderer.render(&SecretView::from(&created))?;
        }
        Ok(())
    }
}

pub struct UpdateSecret {
    pub file: PathBuf,
}

#[async_trait]
impl Command for UpdateSecret {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let resource = load_secret_resource(&self.file)?;
        let target = resource.update_target()?;
        let api = ctx.api()?;
        let scope = organization_scope(api.as_ref()).await?;

        let updated = api
            .update_secret(&scope, &target, &resource.into_secret())
            .await?
            .secret;

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Secret updated: {}", target))?;
        } else {
            ctx.renderer.render(&SecretView::from(&updated))?;
        }
        Ok(())
    }
}

pub struct DeleteSecret {
    pub id_or_name: String,
}

#[async_trait]
impl Command for DeleteSecret {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let id_or_name = self.id_or_name.trim();
        let api = ctx.api()?;
        let scope = organization_scope(api.as_ref()).await?;
        let response = api.delete_secret(&scope, id_or_name).await?;

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Secret deleted: {}", id_or_name))?;
        } else {
            ctx.renderer.render(&response)?;
        }
        Ok(())
    }
}
