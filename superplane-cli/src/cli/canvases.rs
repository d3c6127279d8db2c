//! `superplane canvases ...`

use crate::cli::output::{timestamp, write_table};
use anyhow::Result;
use async_trait::async_trait;
use clap::Subcommand;
use std::path::{Path, PathBuf};
use superplane_core::client::ApiError;
use superplane_core::command::{Command, CommandContext};
use superplane_core::models::Canvas;
use superplane_core::resource::{read_resource_file, CanvasResource};
use superplane_core::selector::{select, SelectorRow};
use superplane_core::CliError;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CanvasCommands {
    /// List canvases
    List,

    /// Show a canvas
    Get {
        /// Canvas ID or exact name
        name_or_id: String,
    },

    /// Set the active canvas for the current context
    ///
    /// Without arguments, prompts for a canvas selection. With a canvas ID,
    /// sets it directly.
    Active {
        /// Canvas ID
        canvas_id: Option<String>,
    },

    /// Create a canvas
    ///
    /// Either pass a name to create an empty canvas, or a resource file.
    Create {
        /// Name of the new, empty canvas
        name: Option<String>,

        /// Canvas resource file (YAML or JSON)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Update a canvas from a resource file
    Update {
        /// Canvas resource file (YAML or JSON); metadata.id is required
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Delete a canvas
    Delete {
        /// Canvas ID
        canvas_id: String,
    },
}

impl CanvasCommands {
    /// Subcommand name and its handler.
    pub fn into_command(self) -> (&'static str, Box<dyn Command>) {
        match self {
            CanvasCommands::List => ("list", Box::new(ListCanvases)),
            CanvasCommands::Get { name_or_id } => ("get", Box::new(GetCanvas { name_or_id })),
            CanvasCommands::Active { canvas_id } => ("active", Box::new(ActiveCanvas { canvas_id })),
            CanvasCommands::Create { name, file } => ("create", Box::new(CreateCanvas { name, file })),
            CanvasCommands::Update { file } => ("update", Box::new(UpdateCanvas { file })),
            CanvasCommands::Delete { canvas_id } => ("delete", Box::new(DeleteCanvas { canvas_id })),
        }
    }
}

pub struct ListCanvases;

#[async_trait]
impl Command for ListCanvases {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let response = ctx.api()?.list_canvases().await?;

        if !ctx.renderer.is_text() {
            ctx.renderer.render(&response)?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            write_table(
                out,
                &["ID", "NAME", "CREATED_AT"],
                response.canvases.iter().map(|canvas| {
                    vec![
                        canvas.id().to_string(),
                        canvas.metadata.name.clone(),
                        timestamp(canvas.metadata.created_at),
                    ]
                }),
            )
        })?;
        Ok(())
    }
}

pub struct GetCanvas {
    pub name_or_id: String,
}

/// Errors that mean "no canvas with this id" rather than a failed call.
fn is_missing(err: &ApiError) -> bool {
    matches!(err, ApiError::Status { status: 400 | 404, .. })
}

#[async_trait]
impl Command for GetCanvas {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let api = ctx.api()?;
        let wanted = self.name_or_id.trim();

        let canvas = match api.describe_canvas(wanted).await {
            Ok(response) => response.canvas,
            Err(err) if is_missing(&err) => {
                tracing::debug!(canvas = wanted, "no canvas with this id, trying names");
                api.list_canvases()
                    .await?
                    .canvases
                    .into_iter()
                    .find(|canvas| canvas.metadata.name == wanted)
                    .ok_or_else(|| CliError::not_found(format!("canvas {:?} not found", wanted)))?
            }
            Err(err) => return Err(err.into()),
        };

        if !ctx.renderer.is_text() {
            ctx.renderer.render(&canvas)?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            writeln!(out, "ID: {}", canvas.id())?;
            writeln!(out, "Name: {}", canvas.metadata.name)?;
            writeln!(
                out,
                "Description: {}",
                canvas.metadata.description.as_deref().unwrap_or("")
            )?;
            writeln!(out, "Created at: {}", timestamp(canvas.metadata.created_at))?;
            writeln!(out, "Nodes: {}", canvas.spec.nodes.len())?;
            writeln!(out, "Edges: {}", canvas.spec.edges.len())
        })?;
        Ok(())
    }
}

pub struct ActiveCanvas {
    pub canvas_id: Option<String>,
}

#[async_trait]
impl Command for ActiveCanvas {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = match &self.canvas_id {
            Some(canvas_id) => {
                let canvas_id = canvas_id.trim();
                if canvas_id.is_empty() {
                    return Err(CliError::validation("canvas id is required").into());
                }
                ctx.config_mut()?;
                ctx.api()?.describe_canvas(canvas_id).await?;
                canvas_id.to_string()
            }
            None => {
                if !ctx.renderer.is_text() {
                    return Err(CliError::unsupported(
                        "interactive canvas selection requires text output",
                    )
                    .into());
                }

                let active = ctx.config_mut()?.active_canvas();
                let canvases = ctx.api()?.list_canvases().await?.canvases;
                let selected = select(
                    &mut ctx.renderer,
                    ctx.input.as_mut(),
                    "canvas",
                    canvases,
                    |canvas: &Canvas| SelectorRow {
                        label: canvas.metadata.name.clone(),
                        id: canvas.id().to_string(),
                        current: !active.is_empty() && canvas.id() == active,
                    },
                )?;
                selected.id().to_string()
            }
        };

        ctx.config_mut()?.set_active_canvas(&canvas_id)?;
        tracing::info!(canvas = %canvas_id, "active canvas set");

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Active canvas: {}", canvas_id))?;
        } else {
            ctx.renderer
                .render(&serde_json::json!({ "activeCanvas": canvas_id }))?;
        }
        Ok(())
    }
}

pub struct CreateCanvas {
    pub name: Option<String>,
    pub file: Option<PathBuf>,
}

fn load_canvas_resource(path: &Path) -> Result<CanvasResource> {
    let raw = read_resource_file(path)?;
    Ok(CanvasResource::parse(&raw)?)
}

#[async_trait]
impl Command for CreateCanvas {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas = match (&self.file, &self.name) {
            (Some(_), Some(_)) => {
                return Err(CliError::validation(
                    "cannot use <canvas-name> together with --file",
                )
                .into())
            }
            (Some(file), None) => load_canvas_resource(file)?.into_canvas(),
            (None, Some(name)) if !name.trim().is_empty() => Canvas::empty(name.trim()),
            _ => {
                return Err(
                    CliError::validation("either --file or <canvas-name> is required").into(),
                )
            }
        };

        let created = ctx.api()?.create_canvas(&canvas).await?.canvas;

        if ctx.renderer.is_text() {
            ctx.renderer.render_text(|out| {
                writeln!(
                    out,
                    "Canvas created: {} ({})",
                    created.metadata.name,
                    created.id()
                )
            })?;
        } else {
            ctx.renderer.render(&created)?;
        }
        Ok(())
    }
}

pub struct UpdateCanvas {
    pub file: PathBuf,
}

#[async_trait]
impl Command for UpdateCanvas {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let resource = load_canvas_resource(&self.file)?;
        let canvas_id = resource.require_id()?.to_string();

        let updated = ctx
            .api()?
            .update_canvas(&canvas_id, &resource.into_canvas())
            .await?
            .canvas;

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Canvas updated: {}", canvas_id))?;
        } else {
            ctx.renderer.render(&updated)?;
        }
        Ok(())
    }
}

pub struct DeleteCanvas {
    pub canvas_id: String,
}

#[async_trait]
impl Command for DeleteCanvas {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = self.canvas_id.trim();
        let response = ctx.api()?.delete_canvas(canvas_id).await?;

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Canvas deleted: {}", canvas_id))?;
        } else {
            ctx.renderer.render(&response)?;
        }
        Ok(())
    }
}
