//! `superplane events ...`

use crate::cli::flags::PageArgs;
use crate::cli::output::{timestamp, write_table};
use anyhow::Result;
use async_trait::async_trait;
use clap::Subcommand;
use superplane_core::command::{Command, CommandContext};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum EventCommands {
    /// List root events for a canvas or events for a specific node
    List {
        /// Canvas ID (defaults to the active canvas)
        #[arg(long, default_value = "")]
        canvas_id: String,

        /// Node ID; lists that node's events instead of the canvas root events
        #[arg(long, default_value = "")]
        node_id: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List executions triggered by an event
    ListExecutions {
        /// Canvas ID (defaults to the active canvas)
        #[arg(long, default_value = "")]
        canvas_id: String,

        /// Event ID
        #[arg(long)]
        event_id: String,
    },
}

impl EventCommands {
    pub fn into_command(self) -> (&'static str, Box<dyn Command>) {
        match self {
            EventCommands::List {
                canvas_id,
                node_id,
                page,
            } => (
                "list",
                Box::new(ListEvents {
                    canvas_id,
                    node_id,
                    page,
                }),
            ),
            EventCommands::ListExecutions {
                canvas_id,
                event_id,
            } => (
                "list-executions",
                Box::new(ListEventExecutions {
                    canvas_id,
                    event_id,
                }),
            ),
        }
    }
}

pub struct ListEvents {
    pub canvas_id: String,
    pub node_id: String,
    pub page: PageArgs,
}

#[async_trait]
impl Command for ListEvents {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = ctx.resolve_canvas_id(&self.canvas_id)?;
        let options = self.page.list_options()?;
        let api = ctx.api()?;
        let node_id = self.node_id.trim();

        if !node_id.is_empty() {
            let response = api.list_node_events(&canvas_id, node_id, &options).await?;
            if !ctx.renderer.is_text() {
                ctx.renderer.render(&response)?;
                return Ok(());
            }

            ctx.renderer.render_text(|out| {
                write_table(
                    out,
                    &["ID", "CHANNEL", "CREATED_AT"],
                    response.events.iter().map(|event| {
                        vec![
                            event.id.clone(),
                            event.channel.clone(),
                            timestamp(event.created_at),
                        ]
                    }),
                )
            })?;
            return Ok(());
        }

        let response = api.list_canvas_events(&canvas_id, &options).await?;
        if !ctx.renderer.is_text() {
            ctx.renderer.render(&response)?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            write_table(
                out,
                &["ID", "NODE_ID", "CHANNEL", "EXECUTIONS", "CREATED_AT"],
                response.events.iter().map(|event| {
                    vec![
                        event.id.clone(),
                        event.node_id.clone(),
                        event.channel.clone(),
                        event.executions.len().to_string(),
                        timestamp(event.created_at),
                    ]
                }),
            )
        })?;
        Ok(())
    }
}

pub struct ListEventExecutions {
    pub canvas_id: String,
    pub event_id: String,
}

#[async_trait]
impl Command for ListEventExecutions {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = ctx.resolve_canvas_id(&self.canvas_id)?;
        let response = ctx
            .api()?
            .list_event_executions(&canvas_id, self.event_id.trim())
            .await?;

        if !ctx.renderer.is_text() {
            ctx.renderer.render(&response)?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            write_table(
                out,
                &["ID", "NODE_ID", "STATE", "RESULT", "CREATED_AT", "UPDATED_AT"],
                response.executions.iter().map(|execution| {
                    vec![
                        execution.id.clone(),
                        execution.node_id.clone(),
                        execution.state.clone(),
                        execution.result.clone(),
                        timestamp(execution.created_at),
                        timestamp(execution.updated_at),
                    ]
                }),
            )
        })?;
        Ok(())
    }
}
