//! `superplane queue ...`

use crate::cli::output::{timestamp, write_table};
use anyhow::Result;
use async_trait::async_trait;
use clap::Subcommand;
use superplane_core::command::{Command, CommandContext};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueueCommands {
    /// List queued items for a canvas node
    List {
        /// Canvas ID (defaults to the active canvas)
        #[arg(long, default_value = "")]
        canvas_id: String,

        /// Node ID
        #[arg(long)]
        node_id: String,
    },

    /// Delete a queued item
    Delete {
        /// Canvas ID (defaults to the active canvas)
        #[arg(long, default_value = "")]
        canvas_id: String,

        /// Node ID
        #[arg(long)]
        node_id: String,

        /// Queue item ID
        #[arg(long)]
        item_id: String,
    },
}

impl QueueCommands {
    pub fn into_command(self) -> (&'static str, Box<dyn Command>) {
        match self {
            QueueCommands::List { canvas_id, node_id } => {
                ("list", Box::new(ListQueueItems { canvas_id, node_id }))
            }
            QueueCommands::Delete {
                canvas_id,
                node_id,
                item_id,
            } => (
                "delete",
                Box::new(DeleteQueueItem {
                    canvas_id,
                    node_id,
                    item_id,
                }),
            ),
        }
    }
}

pub struct ListQueueItems {
    pub canvas_id: String,
    pub node_id: String,
}

#[async_trait]
impl Command for ListQueueItems {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = ctx.resolve_canvas_id(&self.canvas_id)?;
        let response = ctx
            .api()?
            .list_node_queue_items(&canvas_id, self.node_id.trim())
            .await?;

        if !ctx.renderer.is_text() {
            ctx.renderer.render(&response)?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            write_table(
                out,
                &["ID", "CREATED_AT", "ROOT_EVENT_ID", "SOURCE"],
                response.items.iter().map(|item| {
                    let (event_id, source) = item
                        .root_event
                        .as_ref()
                        .map(|event| (event.id.clone(), event.node_id.clone()))
                        .unwrap_or_default();
                    vec![item.id.clone(), timestamp(item.created_at), event_id, source]
                }),
            )
        })?;
        Ok(())
    }
}

pub struct DeleteQueueItem {
    pub canvas_id: String,
    pub node_id: String,
    pub item_id: String,
}

#[async_trait]
impl Command for DeleteQueueItem {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = ctx.resolve_canvas_id(&self.canvas_id)?;
        let item_id = self.item_id.trim();
        let response = ctx
            .api()?
            .delete_node_queue_item(&canvas_id, self.node_id.trim(), item_id)
            .await?;

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Queue item deleted: {}", item_id))?;
        } else {
            ctx.renderer.render(&response)?;
        }
        Ok(())
    }
}
