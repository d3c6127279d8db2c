//! `superplane executions ...`

use crate::cli::flags::PageArgs;
use crate::cli::output::{or_dash, timestamp, write_table};
use anyhow::Result;
use async_trait::async_trait;
use clap::Subcommand;
use superplane_core::command::{Command, CommandContext};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionCommands {
    /// List executions for a canvas node
    List {
        /// Canvas ID (defaults to the active canvas)
        #[arg(long, default_value = "")]
        canvas_id: String,

        /// Node ID
        #[arg(long)]
        node_id: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Cancel an execution
    Cancel {
        /// Canvas ID (defaults to the active canvas)
        #[arg(long, default_value = "")]
        canvas_id: String,

        /// Execution ID
        #[arg(long)]
        execution_id: String,
    },
}

impl ExecutionCommands {
    pub fn into_command(self) -> (&'static str, Box<dyn Command>) {
        match self {
            ExecutionCommands::List {
                canvas_id,
                node_id,
                page,
            } => (
                "list",
                Box::new(ListExecutions {
                    canvas_id,
                    node_id,
                    page,
                }),
            ),
            ExecutionCommands::Cancel {
                canvas_id,
                execution_id,
            } => (
                "cancel",
                Box::new(CancelExecution {
                    canvas_id,
                    execution_id,
                }),
            ),
        }
    }
}

pub struct ListExecutions {
    pub canvas_id: String,
    pub node_id: String,
    pub page: PageArgs,
}

#[async_trait]
impl Command for ListExecutions {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = ctx.resolve_canvas_id(&self.canvas_id)?;
        let options = self.page.list_options()?;
        let response = ctx
            .api()?
            .list_node_executions(&canvas_id, self.node_id.trim(), &options)
            .await?;

        if !ctx.renderer.is_text() {
            ctx.renderer.render(&response)?;
            return Ok(());
        }

        ctx.renderer.render_text(|out| {
            write_table(
                out,
                &[
                    "ID",
                    "NODE_ID",
                    "STATE",
                    "RESULT",
                    "MESSAGE",
                    "CREATED_AT",
                    "UPDATED_AT",
                ],
                response.executions.iter().map(|execution| {
                    vec![
                        execution.id.clone(),
                        execution.node_id.clone(),
                        execution.state.clone(),
                        execution.result.clone(),
                        or_dash(&execution.result_message),
                        timestamp(execution.created_at),
                        timestamp(execution.updated_at),
                    ]
                }),
            )
        })?;
        Ok(())
    }
}

pub struct CancelExecution {
    pub canvas_id: String,
    pub execution_id: String,
}

#[async_trait]
impl Command for CancelExecution {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let canvas_id = ctx.resolve_canvas_id(&self.canvas_id)?;
        let execution_id = self.execution_id.trim();
        let response = ctx.api()?.cancel_execution(&canvas_id, execution_id).await?;

        if ctx.renderer.is_text() {
            ctx.renderer
                .render_text(|out| writeln!(out, "Execution cancelled: {}", execution_id))?;
        } else {
            ctx.renderer.render(&response)?;
        }
        Ok(())
    }
}
