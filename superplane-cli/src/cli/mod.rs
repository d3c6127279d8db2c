//! CLI command handling

pub mod canvases;
pub mod connect;
pub mod contexts;
pub mod events;
pub mod executions;
pub mod flags;
pub mod output;
pub mod queue;
pub mod secrets;
pub mod whoami;

#[cfg(test)]
mod handlers_tests;

use anyhow::Result;
use clap::Subcommand;
use superplane_core::command::{run, BindOptions, Command, GlobalOptions, Streams};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Connect to a SuperPlane organization
    ///
    /// Validates the token, then saves the organization as a context and
    /// makes it current.
    ///
    /// Example:
    ///   superplane connect https://app.superplane.com $SUPERPLANE_TOKEN
    Connect {
        /// Organization base URL
        base_url: String,

        /// API token
        api_token: String,
    },

    /// List contexts or switch the current one
    ///
    /// Without a selector, prompts for a context in text output and lists
    /// them in JSON or YAML output.
    Contexts {
        /// Context to switch to, as BASE_URL/ORGANIZATION
        selector: Option<String>,
    },

    /// Show the authenticated user
    Whoami,

    /// Manage canvases
    #[command(alias = "canvas")]
    Canvases {
        #[command(subcommand)]
        command: canvases::CanvasCommands,
    },

    /// Inspect canvas events
    #[command(alias = "event")]
    Events {
        #[command(subcommand)]
        command: events::EventCommands,
    },

    /// Inspect and cancel node executions
    #[command(alias = "execution")]
    Executions {
        #[command(subcommand)]
        command: executions::ExecutionCommands,
    },

    /// Inspect and delete queued node items
    Queue {
        #[command(subcommand)]
        command: queue::QueueCommands,
    },

    /// Manage organization secrets
    #[command(alias = "secret")]
    Secrets {
        #[command(subcommand)]
        command: secrets::SecretCommands,
    },
}

fn grouped(group: &str, (name, command): (&str, Box<dyn Command>)) -> (String, Box<dyn Command>) {
    (format!("superplane {} {}", group, name), command)
}

impl Commands {
    /// Full command path (`superplane canvases list`) and its handler.
    pub fn into_command(self) -> (String, Box<dyn Command>) {
        match self {
            Commands::Connect {
                base_url,
                api_token,
            } => (
                "superplane connect".to_string(),
                Box::new(connect::ConnectCommand {
                    base_url,
                    api_token,
                }),
            ),
            Commands::Contexts { selector } => (
                "superplane contexts".to_string(),
                Box::new(contexts::ContextsCommand { selector }),
            ),
            Commands::Whoami => (
                "superplane whoami".to_string(),
                Box::new(whoami::WhoamiCommand),
            ),
            Commands::Canvases { command } => grouped("canvases", command.into_command()),
            Commands::Events { command } => grouped("events", command.into_command()),
            Commands::Executions { command } => grouped("executions", command.into_command()),
            Commands::Queue { command } => grouped("queue", command.into_command()),
            Commands::Secrets { command } => grouped("secrets", command.into_command()),
        }
    }
}

/// Binds `command` to a fresh context and runs it.
pub async fn dispatch(
    command: Commands,
    globals: &GlobalOptions,
    options: &BindOptions,
    streams: Streams,
) -> Result<()> {
    let (path, command) = command.into_command();
    run(command.as_ref(), &path, globals, options, streams).await
}
