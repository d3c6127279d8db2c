//! Command binding.
//!
//! Every command handler implements [`Command`]. The binder resolves the
//! output format, builds the [`Renderer`], asks the configured factories for
//! an API client and a config accessor, and hands the resulting
//! [`CommandContext`] to the handler inside a span tagged with the command path.

use crate::client::{CanvasApi, HttpCanvasApi};
use crate::config::{ConfigStore, CurrentContext, DEFAULT_API_URL};
use crate::error::{CliError, CliResult};
use crate::render::Renderer;
use async_trait::async_trait;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

/// Access to the active canvas of the current context.
pub trait ConfigAccessor: Send {
    fn active_canvas(&self) -> String;
    fn set_active_canvas(&mut self, canvas_id: &str) -> CliResult<()>;
}

/// A bound command handler.
#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&self, ctx: &mut CommandContext) -> anyhow::Result<()>;
}

/// Flags accepted by every command, parsed once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub verbose: bool,
    pub config: Option<PathBuf>,
    pub output: Option<String>,
}

/// Builds a client for the current context.
pub type ApiClientFactory = Arc<dyn Fn() -> CliResult<Arc<dyn CanvasApi>> + Send + Sync>;

/// Builds a client for an explicit `(url, token)` pair.
pub type ConnectFactory = Arc<dyn Fn(&str, &str) -> CliResult<Arc<dyn CanvasApi>> + Send + Sync>;

/// Builds the config accessor; yields `None` when no context is configured.
pub type ConfigContextFactory = Arc<dyn Fn() -> Option<Box<dyn ConfigAccessor>> + Send + Sync>;

pub type OutputFormatFactory = Arc<dyn Fn() -> String + Send + Sync>;

/// Factories the binder consults while building a [`CommandContext`].
#[derive(Clone, Default)]
pub struct BindOptions {
    pub new_api_client: Option<ApiClientFactory>,
    pub connect_api_client: Option<ConnectFactory>,
    pub new_config_context: Option<ConfigContextFactory>,
    pub default_output_format: Option<OutputFormatFactory>,
    pub config_store: Option<ConfigStore>,
}

fn http_client(url: &str, api_token: &str) -> CliResult<Arc<dyn CanvasApi>> {
    let api = HttpCanvasApi::new(url, api_token)?;
    Ok(Arc::new(api))
}

impl BindOptions {
    /// Factories backed by `store` and the HTTP client.
    pub fn for_store(store: &ConfigStore) -> Self {
        let api_store = store.clone();
        let config_store = store.clone();
        let format_store = store.clone();

        Self {
            new_api_client: Some(Arc::new(move || {
                match api_store.get_current_context() {
                    Some(context) => http_client(&context.url, &context.api_token),
                    None => http_client(DEFAULT_API_URL, ""),
                }
            })),
            connect_api_client: Some(Arc::new(http_client)),
            new_config_context: Some(Arc::new(move || {
                CurrentContext::from_store(&config_store)
                    .map(|current| Box::new(current) as Box<dyn ConfigAccessor>)
            })),
            default_output_format: Some(Arc::new(move || {
                format_store.output_format().unwrap_or_default()
            })),
            config_store: Some(store.clone()),
        }
    }

    /// Routes every API call, including `connect`, to `api`.
    pub fn with_api(mut self, api: Arc<dyn CanvasApi>) -> Self {
        let current = api.clone();
        self.new_api_client = Some(Arc::new(
            move || -> CliResult<Arc<dyn CanvasApi>> { Ok(current.clone()) },
        ));
        self.connect_api_client = Some(Arc::new(
            move |_: &str, _: &str| -> CliResult<Arc<dyn CanvasApi>> { Ok(api.clone()) },
        ));
        self
    }
}

/// Output sink and interactive input of one invocation.
pub struct Streams {
    pub output: Box<dyn Write + Send>,
    pub input: Box<dyn BufRead + Send>,
}

impl Streams {
    pub fn stdio() -> Self {
        Self {
            output: Box::new(io::stdout()),
            input: Box::new(io::BufReader::new(io::stdin())),
        }
    }
}

/// Everything a handler needs for one invocation.
pub struct CommandContext {
    pub command_path: String,
    pub span: tracing::Span,
    pub renderer: Renderer,
    pub config: Option<Box<dyn ConfigAccessor>>,
    pub input: Box<dyn BufRead + Send>,
    new_api: Option<ApiClientFactory>,
    connect: Option<ConnectFactory>,
    store: Option<ConfigStore>,
}

/// Output format with precedence: flag, then configured default, then `text`.
pub fn resolve_output_format(flag: Option<&str>, configured: Option<String>) -> String {
    if let Some(flag) = flag.filter(|flag| !flag.is_empty()) {
        return flag.to_string();
    }

    match configured {
        Some(configured) if !configured.is_empty() => configured,
        _ => "text".to_string(),
    }
}

impl CommandContext {
    pub fn build(
        command_path: &str,
        globals: &GlobalOptions,
        options: &BindOptions,
        streams: Streams,
    ) -> CliResult<Self> {
        let configured = options.default_output_format.as_ref().map(|format| format());
        let format = resolve_output_format(globals.output.as_deref(), configured);
        let renderer = Renderer::new(&format, streams.output)?;

        let span = tracing::info_span!("command", command = %command_path);

        let config = options.new_config_context.as_ref().and_then(|factory| factory());

        Ok(Self {
            command_path: command_path.to_string(),
            span,
            renderer,
            config,
            input: streams.input,
            new_api: options.new_api_client.clone(),
            connect: options.connect_api_client.clone(),
            store: options.config_store.clone(),
        })
    }

    /// Client bound to the current context, built on demand.
    pub fn api(&self) -> CliResult<Arc<dyn CanvasApi>> {
        let factory = self
            .new_api
            .as_ref()
            .ok_or_else(|| CliError::unsupported("no API client configured for this command"))?;
        factory()
    }

    /// Client bound to an explicit URL and token.
    pub fn connect(&self, url: &str, api_token: &str) -> CliResult<Arc<dyn CanvasApi>> {
        let factory = self
            .connect
            .as_ref()
            .ok_or_else(|| CliError::unsupported("no API client configured for this command"))?;
        factory(url, api_token)
    }

    pub fn store(&self) -> CliResult<&ConfigStore> {
        self.store
            .as_ref()
            .ok_or_else(|| CliError::unsupported("no configuration store available"))
    }

    /// Accessor for the current context; fails when none is configured.
    pub fn config_mut(&mut self) -> CliResult<&mut (dyn ConfigAccessor + 'static)> {
        self.config
            .as_deref_mut()
            .ok_or_else(|| CliError::not_found("no current context configured"))
    }

    /// Explicit `--canvas-id` if given, else the active canvas of the current context.
    pub fn resolve_canvas_id(&self, canvas_id: &str) -> CliResult<String> {
        let canvas_id = canvas_id.trim();
        if !canvas_id.is_empty() {
            return Ok(canvas_id.to_string());
        }

        let active = self
            .config
            .as_ref()
            .map(|config| config.active_canvas())
            .unwrap_or_default();
        let active = active.trim();
        if active.is_empty() {
            return Err(CliError::validation(
                "canvas id is required; pass --canvas-id or set one with \"superplane canvases active\"",
            ));
        }

        Ok(active.to_string())
    }
}

/// Builds the context for `command_path` and executes `command` inside its span.
pub async fn run(
    command: &dyn Command,
    command_path: &str,
    globals: &GlobalOptions,
    options: &BindOptions,
    streams: Streams,
) -> anyhow::Result<()> {
    let mut ctx = CommandContext::build(command_path, globals, options, streams)?;
    let span = ctx.span.clone();

    async {
        tracing::debug!("executing command");
        command.execute(&mut ctx).await
    }
    .instrument(span)
    .await
}
