//! `superplane contexts`

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use superplane_core::command::{Command, CommandContext};
use superplane_core::config::ConfigContext;
use superplane_core::selector::{select, SelectorRow};
use superplane_core::CliError;

/// Lists contexts and switches the current one, interactively or by selector.
pub struct ContextsCommand {
    pub selector: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContextSummary {
    organization: String,
    url: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    current: bool,
}

#[derive(Debug, Serialize)]
struct ContextList {
    contexts: Vec<ContextSummary>,
}

#[async_trait]
impl Command for ContextsCommand {
    async fn execute(&self, ctx: &mut CommandContext) -> Result<()> {
        let store = ctx.store()?.clone();
        let contexts = store.get_contexts();
        if contexts.is_empty() {
            return Err(CliError::not_found(
                "no contexts configured; run superplane connect [BASE_URL] [API_TOKEN]",
            )
            .into());
        }

        if let Some(selector) = &self.selector {
            let selected = store.save_current_context_by_selector(selector)?;
            return render_current(ctx, &selected);
        }

        let current = store.get_current_context().map(|context| context.selector());

        if !ctx.renderer.is_text() {
            let list = ContextList {
                contexts: contexts
                    .iter()
                    .map(|context| ContextSummary {
                        organization: context.organization.clone(),
                        url: context.url.clone(),
                        current: current.as_deref() == Some(context.selector().as_str()),
                    })
                    .collect(),
            };
            ctx.renderer.render(&list)?;
            return Ok(());
        }

        let selected = select(
            &mut ctx.renderer,
            ctx.input.as_mut(),
            "context",
            contexts,
            |context| SelectorRow {
                label: context.organization.clone(),
                id: context.selector(),
                current: current.as_deref() == Some(context.selector().as_str()),
            },
        )?;

        let selected = store.save_current_context_by_selector(&selected.selector())?;
        render_current(ctx, &selected)
    }
}

fn render_current(ctx: &mut CommandContext, context: &ConfigContext) -> Result<()> {
    if ctx.renderer.is_text() {
        ctx.renderer.render_text(|out| {
            writeln!(
                out,
                "Current context: {:?} ({})",
                context.organization, context.url
            )
        })?;
    } else {
        ctx.renderer.render(&ContextSummary {
            organization: context.organization.clone(),
            url: context.url.clone(),
            current: false,
        })?;
    }
    Ok(())
}
