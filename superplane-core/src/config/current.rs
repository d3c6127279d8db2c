//! Config accessor bound to the current context.

use super::{ConfigContext, ConfigStore};
use crate::command::ConfigAccessor;
use crate::error::CliResult;

/// Reads and updates the active canvas of the context that was current when
/// the command started.
pub struct CurrentContext {
    context: ConfigContext,
    store: ConfigStore,
}

impl CurrentContext {
    pub fn new(context: ConfigContext, store: ConfigStore) -> Self {
        Self { context, store }
    }

    /// Builds an accessor for the store's current context, if there is one.
    pub fn from_store(store: &ConfigStore) -> Option<Self> {
        store
            .get_current_context()
            .map(|context| Self::new(context, store.clone()))
    }

    pub fn context(&self) -> &ConfigContext {
        &self.context
    }
}

impl ConfigAccessor for CurrentContext {
    fn active_canvas(&self) -> String {
        self.context.active_canvas().to_string()
    }

    fn set_active_canvas(&mut self, canvas_id: &str) -> CliResult<()> {
        let mut updated = self.context.clone();
        updated.canvas = Some(canvas_id.to_string());
        self.context = self.store.upsert_context(updated)?;
        Ok(())
    }
}
