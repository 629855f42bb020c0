use std::collections::BTreeMap;
use std::sync::Arc;

use super::traits::{ExecutorAdapter, ExecutorResolver};
use crate::plan::Language;

/// Fixed language → adapter table.
#[derive(Clone, Default)]
pub struct ExecutorRegistry {
    adapters: BTreeMap<Language, Arc<dyn ExecutorAdapter>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own language, replacing any previous one.
    pub fn register(mut self, adapter: Arc<dyn ExecutorAdapter>) -> Self {
        self.adapters.insert(adapter.language(), adapter);
        self
    }
}

impl ExecutorResolver for ExecutorRegistry {
    fn resolve(&self, language: Language) -> Option<Arc<dyn ExecutorAdapter>> {
        self.adapters.get(&language).cloned()
    }
}
